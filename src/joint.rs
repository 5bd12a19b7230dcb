//! Joint models: the closed set of joint kinds and their per-kind rules.
//!
//! Every kind defines the size of its configuration vector ([Joint::params]) and of its velocity
//! vector ([Joint::dof]). Both differ for orientation-valued joints: a [JointType::Spherical] joint
//! is configured by a unit quaternion `[w, x, y, z]` but moves with a 3D angular velocity expressed
//! in the successor frame. [JointType::Free] appends a translation to the quaternion and a linear
//! velocity (successor frame) to the angular velocity.
//!
//! The motion subspace columns are full spatial vectors `[angular; linear]` in the successor joint
//! frame, so velocity propagation treats every kind alike.

use crate::{MotionVec, PTransform};
use nalgebra::{Matrix6xX, Quaternion, Unit, UnitQuaternion, Vector3};

/// Identifier of a joint in a [crate::MultiBodyGraph]
pub type JointId = i32;

/// Id of the virtual joint connecting the root body to the world
pub const ROOT_JOINT_ID: JointId = -1;

/// Name of the virtual joint connecting the root body to the world
pub const ROOT_JOINT_NAME: &str = "Root";

#[derive(Debug, Clone, PartialEq)]
pub enum JointType {
    Fixed,
    RevoluteX,
    RevoluteY,
    RevoluteZ,
    Revolute(Unit<Vector3<f64>>),
    Prismatic(Unit<Vector3<f64>>),
    Spherical,
    Free,
}

impl JointType {
    pub fn params(&self) -> usize {
        match self {
            JointType::Fixed => 0,
            JointType::RevoluteX
            | JointType::RevoluteY
            | JointType::RevoluteZ
            | JointType::Revolute(_)
            | JointType::Prismatic(_) => 1,
            JointType::Spherical => 4,
            JointType::Free => 7,
        }
    }

    pub fn dof(&self) -> usize {
        match self {
            JointType::Fixed => 0,
            JointType::RevoluteX
            | JointType::RevoluteY
            | JointType::RevoluteZ
            | JointType::Revolute(_)
            | JointType::Prismatic(_) => 1,
            JointType::Spherical => 3,
            JointType::Free => 6,
        }
    }

    /// Axis of single-dof joints
    pub fn axis(&self) -> Option<Vector3<f64>> {
        match self {
            JointType::RevoluteX => Some(Vector3::x()),
            JointType::RevoluteY => Some(Vector3::y()),
            JointType::RevoluteZ => Some(Vector3::z()),
            JointType::Revolute(axis) | JointType::Prismatic(axis) => Some(axis.into_inner()),
            _ => None,
        }
    }
}

/// A joint of a given kind. The direction flag reverses the motion of the successor with respect to
/// the predecessor.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    kind: JointType,
    forward: bool,
    id: JointId,
    name: String,
}

impl Joint {
    pub fn new(kind: JointType, forward: bool, id: JointId, name: impl Into<String>) -> Self {
        Self {
            kind,
            forward,
            id,
            name: name.into(),
        }
    }

    pub(crate) fn root(fixed_base: bool) -> Self {
        let kind = if fixed_base { JointType::Fixed } else { JointType::Free };
        Self::new(kind, true, ROOT_JOINT_ID, ROOT_JOINT_NAME)
    }

    pub fn kind(&self) -> &JointType {
        &self.kind
    }

    pub fn id(&self) -> JointId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// `1.0` for forward joints, `-1.0` for reversed ones
    pub fn direction(&self) -> f64 {
        if self.forward {
            1.0
        } else {
            -1.0
        }
    }

    /// Size of the configuration vector
    pub fn params(&self) -> usize {
        self.kind.params()
    }

    /// Size of the velocity (and acceleration) vector
    pub fn dof(&self) -> usize {
        self.kind.dof()
    }

    /// The same joint with the opposite direction, e.g., when a link is traversed from its second body.
    pub fn reversed(&self) -> Self {
        Self {
            forward: !self.forward,
            ..self.clone()
        }
    }

    /// Neutral configuration
    pub fn zero_param(&self) -> Vec<f64> {
        match self.kind {
            JointType::Spherical => vec![1.0, 0.0, 0.0, 0.0],
            JointType::Free => vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            _ => vec![0.0; self.params()],
        }
    }

    pub fn zero_dof(&self) -> Vec<f64> {
        vec![0.0; self.dof()]
    }

    /// Transform from the predecessor joint frame to the successor joint frame for configuration `q`.
    pub fn pose(&self, q: &[f64]) -> PTransform {
        let dir = self.direction();
        match &self.kind {
            JointType::Fixed => PTransform::identity(),
            JointType::Prismatic(axis) => PTransform::from_translation(axis.into_inner() * (dir * q[0])),
            JointType::Spherical => PTransform::from_rotation(rotation_from_param(q).transpose()),
            JointType::Free => PTransform::new(
                rotation_from_param(q).transpose(),
                Vector3::new(q[4], q[5], q[6]),
            ),
            // Revolute kinds
            kind => {
                let axis = Unit::new_unchecked(kind.axis().unwrap_or_else(Vector3::z));
                let rotation = nalgebra::Rotation3::from_axis_angle(&axis, dir * q[0]);
                PTransform::from_rotation(rotation.matrix().transpose())
            }
        }
    }

    /// Writes the motion subspace into `target`, which must have [Joint::dof] columns.
    pub fn write_motion_subspace(&self, target: &mut Matrix6xX<f64>) {
        let dir = self.direction();
        target.fill(0.0);
        match &self.kind {
            JointType::Fixed => {}
            JointType::Prismatic(axis) => {
                target.fixed_view_mut::<3, 1>(3, 0).copy_from(&(axis.into_inner() * dir));
            }
            JointType::Spherical => {
                (0..3).for_each(|k| target[(k, k)] = dir);
            }
            JointType::Free => {
                (0..6).for_each(|k| target[(k, k)] = dir);
            }
            kind => {
                let axis = kind.axis().unwrap_or_else(Vector3::z);
                target.fixed_view_mut::<3, 1>(0, 0).copy_from(&(axis * dir));
            }
        }
    }

    /// Allocating variant of [Joint::write_motion_subspace]
    pub fn motion_subspace(&self) -> Matrix6xX<f64> {
        let mut result = Matrix6xX::zeros(self.dof());
        self.write_motion_subspace(&mut result);
        result
    }

    /// Computes the joint transform and refreshes its motion subspace in one call.
    pub fn pose_and_motion_subspace(&self, q: &[f64], subspace: &mut Matrix6xX<f64>) -> PTransform {
        self.write_motion_subspace(subspace);
        self.pose(q)
    }

    /// Spatial velocity of the successor relative to the predecessor (successor joint frame).
    pub fn motion(&self, alpha: &[f64]) -> MotionVec {
        MotionVec::from_subspace(&self.motion_subspace(), alpha)
    }

    /// Advances the configuration `q` in place by the velocity `alpha` over `step`.
    pub fn integrate(&self, q: &mut [f64], alpha: &[f64], step: f64) {
        let dir = self.direction();
        match self.kind {
            JointType::Fixed => {}
            JointType::Spherical => {
                let omega = Vector3::new(alpha[0], alpha[1], alpha[2]) * dir;
                integrate_quaternion(q, &omega, step);
            }
            JointType::Free => {
                // translation first, it uses the orientation at the beginning of the step
                let rotation = rotation_from_param(q);
                let velocity = Vector3::new(alpha[3], alpha[4], alpha[5]) * dir;
                let translation = rotation * velocity * step;
                q[4..7].iter_mut().zip(translation.iter()).for_each(|(t, d)| *t += d);

                let omega = Vector3::new(alpha[0], alpha[1], alpha[2]) * dir;
                integrate_quaternion(q, &omega, step);
            }
            _ => q[0] += alpha[0] * step,
        }
    }
}

fn quaternion_from_param(q: &[f64]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3]))
}

/// Orientation of the successor frame in the predecessor frame
fn rotation_from_param(q: &[f64]) -> nalgebra::Matrix3<f64> {
    quaternion_from_param(q).to_rotation_matrix().into_inner()
}

/// `q <- normalize(q * exp(omega * step))` on the first four entries of `q`.
fn integrate_quaternion(q: &mut [f64], omega: &Vector3<f64>, step: f64) {
    let current = quaternion_from_param(q);
    let next = UnitQuaternion::new_normalize((current * UnitQuaternion::from_scaled_axis(omega * step)).into_inner());
    q[0] = next.w;
    q[1] = next.i;
    q[2] = next.j;
    q[3] = next.k;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_sizes() {
        let sizes = [
            (JointType::Fixed, 0, 0),
            (JointType::RevoluteX, 1, 1),
            (JointType::Prismatic(Vector3::y_axis()), 1, 1),
            (JointType::Spherical, 4, 3),
            (JointType::Free, 7, 6),
        ];
        for (kind, params, dof) in sizes {
            let joint = Joint::new(kind, true, 0, "j");
            assert_eq!(joint.params(), params);
            assert_eq!(joint.dof(), dof);
            assert_eq!(joint.zero_param().len(), params);
            assert_eq!(joint.motion_subspace().ncols(), dof);
        }
    }

    #[test]
    fn test_revolute_pose() {
        let joint = Joint::new(JointType::RevoluteX, true, 0, "j");
        let pose = joint.pose(&[FRAC_PI_2]);
        // A point on the successor's y axis ends up on the predecessor's z axis
        assert_abs_diff_eq!(
            pose.inv_apply_point(&Vector3::new(0.0, 1.0, 0.0)),
            Vector3::new(0.0, 0.0, 1.0),
            epsilon = 1e-12
        );

        let reversed = joint.reversed().pose(&[FRAC_PI_2]);
        assert_abs_diff_eq!(
            reversed.inv_apply_point(&Vector3::new(0.0, 1.0, 0.0)),
            Vector3::new(0.0, 0.0, -1.0),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(joint.reversed().motion_subspace()[(0, 0)], -1.0);
    }

    #[test]
    fn test_prismatic_pose() {
        let joint = Joint::new(JointType::Prismatic(Vector3::z_axis()), true, 0, "j");
        let pose = joint.pose(&[0.25]);
        assert_abs_diff_eq!(*pose.translation(), Vector3::new(0.0, 0.0, 0.25), epsilon = 1e-12);
        assert_abs_diff_eq!(joint.motion(&[2.0]).linear, Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn test_spherical_integration_stays_unit() {
        let joint = Joint::new(JointType::Spherical, true, 0, "j");
        let mut q = joint.zero_param();
        for _ in 0..100 {
            joint.integrate(&mut q, &[0.3, -1.2, 2.0], 0.05);
            let norm = q.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_spherical_integration_matches_axis_angle() {
        let joint = Joint::new(JointType::Spherical, true, 0, "j");
        let mut q = joint.zero_param();
        joint.integrate(&mut q, &[0.0, 0.0, 1.0], FRAC_PI_2);
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        assert_abs_diff_eq!(q[0], expected.w, epsilon = 1e-12);
        assert_abs_diff_eq!(q[3], expected.k, epsilon = 1e-12);
    }

    #[test]
    fn test_free_integration_uses_body_frame_velocity() {
        let joint = Joint::new(JointType::Free, true, 0, "j");
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let mut q = vec![rotation.w, rotation.i, rotation.j, rotation.k, 1.0, 0.0, 0.0];
        // moving along the body x axis, which points along world y
        joint.integrate(&mut q, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0], 0.5);
        assert_abs_diff_eq!(q[4], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(q[5], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(q[6], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fixed_is_noop() {
        let joint = Joint::new(JointType::Fixed, true, 0, "j");
        let mut q: Vec<f64> = vec![];
        joint.integrate(&mut q, &[], 1.0);
        assert_eq!(joint.pose(&q), PTransform::identity());
    }
}
