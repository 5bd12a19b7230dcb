//! Minimal 6D spatial algebra on top of [nalgebra].
//!
//! Convention: spatial vectors are `[angular; linear]` (Featherstone order). A [PTransform] maps
//! coordinates of a frame A into a frame B: its rotation `E` rotates A coordinates into B coordinates
//! and its translation `r` is the origin of B expressed in A. Products read right to left, i.e.,
//! `x_bc * x_ab` is the transform from A to C.

use nalgebra::{Matrix3, Matrix6xX, Vector3, Vector6};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Tolerance used to decide whether a rotation block is orthonormal
const RIGID_TOLERANCE: f64 = 1e-6;

/// Cross-product matrix: `skew(v) * w == v.cross(&w)`.
#[inline]
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Spatial motion vector (twist).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionVec {
    pub angular: Vector3<f64>,
    pub linear: Vector3<f64>,
}

impl MotionVec {
    #[inline]
    pub fn new(angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Self { angular, linear }
    }

    #[inline]
    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    #[inline]
    pub fn from_vector6(v: &Vector6<f64>) -> Self {
        Self::new(Vector3::new(v[0], v[1], v[2]), Vector3::new(v[3], v[4], v[5]))
    }

    pub fn to_vector6(&self) -> Vector6<f64> {
        Vector6::new(
            self.angular.x,
            self.angular.y,
            self.angular.z,
            self.linear.x,
            self.linear.y,
            self.linear.z,
        )
    }

    /// Maps a joint velocity through a motion subspace matrix: `S * alpha`.
    ///
    /// Only the first `alpha.len()` columns of `subspace` are used.
    pub fn from_subspace(subspace: &Matrix6xX<f64>, alpha: &[f64]) -> Self {
        let mut result = Vector6::zeros();
        for (k, value) in alpha.iter().enumerate() {
            result += subspace.column(k) * *value;
        }
        Self::from_vector6(&result)
    }
}

impl Add for MotionVec {
    type Output = MotionVec;
    #[inline]
    fn add(self, rhs: MotionVec) -> MotionVec {
        MotionVec::new(self.angular + rhs.angular, self.linear + rhs.linear)
    }
}

impl Sub for MotionVec {
    type Output = MotionVec;
    #[inline]
    fn sub(self, rhs: MotionVec) -> MotionVec {
        MotionVec::new(self.angular - rhs.angular, self.linear - rhs.linear)
    }
}

impl Mul<f64> for MotionVec {
    type Output = MotionVec;
    #[inline]
    fn mul(self, rhs: f64) -> MotionVec {
        MotionVec::new(self.angular * rhs, self.linear * rhs)
    }
}

impl Neg for MotionVec {
    type Output = MotionVec;
    #[inline]
    fn neg(self) -> MotionVec {
        MotionVec::new(-self.angular, -self.linear)
    }
}

/// Plücker transform between two frames (see the module documentation for the convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PTransform {
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl PTransform {
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self { rotation, translation }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::new(Matrix3::identity(), translation)
    }

    pub fn from_rotation(rotation: Matrix3<f64>) -> Self {
        Self::new(rotation, Vector3::zeros())
    }

    /// `E`: rotates source-frame coordinates into target-frame coordinates
    #[inline]
    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    /// `r`: origin of the target frame, expressed in the source frame
    #[inline]
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    pub fn inv(&self) -> PTransform {
        PTransform::new(self.rotation.transpose(), -(self.rotation * self.translation))
    }

    /// Expresses a motion vector given in the source frame in the target frame.
    pub fn apply_motion(&self, v: &MotionVec) -> MotionVec {
        MotionVec::new(
            self.rotation * v.angular,
            self.rotation * (v.linear - self.translation.cross(&v.angular)),
        )
    }

    /// Expresses a motion vector given in the target frame in the source frame.
    pub fn inv_apply_motion(&self, v: &MotionVec) -> MotionVec {
        let angular = self.rotation.transpose() * v.angular;
        MotionVec::new(
            angular,
            self.rotation.transpose() * v.linear + self.translation.cross(&angular),
        )
    }

    /// Maps a point given in target-frame coordinates to source-frame coordinates.
    ///
    /// For a world-to-body pose this returns the world position of a body-local point.
    #[inline]
    pub fn inv_apply_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.translation + self.rotation.transpose() * point
    }

    /// Whether all entries are finite and the rotation block is a proper rotation.
    pub fn is_rigid(&self) -> bool {
        let finite = self.rotation.iter().chain(self.translation.iter()).all(|v| v.is_finite());
        finite
            && (self.rotation * self.rotation.transpose() - Matrix3::identity()).norm() < RIGID_TOLERANCE
            && self.rotation.determinant() > 0.0
    }
}

impl Default for PTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for PTransform {
    type Output = PTransform;

    /// `self * rhs` applies `rhs` first.
    #[inline]
    fn mul(self, rhs: PTransform) -> PTransform {
        PTransform::new(
            self.rotation * rhs.rotation,
            rhs.translation + rhs.rotation.transpose() * self.translation,
        )
    }
}

/// Rigid-body inertia expressed at the origin of the body frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RBInertia {
    mass: f64,
    /// First moment of mass `m * c`
    momentum: Vector3<f64>,
    /// Rotational inertia about the frame origin
    inertia: Matrix3<f64>,
}

impl RBInertia {
    pub fn new(mass: f64, momentum: Vector3<f64>, inertia: Matrix3<f64>) -> Self {
        Self {
            mass,
            momentum,
            inertia,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, Vector3::zeros(), Matrix3::zeros())
    }

    /// Creates the inertia from the center of mass `com` (body frame) and the rotational inertia
    /// about the center of mass.
    pub fn from_com(mass: f64, com: Vector3<f64>, inertia_at_com: Matrix3<f64>) -> Self {
        let c = skew(&com);
        Self::new(mass, com * mass, inertia_at_com + c * c.transpose() * mass)
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn momentum(&self) -> &Vector3<f64> {
        &self.momentum
    }

    #[inline]
    pub fn inertia(&self) -> &Matrix3<f64> {
        &self.inertia
    }

    /// Center of mass in the body frame, `None` for a massless body.
    pub fn com(&self) -> Option<Vector3<f64>> {
        (self.mass > 0.0).then(|| self.momentum / self.mass)
    }

    /// Expresses this inertia (given in a child frame) in its parent frame. `x_parent_child`
    /// transforms parent coordinates into child coordinates.
    pub fn to_parent(&self, x_parent_child: &PTransform) -> RBInertia {
        let e_t = x_parent_child.rotation().transpose();
        let r = skew(x_parent_child.translation());
        let momentum = e_t * self.momentum;
        let h = skew(&momentum);
        RBInertia::new(
            self.mass,
            x_parent_child.translation() * self.mass + momentum,
            e_t * self.inertia * x_parent_child.rotation() - r * h - h * r - r * r * self.mass,
        )
    }
}

impl Default for RBInertia {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for RBInertia {
    type Output = RBInertia;
    fn add(self, rhs: RBInertia) -> RBInertia {
        RBInertia::new(
            self.mass + rhs.mass,
            self.momentum + rhs.momentum,
            self.inertia + rhs.inertia,
        )
    }
}

impl AddAssign for RBInertia {
    fn add_assign(&mut self, rhs: RBInertia) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Rotation3;

    fn rotated(angle: f64, translation: Vector3<f64>) -> PTransform {
        let rot = Rotation3::from_axis_angle(&Vector3::z_axis(), angle);
        PTransform::new(rot.matrix().transpose(), translation)
    }

    #[test]
    fn test_compose_translations() {
        let a = PTransform::from_translation(Vector3::new(1.0, 0.0, 0.0));
        let b = PTransform::from_translation(Vector3::new(0.0, 2.0, 0.0));
        assert_abs_diff_eq!(*(b * a).translation(), Vector3::new(1.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_inverse() {
        let x = rotated(0.3, Vector3::new(1.0, -2.0, 0.5));
        let id = x * x.inv();
        assert_abs_diff_eq!(*id.rotation(), Matrix3::identity(), epsilon = 1e-12);
        assert_abs_diff_eq!(*id.translation(), Vector3::zeros(), epsilon = 1e-12);
        assert!(x.is_rigid());
    }

    #[test]
    fn test_motion_round_trip() {
        let x = rotated(-1.1, Vector3::new(0.2, 0.4, -3.0));
        let v = MotionVec::new(Vector3::new(1.0, 0.5, -0.3), Vector3::new(0.0, 2.0, 1.0));
        let back = x.inv_apply_motion(&x.apply_motion(&v));
        assert_abs_diff_eq!(back.to_vector6(), v.to_vector6(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotated_frame_point() {
        // frame B rotated by 90° about z, placed at (1, 0, 0): its x axis points along world y
        let x = rotated(std::f64::consts::FRAC_PI_2, Vector3::new(1.0, 0.0, 0.0));
        let point = x.inv_apply_point(&Vector3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(point, Vector3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_point_mass_to_parent() {
        let point = RBInertia::new(2.0, Vector3::zeros(), Matrix3::zeros());
        let moved = point.to_parent(&PTransform::from_translation(Vector3::new(1.0, 0.0, 0.0)));
        assert_abs_diff_eq!(moved.mass(), 2.0);
        assert_abs_diff_eq!(*moved.momentum(), Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(
            *moved.inertia(),
            Matrix3::from_diagonal(&Vector3::new(0.0, 2.0, 2.0)),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(moved.com().unwrap(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_from_com_matches_to_parent() {
        let inertia_com = Matrix3::from_diagonal(&Vector3::new(0.1, 0.2, 0.3));
        let com = Vector3::new(0.5, -0.2, 0.1);
        let direct = RBInertia::from_com(3.0, com, inertia_com);
        let shifted = RBInertia::new(3.0, Vector3::zeros(), inertia_com).to_parent(&PTransform::from_translation(com));
        assert_abs_diff_eq!(*direct.inertia(), *shifted.inertia(), epsilon = 1e-12);
        assert_abs_diff_eq!(*direct.momentum(), *shifted.momentum(), epsilon = 1e-12);
    }
}
