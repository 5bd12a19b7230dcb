//! Center of mass of the mobile bodies, its velocity, and the CoM velocity Jacobian.
//!
//! With a fixed base, the root body (and the bodies merged into it) is welded to the world and
//! does not contribute.

use crate::{
    multibody_config::{check_match_body_pos, check_match_body_vel, check_match_buffers, log_violation},
    MotionVec, MultiBody, MultiBodyConfig, PreconditionViolation,
};
use itertools::Itertools;
use nalgebra::{DMatrix, Vector3};

fn total_mass(mb: &MultiBody) -> f64 {
    mb.mobile_bodies().map(|i| mb.body(i).inertia().mass()).sum()
}

fn check_positive_mass(mb: &MultiBody) -> Result<f64, PreconditionViolation> {
    let mass = total_mass(mb);
    if mass > 0.0 {
        Ok(mass)
    } else {
        Err(PreconditionViolation::NonPositiveMass(mass))
    }
}

/// World position of the center of mass for the poses in `mbc.body_pos_w`.
///
/// Returns the origin for a massless mechanism.
pub fn compute_com(mb: &MultiBody, mbc: &MultiBodyConfig) -> Vector3<f64> {
    let (weighted, mass) = mb
        .mobile_bodies()
        .fold((Vector3::<f64>::zeros(), 0.0), |(weighted, mass), i| {
            let inertia = mb.body(i).inertia();
            let pose = &mbc.body_pos_w[i];
            (
                weighted + pose.translation() * inertia.mass() + pose.rotation().transpose() * inertia.momentum(),
                mass + inertia.mass(),
            )
        });
    if mass > 0.0 {
        weighted / mass
    } else {
        Vector3::zeros()
    }
}

/// [compute_com] after checking that `body_pos_w` holds one rigid pose per body and that the
/// mechanism has mass.
pub fn s_compute_com(mb: &MultiBody, mbc: &MultiBodyConfig) -> Result<Vector3<f64>, PreconditionViolation> {
    log_violation(
        "compute_com",
        check_match_body_pos(mb, mbc).and_then(|_| check_positive_mass(mb)),
    )?;
    Ok(compute_com(mb, mbc))
}

/// World velocity of the center of mass, from the body velocities written by
/// [crate::forward_velocity].
pub fn compute_com_velocity(mb: &MultiBody, mbc: &MultiBodyConfig) -> Vector3<f64> {
    let (weighted, mass) = mb
        .mobile_bodies()
        .fold((Vector3::<f64>::zeros(), 0.0), |(weighted, mass), i| {
            let inertia = mb.body(i).inertia();
            let velocity = &mbc.body_vel_b[i];
            let momentum = velocity.linear * inertia.mass() + velocity.angular.cross(inertia.momentum());
            (
                weighted + mbc.body_pos_w[i].rotation().transpose() * momentum,
                mass + inertia.mass(),
            )
        });
    if mass > 0.0 {
        weighted / mass
    } else {
        Vector3::zeros()
    }
}

pub fn s_compute_com_velocity(mb: &MultiBody, mbc: &MultiBodyConfig) -> Result<Vector3<f64>, PreconditionViolation> {
    log_violation(
        "compute_com_velocity",
        check_match_body_pos(mb, mbc)
            .and_then(|_| check_match_body_vel(mb, mbc))
            .and_then(|_| check_positive_mass(mb)),
    )?;
    Ok(compute_com_velocity(mb, mbc))
}

/// Jacobian of the CoM velocity with respect to the flattened joint velocities (see
/// [crate::dof_to_vector]).
///
/// Built once per [MultiBody]; it only caches mass fractions and the output matrix. The matrix is
/// 6 x nr_dof: rows 0 to 2 stay zero, rows 3 to 5 map joint velocities to the CoM velocity.
///
/// The column of a dof is the unit joint motion in world coordinates `(w, v0)` applied to the
/// subtree below the joint: `sum(m_i / M) * v0 + w x sum(m_i * p_i / M)`.
#[derive(Debug, Clone)]
pub struct CoMJacobianDummy {
    jacobian: DMatrix<f64>,
    total_mass: f64,
    /// `m_i / M`
    body_fraction: Vec<f64>,
    /// `h_i / M` (body frame)
    moment_fraction: Vec<Vector3<f64>>,
    /// Mass fraction of the subtree rooted at each body
    subtree_fraction: Vec<f64>,
    /// Mass-weighted CoM of each subtree (world frame), rewritten on every call
    subtree_com: Vec<Vector3<f64>>,
}

impl CoMJacobianDummy {
    pub fn new(mb: &MultiBody) -> Self {
        let total_mass = total_mass(mb);
        let scale = if total_mass > 0.0 { 1.0 / total_mass } else { 0.0 };
        let mobile = mb.mobile_bodies();

        let body_fraction = (0..mb.nr_bodies())
            .map(|i| {
                if mobile.contains(&i) {
                    mb.body(i).inertia().mass() * scale
                } else {
                    0.0
                }
            })
            .collect_vec();
        let moment_fraction = (0..mb.nr_bodies())
            .map(|i| {
                if mobile.contains(&i) {
                    mb.body(i).inertia().momentum() * scale
                } else {
                    Vector3::zeros()
                }
            })
            .collect_vec();

        let mut subtree_fraction = body_fraction.clone();
        for i in (0..mb.nr_bodies()).rev() {
            if let Some(parent) = mb.parent(i) {
                let child = subtree_fraction[i];
                subtree_fraction[parent] += child;
            }
        }

        Self {
            jacobian: DMatrix::zeros(6, mb.nr_dof()),
            total_mass,
            body_fraction,
            moment_fraction,
            subtree_fraction,
            subtree_com: vec![Vector3::zeros(); mb.nr_bodies()],
        }
    }

    /// Computes the Jacobian for the poses and motion subspaces written by [crate::forward_kinematics].
    pub fn jacobian(&mut self, mb: &MultiBody, mbc: &MultiBodyConfig) -> &DMatrix<f64> {
        for i in 0..mb.nr_bodies() {
            let pose = &mbc.body_pos_w[i];
            self.subtree_com[i] =
                pose.translation() * self.body_fraction[i] + pose.rotation().transpose() * self.moment_fraction[i];
        }
        for i in (0..mb.nr_bodies()).rev() {
            if let Some(parent) = mb.parent(i) {
                let child = self.subtree_com[i];
                self.subtree_com[parent] += child;
            }
        }

        for j in 0..mb.nr_joints() {
            let offset = mb.joint_pos_in_dof(j);
            for k in 0..mb.joint(j).dof() {
                let unit = MotionVec::from_vector6(&mbc.motion_subspace[j].column(k).into_owned());
                let in_body = mb.transform_succ(j).apply_motion(&unit);
                let in_world = mbc.body_pos_w[j].inv_apply_motion(&in_body);
                let column =
                    in_world.linear * self.subtree_fraction[j] + in_world.angular.cross(&self.subtree_com[j]);
                self.jacobian.fixed_view_mut::<3, 1>(3, offset + k).copy_from(&column);
            }
        }
        &self.jacobian
    }

    /// [CoMJacobianDummy::jacobian] after checking that `mbc` belongs to the mechanism this Jacobian
    /// was built for.
    pub fn s_jacobian(&mut self, mb: &MultiBody, mbc: &MultiBodyConfig) -> Result<&DMatrix<f64>, PreconditionViolation> {
        log_violation("jacobian", self.check(mb, mbc))?;
        Ok(self.jacobian(mb, mbc))
    }

    fn check(&self, mb: &MultiBody, mbc: &MultiBodyConfig) -> Result<(), PreconditionViolation> {
        if mb.nr_bodies() != self.body_fraction.len() || mb.nr_dof() != self.jacobian.ncols() {
            return Err(PreconditionViolation::MultiBodyMismatch {
                expected_bodies: self.body_fraction.len(),
                expected_dof: self.jacobian.ncols(),
                actual_bodies: mb.nr_bodies(),
                actual_dof: mb.nr_dof(),
            });
        }
        check_match_body_pos(mb, mbc)?;
        check_match_buffers(mb, mbc)?;
        if self.total_mass > 0.0 {
            Ok(())
        } else {
            Err(PreconditionViolation::NonPositiveMass(self.total_mass))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dof_to_vector, forward_kinematics, forward_velocity, Body, Joint, JointType, MultiBodyGraph, PTransform, RBInertia};
    use approx::assert_abs_diff_eq;
    use nalgebra::Matrix3;

    /// Two hinges in a row with off-center bodies
    fn arm(fixed_base: bool) -> MultiBody {
        let mut graph = MultiBodyGraph::new();
        let com = Vector3::new(0.2, 0.1, 0.0);
        graph
            .add_body(Body::new(RBInertia::from_com(3.0, com, Matrix3::identity()), 0, "base"))
            .unwrap();
        graph
            .add_body(Body::new(RBInertia::from_com(1.0, com, Matrix3::identity()), 1, "upper"))
            .unwrap();
        graph
            .add_body(Body::new(RBInertia::from_com(2.0, com, Matrix3::identity()), 2, "lower"))
            .unwrap();
        graph.add_joint(Joint::new(JointType::RevoluteZ, true, 0, "shoulder")).unwrap();
        graph.add_joint(Joint::new(JointType::RevoluteY, false, 1, "elbow")).unwrap();
        let tip = PTransform::from_translation(Vector3::new(1.0, 0.0, 0.0));
        graph.link_bodies(0, tip, 1, PTransform::identity(), 0).unwrap();
        graph.link_bodies(1, tip, 2, PTransform::identity(), 1).unwrap();
        graph.make_multibody(0, fixed_base).unwrap()
    }

    #[test]
    fn test_com_excludes_welded_root() {
        let mb = arm(true);
        let mut mbc = MultiBodyConfig::new(&mb);
        forward_kinematics(&mb, &mut mbc);
        // upper CoM at (1.2, 0.1, 0), lower CoM at (2.2, 0.1, 0)
        let expected = (Vector3::new(1.2, 0.1, 0.0) + Vector3::new(2.2, 0.1, 0.0) * 2.0) / 3.0;
        assert_abs_diff_eq!(compute_com(&mb, &mbc), expected, epsilon = 1e-12);

        let floating = arm(false);
        let mut mbc = MultiBodyConfig::new(&floating);
        forward_kinematics(&floating, &mut mbc);
        let expected = (Vector3::new(0.2, 0.1, 0.0) * 3.0 + expected * 3.0) / 6.0;
        assert_abs_diff_eq!(compute_com(&floating, &mbc), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_com_velocity_matches_jacobian() {
        for fixed_base in [true, false] {
            let mb = arm(fixed_base);
            let mut mbc = MultiBodyConfig::new(&mb);
            let mut jacobian = CoMJacobianDummy::new(&mb);

            mbc.q[1] = vec![0.7];
            mbc.q[2] = vec![-0.4];
            mbc.alpha[1] = vec![1.5];
            mbc.alpha[2] = vec![-0.5];
            if !fixed_base {
                mbc.q[0] = vec![0.9, 0.1, -0.3, 0.2, 0.5, -1.0, 0.3];
                let norm = mbc.q[0][..4].iter().map(|v| v * v).sum::<f64>().sqrt();
                mbc.q[0][..4].iter_mut().for_each(|v| *v /= norm);
                mbc.alpha[0] = vec![0.1, 0.2, -0.3, 0.4, 0.0, 1.0];
            }
            forward_kinematics(&mb, &mut mbc);
            forward_velocity(&mb, &mut mbc);

            let alpha = dof_to_vector(&mb, &mbc.alpha);
            let from_jacobian = jacobian.jacobian(&mb, &mbc).rows(3, 3) * alpha;
            let velocity = compute_com_velocity(&mb, &mbc);
            assert_abs_diff_eq!(from_jacobian[0], velocity.x, epsilon = 1e-12);
            assert_abs_diff_eq!(from_jacobian[1], velocity.y, epsilon = 1e-12);
            assert_abs_diff_eq!(from_jacobian[2], velocity.z, epsilon = 1e-12);
            assert!(jacobian.jacobian(&mb, &mbc).rows(0, 3).iter().all(|v| *v == 0.0));
        }
    }

    #[test_log::test]
    fn test_safe_variants() {
        let mb = arm(true);
        let mut mbc = MultiBodyConfig::new(&mb);
        forward_kinematics(&mb, &mut mbc);
        assert_eq!(s_compute_com(&mb, &mbc), Ok(compute_com(&mb, &mbc)));
        assert_eq!(s_compute_com_velocity(&mb, &mbc), Ok(Vector3::zeros()));

        let mut jacobian = CoMJacobianDummy::new(&mb);
        let other = arm(false);
        assert!(matches!(
            jacobian.s_jacobian(&other, &MultiBodyConfig::new(&other)),
            Err(PreconditionViolation::MultiBodyMismatch { .. })
        ));

        mbc.body_pos_w = vec![PTransform::identity(); 2];
        assert!(matches!(
            s_compute_com(&mb, &mbc),
            Err(PreconditionViolation::BodyCountMismatch { .. })
        ));
        assert!(jacobian.s_jacobian(&mb, &mbc).is_err());
    }

    #[test]
    fn test_massless() {
        let mut graph = MultiBodyGraph::new();
        graph.add_body(Body::new(RBInertia::zero(), 0, "ghost")).unwrap();
        let mb = graph.make_multibody(0, false).unwrap();
        let mbc = MultiBodyConfig::new(&mb);
        assert_eq!(compute_com(&mb, &mbc), Vector3::zeros());
        assert_eq!(s_compute_com(&mb, &mbc), Err(PreconditionViolation::NonPositiveMass(0.0)));
    }
}
