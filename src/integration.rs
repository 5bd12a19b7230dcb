//! Explicit Euler integration of the generalized configuration and velocity.

use crate::{
    multibody_config::{check_match_alpha, check_match_alpha_d, check_match_q, log_violation},
    MultiBody, MultiBodyConfig, PreconditionViolation,
};
use itertools::izip;

/// Advances `mbc.q` by `mbc.alpha` over `step` with each joint's integration rule.
///
/// Orientation-valued joints keep unit quaternions. Poses and velocities are not recomputed.
pub fn euler_integration(mb: &MultiBody, mbc: &mut MultiBodyConfig, step: f64) {
    for (joint, q, alpha) in izip!(mb.joints(), mbc.q.iter_mut(), &mbc.alpha) {
        joint.integrate(q, alpha, step);
    }
}

pub fn s_euler_integration(mb: &MultiBody, mbc: &mut MultiBodyConfig, step: f64) -> Result<(), PreconditionViolation> {
    log_violation(
        "euler_integration",
        check_match_q(mb, mbc).and_then(|_| check_match_alpha(mb, mbc)),
    )?;
    euler_integration(mb, mbc, step);
    Ok(())
}

/// `alpha += alpha_d * step`
pub fn integrate_velocity(mb: &MultiBody, mbc: &mut MultiBodyConfig, step: f64) {
    for (_, alpha, alpha_d) in izip!(mb.joints(), mbc.alpha.iter_mut(), &mbc.alpha_d) {
        alpha
            .iter_mut()
            .zip(alpha_d)
            .for_each(|(velocity, acceleration)| *velocity += acceleration * step);
    }
}

pub fn s_integrate_velocity(mb: &MultiBody, mbc: &mut MultiBodyConfig, step: f64) -> Result<(), PreconditionViolation> {
    log_violation(
        "integrate_velocity",
        check_match_alpha(mb, mbc).and_then(|_| check_match_alpha_d(mb, mbc)),
    )?;
    integrate_velocity(mb, mbc, step);
    Ok(())
}
