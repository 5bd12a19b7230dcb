//! Parallel evaluation of many states of one [MultiBody] with [rayon].
//!
//! The tree is shared read-only; every state is processed by a single worker.

use crate::{compute_com, forward_kinematics, s_compute_com, s_forward_kinematics, MultiBody, MultiBodyConfig, PreconditionViolation};
use nalgebra::Vector3;
use rayon::prelude::*;

/// Runs forward kinematics on every state and returns the centers of mass in order.
pub fn par_forward_com(mb: &MultiBody, configs: &mut [MultiBodyConfig]) -> Vec<Vector3<f64>> {
    configs
        .par_iter_mut()
        .map(|mbc| {
            forward_kinematics(mb, mbc);
            compute_com(mb, mbc)
        })
        .collect()
}

/// Validated [par_forward_com]; fails with the first violation found.
pub fn s_par_forward_com(
    mb: &MultiBody,
    configs: &mut [MultiBodyConfig],
) -> Result<Vec<Vector3<f64>>, PreconditionViolation> {
    configs
        .par_iter_mut()
        .map(|mbc| {
            s_forward_kinematics(mb, mbc)?;
            s_compute_com(mb, mbc)
        })
        .collect()
}
