/*! Forward kinematics and forward velocity: single sweeps over the bodies in topological order.
 *
 * Both algorithms overwrite the caches of a [MultiBodyConfig]. [forward_velocity] reads the transforms
 * written by [forward_kinematics] and must be called after it whenever `q` changed.
 */

use crate::{
    multibody_config::{check_match_alpha, check_match_buffers, check_match_q, log_violation},
    MotionVec, MultiBody, MultiBodyConfig, PreconditionViolation,
};

/// Computes the joint transforms, motion subspaces and body poses for `mbc.q`.
///
/// Writes `joint_config`, `motion_subspace`, `parent_to_son` and `body_pos_w`.
pub fn forward_kinematics(mb: &MultiBody, mbc: &mut MultiBodyConfig) {
    for i in 0..mb.nr_bodies() {
        let joint_config = mb
            .joint(i)
            .pose_and_motion_subspace(&mbc.q[i], &mut mbc.motion_subspace[i]);
        mbc.joint_config[i] = joint_config;
        mbc.parent_to_son[i] = *mb.transform_succ(i) * joint_config * *mb.transform_pred(i);
        mbc.body_pos_w[i] = match mb.parent(i) {
            Some(parent) => mbc.parent_to_son[i] * mbc.body_pos_w[parent],
            None => mbc.parent_to_son[i],
        };
    }
}

/// [forward_kinematics] after checking that `q` and the caches are sized for `mb`
pub fn s_forward_kinematics(mb: &MultiBody, mbc: &mut MultiBodyConfig) -> Result<(), PreconditionViolation> {
    log_violation("forward_kinematics", check_match_q(mb, mbc).and_then(|_| check_match_buffers(mb, mbc)))?;
    forward_kinematics(mb, mbc);
    Ok(())
}

/// Computes the joint and body velocities for `mbc.alpha`.
///
/// Writes `joint_velocity`, `body_vel_b` and `body_vel_w`.
pub fn forward_velocity(mb: &MultiBody, mbc: &mut MultiBodyConfig) {
    for i in 0..mb.nr_bodies() {
        let joint_velocity = MotionVec::from_subspace(&mbc.motion_subspace[i], &mbc.alpha[i]);
        mbc.joint_velocity[i] = joint_velocity;

        let own = mb.transform_succ(i).apply_motion(&joint_velocity);
        mbc.body_vel_b[i] = match mb.parent(i) {
            Some(parent) => mbc.parent_to_son[i].apply_motion(&mbc.body_vel_b[parent]) + own,
            None => own,
        };

        let to_world = mbc.body_pos_w[i].rotation().transpose();
        let velocity = &mbc.body_vel_b[i];
        mbc.body_vel_w[i] = MotionVec::new(to_world * velocity.angular, to_world * velocity.linear);
    }
}

/// [forward_velocity] after checking that `alpha` and the caches are sized for `mb`
pub fn s_forward_velocity(mb: &MultiBody, mbc: &mut MultiBodyConfig) -> Result<(), PreconditionViolation> {
    log_violation(
        "forward_velocity",
        check_match_alpha(mb, mbc).and_then(|_| check_match_buffers(mb, mbc)),
    )?;
    forward_velocity(mb, mbc);
    Ok(())
}
