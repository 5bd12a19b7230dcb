//! Mutable state of a [MultiBody] and the caches written by the algorithms.
//!
//! All fields are public: callers set `q`, `alpha` and `alpha_d` directly and may pre-seed
//! `body_pos_w`. The `check_match_*` functions are used by the validated algorithm variants to verify
//! that a state was made for a given tree.

use crate::{
    multibody::{check_dof_sized, check_param_sized},
    Joint, MotionVec, MultiBody, PTransform, PreconditionViolation,
};
use itertools::Itertools;
use nalgebra::Matrix6xX;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct MultiBodyConfig {
    /// Joint configurations
    pub q: Vec<Vec<f64>>,
    /// Joint velocities
    pub alpha: Vec<Vec<f64>>,
    /// Joint accelerations
    pub alpha_d: Vec<Vec<f64>>,

    /// Joint transform (predecessor joint frame to successor joint frame) for `q`
    pub joint_config: Vec<PTransform>,
    /// `S * alpha` in the successor joint frame
    pub joint_velocity: Vec<MotionVec>,
    /// Motion subspace of each joint, 6 x dof
    pub motion_subspace: Vec<Matrix6xX<f64>>,

    /// Parent body frame to body frame
    pub parent_to_son: Vec<PTransform>,
    /// World frame to body frame
    pub body_pos_w: Vec<PTransform>,
    /// Body velocity with world orientation, at the body origin
    pub body_vel_w: Vec<MotionVec>,
    /// Body velocity in the body frame
    pub body_vel_b: Vec<MotionVec>,
}

impl MultiBodyConfig {
    /// Allocates a state sized for `mb`, with neutral configurations and zero velocities.
    pub fn new(mb: &MultiBody) -> Self {
        let bodies = mb.nr_bodies();
        Self {
            q: mb.joints().iter().map(Joint::zero_param).collect_vec(),
            alpha: mb.joints().iter().map(Joint::zero_dof).collect_vec(),
            alpha_d: mb.joints().iter().map(Joint::zero_dof).collect_vec(),
            joint_config: vec![PTransform::identity(); bodies],
            joint_velocity: vec![MotionVec::zero(); bodies],
            motion_subspace: mb.joints().iter().map(Joint::motion_subspace).collect_vec(),
            parent_to_son: vec![PTransform::identity(); bodies],
            body_pos_w: vec![PTransform::identity(); bodies],
            body_vel_w: vec![MotionVec::zero(); bodies],
            body_vel_b: vec![MotionVec::zero(); bodies],
        }
    }

    /// Resets the state to the neutral configuration at rest, keeping the allocations.
    pub fn zero(&mut self, mb: &MultiBody) {
        self.q.iter_mut().zip(mb.joints()).for_each(|(q, joint)| {
            q.clear();
            q.extend(joint.zero_param());
        });
        self.alpha.iter_mut().chain(self.alpha_d.iter_mut()).for_each(|v| v.fill(0.0));
        self.joint_config.fill(PTransform::identity());
        self.joint_velocity.fill(MotionVec::zero());
        self.parent_to_son.fill(PTransform::identity());
        self.body_pos_w.fill(PTransform::identity());
        self.body_vel_w.fill(MotionVec::zero());
        self.body_vel_b.fill(MotionVec::zero());
    }
}

/// Reports a rejected state at debug level and passes it on.
pub(crate) fn log_violation<T>(
    operation: &'static str,
    result: Result<T, PreconditionViolation>,
) -> Result<T, PreconditionViolation> {
    if let Err(error) = &result {
        debug!(operation, %error, "rejected state");
    }
    result
}

fn check_body_count<T>(name: &'static str, mb: &MultiBody, values: &[T]) -> Result<(), PreconditionViolation> {
    if values.len() == mb.nr_bodies() {
        Ok(())
    } else {
        Err(PreconditionViolation::BodyCountMismatch {
            name,
            expected: mb.nr_bodies(),
            actual: values.len(),
        })
    }
}

pub fn check_match_q(mb: &MultiBody, mbc: &MultiBodyConfig) -> Result<(), PreconditionViolation> {
    check_param_sized("q", mb, &mbc.q)
}

pub fn check_match_alpha(mb: &MultiBody, mbc: &MultiBodyConfig) -> Result<(), PreconditionViolation> {
    check_dof_sized("alpha", mb, &mbc.alpha)
}

pub fn check_match_alpha_d(mb: &MultiBody, mbc: &MultiBodyConfig) -> Result<(), PreconditionViolation> {
    check_dof_sized("alpha_d", mb, &mbc.alpha_d)
}

/// `body_pos_w` has one rigid transform per body.
pub fn check_match_body_pos(mb: &MultiBody, mbc: &MultiBodyConfig) -> Result<(), PreconditionViolation> {
    check_body_count("body_pos_w", mb, &mbc.body_pos_w)?;
    match mbc.body_pos_w.iter().position(|pose| !pose.is_rigid()) {
        Some(index) => Err(PreconditionViolation::InvalidPose(index)),
        None => Ok(()),
    }
}

pub fn check_match_body_vel(mb: &MultiBody, mbc: &MultiBodyConfig) -> Result<(), PreconditionViolation> {
    check_body_count("body_vel_b", mb, &mbc.body_vel_b)?;
    check_body_count("body_vel_w", mb, &mbc.body_vel_w)
}

/// The per-joint and per-body caches written by the algorithms are sized for `mb`.
pub fn check_match_buffers(mb: &MultiBody, mbc: &MultiBodyConfig) -> Result<(), PreconditionViolation> {
    check_body_count("joint_config", mb, &mbc.joint_config)?;
    check_body_count("joint_velocity", mb, &mbc.joint_velocity)?;
    check_body_count("motion_subspace", mb, &mbc.motion_subspace)?;
    if let Some(joint) = mbc
        .motion_subspace
        .iter()
        .zip(mb.joints())
        .position(|(subspace, joint)| subspace.ncols() != joint.dof())
    {
        return Err(PreconditionViolation::JointSizeMismatch {
            name: "motion_subspace",
            joint,
            expected: mb.joint(joint).dof(),
            actual: mbc.motion_subspace[joint].ncols(),
        });
    }
    check_body_count("parent_to_son", mb, &mbc.parent_to_son)?;
    check_body_count("body_pos_w", mb, &mbc.body_pos_w)?;
    check_match_body_vel(mb, mbc)
}
