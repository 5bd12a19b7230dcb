//! Provides the error types used throughout this crate.
//!
//! Compilation of a [crate::MultiBodyGraph] reports [ConstructionError]s. The validated (`s_`-prefixed)
//! algorithm entry points report [PreconditionViolation]s; their unchecked counterparts never fail.

use crate::{BodyId, JointId};
use thiserror::Error;

/// Raised while assembling a graph or compiling it into a [crate::MultiBody]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("Body id not unique: {0}")]
    DuplicateBodyId(BodyId),
    #[error("Body name not unique: {0}")]
    DuplicateBodyName(String),
    #[error("Joint id not unique: {0}")]
    DuplicateJointId(JointId),
    #[error("Joint name not unique: {0}")]
    DuplicateJointName(String),
    #[error("Body not in graph: {0}")]
    UnknownBody(BodyId),
    #[error("Joint not in graph: {0}")]
    UnknownJoint(JointId),
    #[error("Joint {0} already links two bodies")]
    JointAlreadyLinked(JointId),
    #[error("Root body not in graph: {0}")]
    UnknownRoot(BodyId),
    #[error("Bodies not reachable from the root: {0}")]
    Unreachable(String),
    #[error("Joint {0} closes a kinematic loop")]
    Cycle(String),
    #[error("Malformed kinematic tree: {0}")]
    MalformedTree(String),
}

/// Raised by the validated algorithm entry points when the state does not match the [crate::MultiBody]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreconditionViolation {
    #[error("`{name}` has {actual} per-joint entries, expected {expected}")]
    JointCountMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("`{name}[{joint}]` has {actual} entries, joint expects {expected}")]
    JointSizeMismatch {
        name: &'static str,
        joint: usize,
        expected: usize,
        actual: usize,
    },
    #[error("`{name}` has {actual} per-body entries, expected {expected}")]
    BodyCountMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("`body_pos_w[{0}]` is not a rigid transform")]
    InvalidPose(usize),
    #[error("Vector has {actual} entries, expected {expected}")]
    VectorSizeMismatch { expected: usize, actual: usize },
    #[error("Total mass must be strictly positive, got {0}")]
    NonPositiveMass(f64),
    #[error("Jacobian was set up for {expected_bodies} bodies / {expected_dof} dof, got {actual_bodies} / {actual_dof}")]
    MultiBodyMismatch {
        expected_bodies: usize,
        expected_dof: usize,
        actual_bodies: usize,
        actual_dof: usize,
    },
}
