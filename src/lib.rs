//! ## About
//!
//! This crate compiles a graph of rigid bodies connected by joints into a kinematic tree and runs the
//! recursive algorithms used in a control loop on it: forward kinematics, forward velocity, center of
//! mass (CoM), the CoM velocity Jacobian and explicit Euler integration of the joint configuration.
//!
//! The spatial algebra is built on [nalgebra]. Optional backends: [ndarray](https://github.com/rust-ndarray/ndarray)
//! conversions (feature `ndarray`) and parallel batch evaluation with
//! [rayon](https://github.com/rayon-rs/rayon) (feature `rayon`).
//!
//! See [MultiBodyGraph] to get started:
//!
//! 1. add [Body]s and [Joint]s to a [MultiBodyGraph] and link them,
//! 2. compile it into an immutable [MultiBody] with [MultiBodyGraph::make_multibody],
//! 3. allocate a [MultiBodyConfig], set its `q` and `alpha`, and call [forward_kinematics],
//!    [forward_velocity], [compute_com] or [CoMJacobianDummy::jacobian].
//!
//! Every algorithm has a fast variant that trusts its input and a validated variant (prefixed with `s_`)
//! that returns a [PreconditionViolation] when the state was not made for the tree.
//!
//! ## Reading list
//!
//! * [Rigid Body Dynamics Algorithms](https://doi.org/10.1007/978-1-4899-7560-7), R. Featherstone
//! * [RBDyn](https://github.com/jrl-umi3218/RBDyn)
//!
//! ## Naming conventions
//! * Transforms – `x_a_b` maps coordinates of frame `a` to frame `b`
//! * Methods – imperative forms with the exception of getters and factories, which
//!             use substantives (i.e., omit a `get_` prefix) much like the standard library.

pub mod arena;
pub mod body;
pub mod com;
pub mod errors;
pub mod forward;
pub mod graph;
pub mod integration;
pub mod joint;
pub mod multibody;
pub mod multibody_config;
pub mod spatial;

pub use body::{Body, BodyId};
pub use com::{compute_com, compute_com_velocity, s_compute_com, s_compute_com_velocity, CoMJacobianDummy};
pub use errors::{ConstructionError, PreconditionViolation};
pub use forward::{forward_kinematics, forward_velocity, s_forward_kinematics, s_forward_velocity};
pub use graph::{Link, MultiBodyGraph};
pub use integration::{euler_integration, integrate_velocity, s_euler_integration, s_integrate_velocity};
pub use joint::{Joint, JointId, JointType, ROOT_JOINT_ID, ROOT_JOINT_NAME};
pub use multibody::{
    dof_to_vector, param_to_vector, s_dof_to_vector, s_param_to_vector, s_vector_to_dof, s_vector_to_param,
    vector_to_dof, vector_to_param, MultiBody,
};
pub use multibody_config::MultiBodyConfig;
pub use spatial::{MotionVec, PTransform, RBInertia};

// Backends
#[cfg(feature = "rayon")]
pub mod batch;
#[cfg(feature = "ndarray")]
pub mod ndarray;
