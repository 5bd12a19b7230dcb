/*! The immutable, compiled kinematic tree and the utilities mapping ragged per-joint data to flat
 * vectors.
 *
 * Bodies and joints share their indices: joint `i` connects the body `parent(i)` to body `i`, and
 * joint 0 connects the root body to the world. Indices are in topological order (parents precede
 * their children), so every algorithm is a single forward (or backward) sweep over the indices.
 */

use crate::{Body, BodyId, ConstructionError, Joint, JointId, PTransform, PreconditionViolation};
use itertools::Itertools;
use nalgebra::DVector;
use std::{collections::HashMap, ops::Range};

#[derive(Debug, Clone)]
pub struct MultiBody {
    bodies: Vec<Body>,
    joints: Vec<Joint>,
    parents: Vec<Option<usize>>,
    /// Parent body frame to (predecessor) joint frame
    transforms_pred: Vec<PTransform>,
    /// (Successor) joint frame to body frame
    transforms_succ: Vec<PTransform>,
    joint_pos_in_param: Vec<usize>,
    joint_pos_in_dof: Vec<usize>,
    nr_params: usize,
    nr_dof: usize,
    fixed_base: bool,
    body_lookup: HashMap<BodyId, usize>,
    joint_lookup: HashMap<JointId, usize>,
}

impl MultiBody {
    /// Assembles a kinematic tree. Usually called through [crate::MultiBodyGraph::make_multibody].
    ///
    /// All vectors are indexed by body (and joint) index and must have the same length. `parents[0]`
    /// must be `None`; every other body needs a parent with a lower index.
    pub fn new(
        bodies: Vec<Body>,
        joints: Vec<Joint>,
        parents: Vec<Option<usize>>,
        transforms_pred: Vec<PTransform>,
        transforms_succ: Vec<PTransform>,
        fixed_base: bool,
    ) -> Result<Self, ConstructionError> {
        let count = bodies.len();
        if count == 0 {
            return Err(ConstructionError::MalformedTree("no bodies".to_string()));
        }
        if [joints.len(), parents.len(), transforms_pred.len(), transforms_succ.len()]
            .iter()
            .any(|len| *len != count)
        {
            return Err(ConstructionError::MalformedTree(format!(
                "{} bodies but {} joints, {} parents, {}/{} transforms",
                count,
                joints.len(),
                parents.len(),
                transforms_pred.len(),
                transforms_succ.len()
            )));
        }
        for (index, parent) in parents.iter().enumerate() {
            match (index, parent) {
                (0, None) => {}
                (0, Some(_)) => {
                    return Err(ConstructionError::MalformedTree("the root must not have a parent".to_string()))
                }
                (_, Some(parent)) if *parent < index => {}
                _ => {
                    return Err(ConstructionError::MalformedTree(format!(
                        "body {index} is not preceded by its parent"
                    )))
                }
            }
        }
        if fixed_base && joints[0].dof() != 0 {
            return Err(ConstructionError::MalformedTree(
                "a fixed base requires a zero-dof root joint".to_string(),
            ));
        }

        let mut body_lookup = HashMap::with_capacity(count);
        for (index, body) in bodies.iter().enumerate() {
            if body_lookup.insert(body.id(), index).is_some() {
                return Err(ConstructionError::DuplicateBodyId(body.id()));
            }
        }
        let mut joint_lookup = HashMap::with_capacity(count);
        for (index, joint) in joints.iter().enumerate() {
            if joint_lookup.insert(joint.id(), index).is_some() {
                return Err(ConstructionError::DuplicateJointId(joint.id()));
            }
        }

        let (joint_pos_in_param, nr_params) = offsets(joints.iter().map(Joint::params));
        let (joint_pos_in_dof, nr_dof) = offsets(joints.iter().map(Joint::dof));

        Ok(Self {
            bodies,
            joints,
            parents,
            transforms_pred,
            transforms_succ,
            joint_pos_in_param,
            joint_pos_in_dof,
            nr_params,
            nr_dof,
            fixed_base,
            body_lookup,
            joint_lookup,
        })
    }

    pub fn nr_bodies(&self) -> usize {
        self.bodies.len()
    }

    pub fn nr_joints(&self) -> usize {
        self.joints.len()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, index: usize) -> &Body {
        &self.bodies[index]
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> &Joint {
        &self.joints[index]
    }

    /// Parent body index, `None` for the root
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents[index]
    }

    pub fn parents(&self) -> &[Option<usize>] {
        &self.parents
    }

    pub fn transform_pred(&self, index: usize) -> &PTransform {
        &self.transforms_pred[index]
    }

    pub fn transforms_pred(&self) -> &[PTransform] {
        &self.transforms_pred
    }

    pub fn transform_succ(&self, index: usize) -> &PTransform {
        &self.transforms_succ[index]
    }

    pub fn transforms_succ(&self) -> &[PTransform] {
        &self.transforms_succ
    }

    /// Position of joint `index`'s first velocity entry in a flat dof vector
    pub fn joint_pos_in_dof(&self, index: usize) -> usize {
        self.joint_pos_in_dof[index]
    }

    /// Position of joint `index`'s first configuration entry in a flat parameter vector
    pub fn joint_pos_in_param(&self, index: usize) -> usize {
        self.joint_pos_in_param[index]
    }

    pub fn nr_dof(&self) -> usize {
        self.nr_dof
    }

    pub fn nr_params(&self) -> usize {
        self.nr_params
    }

    pub fn is_fixed_base(&self) -> bool {
        self.fixed_base
    }

    /// Bodies that can move with respect to the world. With a fixed base, the root body (and everything
    /// welded to it) belongs to the world frame.
    pub fn mobile_bodies(&self) -> Range<usize> {
        let first = if self.fixed_base { 1 } else { 0 };
        first..self.bodies.len()
    }

    pub fn body_index_by_id(&self, id: BodyId) -> Option<usize> {
        self.body_lookup.get(&id).copied()
    }

    pub fn body_index_by_name(&self, name: &str) -> Option<usize> {
        self.bodies.iter().position(|body| body.name() == name)
    }

    pub fn joint_index_by_id(&self, id: JointId) -> Option<usize> {
        self.joint_lookup.get(&id).copied()
    }

    pub fn joint_index_by_name(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|joint| joint.name() == name)
    }
}

/// Start position of each chunk and the total size
fn offsets(sizes: impl Iterator<Item = usize>) -> (Vec<usize>, usize) {
    let mut total = 0;
    let positions = sizes
        .scan(&mut total, |total, size| {
            let result = Some(**total);
            **total += size;
            result
        })
        .collect_vec();
    (positions, total)
}

fn flatten(ragged: &[Vec<f64>], positions: &[usize], total: usize) -> DVector<f64> {
    let mut result = DVector::zeros(total);
    ragged.iter().zip(positions).for_each(|(values, position)| {
        result.rows_mut(*position, values.len()).copy_from_slice(values);
    });
    result
}

fn unflatten(vector: &DVector<f64>, positions: &[usize], sizes: impl Iterator<Item = usize>) -> Vec<Vec<f64>> {
    positions
        .iter()
        .zip(sizes)
        .map(|(position, size)| vector.rows(*position, size).iter().copied().collect_vec())
        .collect_vec()
}

fn check_ragged(
    name: &'static str,
    ragged: &[Vec<f64>],
    expected: impl ExactSizeIterator<Item = usize>,
) -> Result<(), PreconditionViolation> {
    if ragged.len() != expected.len() {
        return Err(PreconditionViolation::JointCountMismatch {
            name,
            expected: expected.len(),
            actual: ragged.len(),
        });
    }
    match ragged
        .iter()
        .zip(expected)
        .enumerate()
        .find(|(_, (values, size))| values.len() != *size)
    {
        Some((joint, (values, size))) => Err(PreconditionViolation::JointSizeMismatch {
            name,
            joint,
            expected: size,
            actual: values.len(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn check_dof_sized(
    name: &'static str,
    mb: &MultiBody,
    ragged: &[Vec<f64>],
) -> Result<(), PreconditionViolation> {
    check_ragged(name, ragged, mb.joints().iter().map(Joint::dof))
}

pub(crate) fn check_param_sized(
    name: &'static str,
    mb: &MultiBody,
    ragged: &[Vec<f64>],
) -> Result<(), PreconditionViolation> {
    check_ragged(name, ragged, mb.joints().iter().map(Joint::params))
}

fn check_vector_size(vector: &DVector<f64>, expected: usize) -> Result<(), PreconditionViolation> {
    if vector.len() == expected {
        Ok(())
    } else {
        Err(PreconditionViolation::VectorSizeMismatch {
            expected,
            actual: vector.len(),
        })
    }
}

/// Flattens per-joint velocities (or accelerations) into one vector ordered by joint index, then
/// by local dof index.
pub fn dof_to_vector(mb: &MultiBody, ragged: &[Vec<f64>]) -> DVector<f64> {
    flatten(ragged, &mb.joint_pos_in_dof, mb.nr_dof)
}

pub fn s_dof_to_vector(mb: &MultiBody, ragged: &[Vec<f64>]) -> Result<DVector<f64>, PreconditionViolation> {
    check_dof_sized("alpha", mb, ragged)?;
    Ok(dof_to_vector(mb, ragged))
}

/// Inverse of [dof_to_vector]
pub fn vector_to_dof(mb: &MultiBody, vector: &DVector<f64>) -> Vec<Vec<f64>> {
    unflatten(vector, &mb.joint_pos_in_dof, mb.joints.iter().map(Joint::dof))
}

pub fn s_vector_to_dof(mb: &MultiBody, vector: &DVector<f64>) -> Result<Vec<Vec<f64>>, PreconditionViolation> {
    check_vector_size(vector, mb.nr_dof)?;
    Ok(vector_to_dof(mb, vector))
}

/// Flattens per-joint configurations into one vector ordered by joint index.
pub fn param_to_vector(mb: &MultiBody, ragged: &[Vec<f64>]) -> DVector<f64> {
    flatten(ragged, &mb.joint_pos_in_param, mb.nr_params)
}

pub fn s_param_to_vector(mb: &MultiBody, ragged: &[Vec<f64>]) -> Result<DVector<f64>, PreconditionViolation> {
    check_param_sized("q", mb, ragged)?;
    Ok(param_to_vector(mb, ragged))
}

/// Inverse of [param_to_vector]
pub fn vector_to_param(mb: &MultiBody, vector: &DVector<f64>) -> Vec<Vec<f64>> {
    unflatten(vector, &mb.joint_pos_in_param, mb.joints.iter().map(Joint::params))
}

pub fn s_vector_to_param(mb: &MultiBody, vector: &DVector<f64>) -> Result<Vec<Vec<f64>>, PreconditionViolation> {
    check_vector_size(vector, mb.nr_params)?;
    Ok(vector_to_param(mb, vector))
}
