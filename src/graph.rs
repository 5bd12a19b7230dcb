//! Connectivity graph of bodies and joints, and its compilation into a [MultiBody].
//!
//! Links carry no direction. Compilation explores the graph breadth-first from a chosen root body and
//! collects the reachable bodies in a [DirectedArenaTree], which is then reordered depth-first such that
//! every parent precedes its children.

use crate::{
    arena::{DepthFirstArenaTree, DirectedArenaTree},
    Body, BodyId, ConstructionError, Joint, JointId, JointType, MultiBody, PTransform, RBInertia,
};
use itertools::{multiunzip, Itertools};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, trace};
use tracing_attributes::instrument;

/// Undirected edge of a [MultiBodyGraph]
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub body1: BodyId,
    /// `body1` frame to joint frame
    pub x_body1_joint: PTransform,
    pub body2: BodyId,
    /// `body2` frame to joint frame
    pub x_body2_joint: PTransform,
    pub joint: JointId,
}

#[derive(Debug, Clone, Default)]
pub struct MultiBodyGraph {
    bodies: Vec<Body>,
    joints: Vec<Joint>,
    links: Vec<Link>,
    body_ids: HashMap<BodyId, usize>,
    body_names: HashMap<String, usize>,
    joint_ids: HashMap<JointId, usize>,
    joint_names: HashMap<String, usize>,
    linked_joints: HashSet<JointId>,
}

/// Load of the arena nodes during compilation: a tree body and the joint connecting it to its parent
#[derive(Debug)]
struct Segment {
    body: Body,
    joint: Joint,
    x_pred: PTransform,
    x_succ: PTransform,
}

impl MultiBodyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_body(&mut self, body: Body) -> Result<(), ConstructionError> {
        if self.body_ids.contains_key(&body.id()) {
            return Err(ConstructionError::DuplicateBodyId(body.id()));
        }
        if self.body_names.contains_key(body.name()) {
            return Err(ConstructionError::DuplicateBodyName(body.name().to_string()));
        }
        self.body_ids.insert(body.id(), self.bodies.len());
        self.body_names.insert(body.name().to_string(), self.bodies.len());
        self.bodies.push(body);
        Ok(())
    }

    pub fn add_joint(&mut self, joint: Joint) -> Result<(), ConstructionError> {
        if self.joint_ids.contains_key(&joint.id()) {
            return Err(ConstructionError::DuplicateJointId(joint.id()));
        }
        if self.joint_names.contains_key(joint.name()) {
            return Err(ConstructionError::DuplicateJointName(joint.name().to_string()));
        }
        self.joint_ids.insert(joint.id(), self.joints.len());
        self.joint_names.insert(joint.name().to_string(), self.joints.len());
        self.joints.push(joint);
        Ok(())
    }

    /// Connects two bodies with a joint. The transforms place the joint frame in each body frame.
    pub fn link_bodies(
        &mut self,
        body1: BodyId,
        x_body1_joint: PTransform,
        body2: BodyId,
        x_body2_joint: PTransform,
        joint: JointId,
    ) -> Result<(), ConstructionError> {
        for body in [body1, body2] {
            if !self.body_ids.contains_key(&body) {
                return Err(ConstructionError::UnknownBody(body));
            }
        }
        let joint_index = *self.joint_ids.get(&joint).ok_or(ConstructionError::UnknownJoint(joint))?;
        if body1 == body2 {
            return Err(ConstructionError::Cycle(self.joints[joint_index].name().to_string()));
        }
        if !self.linked_joints.insert(joint) {
            return Err(ConstructionError::JointAlreadyLinked(joint));
        }
        self.links.push(Link {
            body1,
            x_body1_joint,
            body2,
            x_body2_joint,
            joint,
        });
        Ok(())
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

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn body_by_id(&self, id: BodyId) -> Option<&Body> {
        self.body_ids.get(&id).map(|index| &self.bodies[*index])
    }

    pub fn body_by_name(&self, name: &str) -> Option<&Body> {
        self.body_names.get(name).map(|index| &self.bodies[*index])
    }

    pub fn joint_by_id(&self, id: JointId) -> Option<&Joint> {
        self.joint_ids.get(&id).map(|index| &self.joints[*index])
    }

    pub fn joint_by_name(&self, name: &str) -> Option<&Joint> {
        self.joint_names.get(name).map(|index| &self.joints[*index])
    }

    /// Compiles the graph into a kinematic tree rooted at `root`.
    ///
    /// Bodies attached by a [JointType::Fixed] joint are merged into the tree body they hang from. A fixed
    /// base welds the root to the world, otherwise a free joint connects the world to the root.
    #[instrument(skip(self))]
    pub fn make_multibody(&self, root: BodyId, is_fixed_base: bool) -> Result<MultiBody, ConstructionError> {
        let root_index = *self.body_ids.get(&root).ok_or(ConstructionError::UnknownRoot(root))?;

        let mut adjacency: HashMap<BodyId, Vec<&Link>> = HashMap::new();
        for link in &self.links {
            adjacency.entry(link.body1).or_default().push(link);
            adjacency.entry(link.body2).or_default().push(link);
        }

        let mut tree = DirectedArenaTree::with_capacity(self.bodies.len());
        tree.set_root(
            Segment {
                body: self.bodies[root_index].clone(),
                joint: Joint::root(is_fixed_base),
                x_pred: PTransform::identity(),
                x_succ: PTransform::identity(),
            },
            root,
        );

        // Visited bodies: the tree body carrying them and the transform from that body's frame
        let mut hosts: HashMap<BodyId, (BodyId, PTransform)> = HashMap::from([(root, (root, PTransform::identity()))]);
        let mut merged: HashMap<BodyId, RBInertia> = HashMap::new();
        let mut traversed: HashSet<JointId> = HashSet::with_capacity(self.links.len());
        let mut queue = VecDeque::from([root]);

        while let Some(current) = queue.pop_front() {
            let (host, x_host_current) = hosts[&current];
            for link in adjacency.get(&current).into_iter().flatten() {
                if !traversed.insert(link.joint) {
                    continue;
                }
                let joint = &self.joints[self.joint_ids[&link.joint]];
                let (next, x_current_joint, x_next_joint, joint) = if link.body1 == current {
                    (link.body2, link.x_body1_joint, link.x_body2_joint, joint.clone())
                } else {
                    (link.body1, link.x_body2_joint, link.x_body1_joint, joint.reversed())
                };
                if hosts.contains_key(&next) {
                    return Err(ConstructionError::Cycle(joint.name().to_string()));
                }

                let x_pred = x_current_joint * x_host_current;
                let x_succ = x_next_joint.inv();
                let body = &self.bodies[self.body_ids[&next]];

                if *joint.kind() == JointType::Fixed {
                    let x_host_next = x_succ * x_pred;
                    trace!(body = body.name(), joint = joint.name(), host, "merging welded body");
                    *merged.entry(host).or_default() += body.inertia().to_parent(&x_host_next);
                    hosts.insert(next, (host, x_host_next));
                } else {
                    tree.add(
                        Segment {
                            body: body.clone(),
                            joint,
                            x_pred,
                            x_succ,
                        },
                        next,
                        &host,
                    )?;
                    hosts.insert(next, (next, PTransform::identity()));
                }
                queue.push_back(next);
            }
        }

        if hosts.len() != self.bodies.len() {
            let unreachable = self
                .bodies
                .iter()
                .filter(|body| !hosts.contains_key(&body.id()))
                .map(Body::name)
                .join(", ");
            return Err(ConstructionError::Unreachable(unreachable));
        }

        let tree: DepthFirstArenaTree<Segment> = tree.into();
        debug!(
            bodies = tree.len(),
            merged = self.bodies.len() - tree.len(),
            "compiled kinematic tree"
        );

        let (bodies, joints, parents, transforms_pred, transforms_succ): (Vec<_>, Vec<_>, Vec<_>, Vec<_>, Vec<_>) =
            multiunzip(tree.into_loads().map(|(segment, parent)| {
                let body = match merged.get(&segment.body.id()) {
                    Some(extra) => segment.body.with_inertia(*segment.body.inertia() + *extra),
                    None => segment.body,
                };
                (body, segment.joint, parent, segment.x_pred, segment.x_succ)
            }));

        MultiBody::new(bodies, joints, parents, transforms_pred, transforms_succ, is_fixed_base)
    }
}
