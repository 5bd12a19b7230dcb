//! Implementation of a mutable
//! [arena allocated](https://en.wikipedia.org/wiki/Region-based_memory_management)
//! tree whose nodes are identified by [BodyId]s. Iteration in depth-first order follows child
//! references and is therefore slower than iterating a [super::DepthFirstArenaTree].

use crate::{BodyId, ConstructionError};
use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct ArenaIndex(pub usize);

/// A node structure to be used in an arena allocated tree
#[derive(Debug)]
pub struct ArenaNode<Load> {
    /// The user-defined load that the node owns
    pub(super) load: Load,
    /// Index in the arena allocation
    pub(super) index: ArenaIndex,
    /// identifier for lookups
    pub(super) id: BodyId,
    /// references for children
    pub(super) children: Vec<ArenaIndex>,
    /// `None` for the root
    pub(super) parent: Option<ArenaIndex>,
}

impl<Load> ArenaNode<Load> {
    pub fn load(&self) -> &Load {
        &self.load
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn index(&self) -> ArenaIndex {
        self.index
    }

    pub fn parent(&self) -> Option<ArenaIndex> {
        self.parent
    }

    pub fn children(&self) -> &[ArenaIndex] {
        &self.children
    }
}

/// Iterable tree that uses arena allocation. Nodes can be added below any existing node.
/// Convert it into a [super::DepthFirstArenaTree] with `into()` once it is complete.
#[derive(Debug)]
pub struct DirectedArenaTree<Load> {
    /// Memory allocated area for nodes. The root, if any, is the first element.
    pub(super) nodes: Vec<ArenaNode<Load>>,

    /// Lookup arena indices
    pub(super) lookup: HashMap<BodyId, ArenaIndex>,
}

impl<Load> DirectedArenaTree<Load> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        DirectedArenaTree {
            nodes: Vec::with_capacity(capacity),
            lookup: HashMap::with_capacity(capacity),
        }
    }

    /// Deletes all nodes and sets a new root
    pub fn set_root(&mut self, load: Load, id: BodyId) -> BodyId {
        self.nodes.clear();
        self.lookup.clear();
        self.nodes.push(ArenaNode {
            load,
            index: ArenaIndex(0),
            id,
            children: vec![],
            parent: None,
        });
        self.lookup.insert(id, ArenaIndex(0));
        id
    }

    /// Adds a node below `parent`.
    pub fn add(&mut self, load: Load, id: BodyId, parent: &BodyId) -> Result<BodyId, ConstructionError> {
        let parent_index = *self.lookup.get(parent).ok_or(ConstructionError::UnknownBody(*parent))?;
        if self.lookup.contains_key(&id) {
            return Err(ConstructionError::DuplicateBodyId(id));
        }

        let index = ArenaIndex(self.nodes.len());
        self.nodes[parent_index.0].children.push(index);
        self.lookup.insert(id, index);
        self.nodes.push(ArenaNode {
            load,
            index,
            id,
            children: vec![],
            parent: Some(parent_index),
        });
        Ok(id)
    }

    pub fn node_by_id(&self, id: &BodyId) -> Option<&ArenaNode<Load>> {
        let index = self.lookup.get(id)?;
        self.nodes.get(index.0)
    }

    pub fn nodes(&self) -> &[ArenaNode<Load>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first iteration following the child references (slow)
    pub fn iter_depth(&self) -> DepthFirstIterator<'_, Load> {
        DepthFirstIterator::new(self)
    }

    /// Given the depth-first `order` (old indices in their new order), rewrites all indices
    /// stored in the nodes. The nodes themselves are moved afterwards.
    pub(super) fn update_indices(nodes: &mut [ArenaNode<Load>], order: &[ArenaIndex]) {
        let mut new_index = vec![ArenaIndex(0); order.len()];
        order
            .iter()
            .enumerate()
            .for_each(|(new, old)| new_index[old.0] = ArenaIndex(new));

        nodes.iter_mut().for_each(|node| {
            node.index = new_index[node.index.0];
            node.parent = node.parent.map(|parent| new_index[parent.0]);
            node.children.iter_mut().for_each(|child| *child = new_index[child.0]);
        });
    }
}

impl<Load> Default for DirectedArenaTree<Load> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator for a depth-first iteration when the data is not already sorted accordingly
pub struct DepthFirstIterator<'a, Load> {
    tree: &'a DirectedArenaTree<Load>,
    stack: Vec<std::slice::Iter<'a, ArenaIndex>>,
    root: Option<usize>,
}

impl<'a, Load> DepthFirstIterator<'a, Load> {
    pub fn new(tree: &'a DirectedArenaTree<Load>) -> Self {
        DepthFirstIterator {
            tree,
            stack: Vec::new(),
            root: (!tree.nodes.is_empty()).then_some(0),
        }
    }
}

impl<'a, Load> Iterator for DepthFirstIterator<'a, Load> {
    type Item = &'a ArenaNode<Load>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            let root = &self.tree.nodes[root];
            self.stack.push(root.children.iter());
            return Some(root);
        }
        while let Some(last) = self.stack.last_mut() {
            if let Some(child) = last.next() {
                let node = &self.tree.nodes[child.0];
                self.stack.push(node.children.iter());
                return Some(node);
            }
            self.stack.pop();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn test_add_errors() {
        let mut tree = DirectedArenaTree::<&str>::new();
        tree.set_root("root", 0);
        tree.add("first", 1, &0).unwrap();

        assert_eq!(tree.add("again", 1, &0), Err(ConstructionError::DuplicateBodyId(1)));
        assert_eq!(tree.add("orphan", 2, &7), Err(ConstructionError::UnknownBody(7)));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.node_by_id(&1).map(|n| *n.load()), Some("first"));
    }

    #[test]
    fn test_iter_depth() {
        //     0
        //    / \
        //  1    2
        //  |
        //  3
        let mut tree = DirectedArenaTree::<usize>::new();
        tree.set_root(0, 0);
        tree.add(1, 1, &0).unwrap();
        tree.add(2, 2, &0).unwrap();
        tree.add(3, 3, &1).unwrap();

        assert_eq!(tree.iter_depth().map(|n| n.id()).collect_vec(), &[0, 1, 3, 2]);
    }
}
