//! Data structure representing an arena tree in which the arena is sorted in depth-first
//! order, i.e., every parent is stored before its children (topological order).

use super::{utils::sort_by_indices, ArenaNode, DirectedArenaTree};
use itertools::Itertools;

#[derive(Debug)]
pub struct DepthFirstArenaTree<Load>(DirectedArenaTree<Load>);

impl<Load> From<DirectedArenaTree<Load>> for DepthFirstArenaTree<Load> {
    fn from(mut value: DirectedArenaTree<Load>) -> Self {
        // sorts the order of nodes such that depth-first descent is optimal
        let optimal_order = value.iter_depth().map(|node| node.index).collect_vec();

        DirectedArenaTree::update_indices(&mut value.nodes, &optimal_order);
        sort_by_indices(&mut value.nodes, optimal_order);

        value.nodes.iter().for_each(|node| {
            value.lookup.insert(node.id, node.index);
        });
        Self(value)
    }
}

impl<Load> DepthFirstArenaTree<Load> {
    pub fn nodes(&self) -> &[ArenaNode<Load>] {
        &self.0.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArenaNode<Load>> {
        self.0.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.0.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.nodes.is_empty()
    }

    /// Consumes the tree and yields `(load, parent position)` pairs in storage order.
    pub fn into_loads(self) -> impl Iterator<Item = (Load, Option<usize>)> {
        self.0
            .nodes
            .into_iter()
            .map(|node| (node.load, node.parent.map(|parent| parent.0)))
    }
}
