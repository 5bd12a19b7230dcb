//! [Arena memory allocated](https://en.wikipedia.org/wiki/Region-based_memory_management)
//! tree of bodies used while compiling a [crate::MultiBodyGraph].
//!
//! Nodes are inserted in any order (the graph is explored breadth-first) into a
//! [DirectedArenaTree] and then reordered into a [DepthFirstArenaTree] whose arena is sorted such
//! that every parent precedes its children.

pub mod depth;
pub mod directed;
mod utils;

pub use depth::DepthFirstArenaTree;
pub use directed::{ArenaIndex, ArenaNode, DepthFirstIterator, DirectedArenaTree};
