//! Balanced descriptor tree stored as a dense array.
//!
//! The tree is built once per descriptor batch by greedy bottom-up pairing
//! (see [`build_tree`]) and is immutable afterwards, so any number of threads
//! can search it at once.
//!
//! # Layout
//!
//! Nodes live in one `Vec` indexed by cell; child cells are computed from
//! [`TreeShape::children`] rather than stored. Leaves occupy cells
//! `shape.leaf0..shape.keep_nodes`, and `leaf_map[cell - leaf0]` gives the
//! index of the input descriptor a leaf holds.
//!
//! # Search
//!
//! Every internal node is the OR of its children, so it covers every bit of
//! every leaf below it. A query whose coverage error against a node exceeds
//! the threshold is not expected to match anything below that node, and the
//! subtree is skipped (see [`search_tree`]).

mod builder;
mod search;

pub use builder::build_tree;
pub use search::{RotationSearch, search_best_rotation, search_tree, search_tree_rotation};

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result, check_index};
use crate::shape::TreeShape;

/// A query matched to a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Match {
    /// Index of the matched descriptor in the batch the tree was built from.
    pub leaf: usize,
    /// Index of the query in the searched batch.
    pub query: usize,
}

/// Immutable dense descriptor tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree<const WORDS: usize = 4> {
    shape: TreeShape,
    nodes: Vec<Descriptor<WORDS>>,
    leaf_map: Vec<usize>,
}

impl<const WORDS: usize> Tree<WORDS> {
    /// Build a tree from an unordered descriptor batch. See [`build_tree`].
    pub fn build(descriptors: &[Descriptor<WORDS>], shape: &TreeShape) -> Result<Self> {
        build_tree(descriptors, shape)
    }

    /// Search the tree with a batch of queries. See [`search_tree`].
    pub fn search(&self, queries: &[Descriptor<WORDS>], config: &SearchConfig) -> Vec<Match> {
        search_tree(self, queries, config)
    }

    #[inline]
    pub fn shape(&self) -> &TreeShape {
        &self.shape
    }

    /// All stored nodes, indexed by cell.
    #[inline]
    pub fn nodes(&self) -> &[Descriptor<WORDS>] {
        &self.nodes
    }

    /// Original descriptor index for each leaf slot.
    #[inline]
    pub fn leaf_map(&self) -> &[usize] {
        &self.leaf_map
    }

    /// Number of stored nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Descriptor stored at `cell`.
    pub fn node(&self, cell: usize) -> Result<&Descriptor<WORDS>> {
        let cell = check_index("tree cell", cell, self.nodes.len())?;
        Ok(&self.nodes[cell])
    }

    /// Original descriptor index held by leaf slot `slot` (cell `leaf0 + slot`).
    pub fn leaf_index(&self, slot: usize) -> Result<usize> {
        let slot = check_index("leaf slot", slot, self.leaf_map.len())?;
        Ok(self.leaf_map[slot])
    }

    /// Leaf descriptor built from input descriptor `original`.
    ///
    /// Input slots past the end of a short batch hold the zero descriptor.
    pub fn leaf_descriptor(&self, original: usize) -> Result<&Descriptor<WORDS>> {
        let original = check_index("leaf", original, self.leaf_map.len())?;
        let slot = self
            .leaf_map
            .iter()
            .position(|&index| index == original)
            .ok_or(Error::IndexOutOfRange {
                what: "leaf",
                index: original,
                len: self.leaf_map.len(),
            })?;
        Ok(&self.nodes[self.shape.leaf0 + slot])
    }
}
