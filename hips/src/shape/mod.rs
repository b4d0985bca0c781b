//! Geometry of the dense, truncated descriptor tree.
//!
//! A full binary tree over `leaf_count` leaves has `total_levels` levels.
//! Only the bottom `keep_levels` are stored: the top `drop_levels` are cut
//! off, leaving a forest of `tree_roots` independent trees laid out in one
//! dense array.
//!
//! ```text
//! full heap index:  0 | 1 2 | 3 4 5 6 | 7 8 9 10 11 12 13 14      (L = 8, K = 2)
//!                   dropped (3 nodes)  | kept (12 nodes)
//! kept cell:                 0 1 2 3 | 4 5 6 7  8  9 10 11
//!                            roots   | leaves (leaf0 = 4)
//! ```
//!
//! Kept cell `c` is full heap index `c + drop_nodes`, so child cells are
//! `2 * (c + drop_nodes) + 1 - drop_nodes` and `+ 2 - drop_nodes`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};


/// Smallest supported leaf count.
pub const MIN_LEAVES: usize = 8;

/// Largest supported leaf count.
pub const MAX_LEAVES: usize = 2048;

/// Derived tree geometry for a (leaf count, kept levels) pair.
///
/// Only constructed through [`TreeShape::new`] (or deserialization, which
/// calls it), so the derived fields are always consistent.
/// Serialized as its two parameters and validated again on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ShapeParams", into = "ShapeParams")]
pub struct TreeShape {
    /// Leaves in the tree. Power of two in `[MIN_LEAVES, MAX_LEAVES]`.
    pub(crate) leaf_count: usize,
    /// Levels kept from the leaves up. `1 < keep_levels < total_levels`.
    pub(crate) keep_levels: usize,
    /// Levels in the full tree, `log2(leaf_count) + 1`.
    pub(crate) total_levels: usize,
    /// Twice the leaf count.
    pub(crate) full_nodes: usize,
    /// Nodes in the full tree.
    pub(crate) tree_nodes: usize,
    /// Levels cut from the top of the full tree.
    pub(crate) drop_levels: usize,
    /// Roots of the stored forest.
    pub(crate) tree_roots: usize,
    /// Nodes cut from the top of the full tree.
    pub(crate) drop_nodes: usize,
    /// Nodes stored in the dense array.
    pub(crate) keep_nodes: usize,
    /// Cell of the first leaf in the dense array.
    pub(crate) leaf0: usize,
}

#[derive(Serialize, Deserialize)]
struct ShapeParams {
    leaf_count: usize,
    keep_levels: usize,
}

impl TryFrom<ShapeParams> for TreeShape {
    type Error = Error;

    fn try_from(params: ShapeParams) -> Result<Self> {
        Self::new(params.leaf_count, params.keep_levels)
    }
}

impl From<TreeShape> for ShapeParams {
    fn from(shape: TreeShape) -> Self {
        Self {
            leaf_count: shape.leaf_count,
            keep_levels: shape.keep_levels,
        }
    }
}

impl TreeShape {
    /// Validates the parameters and derives the geometry.
    pub fn new(leaf_count: usize, keep_levels: usize) -> Result<Self> {
        let invalid = |reason| Error::Configuration {
            leaf_count,
            keep_levels,
            reason,
        };

        if leaf_count < MIN_LEAVES {
            return Err(invalid("leaf count must be at least 8"));
        }
        if leaf_count > MAX_LEAVES {
            return Err(invalid("leaf count must be at most 2048"));
        }
        if !leaf_count.is_power_of_two() {
            return Err(invalid("leaf count must be a power of two"));
        }

        let total_levels = leaf_count.trailing_zeros() as usize + 1;

        if keep_levels <= 1 || keep_levels >= total_levels {
            return Err(invalid("keep levels must satisfy 1 < keep_levels < total_levels"));
        }

        let full_nodes = leaf_count * 2;
        let tree_nodes = full_nodes - 1;
        let drop_levels = total_levels - keep_levels;
        let tree_roots = 1 << drop_levels;
        let drop_nodes = tree_roots - 1;
        let keep_nodes = tree_nodes - drop_nodes;
        let leaf0 = keep_nodes - leaf_count;

        debug_assert_eq!(leaf0 + leaf_count, keep_nodes);

        Ok(Self {
            leaf_count,
            keep_levels,
            total_levels,
            full_nodes,
            tree_nodes,
            drop_levels,
            tree_roots,
            drop_nodes,
            keep_nodes,
            leaf0,
        })
    }

    /// Re-derives the geometry from `leaf_count` and `keep_levels` and
    /// rejects a shape whose stored fields disagree with it.
    pub(crate) fn check_consistent(&self) -> Result<()> {
        let derived = Self::new(self.leaf_count, self.keep_levels)?;
        if derived != *self {
            return Err(Error::Configuration {
                leaf_count: self.leaf_count,
                keep_levels: self.keep_levels,
                reason: "derived geometry is inconsistent",
            });
        }
        Ok(())
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    #[inline]
    pub fn keep_levels(&self) -> usize {
        self.keep_levels
    }

    #[inline]
    pub fn total_levels(&self) -> usize {
        self.total_levels
    }

    #[inline]
    pub fn full_nodes(&self) -> usize {
        self.full_nodes
    }

    #[inline]
    pub fn tree_nodes(&self) -> usize {
        self.tree_nodes
    }

    #[inline]
    pub fn drop_levels(&self) -> usize {
        self.drop_levels
    }

    #[inline]
    pub fn tree_roots(&self) -> usize {
        self.tree_roots
    }

    #[inline]
    pub fn drop_nodes(&self) -> usize {
        self.drop_nodes
    }

    /// Nodes stored in the dense array.
    #[inline]
    pub fn keep_nodes(&self) -> usize {
        self.keep_nodes
    }

    /// Cell of the first leaf.
    #[inline]
    pub fn leaf0(&self) -> usize {
        self.leaf0
    }

    /// Cells holding the forest roots.
    #[inline]
    pub fn root_cells(&self) -> Range<usize> {
        0..self.tree_roots
    }

    /// Cells holding the leaves.
    #[inline]
    pub fn leaf_cells(&self) -> Range<usize> {
        self.leaf0..self.keep_nodes
    }

    #[inline]
    pub fn is_leaf(&self, cell: usize) -> bool {
        cell >= self.leaf0
    }

    /// Child cells of an internal cell.
    #[inline]
    pub fn children(&self, cell: usize) -> [usize; 2] {
        debug_assert!(cell < self.leaf0, "cell {} has no children", cell);
        let full = (cell + self.drop_nodes) * 2;
        [full + 1 - self.drop_nodes, full + 2 - self.drop_nodes]
    }

    /// Number of nodes on a level, counting level 0 as the leaves.
    #[inline]
    pub fn level_len(&self, level: usize) -> usize {
        self.leaf_count >> level
    }

    /// Level of the forest roots, the topmost stored level.
    #[inline]
    pub fn root_level(&self) -> usize {
        self.keep_levels - 1
    }
}
