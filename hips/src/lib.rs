//! Hips - Hierarchical index over binary image feature descriptors.
//!
//! Matches a batch of query descriptors against a batch of reference
//! descriptors by bit coverage instead of a brute-force comparison of every
//! pair:
//! - Dense balanced forest built by greedy pairwise merging ([`Tree`])
//! - Parallel batch search with rotation hypotheses ([`search_tree`])
//! - Unbalanced merge tree for arbitrary batch sizes ([`AgglomerativeIndex`])
//! - Brute-force reference matcher ([`linear`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use hips::{Descriptor256, SearchConfig, Tree, TreeShape};
//!
//! let shape = TreeShape::new(512, 6)?;
//! let tree = Tree::build(&reference, &shape)?;
//!
//! let config = SearchConfig {
//!     threshold: 4,
//!     rotations: 4,
//!     ..Default::default()
//! };
//! let matches = tree.search(&queries, &config);
//! println!("Found {} matches", matches.len());
//! ```

pub mod agglomerative;
mod config;
mod descriptor;
mod error;
pub mod linear;
mod shape;
mod tree;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Descriptors
// ============================================================================

pub use descriptor::{
    Descriptor, Descriptor256, MAX_ROTATIONS, ROTATION_QUANTUM, clip_descriptors,
};

// ============================================================================
// Dense tree
// ============================================================================

pub use config::SearchConfig;
pub use shape::{MAX_LEAVES, MIN_LEAVES, TreeShape};
pub use tree::{
    Match, RotationSearch, Tree, build_tree, search_best_rotation, search_tree,
    search_tree_rotation,
};

// ============================================================================
// Agglomerative index
// ============================================================================

pub use agglomerative::{AgglomerativeIndex, AgglomerativeNode, LeafMatch};

// ============================================================================
// Errors
// ============================================================================

pub use error::{Error, Result};
