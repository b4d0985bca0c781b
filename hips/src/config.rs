//! Configuration types for index queries.
//!
//! Tree geometry is configured through [`crate::TreeShape`], which validates
//! itself on construction. Search parameters are plain data: every
//! combination is accepted and only changes how much work a search does.

use serde::{Deserialize, Serialize};

use crate::descriptor::MAX_ROTATIONS;

/// Options for a batch search over a built [`crate::Tree`].
///
/// Defaults follow the descriptor matching pipeline this index was built
/// for: a coverage error of at most 3 bits, no rotation, every matching leaf
/// reported, unbounded output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum coverage error for a node to be visited and a leaf to match.
    ///
    /// Values of 0 require exact coverage; values at or above the descriptor
    /// width match every leaf.
    pub threshold: u32,
    /// Rotation steps tried per query, starting at the identity.
    ///
    /// 0 performs no search; values above [`MAX_ROTATIONS`] revisit the same
    /// orientations.
    pub rotations: usize,
    /// Report every matching leaf. When false, each (query, rotation) stops at
    /// the first leaf found.
    pub exhaustive: bool,
    /// Capacity of the output. Matches beyond it are dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_matches: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            rotations: 1,
            exhaustive: true,
            max_matches: None,
        }
    }
}

impl SearchConfig {
    /// Search over every orientation of the rotation cycle.
    pub fn all_rotations() -> Self {
        Self {
            rotations: MAX_ROTATIONS,
            ..Default::default()
        }
    }
}
