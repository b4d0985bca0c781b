//! Error types for descriptor index construction and access.

use thiserror::Error;

/// Errors that can occur while building or accessing a descriptor index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Leaf count / kept level parameters do not describe a valid tree.
    #[error(
        "Invalid tree shape (leaf_count={leaf_count}, keep_levels={keep_levels}): {reason}"
    )]
    Configuration {
        leaf_count: usize,
        keep_levels: usize,
        reason: &'static str,
    },

    /// Greedy pairing did not converge to the geometry the shape predicts.
    #[error("Tree level {level} has {actual} nodes, shape expects {expected}")]
    ShapeMismatch {
        level: usize,
        expected: usize,
        actual: usize,
    },

    /// Caller-supplied index outside the valid range.
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Bounds check helper returning [`Error::IndexOutOfRange`].
#[inline]
pub(crate) fn check_index(what: &'static str, index: usize, len: usize) -> Result<usize> {
    if index < len {
        Ok(index)
    } else {
        Err(Error::IndexOutOfRange { what, index, len })
    }
}
