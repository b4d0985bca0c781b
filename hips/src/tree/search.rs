//! Parallel batch search over a built tree.
//!
//! Queries are split into contiguous chunks that run on the rayon pool. Each
//! chunk owns its traversal stack and output buffer, and the buffers are
//! concatenated in chunk order, so results are ordered by query, then by
//! rotation, then by visit order no matter how the chunks were scheduled.
//!
//! Traversal is depth-first from every root. A node whose coverage error
//! exceeds the threshold is pruned with its whole subtree. Matches are not
//! deduplicated: several rotations of one query can report the same leaf.

use std::ops::Range;
use std::time::Instant;

use common::parallel::par_chunks_flat_map;
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::descriptor::{Descriptor, MAX_ROTATIONS};

use super::{Match, Tree};

/// Matches produced by the single rotation that matched best.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RotationSearch {
    /// Rotation step applied to every query.
    pub rotation: usize,
    pub matches: Vec<Match>,
}

/// Search every query under rotations `0..config.rotations`.
///
/// Output holds one entry per (query, rotation, matching leaf) and is capped
/// at `config.max_matches`.
pub fn search_tree<const WORDS: usize>(
    tree: &Tree<WORDS>,
    queries: &[Descriptor<WORDS>],
    config: &SearchConfig,
) -> Vec<Match> {
    search_rotations(tree, queries, 0..config.rotations, config)
}

/// Search every query under one rotation step, ignoring `config.rotations`.
///
/// Steps wrap every [`MAX_ROTATIONS`].
pub fn search_tree_rotation<const WORDS: usize>(
    tree: &Tree<WORDS>,
    queries: &[Descriptor<WORDS>],
    rotation: usize,
    config: &SearchConfig,
) -> Vec<Match> {
    let rotation = rotation % MAX_ROTATIONS;
    search_rotations(tree, queries, rotation..rotation + 1, config)
}

/// Try rotations `0..config.rotations` one at a time and keep the one with
/// the most matches. The earliest rotation wins ties.
///
/// With `config.rotations == 0` the result is rotation 0 with no matches.
pub fn search_best_rotation<const WORDS: usize>(
    tree: &Tree<WORDS>,
    queries: &[Descriptor<WORDS>],
    config: &SearchConfig,
) -> RotationSearch {
    let mut best = RotationSearch::default();
    for rotation in 0..config.rotations {
        let matches = search_tree_rotation(tree, queries, rotation, config);
        tracing::debug!(rotation, matches = matches.len(), "Rotation searched");
        if matches.len() > best.matches.len() {
            best = RotationSearch { rotation, matches };
        }
    }
    best
}

fn search_rotations<const WORDS: usize>(
    tree: &Tree<WORDS>,
    queries: &[Descriptor<WORDS>],
    rotations: Range<usize>,
    config: &SearchConfig,
) -> Vec<Match> {
    let start = Instant::now();

    let mut matches = if rotations.is_empty() {
        Vec::new()
    } else {
        let shape = tree.shape();
        par_chunks_flat_map(queries, |offset, chunk| {
            let mut stack = Vec::with_capacity(shape.tree_roots + shape.keep_levels);
            let mut found = Vec::new();
            for (i, query) in chunk.iter().enumerate() {
                for rotation in rotations.clone() {
                    let rotated = query.rotated(rotation);
                    traverse(tree, &rotated, offset + i, config, &mut stack, &mut found);
                }
            }
            found
        })
    };

    if let Some(capacity) = config.max_matches {
        if matches.len() > capacity {
            tracing::warn!(
                "Search produced {} matches, keeping the first {}",
                matches.len(),
                capacity
            );
            matches.truncate(capacity);
        }
    }

    tracing::debug!(
        queries = queries.len(),
        rotations = rotations.len(),
        threshold = config.threshold,
        matches = matches.len(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "Tree search finished"
    );

    matches
}

/// Depth-first walk of the forest for one rotated query.
///
/// `stack` is reused across calls and is empty on return.
fn traverse<const WORDS: usize>(
    tree: &Tree<WORDS>,
    query: &Descriptor<WORDS>,
    query_index: usize,
    config: &SearchConfig,
    stack: &mut Vec<usize>,
    found: &mut Vec<Match>,
) {
    let shape = tree.shape();
    let nodes = tree.nodes();

    stack.clear();
    // Reversed so root 0 is visited first.
    stack.extend(shape.root_cells().rev());

    while let Some(cell) = stack.pop() {
        if query.error(&nodes[cell]) > config.threshold {
            continue;
        }

        if shape.is_leaf(cell) {
            found.push(Match {
                leaf: tree.leaf_map()[cell - shape.leaf0],
                query: query_index,
            });
            if !config.exhaustive {
                stack.clear();
                return;
            }
            continue;
        }

        let [left, right] = shape.children(cell);
        stack.push(right);
        stack.push(left);
    }
}
