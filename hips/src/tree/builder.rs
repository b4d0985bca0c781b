//! Bottom-up construction of the dense descriptor tree.
//!
//! 1. The batch is truncated or zero-padded to exactly `leaf_count` leaves.
//! 2. Each level is paired greedily: the first unpaired descriptor takes the
//!    unpaired descriptor with the smallest Hamming distance (first found on
//!    ties, a distance of 0 ends the scan early). O(n²) per level.
//! 3. Each pair is blended (OR) into one descriptor of the next level.
//! 4. Levels stop at the topmost kept level, which must hold exactly
//!    `tree_roots` descriptors.
//! 5. The levels are written into the dense array root by root.

use std::time::Instant;

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::shape::TreeShape;

use super::Tree;

/// Descriptors of one tree level and the pairs of the level below that
/// produced them. The leaf level has no pairs.
#[derive(Debug, Clone)]
pub(super) struct TreeLevel<const WORDS: usize> {
    pub descriptors: Vec<Descriptor<WORDS>>,
    pub pairs: Vec<[usize; 2]>,
}

/// Build a dense tree from an unordered descriptor batch.
///
/// Extra descriptors beyond `shape.leaf_count` are ignored; a short batch is
/// padded with zero descriptors, whose leaf map entries are the indices past
/// the end of the batch.
///
/// # Errors
///
/// [`Error::Configuration`] if the shape's derived geometry is inconsistent,
/// [`Error::ShapeMismatch`] if a level does not hold the number of nodes the
/// shape predicts. No partial tree is returned.
pub fn build_tree<const WORDS: usize>(
    descriptors: &[Descriptor<WORDS>],
    shape: &TreeShape,
) -> Result<Tree<WORDS>> {
    shape.check_consistent()?;
    let start = Instant::now();

    let leaves = normalize_leaves(descriptors, shape.leaf_count);
    let levels = build_levels(leaves, shape)?;

    let fill_start = Instant::now();
    let (nodes, leaf_map) = fill_tree(&levels, shape);

    tracing::debug!(
        leaves = shape.leaf_count,
        nodes = nodes.len(),
        fill_us = fill_start.elapsed().as_micros() as u64,
        total_us = start.elapsed().as_micros() as u64,
        "Descriptor tree built"
    );

    Ok(Tree {
        shape: *shape,
        nodes,
        leaf_map,
    })
}

/// Truncate or zero-pad the batch to exactly `leaf_count` descriptors.
fn normalize_leaves<const WORDS: usize>(
    descriptors: &[Descriptor<WORDS>],
    leaf_count: usize,
) -> Vec<Descriptor<WORDS>> {
    if descriptors.len() > leaf_count {
        tracing::debug!(
            "Truncating {} descriptors to {} leaves",
            descriptors.len(),
            leaf_count
        );
    } else if descriptors.len() < leaf_count {
        tracing::debug!(
            "Padding {} descriptors with {} zero leaves",
            descriptors.len(),
            leaf_count - descriptors.len()
        );
    }

    let mut leaves: Vec<Descriptor<WORDS>> =
        descriptors.iter().take(leaf_count).copied().collect();
    leaves.resize(leaf_count, Descriptor::zero());
    leaves
}

/// Pair and blend levels from the leaves up to the forest roots.
pub(super) fn build_levels<const WORDS: usize>(
    leaves: Vec<Descriptor<WORDS>>,
    shape: &TreeShape,
) -> Result<Vec<TreeLevel<WORDS>>> {
    let mut levels = Vec::with_capacity(shape.keep_levels);
    levels.push(TreeLevel {
        descriptors: leaves,
        pairs: Vec::new(),
    });

    for level in 1..shape.keep_levels {
        let below = &levels[level - 1].descriptors;

        let pair_start = Instant::now();
        let pairs = pair_descriptors(below);
        let pair_us = pair_start.elapsed().as_micros() as u64;

        if pairs.len() * 2 < below.len() {
            tracing::warn!(
                "Level {}: {} of {} descriptors left unpaired and dropped",
                level,
                below.len() - pairs.len() * 2,
                below.len()
            );
        }

        let blend_start = Instant::now();
        let descriptors = blend_descriptors(below, &pairs);
        let blend_us = blend_start.elapsed().as_micros() as u64;

        tracing::debug!(level, pairs = pairs.len(), pair_us, blend_us, "Tree level built");

        let expected = shape.level_len(level);
        if descriptors.len() != expected {
            return Err(Error::ShapeMismatch {
                level,
                expected,
                actual: descriptors.len(),
            });
        }

        levels.push(TreeLevel { descriptors, pairs });
    }

    let roots = levels.last().map_or(0, |l| l.descriptors.len());
    if roots != shape.tree_roots {
        return Err(Error::ShapeMismatch {
            level: shape.root_level(),
            expected: shape.tree_roots,
            actual: roots,
        });
    }

    Ok(levels)
}

/// Greedy best-pair matching under Hamming distance.
///
/// Returns pairs `[i, j]` of indices into `descriptors`, in the order the
/// first element was taken. With an odd count the last unpaired descriptor
/// is left out.
pub(super) fn pair_descriptors<const WORDS: usize>(
    descriptors: &[Descriptor<WORDS>],
) -> Vec<[usize; 2]> {
    let n = descriptors.len();
    let mut used = vec![false; n];
    let mut pairs = Vec::with_capacity(n / 2);

    for i in 0..n {
        if used[i] {
            continue;
        }
        let first = &descriptors[i];

        // Every index below i is already consumed.
        let mut best: Option<(u32, usize)> = None;
        for j in (i + 1)..n {
            if used[j] {
                continue;
            }
            let diff = first.diff(&descriptors[j]);
            if best.is_none_or(|(best_diff, _)| diff < best_diff) {
                best = Some((diff, j));
                if diff == 0 {
                    break;
                }
            }
        }

        let Some((_, j)) = best else {
            break;
        };

        used[i] = true;
        used[j] = true;
        pairs.push([i, j]);
    }

    pairs
}

/// OR-blend each pair into one descriptor.
pub(super) fn blend_descriptors<const WORDS: usize>(
    descriptors: &[Descriptor<WORDS>],
    pairs: &[[usize; 2]],
) -> Vec<Descriptor<WORDS>> {
    pairs
        .iter()
        .map(|&[a, b]| descriptors[a].merge(&descriptors[b]))
        .collect()
}

/// Write all kept levels into the dense array and build the leaf map.
fn fill_tree<const WORDS: usize>(
    levels: &[TreeLevel<WORDS>],
    shape: &TreeShape,
) -> (Vec<Descriptor<WORDS>>, Vec<usize>) {
    let mut nodes = vec![Descriptor::zero(); shape.keep_nodes];
    let mut leaf_map = vec![usize::MAX; shape.leaf_count];
    let mut written = vec![false; shape.keep_nodes];

    let root_level = shape.root_level();
    for root in shape.root_cells() {
        fill_cell(
            levels,
            shape,
            &mut nodes,
            &mut leaf_map,
            &mut written,
            root_level,
            root,
            root,
        );
    }

    debug_assert!(
        written.iter().all(|&w| w),
        "Dense fill left cells unwritten"
    );
    debug_assert!(
        is_permutation(&leaf_map),
        "Leaf map is not a permutation of 0..{}",
        shape.leaf_count
    );

    (nodes, leaf_map)
}

/// Place node `index` of `level` at `cell` and recurse into its pair.
#[allow(clippy::too_many_arguments)]
fn fill_cell<const WORDS: usize>(
    levels: &[TreeLevel<WORDS>],
    shape: &TreeShape,
    nodes: &mut [Descriptor<WORDS>],
    leaf_map: &mut [usize],
    written: &mut [bool],
    level: usize,
    index: usize,
    cell: usize,
) {
    debug_assert!(!written[cell], "Cell {} written twice", cell);
    written[cell] = true;
    nodes[cell] = levels[level].descriptors[index];

    if level == 0 {
        debug_assert!(shape.is_leaf(cell));
        leaf_map[cell - shape.leaf0] = index;
        return;
    }
    debug_assert!(!shape.is_leaf(cell));

    let [left, right] = levels[level].pairs[index];
    let [left_cell, right_cell] = shape.children(cell);
    fill_cell(levels, shape, nodes, leaf_map, written, level - 1, left, left_cell);
    fill_cell(levels, shape, nodes, leaf_map, written, level - 1, right, right_cell);
}

/// True if `map` holds every value in `0..map.len()` exactly once.
pub(super) fn is_permutation(map: &[usize]) -> bool {
    let mut seen = vec![false; map.len()];
    for &v in map {
        if v >= map.len() || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    true
}
