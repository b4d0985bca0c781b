//! Brute-force matching against every reference descriptor.
//!
//! Quadratic in the batch sizes. Used as ground truth for the tree indices
//! and for small batches where building an index does not pay off.

use common::parallel::par_chunks_flat_map;
use hashbrown::HashSet;

use crate::descriptor::Descriptor;
use crate::tree::Match;


/// For each query, the reference with the smallest coverage error, kept if
/// that error is below `threshold`. The lowest reference index wins ties.
///
/// Output is ordered by query and holds at most one match per query.
pub fn best_matches<const WORDS: usize>(
    reference: &[Descriptor<WORDS>],
    queries: &[Descriptor<WORDS>],
    threshold: u32,
) -> Vec<Match> {
    par_chunks_flat_map(queries, |offset, chunk| {
        chunk
            .iter()
            .enumerate()
            .filter_map(|(i, query)| {
                let mut best: Option<(u32, usize)> = None;
                for (leaf, candidate) in reference.iter().enumerate() {
                    let error = query.error(candidate);
                    if best.is_none_or(|(best_error, _)| error < best_error) {
                        best = Some((error, leaf));
                        if error == 0 {
                            break;
                        }
                    }
                }
                let (error, leaf) = best?;
                (error < threshold).then_some(Match {
                    leaf,
                    query: offset + i,
                })
            })
            .collect()
    })
}

/// Every (reference, query) pair with coverage error at most `threshold`.
///
/// Ordered by query, then by reference index. This is the set an exhaustive
/// identity-rotation tree search reports.
pub fn all_matches<const WORDS: usize>(
    reference: &[Descriptor<WORDS>],
    queries: &[Descriptor<WORDS>],
    threshold: u32,
) -> Vec<Match> {
    par_chunks_flat_map(queries, |offset, chunk| {
        let mut found = Vec::new();
        for (i, query) in chunk.iter().enumerate() {
            for (leaf, candidate) in reference.iter().enumerate() {
                if query.error(candidate) <= threshold {
                    found.push(Match {
                        leaf,
                        query: offset + i,
                    });
                }
            }
        }
        found
    })
}

/// Fraction of `truth` present in `found`. 1.0 when `truth` is empty.
pub fn recall(found: &[Match], truth: &[Match]) -> f64 {
    if truth.is_empty() {
        return 1.0;
    }
    let found: HashSet<&Match> = found.iter().collect();
    let hits = truth.iter().filter(|m| found.contains(m)).count();
    hits as f64 / truth.len() as f64
}
