//! Chunked parallel iteration utilities.
//!
//! Wraps rayon's `par_chunks` so that each chunk owns its scratch state and
//! output buffer; the per-chunk outputs are concatenated in chunk order, which
//! keeps results deterministic regardless of scheduling.

use rayon::prelude::*;

/// Multiplier for number of chunks relative to CPU threads.
/// Using 2x threads provides good load balancing when some chunks finish faster.
const CHUNKS_PER_THREAD: usize = 2;

/// Compute the chunk size that splits `len` items into roughly
/// `num_threads * CHUNKS_PER_THREAD` chunks. Minimum of 1 item per chunk.
#[inline]
pub fn items_per_chunk(len: usize) -> usize {
    let num_chunks = rayon::current_num_threads() * CHUNKS_PER_THREAD;
    (len / num_chunks).max(1)
}

/// Runs `f(start_index, chunk)` over contiguous chunks of `items` in parallel
/// and concatenates the returned vectors in chunk order.
///
/// `start_index` is the position of the chunk's first element in `items`.
pub fn par_chunks_flat_map<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &[T]) -> Vec<R> + Sync + Send,
{
    if items.is_empty() {
        return Vec::new();
    }

    let chunk_size = items_per_chunk(items.len());

    let per_chunk: Vec<Vec<R>> = items
        .par_chunks(chunk_size)
        .enumerate()
        .map(|(chunk_idx, chunk)| f(chunk_idx * chunk_size, chunk))
        .collect();

    let total = per_chunk.iter().map(Vec::len).sum();
    let mut results = Vec::with_capacity(total);
    for chunk_results in per_chunk {
        results.extend(chunk_results);
    }
    results
}
