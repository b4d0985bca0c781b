//! Builds both index kinds over synthetic sparse descriptors and reports
//! recall against the brute-force matcher.
//!
//! ```text
//! cargo run -p hips --example match_synthetic --release
//! RUST_LOG=hips=debug cargo run -p hips --example match_synthetic
//! ```

use std::time::Instant;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hips::{
    AgglomerativeIndex, Descriptor256, MAX_ROTATIONS, SearchConfig, Tree, TreeShape,
    clip_descriptors, linear, search_best_rotation,
};

const LEAVES: usize = 1024;
const KEEP_LEVELS: usize = 7;
const BITS_PER_DESCRIPTOR: u32 = 32;
const NOISE_BITS: u32 = 3;
const CLIP_BITS: u32 = 64;

fn sparse(rng: &mut StdRng, bits: u32) -> Descriptor256 {
    let mut words = [0u64; 4];
    for _ in 0..bits {
        let bit = rng.random_range(0..256u32);
        words[(bit / 64) as usize] |= 1 << (bit % 64);
    }
    Descriptor256::from_words(words)
}

/// Copy of `d` with extra bits set, rotated by `rotation` steps backwards so
/// that search rotation `rotation` restores it.
fn observe(rng: &mut StdRng, d: &Descriptor256, rotation: usize) -> Descriptor256 {
    let noisy = d.merge(&sparse(rng, NOISE_BITS));
    noisy.rotated(MAX_ROTATIONS - rotation)
}

fn main() -> Result<()> {
    common::setup_logging("info");

    let mut rng = StdRng::seed_from_u64(7);
    let mut reference: Vec<Descriptor256> = (0..LEAVES)
        .map(|_| sparse(&mut rng, BITS_PER_DESCRIPTOR))
        .collect();
    let clipped = clip_descriptors(&mut reference, CLIP_BITS);
    tracing::info!("Clipped {} dense reference descriptors", clipped);

    let rotation = 2;
    let queries: Vec<Descriptor256> = reference
        .iter()
        .step_by(3)
        .map(|d| observe(&mut rng, d, rotation))
        .collect();

    let config = SearchConfig {
        threshold: NOISE_BITS,
        rotations: 4,
        ..Default::default()
    };

    let start = Instant::now();
    let shape = TreeShape::new(LEAVES, KEEP_LEVELS)?;
    let tree = Tree::build(&reference, &shape)?;
    tracing::info!(
        "Built tree: {} nodes, {} roots in {:?}",
        tree.len(),
        shape.tree_roots(),
        start.elapsed()
    );

    let start = Instant::now();
    let best = search_best_rotation(&tree, &queries, &config);
    tracing::info!(
        "Best rotation {} with {} matches in {:?}",
        best.rotation,
        best.matches.len(),
        start.elapsed()
    );

    let restored: Vec<Descriptor256> = queries.iter().map(|q| q.rotated(best.rotation)).collect();
    let truth = linear::all_matches(&reference, &restored, config.threshold);
    let found = tree.search(&restored, &SearchConfig { rotations: 1, ..config.clone() });
    tracing::info!(
        "Tree recall {:.3} ({} found, {} expected)",
        linear::recall(&found, &truth),
        found.len(),
        truth.len()
    );

    let start = Instant::now();
    let index = AgglomerativeIndex::build(&reference)
        .ok_or_else(|| anyhow::anyhow!("no reference descriptors"))?;
    tracing::info!(
        "Built agglomerative index: {} nodes in {:?}",
        index.len(),
        start.elapsed()
    );

    let best_matches = index.best_matches(&restored, config.threshold + 1);
    let matched = best_matches.iter().filter(|m| m.is_some()).count();
    tracing::info!(
        "Agglomerative best match for {} of {} queries",
        matched,
        restored.len()
    );

    Ok(())
}
