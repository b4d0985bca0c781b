//! Seeded synthetic descriptor batches.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::descriptor::{Descriptor, Descriptor256};

/// `n` descriptors with uniformly random bits (about half of them set).
pub fn random_descriptors(n: usize, seed: u64) -> Vec<Descriptor256> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| Descriptor::from_words(std::array::from_fn(|_| rng.random::<u64>())))
        .collect()
}

/// `n` descriptors with exactly `bits` bits set at random positions.
///
/// Sparse descriptors resemble real binary features after clipping and give
/// coverage-error searches a meaningful number of near misses.
pub fn sparse_descriptors(n: usize, bits: u32, seed: u64) -> Vec<Descriptor256> {
    assert!(bits <= Descriptor256::BITS);
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let mut words = [0u64; 4];
            let mut set = 0;
            while set < bits {
                let bit = rng.random_range(0..Descriptor256::BITS);
                let (word, mask) = ((bit / 64) as usize, 1u64 << (bit % 64));
                if words[word] & mask == 0 {
                    words[word] |= mask;
                    set += 1;
                }
            }
            Descriptor::from_words(words)
        })
        .collect()
}

/// Copy of `d` with `count` distinct random bits flipped.
pub fn flip_bits(d: &Descriptor256, count: u32, rng: &mut impl Rng) -> Descriptor256 {
    assert!(count <= Descriptor256::BITS);
    let mut words = *d.words();
    let mut flipped = [0u64; 4];
    let mut done = 0;
    while done < count {
        let bit = rng.random_range(0..Descriptor256::BITS);
        let (word, mask) = ((bit / 64) as usize, 1u64 << (bit % 64));
        if flipped[word] & mask == 0 {
            flipped[word] |= mask;
            words[word] ^= mask;
            done += 1;
        }
    }
    Descriptor::from_words(words)
}
