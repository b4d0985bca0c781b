//! Fixed-width binary feature descriptors and their bit-level metrics.
//!
//! A descriptor is a bit vector stored as `WORDS` 64-bit lanes. Two measures
//! are defined on it:
//!
//! - [`Descriptor::diff`]: symmetric Hamming distance, `popcount(a ^ b)`.
//! - [`Descriptor::error`]: asymmetric coverage error, `popcount(t & !c)`,
//!   the number of bits set in the target that the candidate does not cover.
//!
//! Tree nodes are OR-blends of their descendants, so an ancestor is a superset
//! of every leaf below it and its coverage error never exceeds the leaf's.
//! Index search prunes on coverage error for that reason.

#[cfg(test)]
mod tests;

/// Bits a lane is rotated by per rotation step.
pub const ROTATION_QUANTUM: u32 = 4;

/// Rotation steps in one full cycle of a 64-bit lane.
pub const MAX_ROTATIONS: usize = (u64::BITS / ROTATION_QUANTUM) as usize;

/// A fixed-width binary descriptor of `WORDS * 64` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor<const WORDS: usize = 4> {
    words: [u64; WORDS],
}

/// The 256-bit descriptor produced by the feature extractor.
pub type Descriptor256 = Descriptor<4>;

impl<const WORDS: usize> Default for Descriptor<WORDS> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const WORDS: usize> From<[u64; WORDS]> for Descriptor<WORDS> {
    fn from(words: [u64; WORDS]) -> Self {
        Self::from_words(words)
    }
}

impl<const WORDS: usize> Descriptor<WORDS> {
    /// Width in bits.
    pub const BITS: u32 = WORDS as u32 * u64::BITS;

    /// Descriptor with all bits cleared.
    #[inline]
    pub const fn zero() -> Self {
        Self { words: [0; WORDS] }
    }

    #[inline]
    pub const fn from_words(words: [u64; WORDS]) -> Self {
        Self { words }
    }

    #[inline]
    pub fn words(&self) -> &[u64; WORDS] {
        &self.words
    }

    /// Clears all bits.
    #[inline]
    pub fn clear(&mut self) {
        self.words = [0; WORDS];
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of set bits.
    #[inline]
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Bitwise OR of two descriptors.
    #[inline]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            words: std::array::from_fn(|i| self.words[i] | other.words[i]),
        }
    }

    /// Hamming distance: number of differing bits.
    #[inline]
    pub fn diff(&self, other: &Self) -> u32 {
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    /// Coverage error of `self` (target) against `candidate`: bits set in
    /// `self` that are clear in `candidate`.
    ///
    /// Zero whenever `candidate` is a superset of `self`.
    #[inline]
    pub fn error(&self, candidate: &Self) -> u32 {
        self.words
            .iter()
            .zip(candidate.words.iter())
            .map(|(t, c)| (t & !c).count_ones())
            .sum()
    }

    /// Rotates every 64-bit lane left by `step * ROTATION_QUANTUM` bits.
    ///
    /// Step 0 is the identity; steps wrap every [`MAX_ROTATIONS`].
    #[inline]
    pub fn rotated(&self, step: usize) -> Self {
        let shift = ((step % MAX_ROTATIONS) as u32) * ROTATION_QUANTUM;
        Self {
            words: std::array::from_fn(|i| self.words[i].rotate_left(shift)),
        }
    }

    /// Returns the zero descriptor if more than `max_bits` bits are set,
    /// otherwise `self` unchanged.
    ///
    /// Dense descriptors cover almost any target and would match everything.
    #[inline]
    pub fn clipped(&self, max_bits: u32) -> Self {
        if self.count_ones() > max_bits {
            Self::zero()
        } else {
            *self
        }
    }
}

/// Clears every descriptor with more than `max_bits` bits set.
///
/// Returns the number of descriptors cleared.
pub fn clip_descriptors<const WORDS: usize>(
    descriptors: &mut [Descriptor<WORDS>],
    max_bits: u32,
) -> usize {
    let mut clipped = 0;
    for d in descriptors.iter_mut() {
        if d.count_ones() > max_bits {
            d.clear();
            clipped += 1;
        }
    }
    clipped
}
