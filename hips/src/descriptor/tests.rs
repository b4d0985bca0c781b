//! Tests for descriptor bit operations.

use super::*;
use crate::testing::synthetic::random_descriptors;

#[test]
fn test_zero_and_clear() {
    let mut d = Descriptor256::from_words([1, 2, 3, 4]);
    assert!(!d.is_zero());
    d.clear();
    assert!(d.is_zero());
    assert_eq!(d, Descriptor256::zero());
    assert_eq!(d, Descriptor256::default());
    assert_eq!(d.count_ones(), 0);
}

#[test]
fn test_bits_constant() {
    assert_eq!(Descriptor256::BITS, 256);
    assert_eq!(Descriptor::<1>::BITS, 64);
    assert_eq!(Descriptor::<8>::BITS, 512);
}

#[test]
fn test_merge_is_or() {
    let a = Descriptor256::from_words([0b1010, 0, u64::MAX, 1]);
    let b = Descriptor256::from_words([0b0110, 7, 0, 1 << 63]);
    let c = a.merge(&b);
    assert_eq!(c.words(), &[0b1110, 7, u64::MAX, (1 << 63) | 1]);
}

#[test]
fn test_merge_commutative_and_idempotent() {
    for pair in random_descriptors(64, 1).chunks(2) {
        let (a, b) = (pair[0], pair[1]);
        assert_eq!(a.merge(&b), b.merge(&a));
        assert_eq!(a.merge(&a), a);
    }
}

#[test]
fn test_diff_self_is_zero() {
    for d in random_descriptors(32, 2) {
        assert_eq!(d.diff(&d), 0);
    }
}

#[test]
fn test_diff_symmetric() {
    let ds = random_descriptors(32, 3);
    for a in &ds {
        for b in &ds {
            assert_eq!(a.diff(b), b.diff(a));
        }
    }
}

#[test]
fn test_diff_counts_differing_bits() {
    let a = Descriptor256::from_words([0b1111, 0, 0, 0]);
    let b = Descriptor256::from_words([0b0011, 0, 0, 1]);
    assert_eq!(a.diff(&b), 3);
}

#[test]
fn test_error_is_asymmetric() {
    // a has 4 bits, b covers 2 of them and adds 1 of its own.
    let a = Descriptor256::from_words([0b1111, 0, 0, 0]);
    let b = Descriptor256::from_words([0b1_0011, 0, 0, 0]);
    assert_eq!(a.error(&b), 2);
    assert_eq!(b.error(&a), 1);
}

#[test]
fn test_error_zero_against_merge() {
    let ds = random_descriptors(64, 4);
    for pair in ds.chunks(2) {
        let (a, b) = (pair[0], pair[1]);
        let m = a.merge(&b);
        assert_eq!(a.error(&m), 0);
        assert_eq!(b.error(&m), 0);
    }
}

#[test]
fn test_error_zero_target_always_covered() {
    let zero = Descriptor256::zero();
    for d in random_descriptors(8, 5) {
        assert_eq!(zero.error(&d), 0);
        assert_eq!(d.error(&zero), d.count_ones());
    }
}

#[test]
fn test_rotation_identity_and_cycle() {
    for d in random_descriptors(16, 6) {
        assert_eq!(d.rotated(0), d);
        assert_eq!(d.rotated(MAX_ROTATIONS), d);
        assert_eq!(d.rotated(3).rotated(MAX_ROTATIONS - 3), d);
    }
}

#[test]
fn test_rotation_per_lane() {
    let d = Descriptor256::from_words([1, 1 << 63, 0xF, 0]);
    let r = d.rotated(1);
    assert_eq!(r.words(), &[1 << 4, 1 << 3, 0xF0, 0]);
}

#[test]
fn test_rotation_preserves_population() {
    for d in random_descriptors(16, 7) {
        for step in 0..MAX_ROTATIONS {
            assert_eq!(d.rotated(step).count_ones(), d.count_ones());
        }
    }
}

#[test]
fn test_max_rotations() {
    assert_eq!(MAX_ROTATIONS, 16);
}

#[test]
fn test_clipped() {
    let sparse = Descriptor256::from_words([0b111, 0, 0, 0]);
    let dense = Descriptor256::from_words([u64::MAX, 0, 0, 0]);
    assert_eq!(sparse.clipped(3), sparse);
    assert_eq!(sparse.clipped(2), Descriptor256::zero());
    assert_eq!(dense.clipped(100), dense);
    assert!(dense.clipped(63).is_zero());
}

#[test]
fn test_clip_descriptors_counts() {
    let mut ds = vec![
        Descriptor256::from_words([0b1, 0, 0, 0]),
        Descriptor256::from_words([u64::MAX, u64::MAX, 0, 0]),
        Descriptor256::from_words([0b11, 0, 0, 0]),
        Descriptor256::from_words([u64::MAX; 4]),
    ];
    let clipped = clip_descriptors(&mut ds, 2);
    assert_eq!(clipped, 2);
    assert_eq!(ds[0].count_ones(), 1);
    assert!(ds[1].is_zero());
    assert_eq!(ds[2].count_ones(), 2);
    assert!(ds[3].is_zero());
}
