//! Rank of a hash: one plus the number of leading zeros in the `bits_for_rank`
//! low bits of the hash (the bits not used as register index).
//!
//! Three interchangeable implementations are provided:
//! - [`rank_loop`] scans bit by bit and serves as the reference implementation,
//! - [`rank_lookup`] resolves the top 9 rank bits with a precomputed table and
//!   only falls back to scanning when they are all zero (~0.2% of uniform hashes),
//! - [`rank_leading_zeros`] uses the `leading_zeros` intrinsic (`lzcnt` / `clz`).
//!
//! All three return identical results for every 64-bit input and every
//! `bits_for_rank` in `[48..60]`, the range produced by precisions `[4..16]`.

use std::ops::RangeInclusive;
use std::sync::OnceLock;

/// Supported `bits_for_rank` values
const BITS_FOR_RANK: RangeInclusive<u32> = 48..=60;

/// Number of high rank bits resolved by the lookup table
const WINDOW_BITS: u32 = 9;

/// `WINDOW[w]` is one plus the number of leading zeros of the 9-bit value `w`.
static WINDOW: [u8; 1 << WINDOW_BITS] = build_window();

const fn build_window() -> [u8; 1 << WINDOW_BITS] {
    let mut table = [0u8; 1 << WINDOW_BITS];
    // all-zero window is never looked up, but keep it consistent
    table[0] = WINDOW_BITS as u8 + 1;
    let mut w = 1;
    while w < table.len() {
        let mut zeros = 0;
        while w & (1 << (WINDOW_BITS - 1 - zeros)) == 0 {
            zeros += 1;
        }
        table[w] = zeros as u8 + 1;
        w += 1;
    }
    table
}

#[inline]
fn check_bits_for_rank(bits_for_rank: u32) {
    debug_assert!(
        BITS_FOR_RANK.contains(&bits_for_rank),
        "bits_for_rank {bits_for_rank} outside {BITS_FOR_RANK:?}"
    );
}

/// Rank computed by scanning bits from `bits_for_rank - 1` down to 0
///
/// # Panics
/// In debug builds, if `bits_for_rank` is outside `[48..60]`.
#[inline]
pub fn rank_loop(hash: u64, bits_for_rank: u32) -> u8 {
    check_bits_for_rank(bits_for_rank);
    scan(hash, bits_for_rank)
}

#[inline]
fn scan(hash: u64, bits_for_rank: u32) -> u8 {
    let mut rank = 1;
    for j in (0..bits_for_rank).rev() {
        if (hash >> j) & 1 != 0 {
            break;
        }
        rank += 1;
    }
    rank
}

/// Rank computed with a 9-bit window lookup table
///
/// # Panics
/// In debug builds, if `bits_for_rank` is outside `[48..60]`.
#[inline]
pub fn rank_lookup(hash: u64, bits_for_rank: u32) -> u8 {
    check_bits_for_rank(bits_for_rank);
    let window = (hash << (64 - bits_for_rank)) >> (64 - WINDOW_BITS);
    if window != 0 {
        return WINDOW[window as usize];
    }
    WINDOW_BITS as u8 + scan(hash, bits_for_rank - WINDOW_BITS)
}

/// Rank computed with the hardware leading zero count
///
/// # Panics
/// In debug builds, if `bits_for_rank` is outside `[48..60]`.
#[inline]
pub fn rank_leading_zeros(hash: u64, bits_for_rank: u32) -> u8 {
    check_bits_for_rank(bits_for_rank);
    let index_bits = 64 - bits_for_rank;
    // sentinel bit caps the count at `bits_for_rank` when all rank bits are zero
    let w = (hash << index_bits) | (1 << (index_bits - 1));
    w.leading_zeros() as u8 + 1
}

/// Algorithm used to compute hash ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankStrategy {
    Loop,
    Lookup,
    LeadingZeros,
}

static DETECTED: OnceLock<RankStrategy> = OnceLock::new();

#[cfg(target_arch = "x86_64")]
fn detect_uncached() -> RankStrategy {
    if is_x86_feature_detected!("lzcnt") {
        RankStrategy::LeadingZeros
    } else {
        RankStrategy::Lookup
    }
}

#[cfg(target_arch = "aarch64")]
fn detect_uncached() -> RankStrategy {
    RankStrategy::LeadingZeros
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect_uncached() -> RankStrategy {
    RankStrategy::Lookup
}

impl RankStrategy {
    /// Fastest strategy supported by the running CPU, detected once per process
    pub fn detect() -> Self {
        *DETECTED.get_or_init(detect_uncached)
    }

    /// Compute the rank of `hash` with this strategy
    #[inline]
    pub fn rank(self, hash: u64, bits_for_rank: u32) -> u8 {
        match self {
            RankStrategy::Loop => rank_loop(hash, bits_for_rank),
            RankStrategy::Lookup => rank_lookup(hash, bits_for_rank),
            RankStrategy::LeadingZeros => rank_leading_zeros(hash, bits_for_rank),
        }
    }
}

impl Default for RankStrategy {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use test_case::test_case;

    // 64 - 14 = 50 rank bits
    #[test_case(0 => 51)]
    #[test_case(1 => 50)]
    #[test_case(8 => 47)]
    #[test_case((1 << 50) - 1 => 1)]
    #[test_case(1 << 49 => 1)]
    #[test_case(1 << 48 => 2)]
    #[test_case(1 << 50 => 51; "index bit only")]
    #[test_case(u64::MAX => 1)]
    fn test_rank_loop_b14(hash: u64) -> u8 {
        rank_loop(hash, 50)
    }

    #[test]
    fn test_window_table() {
        assert_eq!(WINDOW[1], 9);
        assert_eq!(WINDOW[2], 8);
        assert_eq!(WINDOW[3], 8);
        assert_eq!(WINDOW[255], 2);
        assert_eq!(WINDOW[256], 1);
        assert_eq!(WINDOW[511], 1);
    }

    fn assert_equivalent(hash: u64, bits_for_rank: u32) {
        let expected = rank_loop(hash, bits_for_rank);
        assert_eq!(
            rank_lookup(hash, bits_for_rank),
            expected,
            "lookup: hash={hash:#x} bits={bits_for_rank}"
        );
        assert_eq!(
            rank_leading_zeros(hash, bits_for_rank),
            expected,
            "leading_zeros: hash={hash:#x} bits={bits_for_rank}"
        );
    }

    #[test]
    fn test_equivalence_edge_hashes() {
        for b in 4..=16u32 {
            let bits_for_rank = 64 - b;
            for &base in &[0u64, u64::MAX, 0xffff_0000_0000_0000] {
                assert_equivalent(base, bits_for_rank);
                for k in 0..64 {
                    assert_equivalent(base ^ (1 << k), bits_for_rank);
                    assert_equivalent(1 << k, bits_for_rank);
                    assert_equivalent((1u64 << k).wrapping_sub(1), bits_for_rank);
                }
            }
        }
    }

    #[test]
    fn test_equivalence_random_hashes() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for b in 4..=16u32 {
            for _ in 0..20_000 {
                let hash: u64 = rng.gen();
                assert_equivalent(hash, 64 - b);
                // bias towards long zero runs to exercise the lookup fallback
                let shift = rng.gen_range(0..64);
                assert_equivalent(hash >> shift, 64 - b);
            }
        }
    }

    #[test_case(RankStrategy::Loop)]
    #[test_case(RankStrategy::Lookup)]
    #[test_case(RankStrategy::LeadingZeros)]
    fn test_strategy_dispatch(strategy: RankStrategy) {
        assert_eq!(strategy.rank(0, 50), 51);
        assert_eq!(strategy.rank(1 << 40, 50), 10);
    }

    #[cfg(debug_assertions)]
    #[test_case(RankStrategy::Loop, 65 => panics "outside")]
    #[test_case(RankStrategy::Lookup, 5 => panics "outside")]
    #[test_case(RankStrategy::LeadingZeros, 64 => panics "outside")]
    #[test_case(RankStrategy::LeadingZeros, 47 => panics "outside")]
    fn test_unsupported_bits_for_rank(strategy: RankStrategy, bits_for_rank: u32) {
        strategy.rank(u64::MAX, bits_for_rank);
    }

    #[test]
    fn test_detect_is_stable() {
        assert_eq!(RankStrategy::detect(), RankStrategy::detect());
        assert_ne!(RankStrategy::detect(), RankStrategy::Loop);
    }
}
