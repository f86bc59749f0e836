//! Throughput oriented HyperLogLog fixed at precision 14 which works directly
//! on pre-hashed 64-bit values.
//!
//! Registers live in a single 16 KiB dense array from the start, there is no
//! sparse phase and no mixing step. Not mergeable with [`crate::HyperLogLog`].

use std::fmt::{Debug, Formatter};

use crate::bias::PoissonBias;
use crate::formula::{cardinality, RegisterSum};
use crate::precision::Precision;
use crate::rank::rank_leading_zeros;

/// Number of registers
const M: usize = 1 << 14;
/// Number of low hash bits the rank is computed on
const BITS_FOR_RANK: u32 = 64 - 14;
/// Number of hashes processed per unrolled step
const LANES: usize = 4;

#[derive(Clone)]
pub struct HyperLogLog14 {
    registers: Box<[u8; M]>,
}

impl HyperLogLog14 {
    /// Creates new instance of `HyperLogLog14` with all registers set to zero
    #[inline]
    pub fn new() -> Self {
        Self {
            registers: Box::new([0; M]),
        }
    }

    /// Estimate number of distinct hashes in `hashes`
    pub fn count(hashes: &[u64]) -> u64 {
        let mut hll = Self::new();
        hll.insert_slice(hashes);
        hll.estimate()
    }

    /// Insert a single pre-hashed value
    #[inline]
    pub fn insert(&mut self, hash: u64) {
        let index = (hash >> BITS_FOR_RANK) as usize;
        let rank = rank_leading_zeros(hash, BITS_FOR_RANK);
        // SAFETY: `hash >> 50` is always below 2^14, the length of `registers`.
        let register = unsafe { self.registers.get_unchecked_mut(index) };
        if rank > *register {
            *register = rank;
        }
    }

    /// Insert all pre-hashed values of `hashes`
    #[inline]
    pub fn insert_slice(&mut self, hashes: &[u64]) {
        let chunks = hashes.chunks_exact(LANES);
        let remainder = chunks.remainder();
        for chunk in chunks {
            let ranks = [
                rank_leading_zeros(chunk[0], BITS_FOR_RANK),
                rank_leading_zeros(chunk[1], BITS_FOR_RANK),
                rank_leading_zeros(chunk[2], BITS_FOR_RANK),
                rank_leading_zeros(chunk[3], BITS_FOR_RANK),
            ];
            for (&hash, &rank) in chunk.iter().zip(ranks.iter()) {
                let index = (hash >> BITS_FOR_RANK) as usize;
                // SAFETY: `hash >> 50` is always below 2^14, the length of `registers`.
                let register = unsafe { self.registers.get_unchecked_mut(index) };
                *register = (*register).max(rank);
            }
        }
        for &hash in remainder {
            self.insert(hash);
        }
    }

    /// Return cardinality estimate
    pub fn estimate(&self) -> u64 {
        let sum: RegisterSum = self.registers.iter().copied().collect();
        cardinality(sum, Precision::FOURTEEN, &PoissonBias)
    }

    /// Reset all registers to zero
    #[inline]
    pub fn clear(&mut self) {
        self.registers.fill(0);
    }

    #[inline]
    pub fn registers(&self) -> &[u8] {
        &self.registers[..]
    }
}

impl Default for HyperLogLog14 {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for HyperLogLog14 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ estimate: {}, size: {} }}", self.estimate(), M)
    }
}
