//! HyperLogLog cardinality estimator which allows to estimate number of distinct
//! elements in a stream or dataset using `2^b` registers, where the precision
//! `b` is in `[4..16]` range.
//!
//! # Data-structure design rationale
//!
//! ## Low memory footprint
//! The estimator starts with a sparse representation which holds only touched
//! registers, and switches to a dense byte array once the sparse one would be
//! larger. For b = 14 the sparse representation holds up to 1082 registers,
//! the dense one uses 16 KiB.
//!
//! ## Low latency
//! - Hashes are mixed with a single avalanche round (numbers) or FNV-1a (bytes).
//! - Ranks are computed with the fastest [`RankStrategy`] the CPU supports.
//!
//! ## High accuracy
//! - For small cardinality range linear counting is used.
//! - The raw estimate is bias corrected below `5 * 2^b`.
//! - Expected error:
//!   b = 10: 1.04 / sqrt(2^10) = 3.25%
//!   b = 12: 1.04 / sqrt(2^12) = 1.62%
//!   b = 14: 1.04 / sqrt(2^14) = 0.81%
//!   b = 16: 1.04 / sqrt(2^16) = 0.41%

use std::fmt::{Debug, Formatter};
use std::io::{ErrorKind, Read};

use crate::bias::{BiasCorrection, PoissonBias};
use crate::error::EstimatorError;
use crate::formula::cardinality;
use crate::hash::{LeNumeric, Mix};
use crate::precision::Precision;
use crate::rank::RankStrategy;
use crate::representation::RepresentationTrait;
use crate::store::RegisterStore;

/// Size of the buffer used by `add_le_reader`, a multiple of every `LeNumeric` width
const READ_BUFFER_SIZE: usize = 1024;

#[derive(Clone)]
pub struct HyperLogLog {
    pub(crate) store: RegisterStore,
    pub(crate) additions: u64,
    rank_strategy: RankStrategy,
}

impl HyperLogLog {
    /// Creates new instance of `HyperLogLog` with `b` index bits
    #[inline]
    pub fn new(b: u8) -> Result<Self, EstimatorError> {
        Ok(Self::with_precision(Precision::new(b)?))
    }

    /// Creates new instance of `HyperLogLog` with validated precision
    #[inline]
    pub fn with_precision(precision: Precision) -> Self {
        Self::with_rank_strategy(precision, RankStrategy::detect())
    }

    /// Creates new instance of `HyperLogLog` using a specific rank algorithm
    #[inline]
    pub fn with_rank_strategy(precision: Precision, rank_strategy: RankStrategy) -> Self {
        Self {
            store: RegisterStore::new(precision),
            additions: 0,
            rank_strategy,
        }
    }

    /// Create estimator around an already populated store
    pub(crate) fn from_store(store: RegisterStore, additions: u64) -> Self {
        Self {
            store,
            additions,
            rank_strategy: RankStrategy::detect(),
        }
    }

    /// Insert a value into `HyperLogLog`
    #[inline]
    pub fn add<T: Mix + ?Sized>(&mut self, value: &T) {
        self.add_hash(value.mix());
    }

    /// Insert an already mixed 64-bit hash into `HyperLogLog`
    #[inline]
    pub fn add_hash(&mut self, hash: u64) {
        let bits_for_rank = self.store.precision().bits_for_rank();
        // precision is at most 16 bits, so the index always fits
        let index = (hash >> bits_for_rank) as u16;
        let rank = self.rank_strategy.rank(hash, bits_for_rank);
        self.store.update(index, rank);
        self.additions = self.additions.saturating_add(1);
    }

    /// Insert every value of `values`
    #[inline]
    pub fn bulk_add<T: Mix>(&mut self, values: &[T]) {
        for value in values {
            self.add(value);
        }
    }

    /// Insert every little-endian `T` packed in `bytes`, ignoring a trailing partial value
    pub fn add_le_bytes<T: LeNumeric>(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks_exact(T::WIDTH) {
            self.add(&T::read_le(chunk));
        }
    }

    /// Insert every little-endian `T` read from `reader` until end of stream.
    /// A trailing partial value is ignored.
    pub fn add_le_reader<T: LeNumeric, R: Read>(
        &mut self,
        mut reader: R,
    ) -> Result<(), EstimatorError> {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let mut filled = 0;
        loop {
            let n = match reader.read(&mut buf[filled..]) {
                Ok(0) => return Ok(()),
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            filled += n;
            let whole = filled - filled % T::WIDTH;
            self.add_le_bytes::<T>(&buf[..whole]);
            // carry the partial value over to the next read
            buf.copy_within(whole..filled, 0);
            filled -= whole;
        }
    }

    /// Return cardinality estimate
    #[inline]
    pub fn count(&self) -> u64 {
        self.count_with(&PoissonBias)
    }

    /// Return cardinality estimate using a custom bias correction
    pub fn count_with<B: BiasCorrection + ?Sized>(&self, bias: &B) -> u64 {
        cardinality(self.store.sum(), self.store.precision(), bias)
    }

    /// Merge `rhs` into `self`. Fails without modifying `self` if precisions differ.
    pub fn merge(&mut self, rhs: &HyperLogLog) -> Result<(), EstimatorError> {
        check_precision(self.precision(), rhs.precision())?;
        self.store.merge(&rhs.store);
        self.additions = self.additions.saturating_add(rhs.additions);
        Ok(())
    }

    /// Merge all `estimators` into a new estimator.
    /// Precisions are all validated before any merging takes place.
    pub fn merge_all(estimators: &[&HyperLogLog]) -> Result<HyperLogLog, EstimatorError> {
        let (first, rest) = estimators.split_first().ok_or(EstimatorError::EmptyMerge)?;
        for estimator in rest {
            check_precision(first.precision(), estimator.precision())?;
        }
        let mut merged = (*first).clone();
        for estimator in rest {
            merged.merge(estimator)?;
        }
        Ok(merged)
    }

    /// Reset to an empty estimator with the same precision
    pub fn clear(&mut self) {
        self.store = RegisterStore::new(self.store.precision());
        self.additions = 0;
    }

    /// Number of values inserted, including duplicates and merged estimators
    #[inline]
    pub fn additions(&self) -> u64 {
        self.additions
    }

    #[inline]
    pub fn precision(&self) -> Precision {
        self.store.precision()
    }

    #[inline]
    pub fn rank_strategy(&self) -> RankStrategy {
        self.rank_strategy
    }

    /// Whether registers are held in the sparse representation
    #[inline]
    pub fn is_sparse(&self) -> bool {
        self.store.is_sparse()
    }

    /// Rank held by register `index`, `None` if `index` is not below `2^b`
    #[inline]
    pub fn register(&self, index: usize) -> Option<u8> {
        let index = u16::try_from(index).ok()?;
        if usize::from(index) >= self.precision().registers() {
            return None;
        }
        Some(self.store.get(index))
    }

    /// Snapshot of all `2^b` registers
    pub fn registers(&self) -> Vec<u8> {
        self.store.registers()
    }

    /// Return memory size of `HyperLogLog`
    pub fn size_of(&self) -> usize {
        std::mem::size_of::<Self>() - std::mem::size_of::<RegisterStore>() + self.store.size_of()
    }
}

fn check_precision(left: Precision, right: Precision) -> Result<(), EstimatorError> {
    if left != right {
        return Err(EstimatorError::PrecisionMismatch {
            left: left.bits(),
            right: right.bits(),
        });
    }
    Ok(())
}

impl Default for HyperLogLog {
    /// Creates new instance of `HyperLogLog` with default precision 14
    #[inline]
    fn default() -> Self {
        Self::with_precision(Precision::default())
    }
}

impl PartialEq for HyperLogLog {
    /// Estimators are equal when their registers, representation and additions are.
    /// The rank strategy does not affect results and is ignored.
    fn eq(&self, rhs: &Self) -> bool {
        self.store == rhs.store && self.additions == rhs.additions
    }
}

impl Eq for HyperLogLog {}

impl Debug for HyperLogLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let repr = self.store.representation();
        write!(f, "{{ representation: {}, {} }}", repr.name(), repr.to_string())
    }
}
