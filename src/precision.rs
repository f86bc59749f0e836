//! Precision (bits per index) of a HyperLogLog estimator and the values derived from it.

use std::fmt::{Display, Formatter};

use crate::error::EstimatorError;

/// Smallest supported number of index bits
pub const MIN_PRECISION: u8 = 4;
/// Largest supported number of index bits (sparse indices are stored as `u16`)
pub const MAX_PRECISION: u8 = 16;
/// Precision used by `HyperLogLog::default()`
pub const DEFAULT_PRECISION: u8 = 14;

/// Validated number of hash bits used to select a register, in `[4..16]` range.
///
/// For large cardinalities the standard error is `1.04 / sqrt(2^b)` and the
/// dense representation uses `2^b` bytes:
/// - b = 4: ~26% error, 16 bytes
/// - b = 10: ~3.25% error, 1 KiB
/// - b = 14: ~0.81% error, 16 KiB
/// - b = 16: ~0.41% error, 64 KiB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Precision(u8);

impl Precision {
    /// Precision of [`crate::HyperLogLog14`]
    pub(crate) const FOURTEEN: Precision = Precision(14);

    /// Create precision, failing if `b` is outside of `[4..16]` range
    pub fn new(b: u8) -> Result<Self, EstimatorError> {
        if b < MIN_PRECISION || b > MAX_PRECISION {
            return Err(EstimatorError::InvalidPrecision(b));
        }
        Ok(Self(b))
    }

    /// Number of index bits
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Number of HyperLogLog registers, `m = 2^b`
    #[inline]
    pub const fn registers(self) -> usize {
        1 << self.0
    }

    /// Number of low hash bits the rank is computed on, `64 - b`
    #[inline]
    pub fn bits_for_rank(self) -> u32 {
        64 - u32::from(self.0)
    }

    /// Largest rank a register can hold
    #[inline]
    pub const fn max_rank(self) -> u8 {
        65 - self.0
    }

    /// Maximum number of entries held by the sparse representation.
    ///
    /// Each sparse entry costs roughly 15 bytes, so beyond `m / 15` the dense
    /// byte array is smaller. Zero means the sparse representation is never used.
    #[inline]
    pub const fn sparse_max_elements(self) -> usize {
        (self.registers() / 15).saturating_sub(10)
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self(DEFAULT_PRECISION)
    }
}

impl TryFrom<u8> for Precision {
    type Error = EstimatorError;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        Self::new(b)
    }
}

impl From<Precision> for u8 {
    fn from(p: Precision) -> Self {
        p.0
    }
}

impl Display for Precision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
