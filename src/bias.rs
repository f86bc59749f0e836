//! Correction of the raw HyperLogLog estimate at small cardinalities.
//!
//! The raw estimate `alpha * m^2 / sum(2^-R)` overestimates while many registers
//! are still empty. A [`BiasCorrection`] maps the raw estimate back to the
//! cardinality that would produce it on average. It is only consulted when the
//! raw estimate is at most `5 * m`.

use crate::formula::alpha;
use crate::precision::Precision;

/// Relative tolerance of the bisection in [`PoissonBias::correct`]
const TOLERANCE: f64 = 1e-12;
/// Upper bound on bisection steps; 2^-200 is far below f64 resolution
const MAX_STEPS: usize = 200;

/// Maps a raw estimate to a bias corrected estimate.
///
/// Implementations must be pure and non-decreasing in `raw` for a fixed precision.
pub trait BiasCorrection {
    fn correct(&self, raw: f64, precision: Precision) -> f64;
}

/// Identity correction, returns the raw estimate unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoBiasCorrection;

impl BiasCorrection for NoBiasCorrection {
    #[inline]
    fn correct(&self, raw: f64, _precision: Precision) -> f64 {
        raw
    }
}

/// Table-free correction which inverts the expected raw estimate under the
/// Poisson model of register occupancy.
///
/// With `n` distinct values spread over `m` registers, each register sees a
/// Poisson(`n / m`) number of hashes and `P(R <= k) = exp(-n / m * 2^-k)` for
/// every rank below the cap. The expected raw estimate `f(n)` is strictly
/// increasing, so the correction is the `n` solving `f(n) = raw`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoissonBias;

impl PoissonBias {
    /// Expected value of `2^-R` for a single register at load `lambda = n / m`
    fn expected_inverse_power(lambda: f64, bits_for_rank: u32) -> f64 {
        // sum over k of 2^-k * (P(R <= k) - P(R <= k - 1)), rearranged by parts
        let cap = bits_for_rank + 1;
        let mut weight = 0.5;
        let mut sum = 0.0;
        for k in 0..cap {
            sum += weight * (-lambda * 0.5f64.powi(k as i32)).exp();
            weight *= 0.5;
        }
        sum + 0.5f64.powi(cap as i32)
    }

    /// Expected raw estimate for `n` distinct values
    pub fn expected_raw(&self, n: f64, precision: Precision) -> f64 {
        let m = precision.registers() as f64;
        let inverse = Self::expected_inverse_power(n / m, precision.bits_for_rank());
        alpha(precision.registers()) * m / inverse
    }
}

impl BiasCorrection for PoissonBias {
    fn correct(&self, raw: f64, precision: Precision) -> f64 {
        let m = precision.registers() as f64;
        if raw.is_nan() || raw <= self.expected_raw(0.0, precision) {
            return 0.0;
        }

        let mut lo = 0.0;
        let mut hi = 8.0 * m;
        for _ in 0..MAX_STEPS {
            if self.expected_raw(hi, precision) >= raw || hi.is_infinite() {
                break;
            }
            lo = hi;
            hi *= 2.0;
        }

        for _ in 0..MAX_STEPS {
            if hi - lo <= TOLERANCE * hi {
                break;
            }
            let mid = lo + (hi - lo) / 2.0;
            if self.expected_raw(mid, precision) < raw {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo + (hi - lo) / 2.0
    }
}
