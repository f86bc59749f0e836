//! HyperLogLog counting formula shared by all estimators.
//!
//! Original HyperLogLog paper:
//! <https://algo.inria.fr/flajolet/Publications/FlFuGaMe07.pdf>

use crate::bias::BiasCorrection;
use crate::precision::Precision;

/// Linear counting thresholds for precisions 4 through 18.
const THRESHOLDS: [u64; 15] = [
    10, 20, 40, 80, 220, 400, 900, 1800, 3100, 6500, 11500, 20000, 50000, 120000, 350000,
];

/// `2^64` as `f64`, the fixed point scale of [`RegisterSum`]
const FIXED_POINT_ONE: f64 = 18_446_744_073_709_551_616.0;

/// Compute the `alpha` constant for `m` registers
#[inline]
pub fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / m as f64),
    }
}

/// Cardinality below which linear counting is preferred, for `b` in `[4..18]`.
/// Values of `b` outside that range are clamped to it.
#[inline]
pub fn linear_counting_threshold(b: u8) -> u64 {
    THRESHOLDS[usize::from(b.clamp(4, 18) - 4)]
}

/// Harmonic register sum `sum(2^-R)` and number of zero registers.
///
/// The sum is accumulated exactly as a 64.64 fixed point integer, so it does
/// not depend on the order registers are visited in or on the representation
/// they are stored in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterSum {
    fixed: u128,
    zeros: usize,
}

impl RegisterSum {
    /// Account for one register holding `rank`
    #[inline]
    pub fn add(&mut self, rank: u8) {
        if rank == 0 {
            self.zeros += 1;
        }
        self.fixed += 1u128 << (64 - u32::from(rank));
    }

    /// Account for `count` registers holding zero
    #[inline]
    pub fn add_zeros(&mut self, count: usize) {
        self.zeros += count;
        self.fixed += (count as u128) << 64;
    }

    /// Number of zero registers
    #[inline]
    pub fn zeros(&self) -> usize {
        self.zeros
    }

    /// Harmonic sum as a float
    #[inline]
    pub fn harmonic(&self) -> f64 {
        self.fixed as f64 / FIXED_POINT_ONE
    }
}

impl FromIterator<u8> for RegisterSum {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut sum = RegisterSum::default();
        for rank in iter {
            sum.add(rank);
        }
        sum
    }
}

/// Estimate cardinality from the register sum of an estimator with `precision`.
pub fn cardinality<B>(sum: RegisterSum, precision: Precision, bias: &B) -> u64
where
    B: BiasCorrection + ?Sized,
{
    let registers = precision.registers();
    let m = registers as f64;

    let mut estimate = alpha(registers) * m * m / sum.harmonic();
    if estimate <= 5.0 * m {
        estimate = bias.correct(estimate, precision);
    }

    let linear = if sum.zeros() > 0 {
        m * (m / sum.zeros() as f64).ln()
    } else {
        estimate
    };

    let threshold = linear_counting_threshold(precision.bits()) as f64;
    let result = if linear <= threshold { linear } else { estimate };
    result.round() as u64
}
