use enum_dispatch::enum_dispatch;

use crate::bias::PoissonBias;
use crate::dense::Dense;
use crate::formula::{cardinality, RegisterSum};
use crate::precision::Precision;
use crate::sparse::Sparse;

/// Register representations supported by `HyperLogLog`
#[derive(Debug, Clone, PartialEq, Eq)]
#[enum_dispatch]
pub(crate) enum Representation {
    Sparse(Sparse),
    Dense(Dense),
}

/// Representation trait which must be implemented by all representations.
#[enum_dispatch(Representation)]
pub(crate) trait RepresentationTrait {
    /// Raise register `index` to `rank` if it is currently lower
    fn update(&mut self, index: u16, rank: u8);
    /// Rank held by register `index`, zero if never touched
    fn get(&self, index: u16) -> u8;
    /// Harmonic sum and zero count over all registers
    fn sum(&self) -> RegisterSum;
    fn precision(&self) -> Precision;
    fn size_of(&self) -> usize;
    fn estimate(&self) -> u64 {
        cardinality(self.sum(), self.precision(), &PoissonBias)
    }
    fn to_string(&self) -> String {
        format!("estimate: {}, size: {}", self.estimate(), self.size_of())
    }
}

impl Representation {
    /// Name of the representation variant
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Representation::Sparse(_) => "Sparse",
            Representation::Dense(_) => "Dense",
        }
    }
}
