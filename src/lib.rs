//! `fast-hyperloglog` estimates the number of distinct elements in a stream or dataset
//! using a fixed, small amount of memory and constant time per insertion.
//!
//! The crate provides a HyperLogLog estimator with an adaptive sparse/dense register store,
//! three interchangeable rank algorithms, bias correction blended with linear counting,
//! merging of estimators, and a versioned little-endian binary format.
//!
//! ```
//! use fast_hyperloglog::HyperLogLog;
//!
//! let mut hll = HyperLogLog::new(14).unwrap();
//! for name in ["Alice", "Bob", "Alice", "George Michael"] {
//!     hll.add(name);
//! }
//! assert_eq!(hll.count(), 3);
//!
//! let restored = HyperLogLog::from_bytes(&hll.to_bytes()).unwrap();
//! assert_eq!(restored.count(), 3);
//! ```
mod batch;
mod bias;
mod dense;
mod error;
mod estimator;
mod formula;
mod hash;
mod precision;
mod rank;
mod representation;
#[cfg(feature = "with_serde")]
mod serde;
mod serialization;
mod sparse;
mod store;

pub use batch::HyperLogLog14;
pub use bias::{BiasCorrection, NoBiasCorrection, PoissonBias};
pub use error::EstimatorError;
pub use estimator::HyperLogLog;
pub use formula::{alpha, linear_counting_threshold};
pub use hash::{fnv1a64, fnv1a64_utf16, mix64, LeNumeric, Mix};
pub use precision::{Precision, DEFAULT_PRECISION, MAX_PRECISION, MIN_PRECISION};
pub use rank::{rank_leading_zeros, rank_lookup, rank_loop, RankStrategy};
pub use serialization::{DATA_FORMAT_MAJOR_VERSION, DATA_FORMAT_MINOR_VERSION};
