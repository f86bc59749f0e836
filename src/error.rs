//! Errors returned by fallible estimator operations.

use std::fmt;
use std::io;

use crate::precision::{MAX_PRECISION, MIN_PRECISION};

/// Estimator error
#[derive(Debug)]
pub enum EstimatorError {
    /// Precision (bits per index) outside of the supported range.
    InvalidPrecision(u8),
    /// Estimators with different register counts cannot be merged.
    PrecisionMismatch { left: u8, right: u8 },
    /// `merge_all` was called with no estimators.
    EmptyMerge,
    /// Serialized data was written by a newer, incompatible format version.
    UnsupportedVersion { major: u16, minor: u16 },
    /// Serialized data is structurally invalid.
    Malformed(String),
    /// Underlying reader or writer failed, including truncated input.
    Io(io::Error),
}

impl fmt::Display for EstimatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatorError::InvalidPrecision(b) => write!(
                f,
                "precision {} is out of range, legal range is {} <= b <= {}",
                b, MIN_PRECISION, MAX_PRECISION
            ),
            EstimatorError::PrecisionMismatch { left, right } => write!(
                f,
                "cannot merge estimators with different precisions ({} and {})",
                left, right
            ),
            EstimatorError::EmptyMerge => f.write_str("was asked to merge 0 estimators"),
            EstimatorError::UnsupportedVersion { major, minor } => write!(
                f,
                "incompatible data format, can't deserialize data version {}.{} (serializer version: {}.{})",
                major,
                minor,
                crate::serialization::DATA_FORMAT_MAJOR_VERSION,
                crate::serialization::DATA_FORMAT_MINOR_VERSION
            ),
            EstimatorError::Malformed(msg) => write!(f, "malformed data: {}", msg),
            EstimatorError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for EstimatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EstimatorError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for EstimatorError {
    fn from(err: io::Error) -> Self {
        EstimatorError::Io(err)
    }
}
