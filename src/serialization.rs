//! # Binary serialization of `HyperLogLog`
//!
//! All fields are little-endian:
//!
//! - `u16` major version, `u16` minor version
//! - `i32` precision
//! - `u8` flags: bit 0 marks legacy direct-count data, bit 1 marks sparse data
//! - body, one of:
//!   - direct count: `i32` count, then `count` raw `u64` hashes
//!   - sparse: `i32` count, then `count` pairs of `u16` register index and `u8` rank
//!   - dense: `i32` length, then `length` register bytes
//! - `u64` number of additions, present since version 2.1
//!
//! Direct-count data is only read, never written. Bytes following the known
//! fields are ignored, so data written by newer minor versions stays readable.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::dense::Dense;
use crate::error::EstimatorError;
use crate::estimator::HyperLogLog;
use crate::precision::Precision;
use crate::representation::Representation;
use crate::store::RegisterStore;

pub const DATA_FORMAT_MAJOR_VERSION: u16 = 2;
pub const DATA_FORMAT_MINOR_VERSION: u16 = 1;

const FLAG_DIRECT_COUNT: u8 = 0b01;
const FLAG_SPARSE: u8 = 0b10;

/// Upper bound on capacity reserved up front for direct-count hashes
const MAX_PREALLOCATED_HASHES: usize = 1 << 16;

impl HyperLogLog {
    /// Serialize into `writer` using the current data format version
    pub fn serialize_into<W: Write>(&self, mut writer: W) -> Result<(), EstimatorError> {
        writer.write_u16::<LittleEndian>(DATA_FORMAT_MAJOR_VERSION)?;
        writer.write_u16::<LittleEndian>(DATA_FORMAT_MINOR_VERSION)?;
        writer.write_i32::<LittleEndian>(i32::from(self.precision().bits()))?;

        match self.store.representation() {
            Representation::Sparse(sparse) => {
                writer.write_u8(FLAG_SPARSE)?;
                writer.write_i32::<LittleEndian>(encode_len(sparse.len())?)?;
                for (&index, &rank) in sparse.entries() {
                    writer.write_u16::<LittleEndian>(index)?;
                    writer.write_u8(rank)?;
                }
            }
            Representation::Dense(dense) => {
                writer.write_u8(0)?;
                writer.write_i32::<LittleEndian>(encode_len(dense.registers().len())?)?;
                writer.write_all(dense.registers())?;
            }
        }

        writer.write_u64::<LittleEndian>(self.additions)?;
        Ok(())
    }

    /// Serialize into a new byte vector
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.serialize_into(&mut bytes)
            .expect("writing into a Vec<u8> never fails");
        bytes
    }

    /// Deserialize from `reader`, accepting any data format up to the current major version
    pub fn deserialize_from<R: Read>(mut reader: R) -> Result<Self, EstimatorError> {
        let major = reader.read_u16::<LittleEndian>()?;
        let minor = reader.read_u16::<LittleEndian>()?;
        if major > DATA_FORMAT_MAJOR_VERSION {
            return Err(EstimatorError::UnsupportedVersion { major, minor });
        }

        let bits = reader.read_i32::<LittleEndian>()?;
        let b = u8::try_from(bits)
            .map_err(|_| EstimatorError::Malformed(format!("precision {} is not a byte", bits)))?;
        let precision = Precision::new(b)?;
        let flags = reader.read_u8()?;

        let store = if flags & FLAG_DIRECT_COUNT != 0 {
            read_direct_count(&mut reader, precision)?
        } else if flags & FLAG_SPARSE != 0 {
            read_sparse(&mut reader, precision)?
        } else {
            read_dense(&mut reader, precision)?
        };

        let additions = if major >= 2 && minor >= 1 {
            reader.read_u64::<LittleEndian>()?
        } else {
            0
        };

        Ok(HyperLogLog::from_store(store, additions))
    }

    /// Deserialize from a byte slice, see [`HyperLogLog::deserialize_from`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EstimatorError> {
        Self::deserialize_from(bytes)
    }
}

fn encode_len(len: usize) -> Result<i32, EstimatorError> {
    i32::try_from(len).map_err(|_| EstimatorError::Malformed(format!("length {} overflows i32", len)))
}

fn read_len<R: Read>(reader: &mut R) -> Result<usize, EstimatorError> {
    let len = reader.read_i32::<LittleEndian>()?;
    usize::try_from(len).map_err(|_| EstimatorError::Malformed(format!("negative length {}", len)))
}

fn read_direct_count<R: Read>(
    reader: &mut R,
    precision: Precision,
) -> Result<RegisterStore, EstimatorError> {
    let count = read_len(reader)?;
    let mut hashes = Vec::with_capacity(count.min(MAX_PREALLOCATED_HASHES));
    for _ in 0..count {
        hashes.push(reader.read_u64::<LittleEndian>()?);
    }

    let mut estimator = HyperLogLog::with_precision(precision);
    for hash in hashes {
        estimator.add_hash(hash);
    }
    Ok(estimator.store)
}

fn read_sparse<R: Read>(
    reader: &mut R,
    precision: Precision,
) -> Result<RegisterStore, EstimatorError> {
    let count = read_len(reader)?;
    if count > precision.registers() {
        return Err(EstimatorError::Malformed(format!(
            "{} sparse entries exceed {} registers",
            count,
            precision.registers()
        )));
    }

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let index = reader.read_u16::<LittleEndian>()?;
        let rank = reader.read_u8()?;
        if usize::from(index) >= precision.registers() {
            return Err(EstimatorError::Malformed(format!(
                "register index {} out of range for precision {}",
                index, precision
            )));
        }
        check_rank(rank, precision)?;
        entries.push((index, rank));
    }

    let mut store = RegisterStore::new(precision);
    for (index, rank) in entries {
        store.update(index, rank);
    }
    Ok(store)
}

fn read_dense<R: Read>(
    reader: &mut R,
    precision: Precision,
) -> Result<RegisterStore, EstimatorError> {
    let len = read_len(reader)?;
    if len != precision.registers() {
        return Err(EstimatorError::Malformed(format!(
            "dense length {} does not match {} registers",
            len,
            precision.registers()
        )));
    }

    let mut registers = vec![0; len].into_boxed_slice();
    reader.read_exact(&mut registers)?;
    for &rank in registers.iter() {
        check_rank(rank, precision)?;
    }
    Ok(RegisterStore::from_dense(Dense::from_registers(
        precision, registers,
    )))
}

fn check_rank(rank: u8, precision: Precision) -> Result<(), EstimatorError> {
    if rank > precision.max_rank() {
        return Err(EstimatorError::Malformed(format!(
            "rank {} exceeds maximum {} for precision {}",
            rank,
            precision.max_rank(),
            precision
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn estimator(b: u8, n: u64) -> HyperLogLog {
        let mut hll = HyperLogLog::new(b).unwrap();
        for i in 0..n {
            hll.add(&i);
        }
        hll
    }

    #[test_case(14, 0; "empty")]
    #[test_case(14, 100; "sparse")]
    #[test_case(14, 100_000; "dense")]
    #[test_case(4, 10; "dense from start")]
    #[test_case(16, 4000; "sparse max precision")]
    fn test_round_trip(b: u8, n: u64) {
        let original = estimator(b, n);
        let bytes = original.to_bytes();
        let restored = HyperLogLog::from_bytes(&bytes).unwrap();

        assert_eq!(restored, original);
        assert_eq!(restored.is_sparse(), original.is_sparse());
        assert_eq!(restored.registers(), original.registers());
        assert_eq!(restored.additions(), n);
        assert_eq!(restored.count(), original.count());
        assert_eq!(restored.to_bytes(), bytes);
    }

    #[test]
    fn test_layout_sparse() {
        let mut hll = HyperLogLog::new(10).unwrap();
        hll.add_hash(0x0040_0000_0000_0001);
        hll.add_hash(0);
        assert_eq!(
            hll.to_bytes(),
            vec![
                2, 0, 1, 0, // version 2.1
                10, 0, 0, 0, // precision
                0b10, // sparse
                2, 0, 0, 0, // entries
                0, 0, 55, // index 0, rank 55
                1, 0, 54, // index 1, rank 54
                2, 0, 0, 0, 0, 0, 0, 0, // additions
            ]
        );
    }

    #[test]
    fn test_layout_dense() {
        let mut hll = HyperLogLog::new(4).unwrap();
        hll.add_hash(0xf000_0000_0000_0000 | (1 << 59));
        let bytes = hll.to_bytes();
        assert_eq!(&bytes[..9], &[2, 0, 1, 0, 4, 0, 0, 0, 0]);
        assert_eq!(&bytes[9..13], &[16, 0, 0, 0]);
        assert_eq!(&bytes[13..28], &[0; 15]);
        assert_eq!(bytes[28], 1);
        assert_eq!(&bytes[29..], &[1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_deterministic() {
        let mut forward = HyperLogLog::new(12).unwrap();
        let mut backward = HyperLogLog::new(12).unwrap();
        for i in 0..50u32 {
            forward.add(&i);
            backward.add(&(49 - i));
        }
        assert_eq!(forward.to_bytes(), backward.to_bytes());
    }

    #[test]
    fn test_newer_major_version() {
        let mut bytes = estimator(14, 10).to_bytes();
        bytes[0] = 3;
        assert!(matches!(
            HyperLogLog::from_bytes(&bytes),
            Err(EstimatorError::UnsupportedVersion { major: 3, minor: 1 })
        ));
    }

    #[test]
    fn test_newer_minor_version_with_trailing_bytes() {
        let original = estimator(14, 10);
        let mut bytes = original.to_bytes();
        bytes[2] = 7;
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(HyperLogLog::from_bytes(&bytes).unwrap(), original);
    }

    #[test]
    fn test_version_without_additions() {
        let original = estimator(14, 10);
        let mut bytes = original.to_bytes();
        bytes[2] = 0;
        bytes.truncate(bytes.len() - 8);
        let restored = HyperLogLog::from_bytes(&bytes).unwrap();
        assert_eq!(restored.additions(), 0);
        assert_eq!(restored.registers(), original.registers());
        assert_eq!(restored.count(), original.count());
    }

    #[test]
    fn test_direct_count() {
        let hashes: Vec<u64> = (0..100u64).map(|i| crate::hash::mix64(i + 1)).collect();
        let mut bytes = vec![2, 0, 1, 0, 12, 0, 0, 0, FLAG_DIRECT_COUNT];
        bytes.extend_from_slice(&100i32.to_le_bytes());
        for hash in &hashes {
            bytes.extend_from_slice(&hash.to_le_bytes());
        }
        bytes.extend_from_slice(&5u64.to_le_bytes());

        let restored = HyperLogLog::from_bytes(&bytes).unwrap();
        let mut expected = HyperLogLog::new(12).unwrap();
        for &hash in &hashes {
            expected.add_hash(hash);
        }
        assert_eq!(restored.registers(), expected.registers());
        assert_eq!(restored.is_sparse(), expected.is_sparse());
        assert_eq!(restored.additions(), 5);
        // re-serialized without the legacy mode
        assert_eq!(restored.to_bytes()[8] & FLAG_DIRECT_COUNT, 0);
    }

    #[test_case(&[]; "empty input")]
    #[test_case(&[2, 0, 1]; "partial version")]
    #[test_case(&[2, 0, 1, 0, 14, 0, 0, 0]; "missing flags")]
    #[test_case(&[2, 0, 1, 0, 14, 0, 0, 0, 2, 1, 0, 0, 0, 5, 0]; "partial sparse entry")]
    #[test_case(&[2, 0, 1, 0, 4, 0, 0, 0, 0, 16, 0, 0, 0, 1, 2, 3]; "partial dense registers")]
    #[test_case(&[2, 0, 1, 0, 14, 0, 0, 0, 2, 0, 0, 0, 0, 1, 2, 3]; "partial additions")]
    fn test_truncated(bytes: &[u8]) {
        assert!(matches!(
            HyperLogLog::from_bytes(bytes),
            Err(EstimatorError::Io(_))
        ));
    }

    #[test_case(&[2, 0, 1, 0, 3, 0, 0, 0, 2] => matches Err(EstimatorError::InvalidPrecision(3)); "precision too small")]
    #[test_case(&[2, 0, 1, 0, 17, 0, 0, 0, 2] => matches Err(EstimatorError::InvalidPrecision(17)); "precision too large")]
    #[test_case(&[2, 0, 1, 0, 0, 1, 0, 0, 2] => matches Err(EstimatorError::Malformed(_)); "precision not a byte")]
    #[test_case(&[2, 0, 1, 0, 14, 0, 0, 0, 2, 0xff, 0xff, 0xff, 0xff] => matches Err(EstimatorError::Malformed(_)); "negative count")]
    #[test_case(&[2, 0, 1, 0, 4, 0, 0, 0, 2, 1, 0, 0, 0, 16, 0, 1] => matches Err(EstimatorError::Malformed(_)); "index out of range")]
    #[test_case(&[2, 0, 1, 0, 14, 0, 0, 0, 2, 1, 0, 0, 0, 0, 0, 52] => matches Err(EstimatorError::Malformed(_)); "rank too large")]
    #[test_case(&[2, 0, 1, 0, 4, 0, 0, 0, 0, 15, 0, 0, 0] => matches Err(EstimatorError::Malformed(_)); "dense length mismatch")]
    #[test_case(&[2, 0, 1, 0, 4, 0, 0, 0, 2, 17, 0, 0, 0] => matches Err(EstimatorError::Malformed(_)); "too many sparse entries")]
    fn test_malformed(bytes: &[u8]) -> Result<HyperLogLog, EstimatorError> {
        HyperLogLog::from_bytes(bytes)
    }

    #[test]
    fn test_dense_rank_too_large() {
        let mut bytes = estimator(4, 100).to_bytes();
        bytes[13] = 62;
        assert!(matches!(
            HyperLogLog::from_bytes(&bytes),
            Err(EstimatorError::Malformed(_))
        ));
    }

    #[test]
    fn test_sparse_stream_beyond_limit_is_promoted() {
        // b = 8 keeps at most 7 sparse entries
        let mut bytes = vec![2, 0, 1, 0, 8, 0, 0, 0, FLAG_SPARSE, 10, 0, 0, 0];
        for index in 0..10u16 {
            bytes.extend_from_slice(&index.to_le_bytes());
            bytes.push(1);
        }
        let restored = HyperLogLog::from_bytes(&bytes).unwrap();
        assert!(!restored.is_sparse());
        assert_eq!(restored.count(), 10);
    }

    #[test]
    fn test_serialize_into_writer() {
        let original = estimator(12, 2000);
        let mut buffer = std::io::Cursor::new(Vec::new());
        original.serialize_into(&mut buffer).unwrap();
        buffer.set_position(0);
        let restored = HyperLogLog::deserialize_from(&mut buffer).unwrap();
        assert_eq!(restored, original);
    }
}
