//! # Serde module for HyperLogLog
//!
//! This module provides serde-based (serialization and deserialization) features for
//! `HyperLogLog`. The estimator is encoded as a single byte string holding the versioned
//! binary layout produced by [`HyperLogLog::to_bytes`], so every serde format carries
//! exactly the same payload as the native serializer.
//!
//! Deserialization accepts a byte string, a borrowed or owned byte buffer, or a sequence
//! of bytes (which is how self-describing formats such as JSON represent byte strings).
//!
//! Refer to the serde documentation for more details on custom serialization and deserialization:
//! - [Serialization](https://serde.rs/impl-serialize.html)
//! - [Deserialization](https://serde.rs/impl-deserialize.html)
use std::fmt;

use serde::de::{Error, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::estimator::HyperLogLog;

impl Serialize for HyperLogLog {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

struct HyperLogLogVisitor;

impl<'de> Visitor<'de> for HyperLogLogVisitor {
    type Value = HyperLogLog;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a serialized HyperLogLog byte string")
    }

    fn visit_bytes<E: Error>(self, bytes: &[u8]) -> Result<Self::Value, E> {
        HyperLogLog::from_bytes(bytes).map_err(|e| E::custom(e.to_string()))
    }

    fn visit_byte_buf<E: Error>(self, bytes: Vec<u8>) -> Result<Self::Value, E> {
        self.visit_bytes(&bytes)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1 << 17));
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        self.visit_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for HyperLogLog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_bytes(HyperLogLogVisitor)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0; "empty set")]
    #[test_case(1; "single element")]
    #[test_case(2; "two distinct elements")]
    #[test_case(100; "hundred distinct elements")]
    #[test_case(10000; "ten thousand distinct elements")]
    fn test_serde(n: usize) {
        let mut original_estimator = HyperLogLog::default();

        for i in 0..n {
            let item = &format!("item{}", i);
            original_estimator.add(item);
        }

        let serialized = serde_json::to_string(&original_estimator).expect("serialization failed");
        assert!(
            !serialized.is_empty(),
            "serialized string should not be empty"
        );

        let deserialized_estimator: HyperLogLog =
            serde_json::from_str(&serialized).expect("deserialization failed");

        assert_eq!(original_estimator, deserialized_estimator);
        assert_eq!(original_estimator.count(), deserialized_estimator.count());
    }

    #[test]
    fn test_payload_matches_binary_format() {
        let mut estimator = HyperLogLog::new(10).unwrap();
        estimator.add("x");
        let json = serde_json::to_string(&estimator).unwrap();
        let bytes: Vec<u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(bytes, estimator.to_bytes());
    }

    #[test]
    fn test_deserialize_invalid_json() {
        let invalid_json = "{ invalid_json_string }";
        let result: Result<HyperLogLog, _> = serde_json::from_str(invalid_json);

        assert!(
            result.is_err(),
            "Deserialization should fail for invalid JSON"
        );
    }

    #[test_case("[12345,null]".as_bytes(); "case 1")]
    #[test_case("[2,0,1,0]".as_bytes(); "truncated header")]
    #[test_case("[3,0,1,0,14,0,0,0,2,0,0,0,0]".as_bytes(); "newer major version")]
    #[test_case("[2,0,1,0,20,0,0,0,2,0,0,0,0]".as_bytes(); "invalid precision")]
    #[test_case("\"AAEC\"".as_bytes(); "string")]
    fn test_failed_deserialization(input: &[u8]) {
        let result: Result<HyperLogLog, _> = serde_json::from_slice(input);
        assert!(result.is_err());
    }
}
