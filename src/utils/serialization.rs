// Bincode 2.x serde integration used for sled values.
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Serialize data using bincode 2.0 with standard configuration
pub fn serialize<T: Serialize>(data: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::serde::encode_to_vec(data, config)
        .map_err(|e| LedgerError::Serialization(format!("Serialization failed: {e}")))
}

/// Deserialize data using bincode 2.0 with standard configuration
pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let config = bincode::config::standard();
    let (data, _) = bincode::serde::decode_from_slice(bytes, config)
        .map_err(|e| LedgerError::Serialization(format!("Deserialization failed: {e}")))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestRecord {
        name: String,
        balance: BigUint,
        counter: u64,
    }

    #[test]
    fn test_serialize_deserialize_biguint_record() {
        let original = TestRecord {
            name: "miner".to_string(),
            balance: BigUint::parse_bytes(b"100000000000000", 10).unwrap(),
            counter: 7,
        };

        let bytes = serialize(&original).expect("Serialization should work");
        let back: TestRecord = deserialize(&bytes).expect("Deserialization should work");
        assert_eq!(original, back);
    }

    #[test]
    fn test_deserialize_invalid_data() {
        let invalid = vec![0xFF, 0xFF, 0xFF, 0xFF];
        let result: Result<TestRecord> = deserialize(&invalid);
        assert!(result.is_err());
    }
}
