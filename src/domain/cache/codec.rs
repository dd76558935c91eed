//! Byte encoding of cached values

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Encodes a value into the bytes written to the store
pub fn encode<T: Serialize>(value: &T) -> Result<Bytes, DomainError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| DomainError::serialization(format!("Failed to serialize cache value: {}", e)))
}

/// Decodes bytes read from the store
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DomainError> {
    serde_json::from_slice(bytes).map_err(|e| {
        DomainError::serialization(format!("Failed to deserialize cache value: {}", e))
    })
}
