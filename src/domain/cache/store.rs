//! External key/value store abstraction

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Byte-oriented key/value store with per-entry TTL
///
/// `Ok(None)` means the key is absent (or expired); `Err` means the store
/// itself failed. Callers rely on the two being distinguishable.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the raw bytes stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Bytes>, DomainError>;

    /// Writes `value` under `key`, expiring after `ttl`
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), DomainError>;

    /// Reads several keys at once, one slot per requested key
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Bytes>>, DomainError> {
        let mut values = Vec::with_capacity(keys.len());

        for key in keys {
            values.push(self.get(key).await?);
        }

        Ok(values)
    }

    /// Writes several entries at once, all with the same TTL
    async fn set_many(
        &self,
        entries: Vec<(String, Bytes)>,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        for (key, value) in entries {
            self.set(&key, value, ttl).await?;
        }

        Ok(())
    }

    /// Drops every entry in the store
    async fn flush(&self) -> Result<(), DomainError>;

    /// Checks the store is reachable
    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
