//! Store factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::config::CacheConfig;
use crate::domain::cache::KeyValueStore;
use crate::domain::DomainError;

use super::in_memory::{InMemoryStore, InMemoryStoreConfig};
use super::redis::{RedisStore, RedisStoreConfig};

/// Supported store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreType {
    /// Process-local store using moka
    #[default]
    InMemory,
    /// Redis
    Redis,
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::InMemory => write!(f, "in_memory"),
            StoreType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for StoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(StoreType::InMemory),
            "redis" => Ok(StoreType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache backend: {}. Valid backends: in_memory, redis",
                s
            ))),
        }
    }
}

/// Factory for key/value store instances
#[derive(Debug, Default)]
pub struct StoreFactory;

impl StoreFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates the store described by the cache section of the configuration
    pub async fn create(&self, config: &CacheConfig) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        let store_type: StoreType = config.backend.parse()?;
        info!(backend = %store_type, ttl_secs = config.ttl_secs, "Creating cache store");

        match store_type {
            StoreType::InMemory => Ok(self.create_in_memory(
                InMemoryStoreConfig::default().with_max_capacity(config.max_capacity),
            )),
            StoreType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for the redis cache backend")
                })?;

                let mut redis_config =
                    RedisStoreConfig::new(url).with_connection_timeout(config.connection_timeout());

                if let Some(prefix) = &config.key_prefix {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }

                self.create_redis(redis_config).await
            }
        }
    }

    pub fn create_in_memory(&self, config: InMemoryStoreConfig) -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryStore::with_config(config))
    }

    pub async fn create_redis(
        &self,
        config: RedisStoreConfig,
    ) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        let store = RedisStore::connect(config).await?;
        Ok(Arc::new(store))
    }
}
