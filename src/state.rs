//! Shared cache instances, built once at startup and handed out by `Arc`

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::domain::cache::KeyValueStore;
use crate::domain::{DomainError, Livestream, Tag, Theme, User};
use crate::infrastructure::cache::StoreFactory;
use crate::infrastructure::local::EntityCaches;
use crate::infrastructure::repository::CachedRepository;
use crate::infrastructure::storage::MySqlDatabase;

pub type Repository<T> = CachedRepository<T, MySqlDatabase>;

#[derive(Clone)]
pub struct AppState {
    pub database: Arc<MySqlDatabase>,
    pub store: Arc<dyn KeyValueStore>,
    pub entity_caches: Arc<EntityCaches>,
    pub users: Arc<Repository<User>>,
    pub themes: Arc<Repository<Theme>>,
    pub tags: Arc<Repository<Tag>>,
    pub livestreams: Arc<Repository<Livestream>>,
}

impl AppState {
    pub fn new(database: Arc<MySqlDatabase>, store: Arc<dyn KeyValueStore>, config: &AppConfig) -> Self {
        let ttl = config.cache.ttl();
        let policy = config.cache.degrade_policy;

        Self {
            users: Arc::new(
                CachedRepository::new(Arc::clone(&database), Arc::clone(&store), ttl).with_policy(policy),
            ),
            themes: Arc::new(
                CachedRepository::new(Arc::clone(&database), Arc::clone(&store), ttl).with_policy(policy),
            ),
            tags: Arc::new(
                CachedRepository::new(Arc::clone(&database), Arc::clone(&store), ttl).with_policy(policy),
            ),
            livestreams: Arc::new(
                CachedRepository::new(Arc::clone(&database), Arc::clone(&store), ttl).with_policy(policy),
            ),
            entity_caches: Arc::new(EntityCaches::new()),
            database,
            store,
        }
    }
}

/// Connects to MySQL and the configured store and builds every cache
pub async fn create_app_state(config: &AppConfig) -> Result<AppState, DomainError> {
    let database = Arc::new(MySqlDatabase::connect(&config.database).await?);
    let store = StoreFactory::new().create(&config.cache).await?;

    info!(
        backend = %config.cache.backend,
        ttl_secs = config.cache.ttl_secs,
        degrade_policy = ?config.cache.degrade_policy,
        "Application state ready"
    );

    Ok(AppState::new(database, store, config))
}
