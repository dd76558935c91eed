//! Ping command - verifies the database and the cache store answer

use tracing::info;

use crate::infrastructure::cache::StoreFactory;
use crate::infrastructure::storage::MySqlDatabase;

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let database = MySqlDatabase::connect(&config.database).await?;
    database.ping().await?;
    info!("Database reachable");

    let store = StoreFactory::new().create(&config.cache).await?;
    store.ping().await?;
    info!(backend = %config.cache.backend, "Cache store reachable");

    println!("ok");
    Ok(())
}
