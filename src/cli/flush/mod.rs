//! Flush command - empties the networked cache store

use tracing::info;

use crate::infrastructure::cache::StoreFactory;

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let store = StoreFactory::new().create(&config.cache).await?;
    store.flush().await?;

    info!(backend = %config.cache.backend, "Cache store flushed");
    Ok(())
}
