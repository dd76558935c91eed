//! Lookup command - fetches one entity through the cache layer

use std::time::Instant;

use anyhow::Context;
use clap::{Args, ValueEnum};
use serde_json::Value;
use tracing::info;

use crate::domain::storage::EntityDatabase;
use crate::infrastructure::local::EntityCaches;
use crate::state::{create_app_state, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Entity {
    /// User by id
    User,
    /// User by name
    UserName,
    /// Theme by owning user id
    Theme,
    /// Tag by id
    Tag,
    /// Livestream by id
    Livestream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Via {
    /// Process-local entity caches, loading inside a transaction
    #[default]
    Local,
    /// Networked read-through cache
    Repository,
}

/// Arguments for the lookup command
#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    #[arg(value_enum)]
    pub entity: Entity,

    /// Id, user id or name, depending on the entity
    pub key: String,

    #[arg(long, value_enum, default_value_t = Via::Local)]
    pub via: Via,

    /// Columns to select on a repository lookup (default: all)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Run the lookup this many times, printing the last result
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,
}

pub async fn run(args: LookupArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let state = create_app_state(&config).await?;

    let mut last = Value::Null;
    for attempt in 1..=args.repeat.max(1) {
        let started = Instant::now();

        last = match args.via {
            Via::Local => {
                let tx = state.database.begin().await?;
                let value = lookup_local(&state.entity_caches, &tx, args.entity, &args.key).await?;
                tx.commit().await?;
                value
            }
            Via::Repository => lookup_repository(&state, &args).await?,
        };

        info!(
            attempt,
            via = ?args.via,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Lookup complete"
        );
    }

    println!("{}", serde_json::to_string_pretty(&last)?);
    Ok(())
}

fn parse_id(key: &str) -> anyhow::Result<i64> {
    key.parse()
        .with_context(|| format!("'{}' is not a valid id", key))
}

/// Looks the entity up through the process-local caches
pub async fn lookup_local<D>(
    caches: &EntityCaches,
    db: &D,
    entity: Entity,
    key: &str,
) -> anyhow::Result<Value>
where
    D: EntityDatabase + ?Sized,
{
    let value = match entity {
        Entity::User => serde_json::to_value(caches.get_user_by_id(db, parse_id(key)?).await?)?,
        Entity::UserName => serde_json::to_value(caches.get_user_by_name(db, key).await?)?,
        Entity::Theme => {
            serde_json::to_value(caches.get_theme_by_user_id(db, parse_id(key)?).await?)?
        }
        Entity::Tag => serde_json::to_value(caches.get_tag_by_id(db, parse_id(key)?).await?)?,
        Entity::Livestream => {
            serde_json::to_value(caches.get_livestream_by_id(db, parse_id(key)?).await?)?
        }
    };

    Ok(value)
}

async fn lookup_repository(state: &AppState, args: &LookupArgs) -> anyhow::Result<Value> {
    let columns: Vec<&str> = args.columns.iter().map(String::as_str).collect();
    let key = args.key.as_str();

    let value = match args.entity {
        Entity::User => serde_json::to_value(state.users.get_by_id(key, &columns).await?)?,
        Entity::UserName => serde_json::to_value(state.users.get_by_name(key, &columns).await?)?,
        Entity::Theme => serde_json::to_value(state.themes.get_by_user_id(key, &columns).await?)?,
        Entity::Tag => serde_json::to_value(state.tags.get_by_id(key, &columns).await?)?,
        Entity::Livestream => {
            serde_json::to_value(state.livestreams.get_by_id(key, &columns).await?)?
        }
    };

    Ok(value)
}
