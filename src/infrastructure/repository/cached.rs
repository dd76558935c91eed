//! Column lookups served through the networked read-through cache

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::cache::{validate_identifier, ColumnKey, DegradePolicy, KeyValueStore, LookupColumn};
use crate::domain::storage::RowSource;
use crate::domain::{DomainError, Record};
use crate::infrastructure::cache::ReadThroughCache;

/// Repository answering single-row lookups by `id`, `name` or `user_id`
///
/// Each lookup is cached under `table:column:value`. The query only runs on
/// a cache miss, and concurrent misses for one key share a single query.
pub struct CachedRepository<T, D: ?Sized> {
    database: Arc<D>,
    cache: ReadThroughCache<T>,
}

impl<T, D: ?Sized> fmt::Debug for CachedRepository<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedRepository")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<T, D> CachedRepository<T, D>
where
    T: Record + Serialize + DeserializeOwned + Send + 'static,
    D: RowSource<T> + ?Sized + 'static,
{
    pub fn new(database: Arc<D>, store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self {
            database,
            cache: ReadThroughCache::new(store, ttl),
        }
    }

    pub fn with_policy(mut self, policy: DegradePolicy) -> Self {
        self.cache = self.cache.with_policy(policy);
        self
    }

    pub fn cache(&self) -> &ReadThroughCache<T> {
        &self.cache
    }

    /// Fetches the one row of `table` whose `column` equals `value`
    ///
    /// `columns` narrows the projection; empty selects every column. The
    /// projection is not part of the cache key, so until the entry expires a
    /// lookup is answered with whatever columns the first caller selected.
    pub async fn get_by_column(
        &self,
        table: &str,
        column: LookupColumn,
        value: &str,
        columns: &[&str],
    ) -> Result<T, DomainError> {
        let key = ColumnKey::new(table, column, value)?;
        let param = column.bind(value)?;
        let query = select_query(table, column, columns)?;

        let database = Arc::clone(&self.database);
        self.cache
            .get_or_set(&key.to_string(), move || async move {
                let params = [param];
                RowSource::<T>::fetch_one(database.as_ref(), &query, &params).await
            })
            .await
    }

    pub async fn get_by_id(&self, id: impl fmt::Display, columns: &[&str]) -> Result<T, DomainError> {
        self.get_by_column(T::TABLE, LookupColumn::Id, &id.to_string(), columns)
            .await
    }

    pub async fn get_by_name(&self, name: &str, columns: &[&str]) -> Result<T, DomainError> {
        self.get_by_column(T::TABLE, LookupColumn::Name, name, columns)
            .await
    }

    pub async fn get_by_user_id(
        &self,
        user_id: impl fmt::Display,
        columns: &[&str],
    ) -> Result<T, DomainError> {
        self.get_by_column(T::TABLE, LookupColumn::UserId, &user_id.to_string(), columns)
            .await
    }
}

fn select_query(table: &str, column: LookupColumn, columns: &[&str]) -> Result<String, DomainError> {
    let projection = if columns.is_empty() {
        "*".to_string()
    } else {
        for name in columns {
            validate_identifier(name)?;
        }
        columns.join(", ")
    };

    Ok(format!(
        "SELECT {} FROM `{}` WHERE {} = ?",
        projection, table, column
    ))
}
