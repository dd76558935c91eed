//! MySQL row sources over a connection pool or an open transaction

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions};
use sqlx::query::Query;
use sqlx::{MySql, Transaction};
use tokio::sync::Mutex;
use tracing::info;

use super::record::MySqlRecord;
use crate::config::DatabaseConfig;
use crate::domain::storage::{RowSource, SqlValue};
use crate::domain::DomainError;

impl From<sqlx::Error> for DomainError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DomainError::not_found("no rows in result set"),
            other => DomainError::storage(other.to_string()),
        }
    }
}

fn bind_params<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &[SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
    for param in params {
        query = match param {
            SqlValue::Int(value) => query.bind(*value),
            SqlValue::Text(value) => query.bind(value.clone()),
        };
    }
    query
}

/// Connection pool handle
#[derive(Debug, Clone)]
pub struct MySqlDatabase {
    pool: MySqlPool,
}

impl MySqlDatabase {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DomainError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to MySQL: {}", e)))?;

        info!(max_connections = config.max_connections, "Connected to MySQL");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("MySQL ping failed: {}", e)))?;
        Ok(())
    }

    /// Opens a transaction usable as a row source until committed or rolled back
    pub async fn begin(&self) -> Result<MySqlTransaction, DomainError> {
        let tx = self.pool.begin().await?;
        Ok(MySqlTransaction { tx: Mutex::new(tx) })
    }
}

#[async_trait]
impl<R: MySqlRecord> RowSource<R> for MySqlDatabase {
    async fn fetch_one(&self, query: &str, params: &[SqlValue]) -> Result<R, DomainError> {
        let row = bind_params(sqlx::query(query), params)
            .fetch_one(&self.pool)
            .await?;
        R::from_row(&row)
    }

    async fn fetch_all(&self, query: &str, params: &[SqlValue]) -> Result<Vec<R>, DomainError> {
        let rows = bind_params(sqlx::query(query), params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(R::from_row).collect()
    }
}

/// An open transaction
///
/// Queries on one transaction run one at a time. Dropping it without
/// committing rolls it back.
pub struct MySqlTransaction {
    tx: Mutex<Transaction<'static, MySql>>,
}

impl fmt::Debug for MySqlTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlTransaction").finish_non_exhaustive()
    }
}

impl MySqlTransaction {
    pub async fn commit(self) -> Result<(), DomainError> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), DomainError> {
        self.tx.into_inner().rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl<R: MySqlRecord> RowSource<R> for MySqlTransaction {
    async fn fetch_one(&self, query: &str, params: &[SqlValue]) -> Result<R, DomainError> {
        let mut tx = self.tx.lock().await;
        let row = bind_params(sqlx::query(query), params)
            .fetch_one(&mut **tx)
            .await?;
        R::from_row(&row)
    }

    async fn fetch_all(&self, query: &str, params: &[SqlValue]) -> Result<Vec<R>, DomainError> {
        let mut tx = self.tx.lock().await;
        let rows = bind_params(sqlx::query(query), params)
            .fetch_all(&mut **tx)
            .await?;
        rows.iter().map(R::from_row).collect()
    }
}
