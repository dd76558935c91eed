//! Row-fetching abstraction over an open database handle

use std::fmt;

use async_trait::async_trait;

use crate::domain::entity::{Livestream, Tag, Theme, User};
use crate::domain::DomainError;

/// Positional query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{}", value),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A database handle (pool or open transaction) that can decode rows into `R`
///
/// Both operations are cancelled by dropping the returned future.
#[async_trait]
pub trait RowSource<R: Send>: Send + Sync {
    /// Fetches exactly one row, `DomainError::NotFound` when none matches
    async fn fetch_one(&self, query: &str, params: &[SqlValue]) -> Result<R, DomainError>;

    /// Fetches every matching row, possibly none
    async fn fetch_all(&self, query: &str, params: &[SqlValue]) -> Result<Vec<R>, DomainError>;
}

/// A handle that can load every cached entity kind
pub trait EntityDatabase:
    RowSource<User> + RowSource<Theme> + RowSource<Tag> + RowSource<Livestream>
{
}

impl<D> EntityDatabase for D where
    D: RowSource<User> + RowSource<Theme> + RowSource<Tag> + RowSource<Livestream> + ?Sized
{
}
