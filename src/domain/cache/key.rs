//! Cache key construction for column lookups

use std::fmt;
use std::str::FromStr;

use crate::domain::storage::SqlValue;
use crate::domain::DomainError;

/// Column a repository lookup filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupColumn {
    Id,
    Name,
    UserId,
}

impl LookupColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::UserId => "user_id",
        }
    }

    /// Whether the column is compared as `BIGINT` in the schema
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Id | Self::UserId)
    }

    /// Converts a textual lookup value into the parameter type the column
    /// is compared against
    pub fn bind(&self, value: &str) -> Result<SqlValue, DomainError> {
        if self.is_numeric() {
            value.parse::<i64>().map(SqlValue::Int).map_err(|_| {
                DomainError::validation(format!(
                    "Column '{}' expects an integer, got '{}'",
                    self.as_str(),
                    value
                ))
            })
        } else {
            Ok(SqlValue::Text(value.to_string()))
        }
    }
}

impl fmt::Display for LookupColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupColumn {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "user_id" => Ok(Self::UserId),
            _ => Err(DomainError::validation(format!(
                "Unsupported lookup column: {}. Valid columns: id, name, user_id",
                s
            ))),
        }
    }
}

/// Checks that `name` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`)
///
/// Identifiers are interpolated into queries and cache keys, so anything
/// else is rejected.
pub fn validate_identifier(name: &str) -> Result<(), DomainError> {
    let mut chars = name.chars();

    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "Invalid SQL identifier: '{}'",
            name
        )))
    }
}

/// Key of a `(table, column, value)` lookup in the networked cache
///
/// Rendered as `table:column:value`. Table and column can never contain
/// `:`, so the first two separators are unambiguous and distinct triples
/// always render to distinct keys, whatever the value contains.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    table: String,
    column: LookupColumn,
    value: String,
}

impl ColumnKey {
    pub fn new(
        table: impl Into<String>,
        column: LookupColumn,
        value: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let table = table.into();
        validate_identifier(&table)?;

        Ok(Self {
            table,
            column,
            value: value.into(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> LookupColumn {
        self.column
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.table, self.column, self.value)
    }
}

impl FromStr for ColumnKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');

        match (parts.next(), parts.next(), parts.next()) {
            (Some(table), Some(column), Some(value)) => {
                Self::new(table, column.parse()?, value)
            }
            _ => Err(DomainError::validation(format!(
                "Malformed column cache key: '{}'",
                s
            ))),
        }
    }
}
