//! Row decoding for the cached entities

use sqlx::mysql::MySqlRow;
use sqlx::{Decode, MySql, Row, Type};

use crate::domain::{DomainError, Livestream, Tag, Theme, User};

/// An entity that can be decoded from a MySQL row
///
/// Columns left out of the projection decode to their default value, so a
/// narrowed `SELECT` still yields a usable entity.
pub trait MySqlRecord: Sized + Send {
    fn from_row(row: &MySqlRow) -> Result<Self, DomainError>;
}

fn column<'r, T>(row: &'r MySqlRow, name: &str) -> Result<T, DomainError>
where
    T: Decode<'r, MySql> + Type<MySql> + Default,
{
    match row.try_get::<Option<T>, _>(name) {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(sqlx::Error::ColumnNotFound(_)) => Ok(T::default()),
        Err(e) => Err(DomainError::storage(format!(
            "Failed to decode column '{}': {}",
            name, e
        ))),
    }
}

impl MySqlRecord for User {
    fn from_row(row: &MySqlRow) -> Result<Self, DomainError> {
        Ok(Self {
            id: column(row, "id")?,
            name: column(row, "name")?,
            display_name: column(row, "display_name")?,
            description: column(row, "description")?,
            password: column(row, "password")?,
        })
    }
}

impl MySqlRecord for Theme {
    fn from_row(row: &MySqlRow) -> Result<Self, DomainError> {
        Ok(Self {
            id: column(row, "id")?,
            user_id: column(row, "user_id")?,
            dark_mode: column(row, "dark_mode")?,
        })
    }
}

impl MySqlRecord for Tag {
    fn from_row(row: &MySqlRow) -> Result<Self, DomainError> {
        Ok(Self {
            id: column(row, "id")?,
            name: column(row, "name")?,
        })
    }
}

impl MySqlRecord for Livestream {
    fn from_row(row: &MySqlRow) -> Result<Self, DomainError> {
        Ok(Self {
            id: column(row, "id")?,
            user_id: column(row, "user_id")?,
            title: column(row, "title")?,
            description: column(row, "description")?,
            playlist_url: column(row, "playlist_url")?,
            thumbnail_url: column(row, "thumbnail_url")?,
            start_at: column(row, "start_at")?,
            end_at: column(row, "end_at")?,
        })
    }
}
