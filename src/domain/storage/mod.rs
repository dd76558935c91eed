//! Storage domain - the database seam the caches load through

mod database;

pub use database::{EntityDatabase, RowSource, SqlValue};

#[cfg(test)]
pub use database::mock;
