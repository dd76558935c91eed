//! Storage infrastructure - MySQL row sources

mod mysql;
mod record;

pub use mysql::{MySqlDatabase, MySqlTransaction};
pub use record::MySqlRecord;
