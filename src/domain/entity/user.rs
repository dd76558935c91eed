use serde::{Deserialize, Serialize};

use super::Record;

/// A row of the `users` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Password hash as stored; the caching layer never inspects it
    pub password: String,
}

impl Record for User {
    const TABLE: &'static str = "users";
}
