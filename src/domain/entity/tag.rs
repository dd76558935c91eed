use serde::{Deserialize, Serialize};

use super::Record;

/// A row of the `tags` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl Record for Tag {
    const TABLE: &'static str = "tags";
}
