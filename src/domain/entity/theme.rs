use serde::{Deserialize, Serialize};

use super::Record;

/// A row of the `themes` table, one per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: i64,
    pub user_id: i64,
    pub dark_mode: bool,
}

impl Record for Theme {
    const TABLE: &'static str = "themes";
}
