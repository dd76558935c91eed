use serde::{Deserialize, Serialize};

use super::Record;

/// A row of the `livestreams` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Livestream {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub playlist_url: String,
    pub thumbnail_url: String,
    /// Unix seconds
    pub start_at: i64,
    /// Unix seconds
    pub end_at: i64,
}

impl Record for Livestream {
    const TABLE: &'static str = "livestreams";
}
