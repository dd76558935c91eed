//! Livestream entity cache
//!
//! Caching layer in front of the livestream database:
//! - Process-local entity caches for users, themes, tags and livestreams
//! - A networked read-through cache (Redis or in-memory) with request deduplication
//! - A column-based repository adapter caching single-row lookups

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod state;

pub use config::AppConfig;
pub use state::{create_app_state, AppState};
