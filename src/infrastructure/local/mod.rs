//! Process-local entity caches

mod cache;
mod entities;

pub use cache::LocalCache;
pub use entities::EntityCaches;
