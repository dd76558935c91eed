//! Infrastructure layer - Store, database and cache implementations

pub mod cache;
pub mod local;
pub mod logging;
pub mod repository;
pub mod storage;
