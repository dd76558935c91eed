//! Domain layer - Entities, errors and the seams the caches are built on

pub mod cache;
pub mod entity;
pub mod error;
pub mod storage;

pub use entity::{Livestream, Record, Tag, Theme, User};
pub use error::DomainError;
