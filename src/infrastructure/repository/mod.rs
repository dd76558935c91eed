//! Repository infrastructure - cached single-row lookups

mod cached;

pub use cached::CachedRepository;
