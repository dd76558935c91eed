//! Row snapshots served by the caching layer
//!
//! Every entity is an immutable value copied into and out of the caches.
//! Nothing hands out shared mutable references to a cached row.

mod livestream;
mod tag;
mod theme;
mod user;

pub use livestream::Livestream;
pub use tag::Tag;
pub use theme::Theme;
pub use user::User;

/// A cacheable row bound to the table it is read from
pub trait Record {
    /// Table the row lives in
    const TABLE: &'static str;
}
