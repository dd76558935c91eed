//! Cache domain - keys, store abstraction and degrade policy

mod codec;
mod key;
mod policy;
mod store;

pub use codec::{decode, encode};
pub use key::{validate_identifier, ColumnKey, LookupColumn};
pub use policy::{DegradePolicy, StoreOperation};
pub use store::KeyValueStore;

#[cfg(test)]
pub use store::MockKeyValueStore;
