//! Cache infrastructure - store implementations and the read-through cache

mod factory;
mod in_memory;
mod read_through;
mod redis;
mod singleflight;

pub use factory::{StoreFactory, StoreType};
pub use in_memory::{InMemoryStore, InMemoryStoreConfig};
pub use read_through::ReadThroughCache;
pub use redis::{RedisStore, RedisStoreConfig};
pub use singleflight::{FlightGroup, FlightResult};
