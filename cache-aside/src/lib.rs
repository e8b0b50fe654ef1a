pub mod domain;
pub mod gateway;
pub mod ports;
pub mod value;

pub use domain::{CacheEntry, CacheResult};
pub use gateway::CacheGateway;
pub use ports::CacheStoreClient;
pub use value::{UtcTimestamp, ValueSource};
