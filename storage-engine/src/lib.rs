pub mod moka_cache;
pub mod sled_store;

pub use moka_cache::MokaStore;
pub use sled_store::SledStore;

use cache_aside::CacheStoreClient;
use shared::Result;
use shared::config::{StoreBackend, StoreConfig};
use std::sync::Arc;
use tracing::info;

/// Open the store selected by `config`.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn CacheStoreClient>> {
    match config.backend {
        StoreBackend::Memory => {
            info!(max_entries = ?config.max_entries, "using in-memory moka store");
            Ok(Arc::new(MokaStore::new(
                config.container_name.clone(),
                config.max_entries,
            )))
        }
        StoreBackend::Sled => {
            let store = SledStore::open(config)?;
            info!(
                database = %config.database_name,
                container = %config.container_name,
                "using sled store"
            );
            Ok(Arc::new(store))
        }
    }
}
