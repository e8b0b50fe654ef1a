use cache_aside::CacheGateway;
use std::sync::Arc;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<CacheGateway>,
    pub cache_key: Arc<str>,
}

impl AppState {
    pub fn new(gateway: CacheGateway, cache_key: impl Into<Arc<str>>) -> Self {
        Self {
            gateway: Arc::new(gateway),
            cache_key: cache_key.into(),
        }
    }
}
