use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cache::engine::StorageEngine;
use crate::memcache;

/// Everything a running server needs, bundled so the binary and the test
/// harness can build and tear down servers the same way.
pub struct ServerContext {
    cancellation_token: CancellationToken,
    store: Arc<StorageEngine>,
}

impl ServerContext {
    pub fn get_default_server_context(
        store_config: memcache::builder::MemcacheStoreConfig,
    ) -> Self {
        let cancellation_token = CancellationToken::new();
        let store = memcache::builder::MemcacheStoreBuilder::from_config(store_config);
        Self {
            cancellation_token,
            store,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn store(&self) -> Arc<StorageEngine> {
        self.store.clone()
    }
}
