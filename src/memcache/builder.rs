use std::sync::Arc;

use crate::cache::engine::StorageEngine;
use crate::cache::eviction::LruEvictionPolicy;

pub struct MemcacheStoreConfig {
    memory_limit: u64,
}

impl MemcacheStoreConfig {
    pub fn new(memory_limit: u64) -> MemcacheStoreConfig {
        MemcacheStoreConfig { memory_limit }
    }
}

#[derive(Default)]
pub struct MemcacheStoreBuilder {}

impl MemcacheStoreBuilder {
    pub fn new() -> MemcacheStoreBuilder {
        MemcacheStoreBuilder {}
    }

    pub fn from_config(config: MemcacheStoreConfig) -> Arc<StorageEngine> {
        let policy = Box::new(LruEvictionPolicy::new(config.memory_limit as usize));
        Arc::new(StorageEngine::new(policy))
    }
}
