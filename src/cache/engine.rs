use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::cache::eviction::EvictionPolicy;
use crate::cache::value::{kv_size, Value};

/// Outcome of a compare-and-swap write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CasOutcome {
    /// The token matched and the value was written.
    Stored,
    /// The key exists but was written since the client's last `gets`.
    Exists,
    /// The key is not in the cache.
    NotFound,
}

/// A coarsely locked key/value store. To facilitate multiple sessions
/// concurrently reading and writing, it locks *all* operations. While this
/// is nowhere near the most efficient storage engine, it is maybe the
/// simplest.
///
/// Note: the eviction policy mutates on reads (`touch`), so a reader/writer
/// lock would still need a write lock around the policy. One exclusive lock
/// keeps the map, the policy, and the CAS counter linearizable together.
pub struct StorageEngine {
    inner: Mutex<EngineInner>,
}

struct EngineInner {
    values: HashMap<String, Value>,
    policy: Box<dyn EvictionPolicy + Send>,
    cur_cas_unique: i64,
}

impl StorageEngine {
    pub fn new(policy: Box<dyn EvictionPolicy + Send>) -> StorageEngine {
        StorageEngine {
            inner: Mutex::new(EngineInner {
                values: HashMap::new(),
                policy,
                cur_cas_unique: 0,
            }),
        }
    }

    /// Writes or overwrites the value, returning true iff the value was
    /// successfully written. False means the value cannot fit in the cache
    /// at all.
    pub fn set(&self, key: &str, value: Value) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.insert_with_evictions(key, value)
    }

    /// Returns the stored value for the key. The key is touched in the
    /// eviction policy whether or not it is found.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.lock().unwrap();
        let value = inner.values.get(key).cloned();
        inner.policy.touch(key);
        value
    }

    /// Overwrites the value iff it has not been written since the client
    /// last observed it, by comparing the provided value's `cas_unique`
    /// against the one currently stored.
    pub fn cas(&self, key: &str, value: Value) -> CasOutcome {
        let mut inner = self.inner.lock().unwrap();
        let current = match inner.values.get(key) {
            Some(current) => current,
            None => return CasOutcome::NotFound,
        };
        if current.cas_unique != value.cas_unique {
            return CasOutcome::Exists;
        }
        if !inner.insert_with_evictions(key, value) {
            // Nothing was mutated; the protocol has no distinct answer for
            // this case, so it reports as a store.
            warn!("cas of key '{}' exceeds total cache capacity", key);
        }
        CasOutcome::Stored
    }

    /// Removes the binding, returning true iff the key was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.policy.remove(key);
        inner.values.remove(key).is_some()
    }

    pub fn used(&self) -> usize {
        self.inner.lock().unwrap().policy.used()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().unwrap().policy.capacity()
    }
}

impl EngineInner {
    fn insert_with_evictions(&mut self, key: &str, mut value: Value) -> bool {
        let (evicted, had_space) = self.policy.add(key, value.clone());
        if !had_space {
            warn!("value for key '{}' exceeds total cache capacity", key);
            return false;
        }
        for e in &evicted {
            if let Some(v) = self.values.remove(e) {
                debug!("evicting key '{}' ({} bytes)", e, kv_size(e, &v));
            }
        }

        self.cur_cas_unique += 1;
        value.cas_unique = self.cur_cas_unique;
        self.values.insert(key.to_string(), value);
        true
    }
}
