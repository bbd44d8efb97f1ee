use bytes::Bytes;

/// Value stored in the cache. The CAS token is assigned by the storage
/// engine on insertion; clients never pick it on a write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Value {
    pub flags: u16,
    pub cas_unique: i64,
    pub data: Bytes,
}

impl Value {
    pub fn new(flags: u16, data: Bytes) -> Value {
        Value {
            flags,
            cas_unique: 0,
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Accounted size of a key/value binding: key bytes plus payload bytes plus
/// the fixed per-entry overhead (2 bytes of flags, 8 bytes of CAS token).
pub fn kv_size(key: &str, value: &Value) -> usize {
    key.len() + value.data.len() + 2 + 8
}
