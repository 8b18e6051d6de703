//! Session-scoped key/value store backing the browse fallback.
//!
//! Entries live as long as the store does. There is no TTL and no eviction.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::CacheError;

/// String-keyed, string-valued store injected into the catalog client.
pub trait SessionCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// In-memory store, the default for a client.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SessionCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
