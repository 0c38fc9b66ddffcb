/// In-process store implementations
use crate::{
    error::{NameError, NameResult},
    store::{Datastore, ValueStore},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Value store kept in memory, for single-node setups and tests
#[derive(Debug, Default)]
pub struct MemoryValueStore {
    values: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

#[async_trait]
impl ValueStore for MemoryValueStore {
    async fn get_value(&self, key: &[u8]) -> NameResult<Vec<u8>> {
        self.values
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| NameError::NotFound(String::from_utf8_lossy(key).into_owned()))
    }

    async fn put_value(&self, key: &[u8], value: Vec<u8>) -> NameResult<()> {
        debug!(key_len = key.len(), value_len = value.len(), "Value store PUT");
        self.values.lock().insert(key.to_vec(), value);
        Ok(())
    }
}

/// Datastore kept in memory
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn get(&self, key: &str) -> NameResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> NameResult<()> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }
}
