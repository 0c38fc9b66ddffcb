/// Storage collaborators used by the naming system
///
/// The distributed value store holds signed name records for everyone; the
/// local datastore keeps this node's own publish bookkeeping.

pub mod memory;

pub use memory::{MemoryDatastore, MemoryValueStore};

use crate::error::NameResult;
use async_trait::async_trait;

/// Distributed value store trait
///
/// Implementations talk to the network's routing layer (a DHT in production).
#[async_trait]
pub trait ValueStore: Send + Sync {
    /// Fetch the best value stored under `key`
    ///
    /// Returns `NameError::NotFound` when nothing is stored.
    async fn get_value(&self, key: &[u8]) -> NameResult<Vec<u8>>;

    /// Store `value` under `key`
    async fn put_value(&self, key: &[u8], value: Vec<u8>) -> NameResult<()>;
}

/// Local key/value datastore trait
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn get(&self, key: &str) -> NameResult<Option<Vec<u8>>>;

    async fn put(&self, key: &str, value: Vec<u8>) -> NameResult<()>;
}
