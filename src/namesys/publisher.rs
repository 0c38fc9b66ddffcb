/// Publisher - signs name records and writes them to the value store
use crate::{
    crypto::{routing_key, NameRecord, PeerId, PrivateKey},
    error::{NameError, NameResult},
    path::{Path, MUTABLE_PREFIX},
    store::{Datastore, ValueStore},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Writes signed records for keys held by this node
pub struct Publisher {
    store: Arc<dyn ValueStore>,
    datastore: Arc<dyn Datastore>,
    record_ttl: Option<Duration>,
}

impl Publisher {
    pub fn new(store: Arc<dyn ValueStore>, datastore: Arc<dyn Datastore>) -> Self {
        Self {
            store,
            datastore,
            record_ttl: None,
        }
    }

    /// Cache lifetime suggested to resolvers of records published from here
    pub fn with_record_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.record_ttl = ttl;
        self
    }

    /// Sign `value` for `key` valid until `eol` and publish it
    ///
    /// The sequence number continues from the last record this node
    /// published for the key; republishing the same value keeps it.
    pub async fn publish_with_eol(
        &self,
        key: &PrivateKey,
        value: &Path,
        eol: DateTime<Utc>,
    ) -> NameResult<NameRecord> {
        let id = key.peer_id();
        let local_key = datastore_key(&id);

        let previous = self.last_record(&local_key).await?;
        let sequence = match previous {
            Some(prev) if prev.value == *value => prev.sequence,
            Some(prev) => prev.sequence + 1,
            None => 0,
        };

        let record = NameRecord::create(key, value.clone(), sequence, eol, self.record_ttl);
        let bytes = record
            .to_bytes()
            .map_err(|e| NameError::PublishFailed(e.to_string()))?;

        self.datastore
            .put(&local_key, bytes.clone())
            .await
            .map_err(|e| NameError::PublishFailed(format!("local datastore write: {}", e)))?;

        self.store
            .put_value(&routing_key(&id), bytes)
            .await
            .map_err(|e| NameError::PublishFailed(format!("value store write: {}", e)))?;

        info!(
            peer = %id,
            value = %value,
            sequence = sequence,
            eol = %eol.to_rfc3339(),
            "Published name record"
        );

        Ok(record)
    }

    async fn last_record(&self, local_key: &str) -> NameResult<Option<NameRecord>> {
        let bytes = self
            .datastore
            .get(local_key)
            .await
            .map_err(|e| NameError::PublishFailed(format!("local datastore read: {}", e)))?;

        Ok(bytes.and_then(|bytes| match NameRecord::from_bytes(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(key = %local_key, error = %e, "Ignoring unreadable local name record");
                None
            }
        }))
    }
}

/// Local datastore key for an identity's last published record
pub fn datastore_key(id: &PeerId) -> String {
    format!("{}{}", MUTABLE_PREFIX, id.to_base58())
}
