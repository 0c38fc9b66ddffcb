/// Routing resolver - looks up signed records in the distributed value store
use crate::{
    config::DEFAULT_RESOLVER_CACHE_TTL,
    crypto::{routing_key, NameRecord, PeerId},
    error::{NameError, NameResult},
    namesys::resolve::{Resolution, ResolveOnce, ResolveOptions},
    path::Path,
    store::ValueStore,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Resolves peer ids through records published to the value store
pub struct RoutingResolver {
    store: Arc<dyn ValueStore>,
    default_ttl: Duration,
}

impl RoutingResolver {
    pub fn new(store: Arc<dyn ValueStore>) -> Self {
        Self {
            store,
            default_ttl: DEFAULT_RESOLVER_CACHE_TTL,
        }
    }

    /// TTL used when a record carries none
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Fetch and verify the current record of `id`
    pub async fn fetch_record(&self, id: &PeerId) -> NameResult<NameRecord> {
        let bytes = self.store.get_value(&routing_key(id)).await?;
        let record = NameRecord::from_bytes(&bytes)?;
        record.verify(id)?;
        Ok(record)
    }
}

#[async_trait]
impl ResolveOnce for RoutingResolver {
    async fn resolve_once(&self, name: &str, _options: &ResolveOptions) -> NameResult<Resolution> {
        let (key, rest) = match name.split_once('/') {
            Some((key, rest)) => (key, Some(rest)),
            None => (name, None),
        };

        let id = PeerId::from_base58(key)?;
        let record = self.fetch_record(&id).await?;

        let now = Utc::now();
        if record.is_expired(now) {
            return Err(NameError::RecordExpired(key.to_string()));
        }

        // Never cache past the record's end of life
        let until_eol = (record.validity - now).to_std().unwrap_or(Duration::ZERO);
        let ttl = record.ttl().unwrap_or(self.default_ttl).min(until_eol);

        debug!(
            peer = %id,
            value = %record.value,
            sequence = record.sequence,
            ttl_secs = ttl.as_secs(),
            "Resolved name record"
        );

        let path = match rest {
            Some(rest) => {
                Path::from_segments("", &[record.value.as_str().trim_end_matches('/'), rest])?
            }
            None => record.value,
        };

        Ok(Resolution::new(path, ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::store::MemoryValueStore;

    const TARGET: &str = "/dms3fs/QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    async fn store_with_record(
        key: &PrivateKey,
        eol: chrono::DateTime<Utc>,
        ttl: Option<Duration>,
    ) -> Arc<MemoryValueStore> {
        let store = Arc::new(MemoryValueStore::new());
        let record = NameRecord::create(key, Path::parse(TARGET).unwrap(), 0, eol, ttl);
        store
            .put_value(&routing_key(&key.peer_id()), record.to_bytes().unwrap())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_resolves_published_record() {
        let key = PrivateKey::from_bytes(&[42u8; 32]).unwrap();
        let store = store_with_record(&key, Utc::now() + chrono::Duration::hours(1), None).await;
        let resolver = RoutingResolver::new(store);

        let res = resolver
            .resolve_once(&key.peer_id().to_base58(), &ResolveOptions::new())
            .await
            .unwrap();

        assert_eq!(res.path.as_str(), TARGET);
        assert_eq!(res.ttl, DEFAULT_RESOLVER_CACHE_TTL);
    }

    #[tokio::test]
    async fn test_record_ttl_capped_by_eol() {
        let key = PrivateKey::from_bytes(&[42u8; 32]).unwrap();
        let store = store_with_record(
            &key,
            Utc::now() + chrono::Duration::seconds(30),
            Some(Duration::from_secs(3600)),
        )
        .await;
        let resolver = RoutingResolver::new(store);

        let res = resolver
            .resolve_once(&key.peer_id().to_base58(), &ResolveOptions::new())
            .await
            .unwrap();

        assert!(res.ttl <= Duration::from_secs(30));
        assert!(res.ttl > Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_record_ttl_used_when_shorter() {
        let key = PrivateKey::from_bytes(&[42u8; 32]).unwrap();
        let store = store_with_record(
            &key,
            Utc::now() + chrono::Duration::hours(1),
            Some(Duration::from_secs(5)),
        )
        .await;
        let resolver = RoutingResolver::new(store);

        let res = resolver
            .resolve_once(&key.peer_id().to_base58(), &ResolveOptions::new())
            .await
            .unwrap();
        assert_eq!(res.ttl, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_expired_record_rejected() {
        let key = PrivateKey::from_bytes(&[42u8; 32]).unwrap();
        let store = store_with_record(&key, Utc::now() - chrono::Duration::seconds(1), None).await;
        let resolver = RoutingResolver::new(store);

        let err = resolver
            .resolve_once(&key.peer_id().to_base58(), &ResolveOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NameError::RecordExpired(_)));
    }

    #[tokio::test]
    async fn test_record_under_wrong_key_rejected() {
        let key = PrivateKey::from_bytes(&[42u8; 32]).unwrap();
        let impostor = PrivateKey::from_bytes(&[43u8; 32]).unwrap();

        // impostor's record stored under key's routing key
        let store = Arc::new(MemoryValueStore::new());
        let record = NameRecord::create(
            &impostor,
            Path::parse(TARGET).unwrap(),
            0,
            Utc::now() + chrono::Duration::hours(1),
            None,
        );
        store
            .put_value(&routing_key(&key.peer_id()), record.to_bytes().unwrap())
            .await
            .unwrap();

        let err = RoutingResolver::new(store)
            .resolve_once(&key.peer_id().to_base58(), &ResolveOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NameError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn test_missing_record() {
        let key = PrivateKey::from_bytes(&[42u8; 32]).unwrap();
        let resolver = RoutingResolver::new(Arc::new(MemoryValueStore::new()));

        let err = resolver
            .resolve_once(&key.peer_id().to_base58(), &ResolveOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NameError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rest_is_appended() {
        let key = PrivateKey::from_bytes(&[42u8; 32]).unwrap();
        let store = store_with_record(&key, Utc::now() + chrono::Duration::hours(1), None).await;

        let name = format!("{}/a/b", key.peer_id().to_base58());
        let res = RoutingResolver::new(store)
            .resolve_once(&name, &ResolveOptions::new())
            .await
            .unwrap();
        assert_eq!(res.path.as_str(), format!("{}/a/b", TARGET));
    }
}
