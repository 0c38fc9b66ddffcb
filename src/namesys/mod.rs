/// Multi-protocol name system
///
/// Resolves `/dms3ns/` names through one of several resolvers:
/// (a) routing names: records signed by a peer identity in the value store,
/// (b) DNS domains: links in dnslink TXT records,
/// (c) proquints: the key itself encodes the path.
///
/// Publishing only goes to (a).

pub mod cache;
pub mod dns;
pub mod proquint;
pub mod publisher;
pub mod resolve;
pub mod routing;

pub use cache::ResolveCache;
pub use dns::{DnsResolver, HickoryTxtLookup, TxtAnswer, TxtLookup};
pub use proquint::ProquintResolver;
pub use publisher::Publisher;
pub use resolve::{Depth, Resolution, ResolveOnce, ResolveOptions};
pub use routing::RoutingResolver;

use crate::{
    config::{NameSysConfig, PublishConfig},
    crypto::{PeerId, PrivateKey},
    error::{NameError, NameResult},
    metrics,
    path::{Path, CONTENT_PREFIX, MUTABLE_PREFIX},
    store::{Datastore, ValueStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Which resolver handles a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Base58 multihash peer id
    Routing,
    /// Domain name
    Domain,
    /// Anything else, read as a proquint
    Proquint,
}

impl KeyKind {
    /// Classify a key; peer ids win over domain syntax
    pub fn classify(key: &str) -> Self {
        if PeerId::from_base58(key).is_ok() {
            KeyKind::Routing
        } else if dns::is_domain(key) {
            KeyKind::Domain
        } else {
            KeyKind::Proquint
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::Routing => "routing",
            KeyKind::Domain => "dns",
            KeyKind::Proquint => "proquint",
        }
    }
}

/// Resolver of resolvers with a shared resolution cache
pub struct NameSystem {
    routing: RoutingResolver,
    dns: DnsResolver,
    proquint: ProquintResolver,
    publisher: Publisher,
    cache: ResolveCache,
    cache_ttl: Duration,
    publish_config: PublishConfig,
}

impl NameSystem {
    /// Create a name system over the given collaborators
    pub fn new(
        store: Arc<dyn ValueStore>,
        datastore: Arc<dyn Datastore>,
        txt_lookup: Arc<dyn TxtLookup>,
        config: &NameSysConfig,
    ) -> Self {
        let cache_ttl = config.cache.ttl();

        Self {
            routing: RoutingResolver::new(store.clone()).with_default_ttl(cache_ttl),
            dns: DnsResolver::new(txt_lookup),
            proquint: ProquintResolver,
            publisher: Publisher::new(store, datastore)
                .with_record_ttl(config.publish.record_ttl()),
            cache: ResolveCache::new(config.cache.size),
            cache_ttl,
            publish_config: config.publish.clone(),
        }
    }

    /// Resolve `name` to a path.
    ///
    /// `/dms3fs/` paths are returned as-is; names without a leading `/` are
    /// taken as `/dms3ns/` keys.
    pub async fn resolve(
        &self,
        cancel: &CancellationToken,
        name: &str,
        options: &ResolveOptions,
    ) -> NameResult<Path> {
        if name.starts_with(CONTENT_PREFIX) {
            return Path::parse(name);
        }

        let name = if name.starts_with('/') {
            name.to_string()
        } else {
            format!("{}{}", MUTABLE_PREFIX, name)
        };

        resolve::resolve(self, cancel, &name, options, &[MUTABLE_PREFIX]).await
    }

    /// Publish `value` for `key` with the default record lifetime
    pub async fn publish(
        &self,
        cancel: &CancellationToken,
        key: &PrivateKey,
        value: &Path,
    ) -> NameResult<()> {
        let eol = self.publish_config.record_eol(Utc::now())?;
        self.publish_with_eol(cancel, key, value, eol).await
    }

    /// Publish `value` for `key` valid until `eol`, then cache it locally
    ///
    /// The local entry lives for the record TTL when one is configured,
    /// otherwise the resolver cache TTL, and never past `eol`.
    pub async fn publish_with_eol(
        &self,
        cancel: &CancellationToken,
        key: &PrivateKey,
        value: &Path,
        eol: DateTime<Utc>,
    ) -> NameResult<()> {
        if cancel.is_cancelled() {
            return Err(NameError::Cancelled);
        }

        let id = key.peer_id();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(NameError::Cancelled),
            result = self.publisher.publish_with_eol(key, value, eol) => result,
        };
        metrics::record_publish(result.is_ok());
        result?;

        let until_eol = (eol - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let ttl = self
            .publish_config
            .record_ttl()
            .unwrap_or(self.cache_ttl)
            .min(until_eol);
        self.cache.set(&id.to_base58(), value.clone(), ttl);

        Ok(())
    }

    /// Forget a cached resolution
    pub fn invalidate(&self, key: &str) -> bool {
        self.cache.remove(key)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    async fn resolve_key(
        &self,
        kind: KeyKind,
        key: &str,
        options: &ResolveOptions,
    ) -> NameResult<Resolution> {
        match kind {
            KeyKind::Routing => self.routing.resolve_once(key, options).await,
            KeyKind::Domain => self.dns.resolve_once(key, options).await,
            KeyKind::Proquint => self.proquint.resolve_once(key, options).await,
        }
    }
}

#[async_trait]
impl ResolveOnce for NameSystem {
    /// One hop through the cache or the resolver the key selects.
    ///
    /// The cache is written here, so the returned TTL is always zero.
    async fn resolve_once(&self, name: &str, options: &ResolveOptions) -> NameResult<Resolution> {
        let name = if name.starts_with(MUTABLE_PREFIX) {
            name.to_string()
        } else {
            format!("{}{}", MUTABLE_PREFIX, name)
        };

        let segments: Vec<&str> = name.splitn(4, '/').collect();
        if segments.len() < 3 || !segments[0].is_empty() || segments[2].is_empty() {
            debug!(name = %name, "Invalid name syntax");
            return Err(NameError::InvalidSyntax(name.clone()));
        }

        let key = segments[2];

        let cached = self.cache.get(key);
        metrics::record_cache_lookup(cached.is_some());

        let path = match cached {
            Some(path) => path,
            None => {
                let kind = KeyKind::classify(key);
                let result = self.resolve_key(kind, key, options).await;
                metrics::record_resolution(kind.as_str(), result.is_ok());

                let resolution = result.map_err(|e| {
                    debug!(key = %key, resolver = kind.as_str(), error = %e, "Resolver failed");
                    NameError::ResolutionFailed(key.to_string())
                })?;

                self.cache.set(key, resolution.path.clone(), resolution.ttl);
                resolution.path
            }
        };

        let path = match segments.get(3) {
            Some(rest) => Path::from_segments("", &[path.as_str().trim_end_matches('/'), *rest])?,
            None => path,
        };

        Ok(Resolution::new(path, Duration::ZERO))
    }
}
