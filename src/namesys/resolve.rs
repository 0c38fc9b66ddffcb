/// Recursive name resolution on top of single-hop resolvers
use crate::{
    config::DEFAULT_DEPTH_LIMIT,
    error::{NameError, NameResult},
    path::Path,
};
use async_trait::async_trait;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Hop limit for one top-level resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Follow pointers until a content path is reached
    Unbounded,
    /// Perform at most this many hops
    Limited(NonZeroU32),
}

impl Depth {
    /// `Limited(n)`, or `Unbounded` when `n` is zero
    pub fn limited(n: u32) -> Self {
        NonZeroU32::new(n).map_or(Depth::Unbounded, Depth::Limited)
    }

    fn is_last_hop(&self) -> bool {
        matches!(self, Depth::Limited(n) if n.get() == 1)
    }

    fn decrement(self) -> Self {
        match self {
            Depth::Limited(n) => NonZeroU32::new(n.get() - 1).map_or(self, Depth::Limited),
            Depth::Unbounded => Depth::Unbounded,
        }
    }
}

impl Default for Depth {
    fn default() -> Self {
        Depth::limited(DEFAULT_DEPTH_LIMIT)
    }
}

/// Caller-supplied resolution options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub depth: Depth,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }
}

/// Result of one hop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: Path,
    /// Suggested cache lifetime; zero means do not cache
    pub ttl: Duration,
}

impl Resolution {
    pub fn new(path: Path, ttl: Duration) -> Self {
        Self { path, ttl }
    }
}

/// Single-hop resolver trait
///
/// Resolves one name to one path without following the result.
#[async_trait]
pub trait ResolveOnce: Send + Sync {
    async fn resolve_once(&self, name: &str, options: &ResolveOptions) -> NameResult<Resolution>;
}

/// Resolve `name` by repeated single hops.
///
/// Stops at the first content path, when the depth runs out, or when a
/// result matches none of `prefixes`. With a single prefix the prefix is
/// stripped before the next hop.
pub async fn resolve<R: ResolveOnce + ?Sized>(
    resolver: &R,
    cancel: &CancellationToken,
    name: &str,
    options: &ResolveOptions,
    prefixes: &[&str],
) -> NameResult<Path> {
    let mut depth = options.depth;
    let mut name = name.to_string();

    loop {
        if cancel.is_cancelled() {
            return Err(NameError::Cancelled);
        }

        let resolution = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(NameError::Cancelled),
            result = resolver.resolve_once(&name, options) => result?,
        };
        let path = resolution.path;
        debug!(name = %name, path = %path, "Resolved name");

        if path.is_content() {
            return Ok(path);
        }

        if depth.is_last_hop() {
            return Err(NameError::RecursionLimitReached { path });
        }

        let Some(prefix) = prefixes.iter().find(|p| path.as_str().starts_with(**p)) else {
            return Ok(path);
        };

        name = if prefixes.len() == 1 {
            path.as_str()[prefix.len()..].to_string()
        } else {
            path.to_string()
        };

        depth = depth.decrement();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
    const PREFIX: &str = "/dms3ns/";

    /// Resolver backed by a fixed table; records every name it is asked for
    #[derive(Default)]
    struct TableResolver {
        table: HashMap<String, String>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl TableResolver {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResolveOnce for TableResolver {
        async fn resolve_once(&self, name: &str, _options: &ResolveOptions) -> NameResult<Resolution> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().push(name.to_string());
            let target = self
                .table
                .get(name)
                .ok_or_else(|| NameError::NotFound(name.to_string()))?;
            Ok(Resolution::new(Path::parse(target)?, Duration::ZERO))
        }
    }

    fn content() -> String {
        format!("/dms3fs/{}", CID)
    }

    #[tokio::test]
    async fn test_follows_chain_to_content() {
        let content = content();
        let resolver = TableResolver::new(&[
            ("/dms3ns/a", "/dms3ns/b"),
            ("b", "/dms3ns/c"),
            ("c", &content),
        ]);

        let p = resolve(&resolver, &CancellationToken::new(), "/dms3ns/a", &ResolveOptions::new(), &[PREFIX])
            .await
            .unwrap();

        assert_eq!(p.as_str(), content);
        assert_eq!(resolver.calls(), 3);
        // single prefix is stripped between hops
        assert_eq!(*resolver.seen.lock(), vec!["/dms3ns/a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_depth_one_stops_after_first_hop() {
        let content = content();
        let resolver = TableResolver::new(&[
            ("/dms3ns/a", "/dms3ns/b"),
            ("b", &content),
        ]);
        let options = ResolveOptions::new().depth(Depth::limited(1));

        let err = resolve(&resolver, &CancellationToken::new(), "/dms3ns/a", &options, &[PREFIX])
            .await
            .unwrap_err();

        assert_eq!(err.partial_path().map(Path::as_str), Some("/dms3ns/b"));
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_depth_bounds_cycles() {
        let resolver = TableResolver::new(&[("/dms3ns/a", "/dms3ns/b"), ("b", "/dms3ns/a"), ("a", "/dms3ns/b")]);
        let options = ResolveOptions::new().depth(Depth::limited(3));

        let err = resolve(&resolver, &CancellationToken::new(), "/dms3ns/a", &options, &[PREFIX])
            .await
            .unwrap_err();

        assert!(matches!(err, NameError::RecursionLimitReached { .. }));
        assert_eq!(resolver.calls(), 3);
    }

    #[tokio::test]
    async fn test_content_result_is_terminal_even_at_last_hop() {
        let content = content();
        let resolver = TableResolver::new(&[("/dms3ns/a", &content)]);
        let options = ResolveOptions::new().depth(Depth::limited(1));

        let p = resolve(&resolver, &CancellationToken::new(), "/dms3ns/a", &options, &[PREFIX])
            .await
            .unwrap();
        assert!(p.is_content());
    }

    #[tokio::test]
    async fn test_unmatched_prefix_returns_path() {
        let resolver = TableResolver::new(&[("x", "/dms3ns/elsewhere")]);

        let p = resolve(&resolver, &CancellationToken::new(), "x", &ResolveOptions::new(), &["/other/"])
            .await
            .unwrap();

        assert_eq!(p.as_str(), "/dms3ns/elsewhere");
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_several_prefixes_keep_full_path() {
        let content = content();
        let resolver = TableResolver::new(&[
            ("start", "/dms3ns/next"),
            ("/dms3ns/next", &content),
        ]);

        let p = resolve(
            &resolver,
            &CancellationToken::new(),
            "start",
            &ResolveOptions::new(),
            &["/other/", PREFIX],
        )
        .await
        .unwrap();

        assert!(p.is_content());
        assert_eq!(*resolver.seen.lock(), vec!["start", "/dms3ns/next"]);
    }

    #[tokio::test]
    async fn test_hop_error_aborts() {
        let resolver = TableResolver::new(&[("/dms3ns/a", "/dms3ns/b")]);

        let err = resolve(&resolver, &CancellationToken::new(), "/dms3ns/a", &ResolveOptions::new(), &[PREFIX])
            .await
            .unwrap_err();

        assert!(matches!(err, NameError::NotFound(_)));
        assert_eq!(resolver.calls(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_hop() {
        let resolver = TableResolver::new(&[]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = resolve(&resolver, &cancel, "/dms3ns/a", &ResolveOptions::new(), &[PREFIX])
            .await
            .unwrap_err();

        assert_eq!(err, NameError::Cancelled);
        assert_eq!(resolver.calls(), 0);
    }

    /// Resolver whose hop never completes
    struct StuckResolver;

    #[async_trait]
    impl ResolveOnce for StuckResolver {
        async fn resolve_once(&self, _name: &str, _options: &ResolveOptions) -> NameResult<Resolution> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancel_interrupts_hop() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let resolver = Arc::new(StuckResolver);
        let err = resolve(resolver.as_ref(), &cancel, "/dms3ns/a", &ResolveOptions::new(), &[PREFIX])
            .await
            .unwrap_err();

        assert_eq!(err, NameError::Cancelled);
        handle.await.unwrap();
    }

    #[test]
    fn test_depth_decrement() {
        assert_eq!(Depth::limited(0), Depth::Unbounded);
        assert_eq!(Depth::limited(3).decrement(), Depth::limited(2));
        assert!(Depth::limited(2).decrement().is_last_hop());
        assert_eq!(Depth::Unbounded.decrement(), Depth::Unbounded);
        assert!(!Depth::Unbounded.is_last_hop());
        assert_eq!(Depth::default(), Depth::limited(32));
    }
}
