/// Configuration management for the naming system
use crate::error::{NameError, NameResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Default lifetime of a resolved entry in the resolution cache
pub const DEFAULT_RESOLVER_CACHE_TTL: Duration = Duration::from_secs(60);

/// Default validity of a published record (24 hours)
pub const DEFAULT_RECORD_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Default hop limit for one top-level resolve
pub const DEFAULT_DEPTH_LIMIT: u32 = 32;

/// Main naming system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameSysConfig {
    pub cache: CacheConfig,
    pub publish: PublishConfig,
    pub resolve: ResolveConfig,
    pub dns: DnsConfig,
    pub logging: LoggingConfig,
}

/// Resolution cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries, 0 disables the cache
    pub size: usize,
    /// Default TTL for cache entries in seconds
    pub ttl_secs: u64,
}

/// Publisher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Record lifetime used by `publish` in seconds
    pub record_lifetime_secs: u64,
    /// Cache TTL embedded in published records, in seconds
    pub record_ttl_secs: Option<u64>,
}

/// Resolve defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Hop limit, 0 means unbounded
    pub depth_limit: u32,
}

/// DNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Upstream servers; empty means use the system resolver configuration
    pub upstreams: Vec<SocketAddr>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for NameSysConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig {
                size: 128,
                ttl_secs: DEFAULT_RESOLVER_CACHE_TTL.as_secs(),
            },
            publish: PublishConfig {
                record_lifetime_secs: DEFAULT_RECORD_LIFETIME.as_secs(),
                record_ttl_secs: None,
            },
            resolve: ResolveConfig {
                depth_limit: DEFAULT_DEPTH_LIMIT,
            },
            dns: DnsConfig {
                upstreams: Vec::new(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl PublishConfig {
    pub fn record_lifetime(&self) -> Duration {
        Duration::from_secs(self.record_lifetime_secs)
    }

    pub fn record_ttl(&self) -> Option<Duration> {
        self.record_ttl_secs.map(Duration::from_secs)
    }

    /// End of life for a record published at `now`
    pub fn record_eol(&self, now: DateTime<Utc>) -> NameResult<DateTime<Utc>> {
        let out_of_range = || {
            NameError::Config(format!(
                "Record lifetime of {}s is out of range",
                self.record_lifetime_secs
            ))
        };

        let lifetime =
            chrono::Duration::from_std(self.record_lifetime()).map_err(|_| out_of_range())?;
        now.checked_add_signed(lifetime).ok_or_else(out_of_range)
    }
}

impl NameSysConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> NameResult<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let cache_size = env::var("NAMESYS_CACHE_SIZE")
            .unwrap_or_else(|_| defaults.cache.size.to_string())
            .parse()
            .map_err(|_| NameError::Config("Invalid cache size".to_string()))?;
        let cache_ttl_secs = env::var("NAMESYS_CACHE_TTL_SECS")
            .unwrap_or_else(|_| defaults.cache.ttl_secs.to_string())
            .parse()
            .map_err(|_| NameError::Config("Invalid cache TTL".to_string()))?;
        let record_lifetime_secs = env::var("NAMESYS_RECORD_LIFETIME_SECS")
            .unwrap_or_else(|_| defaults.publish.record_lifetime_secs.to_string())
            .parse()
            .map_err(|_| NameError::Config("Invalid record lifetime".to_string()))?;
        let record_ttl_secs = match env::var("NAMESYS_RECORD_TTL_SECS") {
            Ok(raw) => Some(
                raw.parse()
                    .map_err(|_| NameError::Config("Invalid record TTL".to_string()))?,
            ),
            Err(_) => None,
        };
        let depth_limit = env::var("NAMESYS_DEPTH_LIMIT")
            .unwrap_or_else(|_| defaults.resolve.depth_limit.to_string())
            .parse()
            .map_err(|_| NameError::Config("Invalid depth limit".to_string()))?;

        // Comma-separated ip:port list
        let upstreams = parse_upstreams(&env::var("NAMESYS_DNS_UPSTREAMS").unwrap_or_default())?;

        let level = env::var("NAMESYS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let config = NameSysConfig {
            cache: CacheConfig {
                size: cache_size,
                ttl_secs: cache_ttl_secs,
            },
            publish: PublishConfig {
                record_lifetime_secs,
                record_ttl_secs,
            },
            resolve: ResolveConfig { depth_limit },
            dns: DnsConfig { upstreams },
            logging: LoggingConfig { level },
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> NameResult<()> {
        if self.cache.ttl_secs == 0 {
            return Err(NameError::Config(
                "Cache TTL must be greater than zero".to_string(),
            ));
        }

        if self.publish.record_lifetime_secs == 0 {
            return Err(NameError::Config(
                "Record lifetime must be greater than zero".to_string(),
            ));
        }
        self.publish.record_eol(Utc::now())?;

        if self.publish.record_ttl_secs == Some(0) {
            return Err(NameError::Config(
                "Record TTL must be greater than zero when set".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_upstreams(raw: &str) -> NameResult<Vec<SocketAddr>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<SocketAddr>()
                .map_err(|e| NameError::Config(format!("Invalid DNS upstream {}: {}", s, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NameSysConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl(), DEFAULT_RESOLVER_CACHE_TTL);
        assert_eq!(config.publish.record_lifetime(), DEFAULT_RECORD_LIFETIME);
        assert_eq!(config.resolve.depth_limit, 32);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = NameSysConfig::default();
        config.cache.ttl_secs = 0;
        assert!(matches!(config.validate(), Err(NameError::Config(_))));
    }

    #[test]
    fn test_unrepresentable_record_lifetime_rejected() {
        let mut config = NameSysConfig::default();
        config.publish.record_lifetime_secs = 10_000_000_000_000;

        assert!(matches!(config.validate(), Err(NameError::Config(_))));
        assert!(config.publish.record_eol(Utc::now()).is_err());
    }

    #[test]
    fn test_record_eol_adds_lifetime() {
        let config = NameSysConfig::default();
        let now = Utc::now();

        let eol = config.publish.record_eol(now).unwrap();
        assert_eq!(eol - now, chrono::Duration::hours(24));
    }

    #[test]
    fn test_record_ttl() {
        let mut config = NameSysConfig::default();
        assert_eq!(config.publish.record_ttl(), None);

        config.publish.record_ttl_secs = Some(90);
        assert_eq!(config.publish.record_ttl(), Some(Duration::from_secs(90)));
        assert!(config.validate().is_ok());

        config.publish.record_ttl_secs = Some(0);
        assert!(matches!(config.validate(), Err(NameError::Config(_))));
    }

    #[test]
    fn test_parse_upstreams() {
        let upstreams = parse_upstreams("1.1.1.1:53, 8.8.8.8:53,").unwrap();
        assert_eq!(upstreams.len(), 2);
        assert_eq!(upstreams[0].port(), 53);

        assert!(parse_upstreams("").unwrap().is_empty());
        assert!(parse_upstreams("not-an-address").is_err());
    }
}
