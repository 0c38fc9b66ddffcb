/// DNS resolver - follows dnslink TXT records
use crate::{
    config::DnsConfig,
    error::{NameError, NameResult},
    namesys::resolve::{Resolution, ResolveOnce, ResolveOptions},
    path::Path,
};
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::Resolver;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DNSLINK_PREFIX: &str = "dnslink=";
const DNSLINK_SUBDOMAIN: &str = "_dnslink.";

/// TXT records of one name and how long they may be cached
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxtAnswer {
    pub records: Vec<String>,
    pub ttl: Duration,
}

/// DNS TXT lookup trait
#[async_trait]
pub trait TxtLookup: Send + Sync {
    async fn lookup_txt(&self, name: &str) -> NameResult<TxtAnswer>;
}

/// TXT lookups through hickory
pub struct HickoryTxtLookup {
    resolver: Resolver<TokioConnectionProvider>,
}

impl HickoryTxtLookup {
    /// Use the host's resolver configuration
    pub fn from_system_conf() -> NameResult<Self> {
        let resolver = Resolver::builder_tokio()
            .map_err(|e| NameError::Dns(format!("Failed to read system DNS config: {}", e)))?
            .build();

        Ok(Self { resolver })
    }

    /// Query the given upstream servers over UDP
    pub fn with_upstreams(upstreams: &[SocketAddr]) -> NameResult<Self> {
        if upstreams.is_empty() {
            return Err(NameError::Config(
                "No upstream DNS servers configured".to_string(),
            ));
        }

        let name_servers: Vec<NameServerConfig> = upstreams
            .iter()
            .map(|addr| NameServerConfig::new(*addr, Protocol::Udp))
            .collect();
        let config = ResolverConfig::from_parts(None, vec![], name_servers);

        let resolver =
            Resolver::builder_with_config(config, TokioConnectionProvider::default()).build();

        debug!(upstream_count = upstreams.len(), "Created DNS TXT resolver");

        Ok(Self { resolver })
    }

    pub fn from_config(config: &DnsConfig) -> NameResult<Self> {
        if config.upstreams.is_empty() {
            Self::from_system_conf()
        } else {
            Self::with_upstreams(&config.upstreams)
        }
    }
}

#[async_trait]
impl TxtLookup for HickoryTxtLookup {
    async fn lookup_txt(&self, name: &str) -> NameResult<TxtAnswer> {
        let lookup = self
            .resolver
            .txt_lookup(name)
            .await
            .map_err(|e| NameError::Dns(format!("{}: {}", name, e)))?;

        let ttl = lookup
            .valid_until()
            .saturating_duration_since(std::time::Instant::now());

        // A TXT record may be split into several character strings
        let records = lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|data| String::from_utf8_lossy(data).into_owned())
                    .collect::<String>()
            })
            .collect();

        Ok(TxtAnswer { records, ttl })
    }
}

/// Resolves domains through `dnslink=` TXT records
pub struct DnsResolver {
    lookup: Arc<dyn TxtLookup>,
}

impl DnsResolver {
    pub fn new(lookup: Arc<dyn TxtLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl ResolveOnce for DnsResolver {
    async fn resolve_once(&self, name: &str, _options: &ResolveOptions) -> NameResult<Resolution> {
        let (domain, rest) = match name.split_once('/') {
            Some((domain, rest)) => (domain, Some(rest)),
            None => (name, None),
        };

        if !is_domain(domain) {
            return Err(NameError::InvalidSyntax(format!("not a valid domain name: {}", domain)));
        }

        let subdomain = format!("{}{}", DNSLINK_SUBDOMAIN, domain);
        let (sub_answer, root_answer) = tokio::join!(
            self.lookup.lookup_txt(&subdomain),
            self.lookup.lookup_txt(domain),
        );

        // The _dnslink subdomain takes precedence when it carries a link
        let resolution = match sub_answer {
            Ok(answer) if !parse_links(&answer).is_empty() => pick_link(domain, &answer)?,
            sub => {
                if let Err(e) = sub {
                    debug!(domain = %subdomain, error = %e, "dnslink subdomain lookup failed");
                }
                pick_link(domain, &root_answer?)?
            }
        };

        match rest {
            Some(rest) => Ok(Resolution::new(
                Path::from_segments("", &[resolution.path.as_str().trim_end_matches('/'), rest])?,
                resolution.ttl,
            )),
            None => Ok(resolution),
        }
    }
}

/// Parse one TXT record as a dnslink entry
fn parse_entry(txt: &str) -> Option<Path> {
    txt.trim()
        .strip_prefix(DNSLINK_PREFIX)
        .and_then(|link| Path::parse(link.trim()).ok())
}

/// Distinct dnslink paths in an answer, in record order
fn parse_links(answer: &TxtAnswer) -> Vec<Path> {
    let mut links: Vec<Path> = Vec::new();
    for path in answer.records.iter().filter_map(|txt| parse_entry(txt)) {
        if !links.contains(&path) {
            links.push(path);
        }
    }
    links
}

fn pick_link(domain: &str, answer: &TxtAnswer) -> NameResult<Resolution> {
    let mut links = parse_links(answer);
    match links.len() {
        0 => Err(NameError::NoDnsLink(domain.to_string())),
        1 => Ok(Resolution::new(links.remove(0), answer.ttl)),
        _ => Err(NameError::AmbiguousDnsLink(domain.to_string())),
    }
}

/// Whether `s` is a syntactically valid domain name with an alphabetic TLD
pub fn is_domain(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);

    if s.is_empty() || s.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = s.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    for label in &labels {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        if label.starts_with('-') || label.ends_with('-') {
            return false;
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return false;
        }
    }

    labels
        .last()
        .map(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false)
}
