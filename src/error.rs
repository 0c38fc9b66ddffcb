/// Unified error types for the naming system
use crate::path::Path;
use thiserror::Error;

/// Main error type for resolution and publishing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Name does not split into the required segments
    #[error("Invalid name syntax: {0}")]
    InvalidSyntax(String),

    /// String is not a valid dms3fs or dms3ns path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The selected resolver failed; the cause is not carried past the dispatcher
    #[error("Could not resolve name: {0}")]
    ResolutionFailed(String),

    /// Depth ran out before reaching a content path
    #[error("Could not resolve name (recursion limit exceeded), stopped at {path}")]
    RecursionLimitReached { path: Path },

    /// The caller's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Record write or identity derivation failed
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// Value store has no record for the key
    #[error("Not found: {0}")]
    NotFound(String),

    /// Value store errors
    #[error("Routing error: {0}")]
    Routing(String),

    /// Record could not be decoded or verified
    #[error("Invalid name record: {0}")]
    InvalidRecord(String),

    /// Record EOL has passed
    #[error("Name record expired: {0}")]
    RecordExpired(String),

    /// DNS transport errors
    #[error("DNS error: {0}")]
    Dns(String),

    /// Domain has no dnslink TXT record
    #[error("No dnslink record found for {0}")]
    NoDnsLink(String),

    /// Domain has several differing dnslink TXT records
    #[error("Ambiguous dnslink records for {0}")]
    AmbiguousDnsLink(String),

    /// Key is not a proquint
    #[error("Invalid proquint: {0}")]
    InvalidProquint(String),

    /// Key material or peer id could not be parsed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NameError {
    /// Last path reached before the depth limit, if this is a recursion error
    pub fn partial_path(&self) -> Option<&Path> {
        match self {
            NameError::RecursionLimitReached { path } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for naming operations
pub type NameResult<T> = Result<T, NameError>;
