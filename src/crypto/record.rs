/// Signed name records
///
/// A record binds a peer identity to a path until an absolute end of life.
use crate::{
    crypto::keys::{PeerId, PrivateKey},
    error::{NameError, NameResult},
    path::{Path, MUTABLE_PREFIX},
};
use chrono::{DateTime, SecondsFormat, Utc};
use k256::ecdsa::{signature::Verifier, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Signed pointer record stored in the value store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameRecord {
    /// Target path
    pub value: Path,

    /// Absolute end of life
    pub validity: DateTime<Utc>,

    /// Monotonic publish counter for this identity
    pub sequence: u64,

    /// Suggested cache lifetime in nanoseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_ns: Option<u64>,

    /// Compressed SEC1 public key of the publisher
    pub public_key: Vec<u8>,

    /// ECDSA signature over value, validity and sequence
    pub signature: Vec<u8>,
}

impl NameRecord {
    /// Build and sign a record
    pub fn create(
        key: &PrivateKey,
        value: Path,
        sequence: u64,
        eol: DateTime<Utc>,
        ttl: Option<Duration>,
    ) -> Self {
        let signature = key.sign(&signing_bytes(&value, &eol, sequence));

        Self {
            value,
            validity: eol,
            sequence,
            // saturates at about 584 years
            ttl_ns: ttl.map(|t| u64::try_from(t.as_nanos()).unwrap_or(u64::MAX)),
            public_key: key.public_key_bytes(),
            signature,
        }
    }

    /// Check that the record was signed by the owner of `expected`
    pub fn verify(&self, expected: &PeerId) -> NameResult<()> {
        if PeerId::from_public_key_bytes(&self.public_key) != *expected {
            return Err(NameError::InvalidRecord(format!(
                "public key does not match {}",
                expected
            )));
        }

        let verifying_key = VerifyingKey::from_sec1_bytes(&self.public_key)
            .map_err(|e| NameError::InvalidRecord(format!("bad public key: {}", e)))?;
        let signature = Signature::from_slice(&self.signature)
            .map_err(|e| NameError::InvalidRecord(format!("bad signature: {}", e)))?;

        verifying_key
            .verify(
                &signing_bytes(&self.value, &self.validity, self.sequence),
                &signature,
            )
            .map_err(|_| NameError::InvalidRecord(format!("signature check failed for {}", expected)))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.validity <= now
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ns.map(Duration::from_nanos)
    }

    pub fn to_bytes(&self) -> NameResult<Vec<u8>> {
        serde_cbor::to_vec(self)
            .map_err(|e| NameError::Internal(format!("Failed to encode name record: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> NameResult<Self> {
        serde_cbor::from_slice(bytes)
            .map_err(|e| NameError::InvalidRecord(format!("Failed to decode name record: {}", e)))
    }
}

/// Value store key for an identity's record: `/dms3ns/` followed by the raw id bytes
pub fn routing_key(id: &PeerId) -> Vec<u8> {
    let mut key = MUTABLE_PREFIX.as_bytes().to_vec();
    key.extend_from_slice(id.as_bytes());
    key
}

fn signing_bytes(value: &Path, validity: &DateTime<Utc>, sequence: u64) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(value.as_str().as_bytes());
    data.extend_from_slice(validity.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
    data.extend_from_slice(&sequence.to_be_bytes());
    data
}
