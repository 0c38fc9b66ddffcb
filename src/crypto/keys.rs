/// Key handling for name publishing
///
/// Implements secp256k1 signing keys and the peer identities derived from them
use crate::error::{NameError, NameResult};
use k256::{
    ecdsa::{signature::Signer, Signature, SigningKey, VerifyingKey},
    SecretKey,
};
use libipld::multihash::{Code, Multihash, MultihashDigest};
use std::fmt;

/// Peer identity: the sha2-256 multihash of a compressed public key
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PeerId(Vec<u8>);

impl PeerId {
    /// Derive the identity of a public key
    pub fn from_public_key(key: &VerifyingKey) -> Self {
        Self::from_public_key_bytes(key.to_encoded_point(true).as_bytes())
    }

    /// Derive the identity of compressed SEC1 public key bytes
    pub fn from_public_key_bytes(public_key: &[u8]) -> Self {
        PeerId(Code::Sha2_256.digest(public_key).to_bytes())
    }

    /// Parse a base58btc-encoded multihash with a known hash code
    pub fn from_base58(s: &str) -> NameResult<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| NameError::InvalidKey(format!("{}: {}", s, e)))?;

        let mh = Multihash::from_bytes(&bytes)
            .map_err(|e| NameError::InvalidKey(format!("{}: not a multihash: {}", s, e)))?;

        if Code::try_from(mh.code()).is_err() {
            return Err(NameError::InvalidKey(format!(
                "{}: unknown multihash code {:#x}",
                s,
                mh.code()
            )));
        }

        Ok(PeerId(bytes))
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Raw multihash bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.to_base58())
    }
}

/// Private key used to sign name records
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Create a key from 32 secret bytes
    pub fn from_bytes(private_key: &[u8]) -> NameResult<Self> {
        if private_key.len() != 32 {
            return Err(NameError::InvalidKey(
                "Private key must be exactly 32 bytes".to_string(),
            ));
        }

        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| NameError::InvalidKey(format!("Invalid private key: {}", e)))?;

        Ok(Self {
            signing_key: SigningKey::from(secret_key),
        })
    }

    /// Create a key from hex-encoded secret bytes
    pub fn from_hex(hex_key: &str) -> NameResult<Self> {
        let key_bytes = hex::decode(hex_key)
            .map_err(|e| NameError::InvalidKey(format!("Invalid hex private key: {}", e)))?;

        Self::from_bytes(&key_bytes)
    }

    /// Sign raw bytes, returning a 64-byte signature
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(data);
        signature.to_bytes().to_vec()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        *self.signing_key.verifying_key()
    }

    /// Compressed SEC1 public key (33 bytes)
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.verifying_key().to_encoded_point(true).as_bytes().to_vec()
    }

    pub fn peer_id(&self) -> PeerId {
        PeerId::from_public_key(&self.verifying_key())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("peer_id", &self.peer_id())
            .finish_non_exhaustive()
    }
}
