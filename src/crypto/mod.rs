/// Cryptography module for name records and key management
///
/// Handles secp256k1 signing of name records and peer identity derivation

pub mod keys;
pub mod record;

pub use keys::{PeerId, PrivateKey};
pub use record::{routing_key, NameRecord};
