/// DMS3 Namesys - naming layer of the dms3fs network
///
/// Maps DNS domains, proquint keys and peer-identity names to immutable
/// `/dms3fs/` content paths, and publishes signed, time-bounded name records
/// to the distributed value store.

pub mod config;
pub mod crypto;
pub mod error;
pub mod metrics;
pub mod namesys;
pub mod path;
pub mod store;

pub use config::NameSysConfig;
pub use crypto::{PeerId, PrivateKey};
pub use error::{NameError, NameResult};
pub use namesys::{Depth, KeyKind, NameSystem, ResolveOptions};
pub use path::Path;
pub use tokio_util::sync::CancellationToken;
