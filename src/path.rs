/// Content and name paths
///
/// A path is a `/`-separated string whose first segment names the namespace:
/// `/dms3fs/<cid>[/<subpath>]` for immutable content and
/// `/dms3ns/<key>[/<subpath>]` for mutable names.
use crate::error::{NameError, NameResult};
use libipld::Cid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content-addressed namespace
pub const CONTENT_NAMESPACE: &str = "dms3fs";

/// Mutable-name namespace
pub const MUTABLE_NAMESPACE: &str = "dms3ns";

pub const CONTENT_PREFIX: &str = "/dms3fs/";
pub const MUTABLE_PREFIX: &str = "/dms3ns/";

/// Immutable, validated path value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path(String);

impl Path {
    /// Parse a path string.
    ///
    /// A bare CID, or a string starting with a CID segment, is placed in the
    /// content namespace.
    pub fn parse(txt: &str) -> NameResult<Self> {
        let parts: Vec<&str> = txt.split('/').collect();

        if !parts[0].is_empty() {
            Cid::from_str(parts[0])
                .map_err(|e| NameError::InvalidPath(format!("{}: {}", txt, e)))?;
            return Ok(Path(format!("{}{}", CONTENT_PREFIX, txt)));
        }

        if parts.len() < 3 {
            return Err(NameError::InvalidPath(txt.to_string()));
        }

        match parts[1] {
            CONTENT_NAMESPACE => {
                Cid::from_str(parts[2])
                    .map_err(|e| NameError::InvalidPath(format!("{}: {}", txt, e)))?;
            }
            MUTABLE_NAMESPACE => {
                if parts[2].is_empty() {
                    return Err(NameError::InvalidPath(txt.to_string()));
                }
            }
            _ => return Err(NameError::InvalidPath(txt.to_string())),
        }

        Ok(Path(txt.to_string()))
    }

    /// Content path for a CID
    pub fn from_cid(cid: &Cid) -> Self {
        Path(format!("{}{}", CONTENT_PREFIX, cid))
    }

    /// Join `segments` with `/`, prepend `prefix` and parse the result
    pub fn from_segments(prefix: &str, segments: &[&str]) -> NameResult<Self> {
        Self::parse(&format!("{}{}", prefix, segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace segment (`dms3fs` or `dms3ns`)
    pub fn namespace(&self) -> &str {
        self.0.split('/').nth(1).unwrap_or_default()
    }

    /// Whether this path is terminal for resolution
    pub fn is_content(&self) -> bool {
        self.0.starts_with(CONTENT_PREFIX)
    }

    pub fn is_mutable(&self) -> bool {
        self.0.starts_with(MUTABLE_PREFIX)
    }

    /// Non-empty segments after the leading `/`
    pub fn segments(&self) -> Vec<&str> {
        self.0.split('/').filter(|s| !s.is_empty()).collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Path {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Path::parse(&value)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.0
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
