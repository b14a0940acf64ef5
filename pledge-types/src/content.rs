//! Content references (`ipfs://<cid>`)

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypesError};

/// URI scheme prefix for content-addressed references
pub const IPFS_SCHEME: &str = "ipfs://";

/// Reference to a stored payload, `ipfs://<cid>[/path]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentReference {
    uri: String,
}

impl ContentReference {
    /// Parse a reference, rejecting anything that is not `ipfs://` with a CID
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        let rest = uri.strip_prefix(IPFS_SCHEME).ok_or_else(|| {
            TypesError::InvalidContentReference(format!("must start with '{}': {}", IPFS_SCHEME, uri))
        })?;

        let cid = rest.split('/').next().unwrap_or_default();
        if cid.is_empty() {
            return Err(TypesError::InvalidContentReference(format!("missing CID: {}", uri)));
        }
        if !cid.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TypesError::InvalidContentReference(format!("invalid CID '{}'", cid)));
        }

        Ok(Self { uri: uri.to_string() })
    }

    /// Build a reference from a bare CID
    pub fn from_cid(cid: &str) -> Result<Self> {
        Self::parse(&format!("{}{}", IPFS_SCHEME, cid))
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Everything after the scheme (CID plus optional path)
    pub fn location(&self) -> &str {
        &self.uri[IPFS_SCHEME.len()..]
    }

    pub fn cid(&self) -> &str {
        self.location().split('/').next().unwrap_or_default()
    }
}

impl std::fmt::Display for ContentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl TryFrom<String> for ContentReference {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentReference> for String {
    fn from(value: ContentReference) -> Self {
        value.uri
    }
}
