//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain identifiers.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Checks that `component` can be used as a single path segment
///
/// Rejects empty strings, separators (`/` and `\`), NUL bytes and the
/// `.`/`..` segments so a component can never escape its parent directory.
pub(crate) fn is_safe_component(component: &str) -> bool {
    !component.is_empty()
        && component != "."
        && component != ".."
        && !component.contains(['/', '\\', '\0'])
}

// ============================================================================
// OwnerId
// ============================================================================

/// Identifier of the account whose files are mirrored
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Create a new OwnerId
    ///
    /// # Errors
    /// Returns error if the ID is empty or cannot be used as a path segment
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if !is_safe_component(&id) {
            return Err(DomainError::InvalidOwner(format!(
                "Owner ID must be a non-empty single path segment: {id:?}"
            )));
        }
        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OwnerId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<OwnerId> for String {
    fn from(id: OwnerId) -> Self {
        id.0
    }
}

// ============================================================================
// RemotePath
// ============================================================================

/// Object key of a file inside the remote catalog
///
/// Keys are relative, slash separated, e.g. `"user-1/news/video.mp4"`.
/// A remote path uniquely identifies a file within the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath(String);

impl RemotePath {
    /// Create a new RemotePath
    ///
    /// # Errors
    /// Returns error if the path is absolute, has empty segments or
    /// contains traversal segments
    pub fn new(path: impl Into<String>) -> Result<Self, DomainError> {
        let path = path.into();
        if path.starts_with('/') {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path must be relative: {path}"
            )));
        }

        if path.is_empty() || !path.split('/').all(is_safe_component) {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path contains an empty or invalid segment: {path:?}"
            )));
        }

        Ok(Self(path))
    }

    /// Derives the key under which a file is stored in the catalog
    ///
    /// The key is `owner/collection/filename`, so uploading the same triple
    /// twice addresses the same object.
    ///
    /// # Errors
    /// Returns error if the collection or filename is not a safe segment
    pub fn derive(
        owner: &OwnerId,
        collection_name: &str,
        filename: &str,
    ) -> Result<Self, DomainError> {
        if !is_safe_component(collection_name) {
            return Err(DomainError::InvalidCollection(collection_name.to_string()));
        }
        if !is_safe_component(filename) {
            return Err(DomainError::InvalidFilename(filename.to_string()));
        }
        Self::new(format!("{}/{collection_name}/{filename}", owner.as_str()))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the last segment of the key
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Iterates over the key's segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl Display for RemotePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemotePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RemotePath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemotePath> for String {
    fn from(path: RemotePath) -> Self {
        path.0
    }
}
