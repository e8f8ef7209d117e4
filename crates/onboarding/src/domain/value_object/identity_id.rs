//! Identity Id Value Object
//!
//! The externally-issued identifier of an authenticated user. Issued
//! by the identity provider; opaque to this subsystem beyond being a
//! non-empty string.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity id validation error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentityIdError {
    #[error("Identity id must not be empty")]
    Empty,
    #[error("Identity id exceeds {max} characters", max = IdentityId::MAX_LEN)]
    TooLong,
}

/// Externally-issued identity identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    /// Provider ids are short tokens; the cap only bounds pathological input.
    pub const MAX_LEN: usize = 128;

    /// Create a validated identity id
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentityIdError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(IdentityIdError::Empty);
        }
        if raw.len() > Self::MAX_LEN {
            return Err(IdentityIdError::TooLong);
        }
        Ok(Self(raw))
    }

    /// Borrow as string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdentityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
