//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum used to classify failures across the
//! onboarding subsystem. Kinds carry two pieces of policy: a stable
//! string code (used as the `code` field of user-facing error
//! payloads) and whether a retry can reasonably succeed.

use serde::Serialize;

/// Failure classification for the onboarding subsystem.
///
/// ## Notes
/// * `non_exhaustive` - more classifications may be added later
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::Provider;
/// assert_eq!(kind.code(), "provider");
/// assert!(kind.is_retryable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Identity-provider failure (init, login, profile fetch)
    Provider,
    /// No identity profile could be obtained
    ProfileUnavailable,
    /// Member datastore lookup/create/update failure
    Datastore,
    /// Durable state store (cache / event log) failure
    Storage,
    /// Record could not be serialized or deserialized
    Serialization,
    /// Unexpected internal failure
    Internal,
}

impl ErrorKind {
    /// Stable string code for error payloads and logs
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::Provider => "provider",
            ErrorKind::ProfileUnavailable => "profile_unavailable",
            ErrorKind::Datastore => "datastore",
            ErrorKind::Storage => "storage",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Internal => "internal",
        }
    }

    /// Whether invoking the retry action can reasonably succeed.
    ///
    /// Serialization failures are deterministic: the same record fails
    /// the same way on the next attempt. Everything else in this
    /// subsystem is transient.
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, ErrorKind::Serialization)
    }

    /// Whether the failure occurred inside this process rather than in
    /// an external collaborator. These are the ones worth alerting on.
    #[inline]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            ErrorKind::Storage | ErrorKind::Serialization | ErrorKind::Internal
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ErrorKind::Provider.code(), "provider");
        assert_eq!(ErrorKind::ProfileUnavailable.code(), "profile_unavailable");
        assert_eq!(ErrorKind::Datastore.code(), "datastore");
        assert_eq!(ErrorKind::Storage.code(), "storage");
        assert_eq!(ErrorKind::Serialization.code(), "serialization");
        assert_eq!(ErrorKind::Internal.code(), "internal");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::Provider.is_retryable());
        assert!(ErrorKind::ProfileUnavailable.is_retryable());
        assert!(ErrorKind::Datastore.is_retryable());
        assert!(!ErrorKind::Serialization.is_retryable());
    }

    #[test]
    fn test_is_local() {
        assert!(!ErrorKind::Provider.is_local());
        assert!(!ErrorKind::Datastore.is_local());
        assert!(ErrorKind::Storage.is_local());
        assert!(ErrorKind::Internal.is_local());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::Datastore.to_string(), "datastore");
    }
}
