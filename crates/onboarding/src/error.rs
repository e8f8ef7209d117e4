//! Onboarding Error Types
//!
//! Failures from the collaborators this subsystem drives (identity
//! provider, member datastore, durable state store). Everything here is
//! recoverable: errors are caught at the boundary where they occur,
//! converted to [`ErrorInfo`] payloads on the owning state snapshot,
//! and never thrown into the flow state machine.

use kernel::error::{info::ErrorInfo, kind::ErrorKind};
use thiserror::Error;

/// Onboarding-specific result type alias
pub type OnboardingResult<T> = Result<T, OnboardingError>;

/// Onboarding-specific error variants
#[derive(Debug, Error)]
pub enum OnboardingError {
    /// No identity profile could be obtained (cached or fetched)
    #[error("No identity profile available")]
    ProfileUnavailable,

    /// Identity provider failure (init, login, profile fetch)
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// Member datastore failure other than not-found
    #[error("Member datastore error: {0}")]
    Datastore(String),

    /// Durable state store failure (cache / event log persistence)
    #[error("State store error: {0}")]
    Storage(String),

    /// Record serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OnboardingError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            OnboardingError::ProfileUnavailable => ErrorKind::ProfileUnavailable,
            OnboardingError::Provider(_) => ErrorKind::Provider,
            OnboardingError::Datastore(_) => ErrorKind::Datastore,
            OnboardingError::Storage(_) => ErrorKind::Storage,
            OnboardingError::Serialization(_) => ErrorKind::Serialization,
            OnboardingError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Convert to the plain payload attached to state snapshots
    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.to_string()).with_kind(self.kind())
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            OnboardingError::Storage(msg) => {
                tracing::error!(message = %msg, "State store error");
            }
            OnboardingError::Serialization(e) => {
                tracing::error!(error = %e, "Record serialization error");
            }
            OnboardingError::Internal(msg) => {
                tracing::error!(message = %msg, "Onboarding internal error");
            }
            OnboardingError::Datastore(msg) => {
                tracing::warn!(message = %msg, "Member datastore error");
            }
            _ => {
                tracing::debug!(error = %self, "Onboarding error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            OnboardingError::ProfileUnavailable.kind(),
            ErrorKind::ProfileUnavailable
        );
        assert_eq!(
            OnboardingError::Provider("down".into()).kind(),
            ErrorKind::Provider
        );
        assert_eq!(
            OnboardingError::Datastore("timeout".into()).kind(),
            ErrorKind::Datastore
        );
        assert_eq!(
            OnboardingError::Storage("full".into()).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_to_error_info_carries_code() {
        let info = OnboardingError::Datastore("timeout".into()).to_error_info();
        assert_eq!(info.code(), Some("datastore"));
        assert!(info.message.contains("timeout"));
    }

    #[test]
    fn test_serialization_from() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: OnboardingError = err.into();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }
}
