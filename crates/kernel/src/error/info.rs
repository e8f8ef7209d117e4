//! Error Info - Plain error payload for state snapshots
//!
//! Errors in the onboarding subsystem are recovered at the boundary
//! where they occur and surfaced as plain `{message, code?}` data
//! attached to the owning state snapshot. They are never thrown into
//! the flow state machine, so [`ErrorInfo`] is deliberately a value,
//! not an `Error` impl with a source chain.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::kind::ErrorKind;

/// User-facing error payload.
///
/// ## Examples
/// ```rust
/// use kernel::error::{info::ErrorInfo, kind::ErrorKind};
///
/// let err = ErrorInfo::new("Member lookup failed").with_kind(ErrorKind::Datastore);
/// assert_eq!(err.code(), Some("datastore"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// User-facing message
    pub message: String,
    /// Stable machine-readable code (from [`ErrorKind`])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Cow<'static, str>>,
}

impl ErrorInfo {
    /// Create a payload with just a message
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Attach an explicit code
    #[inline]
    pub fn with_code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach the stable code of an [`ErrorKind`]
    #[inline]
    pub fn with_kind(self, kind: ErrorKind) -> Self {
        self.with_code(kind.code())
    }

    /// Machine-readable code, if any
    #[inline]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl<E> From<&E> for ErrorInfo
where
    E: std::error::Error,
{
    fn from(err: &E) -> Self {
        Self::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let info = ErrorInfo::new("boom");
        assert_eq!(info.message, "boom");
        assert!(info.code().is_none());
    }

    #[test]
    fn test_with_kind() {
        let info = ErrorInfo::new("lookup failed").with_kind(ErrorKind::Datastore);
        assert_eq!(info.code(), Some("datastore"));
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorInfo::new("boom").to_string(), "boom");
        assert_eq!(
            ErrorInfo::new("boom").with_kind(ErrorKind::Storage).to_string(),
            "[storage] boom"
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let info = ErrorInfo::new("boom").with_kind(ErrorKind::Provider);
        let json = serde_json::to_string(&info).unwrap();
        let back: ErrorInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn test_code_omitted_from_json_when_absent() {
        let json = serde_json::to_value(ErrorInfo::new("boom")).unwrap();
        assert!(json.get("code").is_none());
    }
}
