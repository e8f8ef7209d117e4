//! Flow State Value Object
//!
//! The single discrete UI-facing phase of the onboarding process.
//! Exactly one value is current at any time; it is recomputed from the
//! input snapshots by [`crate::domain::flow::reduce`], never set
//! directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Onboarding flow state
///
/// Ordering of variants mirrors the happy path; the reducer's priority
/// table, not this ordering, decides which state wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    /// Identity provider still initializing (also the fallback state)
    #[default]
    Initializing,
    /// Provider ready, user not logged in yet
    Authenticating,
    /// Registration or member fetch in flight
    Registering,
    /// Newly registered user, welcome screen showing
    Success,
    /// Any input snapshot carries an error
    Error,
    /// Onboarding finished, member available
    Ready,
}

impl FlowState {
    /// Get string code for serialization/API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Authenticating => "authenticating",
            Self::Registering => "registering",
            Self::Success => "success",
            Self::Error => "error",
            Self::Ready => "ready",
        }
    }

    /// Create from string code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "initializing" => Some(Self::Initializing),
            "authenticating" => Some(Self::Authenticating),
            "registering" => Some(Self::Registering),
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "ready" => Some(Self::Ready),
            _ => None,
        }
    }

    /// Whether the UI should offer a retry action
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Whether the flow is still working (spinner states)
    #[inline]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Initializing | Self::Registering)
    }

    /// Whether onboarding produced a usable member
    #[inline]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(FlowState::from_code("initializing"), Some(FlowState::Initializing));
        assert_eq!(FlowState::from_code("authenticating"), Some(FlowState::Authenticating));
        assert_eq!(FlowState::from_code("registering"), Some(FlowState::Registering));
        assert_eq!(FlowState::from_code("success"), Some(FlowState::Success));
        assert_eq!(FlowState::from_code("error"), Some(FlowState::Error));
        assert_eq!(FlowState::from_code("ready"), Some(FlowState::Ready));
        assert_eq!(FlowState::from_code("bogus"), None);
    }

    #[test]
    fn test_display_round_trip() {
        for state in [
            FlowState::Initializing,
            FlowState::Authenticating,
            FlowState::Registering,
            FlowState::Success,
            FlowState::Error,
            FlowState::Ready,
        ] {
            assert_eq!(FlowState::from_code(&state.to_string()), Some(state));
        }
    }

    #[test]
    fn test_default() {
        assert_eq!(FlowState::default(), FlowState::Initializing);
    }

    #[test]
    fn test_predicates() {
        assert!(FlowState::Error.is_retryable());
        assert!(!FlowState::Ready.is_retryable());
        assert!(FlowState::Registering.is_busy());
        assert!(FlowState::Ready.is_complete());
        assert!(!FlowState::Success.is_complete());
    }
}
