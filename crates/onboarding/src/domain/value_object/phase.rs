//! Phase Value Object
//!
//! Classifies lifecycle events and errors into the phase of the
//! onboarding flow they belong to. Derived from event-type codes by
//! substring matching; the match order is fixed and significant
//! (e.g. `flow_error` must classify as flow control, not unknown).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Onboarding phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    LiffInitialization,
    Authentication,
    Registration,
    FlowControl,
    MemberStatus,
    Unknown,
}

impl Phase {
    /// Get string code for serialization/API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::LiffInitialization => "liff_initialization",
            Self::Authentication => "authentication",
            Self::Registration => "registration",
            Self::FlowControl => "flow_control",
            Self::MemberStatus => "member_status",
            Self::Unknown => "unknown",
        }
    }

    /// Classify an event-type code into its phase.
    ///
    /// Match order: liff, auth, registration, flow, member.
    pub fn from_event_code(code: &str) -> Self {
        if code.contains("liff") {
            Self::LiffInitialization
        } else if code.contains("auth") {
            Self::Authentication
        } else if code.contains("registration") {
            Self::Registration
        } else if code.contains("flow") {
            Self::FlowControl
        } else if code.contains("member") {
            Self::MemberStatus
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
