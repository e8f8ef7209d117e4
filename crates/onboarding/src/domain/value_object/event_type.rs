//! Event Type Value Object
//!
//! Closed enumeration of lifecycle event types recorded by the
//! analytics engine. The string codes are the wire/report values and
//! must stay stable; rate statistics and phase classification are both
//! derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::phase::Phase;

/// Lifecycle event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    LiffInitStart,
    LiffInitSuccess,
    LiffInitError,
    AuthStart,
    AuthSuccess,
    AuthError,
    AuthProfileLoaded,
    RegistrationCheckStart,
    RegistrationNewUser,
    RegistrationExistingUser,
    RegistrationSuccess,
    RegistrationError,
    RegistrationCacheHit,
    FlowStateChange,
    FlowComplete,
    FlowError,
    MemberStatusUpdate,
    MemberStatusRefresh,
    MemberStatusError,
    PerformanceTiming,
}

impl EventType {
    /// Get string code for serialization/API
    pub const fn code(&self) -> &'static str {
        match self {
            Self::LiffInitStart => "liff_init_start",
            Self::LiffInitSuccess => "liff_init_success",
            Self::LiffInitError => "liff_init_error",
            Self::AuthStart => "auth_start",
            Self::AuthSuccess => "auth_success",
            Self::AuthError => "auth_error",
            Self::AuthProfileLoaded => "auth_profile_loaded",
            Self::RegistrationCheckStart => "registration_check_start",
            Self::RegistrationNewUser => "registration_new_user",
            Self::RegistrationExistingUser => "registration_existing_user",
            Self::RegistrationSuccess => "registration_success",
            Self::RegistrationError => "registration_error",
            Self::RegistrationCacheHit => "registration_cache_hit",
            Self::FlowStateChange => "flow_state_change",
            Self::FlowComplete => "flow_complete",
            Self::FlowError => "flow_error",
            Self::MemberStatusUpdate => "member_status_update",
            Self::MemberStatusRefresh => "member_status_refresh",
            Self::MemberStatusError => "member_status_error",
            Self::PerformanceTiming => "performance_timing",
        }
    }

    /// Create from string code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "liff_init_start" => Some(Self::LiffInitStart),
            "liff_init_success" => Some(Self::LiffInitSuccess),
            "liff_init_error" => Some(Self::LiffInitError),
            "auth_start" => Some(Self::AuthStart),
            "auth_success" => Some(Self::AuthSuccess),
            "auth_error" => Some(Self::AuthError),
            "auth_profile_loaded" => Some(Self::AuthProfileLoaded),
            "registration_check_start" => Some(Self::RegistrationCheckStart),
            "registration_new_user" => Some(Self::RegistrationNewUser),
            "registration_existing_user" => Some(Self::RegistrationExistingUser),
            "registration_success" => Some(Self::RegistrationSuccess),
            "registration_error" => Some(Self::RegistrationError),
            "registration_cache_hit" => Some(Self::RegistrationCacheHit),
            "flow_state_change" => Some(Self::FlowStateChange),
            "flow_complete" => Some(Self::FlowComplete),
            "flow_error" => Some(Self::FlowError),
            "member_status_update" => Some(Self::MemberStatusUpdate),
            "member_status_refresh" => Some(Self::MemberStatusRefresh),
            "member_status_error" => Some(Self::MemberStatusError),
            "performance_timing" => Some(Self::PerformanceTiming),
            _ => None,
        }
    }

    /// Whether this event type marks a successful step.
    ///
    /// Rate statistics count an event as a success when its code
    /// contains "success".
    #[inline]
    pub fn is_success(&self) -> bool {
        self.code().contains("success")
    }

    /// Whether this event type itself marks a failure.
    ///
    /// An event can also count as an error by carrying an error
    /// payload; that is the recorder's concern, not this type's.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.code().contains("error")
    }

    /// The onboarding phase this event type belongs to
    #[inline]
    pub fn phase(&self) -> Phase {
        Phase::from_event_code(self.code())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EventType; 20] = [
        EventType::LiffInitStart,
        EventType::LiffInitSuccess,
        EventType::LiffInitError,
        EventType::AuthStart,
        EventType::AuthSuccess,
        EventType::AuthError,
        EventType::AuthProfileLoaded,
        EventType::RegistrationCheckStart,
        EventType::RegistrationNewUser,
        EventType::RegistrationExistingUser,
        EventType::RegistrationSuccess,
        EventType::RegistrationError,
        EventType::RegistrationCacheHit,
        EventType::FlowStateChange,
        EventType::FlowComplete,
        EventType::FlowError,
        EventType::MemberStatusUpdate,
        EventType::MemberStatusRefresh,
        EventType::MemberStatusError,
        EventType::PerformanceTiming,
    ];

    #[test]
    fn test_code_round_trip() {
        for ty in ALL {
            assert_eq!(EventType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(EventType::from_code("bogus"), None);
    }

    #[test]
    fn test_serde_codes_match() {
        for ty in ALL {
            let json = serde_json::to_value(ty).unwrap();
            assert_eq!(json, serde_json::Value::String(ty.code().to_string()));
        }
    }

    #[test]
    fn test_success_and_error_markers() {
        assert!(EventType::LiffInitSuccess.is_success());
        assert!(EventType::RegistrationSuccess.is_success());
        assert!(!EventType::AuthStart.is_success());
        assert!(EventType::AuthError.is_error());
        assert!(EventType::MemberStatusError.is_error());
        assert!(!EventType::RegistrationCacheHit.is_error());
    }

    #[test]
    fn test_phases() {
        assert_eq!(EventType::LiffInitStart.phase(), Phase::LiffInitialization);
        assert_eq!(EventType::AuthProfileLoaded.phase(), Phase::Authentication);
        assert_eq!(EventType::RegistrationCacheHit.phase(), Phase::Registration);
        assert_eq!(EventType::FlowComplete.phase(), Phase::FlowControl);
        assert_eq!(EventType::MemberStatusRefresh.phase(), Phase::MemberStatus);
        assert_eq!(EventType::PerformanceTiming.phase(), Phase::Unknown);
    }
}
