//! Flow Reduction
//!
//! The pure reducer at the heart of the onboarding flow: a total
//! function from the three input snapshots (identity provider,
//! registration, member fetch) plus the welcome flag to a single
//! [`FlowState`]. The priority table is evaluated top to bottom and
//! the first matching rule wins, so no two rules can claim the same
//! input snapshot.
//!
//! The reducer never suspends and never mutates; retry bookkeeping and
//! the welcome flag live in the application-layer controller.

use kernel::error::info::ErrorInfo;

use crate::domain::entity::identity::Identity;
use crate::domain::entity::member::Member;
use crate::domain::value_object::flow_state::FlowState;

/// Snapshot of the identity provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityState {
    /// Provider SDK finished its init call
    pub is_initialized: bool,
    /// Provider is ready to answer profile/login calls
    pub is_ready: bool,
    /// A user session exists
    pub is_logged_in: bool,
    /// Provider init or login round trip in flight
    pub loading: bool,
    /// Provider failure payload
    pub error: Option<ErrorInfo>,
    /// Cached profile, once loaded
    pub profile: Option<Identity>,
}

/// Snapshot of the registration check
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationState {
    /// A `check_and_register` call is in flight
    pub is_registering: bool,
    /// A member record exists for the current identity
    pub is_registered: bool,
    /// The check created the member record
    pub is_new_user: bool,
    /// Failure reaching the registration service itself
    pub error: Option<ErrorInfo>,
    /// Failure reported by the registration outcome
    pub registration_error: Option<ErrorInfo>,
}

/// Snapshot of the member fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberState {
    /// A member refresh is in flight
    pub loading: bool,
    /// The member record, once fetched
    pub member: Option<Member>,
    /// Member fetch failure payload
    pub error: Option<ErrorInfo>,
}

/// Complete reducer input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowInputs {
    pub identity: IdentityState,
    pub registration: RegistrationState,
    pub member: MemberState,
    /// Whether the welcome screen has already been dismissed this session
    pub welcome_shown: bool,
}

/// Reduce the input snapshots to the current flow state.
///
/// Priority table (first match wins):
/// 1. any error set            -> `Error`
/// 2. provider loading         -> `Initializing`
/// 3. ready but not logged in  -> `Authenticating`
/// 4. registering / fetching   -> `Registering`
/// 5. registered with member   -> `Success` (new user, welcome pending)
///                                or `Ready`
/// 6. fallback                 -> `Initializing`
pub fn reduce(inputs: &FlowInputs) -> FlowState {
    if first_error(inputs).is_some() {
        return FlowState::Error;
    }
    if inputs.identity.loading {
        return FlowState::Initializing;
    }
    if inputs.identity.is_ready && !inputs.identity.is_logged_in {
        return FlowState::Authenticating;
    }
    if inputs.registration.is_registering || inputs.member.loading {
        return FlowState::Registering;
    }
    if inputs.registration.is_registered && inputs.member.member.is_some() {
        if inputs.registration.is_new_user && !inputs.welcome_shown {
            return FlowState::Success;
        }
        return FlowState::Ready;
    }
    FlowState::Initializing
}

/// Pick the single error payload to surface.
///
/// Priority order: identity provider, registration service,
/// registration outcome, member fetch. Only one message is shown even
/// when several are set.
pub fn first_error(inputs: &FlowInputs) -> Option<&ErrorInfo> {
    inputs
        .identity
        .error
        .as_ref()
        .or(inputs.registration.error.as_ref())
        .or(inputs.registration.registration_error.as_ref())
        .or(inputs.member.error.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::identity_id::IdentityId;
    use chrono::Utc;
    use uuid::Uuid;

    fn member() -> Member {
        let now = Utc::now();
        Member {
            member_id: Uuid::new_v4(),
            identity_id: IdentityId::new("U1").unwrap(),
            display_name: "Alice".into(),
            picture_url: None,
            joined_at: now,
            updated_at: now,
        }
    }

    fn registered_inputs(is_new_user: bool, welcome_shown: bool) -> FlowInputs {
        FlowInputs {
            identity: IdentityState {
                is_initialized: true,
                is_ready: true,
                is_logged_in: true,
                ..Default::default()
            },
            registration: RegistrationState {
                is_registered: true,
                is_new_user,
                ..Default::default()
            },
            member: MemberState {
                member: Some(member()),
                ..Default::default()
            },
            welcome_shown,
        }
    }

    #[test]
    fn test_error_wins_over_everything() {
        let mut inputs = registered_inputs(true, false);
        inputs.member.error = Some(ErrorInfo::new("member fetch failed"));
        assert_eq!(reduce(&inputs), FlowState::Error);

        inputs.identity.loading = true;
        assert_eq!(reduce(&inputs), FlowState::Error);
    }

    #[test]
    fn test_loading_is_initializing_regardless_of_other_inputs() {
        let mut inputs = registered_inputs(false, true);
        inputs.identity.loading = true;
        assert_eq!(reduce(&inputs), FlowState::Initializing);
    }

    #[test]
    fn test_ready_but_logged_out_is_authenticating() {
        let inputs = FlowInputs {
            identity: IdentityState {
                is_initialized: true,
                is_ready: true,
                is_logged_in: false,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(reduce(&inputs), FlowState::Authenticating);
    }

    #[test]
    fn test_registering() {
        let mut inputs = registered_inputs(false, false);
        inputs.registration.is_registered = false;
        inputs.member.member = None;
        inputs.registration.is_registering = true;
        assert_eq!(reduce(&inputs), FlowState::Registering);

        inputs.registration.is_registering = false;
        inputs.member.loading = true;
        assert_eq!(reduce(&inputs), FlowState::Registering);
    }

    #[test]
    fn test_new_user_sees_success_until_welcome_shown() {
        assert_eq!(reduce(&registered_inputs(true, false)), FlowState::Success);
        assert_eq!(reduce(&registered_inputs(true, true)), FlowState::Ready);
    }

    #[test]
    fn test_existing_user_goes_straight_to_ready() {
        assert_eq!(reduce(&registered_inputs(false, false)), FlowState::Ready);
    }

    #[test]
    fn test_registered_without_member_falls_back() {
        let mut inputs = registered_inputs(false, false);
        inputs.member.member = None;
        assert_eq!(reduce(&inputs), FlowState::Initializing);
    }

    #[test]
    fn test_default_inputs_fall_back_to_initializing() {
        assert_eq!(reduce(&FlowInputs::default()), FlowState::Initializing);
    }

    #[test]
    fn test_first_error_priority() {
        let mut inputs = FlowInputs::default();
        inputs.member.error = Some(ErrorInfo::new("member"));
        inputs.registration.registration_error = Some(ErrorInfo::new("outcome"));
        assert_eq!(first_error(&inputs).unwrap().message, "outcome");

        inputs.registration.error = Some(ErrorInfo::new("service"));
        assert_eq!(first_error(&inputs).unwrap().message, "service");

        inputs.identity.error = Some(ErrorInfo::new("provider"));
        assert_eq!(first_error(&inputs).unwrap().message, "provider");
    }
}
