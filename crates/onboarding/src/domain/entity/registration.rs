//! Registration Status Entity
//!
//! The outcome of reconciling an identity against the member
//! datastore. Exactly one of "registered with a member" or "not
//! registered" holds; the constructors enforce it so downstream code
//! never sees a registered status without a member.

use chrono::{DateTime, Utc};
use kernel::error::info::ErrorInfo;
use serde::{Deserialize, Serialize};

use crate::domain::entity::member::Member;

/// Outcome of a registration check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationStatus {
    /// Whether this check created the member record
    pub is_new_user: bool,
    /// Whether a member record exists for the identity
    pub is_registered: bool,
    /// The member record, present iff `is_registered`
    pub member: Option<Member>,
    /// Failure payload, present iff the check failed
    pub error: Option<ErrorInfo>,
    /// When the member record was created by this flow, if it was
    pub registration_time: Option<DateTime<Utc>>,
}

impl RegistrationStatus {
    /// An existing member was found
    pub fn existing(member: Member) -> Self {
        Self {
            is_new_user: false,
            is_registered: true,
            member: Some(member),
            error: None,
            registration_time: None,
        }
    }

    /// A member record was just created for a new user
    pub fn newly_registered(member: Member, registered_at: DateTime<Utc>) -> Self {
        Self {
            is_new_user: true,
            is_registered: true,
            member: Some(member),
            error: None,
            registration_time: Some(registered_at),
        }
    }

    /// The check failed; the caller shows an error state with retry
    pub fn failed(error: ErrorInfo) -> Self {
        Self {
            is_new_user: false,
            is_registered: false,
            member: None,
            error: Some(error),
            registration_time: None,
        }
    }

    /// Whether the invariant from the data model holds
    pub fn is_coherent(&self) -> bool {
        if self.is_registered {
            self.member.is_some() && self.error.is_none()
        } else {
            self.member.is_none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::identity_id::IdentityId;
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

    #[test]
    fn test_existing() {
        let status = RegistrationStatus::existing(member());
        assert!(status.is_registered);
        assert!(!status.is_new_user);
        assert!(status.member.is_some());
        assert!(status.registration_time.is_none());
        assert!(status.is_coherent());
    }

    #[test]
    fn test_newly_registered() {
        let status = RegistrationStatus::newly_registered(member(), Utc::now());
        assert!(status.is_registered);
        assert!(status.is_new_user);
        assert!(status.registration_time.is_some());
        assert!(status.is_coherent());
    }

    #[test]
    fn test_failed() {
        let status = RegistrationStatus::failed(ErrorInfo::new("boom"));
        assert!(!status.is_registered);
        assert!(status.member.is_none());
        assert!(status.error.is_some());
        assert!(status.is_coherent());
    }
}
