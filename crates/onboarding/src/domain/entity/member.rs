//! Member Entity
//!
//! The durable record representing a registered identity in the
//! external member datastore. Row CRUD lives behind
//! [`crate::domain::repository::MemberRepository`]; this subsystem
//! only reads and creates members, it never owns their schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::identity::Identity;
use crate::domain::value_object::identity_id::IdentityId;

/// Member record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Datastore row id
    pub member_id: Uuid,
    /// Identity this member belongs to (unique per member)
    pub identity_id: IdentityId,
    /// Display name copied from the identity profile at registration
    pub display_name: String,
    /// Avatar URL copied from the identity profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    /// When the member record was created
    pub joined_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Creation input for a member record.
///
/// The datastore mints the row id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDraft {
    pub identity_id: IdentityId,
    pub display_name: String,
    pub picture_url: Option<String>,
}

impl MemberDraft {
    /// Build the draft a fresh registration creates
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            identity_id: identity.id.clone(),
            display_name: identity.display_name.clone(),
            picture_url: identity.picture_url.clone(),
        }
    }
}

/// Partial update for a member record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPatch {
    pub display_name: Option<String>,
    pub picture_url: Option<String>,
}

impl MemberPatch {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.picture_url.is_none()
    }
}
