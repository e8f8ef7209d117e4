//! Collaborator Traits
//!
//! Interfaces for the external collaborators the orchestration
//! consumes: the identity provider SDK wrapper, the member datastore
//! client, and the durable state store backing the registration cache
//! and the analytics event log. Implementations live in the
//! infrastructure layer (or outside this crate entirely).

use crate::domain::entity::identity::Identity;
use crate::domain::entity::member::{Member, MemberDraft, MemberPatch};
use crate::domain::value_object::identity_id::IdentityId;
use crate::error::OnboardingResult;

/// Identity provider trait (login/logout/profile)
#[trait_variant::make(IdentityProvider: Send)]
pub trait LocalIdentityProvider {
    /// Profile already held by the provider SDK, if any. Never touches
    /// the network.
    async fn cached_profile(&self) -> Option<Identity>;

    /// Actively fetch the profile from the provider
    async fn fetch_profile(&self) -> OnboardingResult<Identity>;

    /// Start an authentication round trip
    async fn login(&self) -> OnboardingResult<()>;

    /// End the provider session
    async fn logout(&self) -> OnboardingResult<()>;
}

/// Member datastore trait.
///
/// Not-found is `Ok(None)`, never an error: it signals "new user" and
/// triggers creation.
#[trait_variant::make(MemberRepository: Send)]
pub trait LocalMemberRepository {
    /// Find the member for an identity
    async fn find_by_identity(&self, id: &IdentityId) -> OnboardingResult<Option<Member>>;

    /// Create a member record
    async fn create(&self, draft: &MemberDraft) -> OnboardingResult<Member>;

    /// Apply a partial update to the identity's member record
    async fn update(&self, id: &IdentityId, patch: MemberPatch) -> OnboardingResult<Member>;
}

/// Durable string key-value store trait.
///
/// Backs both the registration cache (one key per identity) and the
/// event log (one well-known key). Values are serialized records; the
/// store itself is schema-free.
#[trait_variant::make(StateStore: Send)]
pub trait LocalStateStore {
    /// Read a value
    async fn get(&self, key: &str) -> OnboardingResult<Option<String>>;

    /// Write (or overwrite) a value
    async fn put(&self, key: &str, value: String) -> OnboardingResult<()>;

    /// Remove a value; removing an absent key is not an error
    async fn remove(&self, key: &str) -> OnboardingResult<()>;

    /// List keys starting with a prefix (for cache-wide clears)
    async fn keys_with_prefix(&self, prefix: &str) -> OnboardingResult<Vec<String>>;
}
