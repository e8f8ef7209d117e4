//! In-Memory Implementations
//!
//! Process-local implementations of the collaborator traits: the
//! durable state store backend, a member datastore, and a scriptable
//! identity provider. These back the demo binary and the test suites;
//! production deployments supply their own implementations of the
//! same traits.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entity::identity::Identity;
use crate::domain::entity::member::{Member, MemberDraft, MemberPatch};
use crate::domain::repository::{IdentityProvider, MemberRepository, StateStore};
use crate::domain::value_object::identity_id::IdentityId;
use crate::error::{OnboardingError, OnboardingResult};

// ============================================================================
// State store
// ============================================================================

/// In-memory durable state store
#[derive(Default)]
pub struct InMemoryStateStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for InMemoryStateStore {
    async fn get(&self, key: &str) -> OnboardingResult<Option<String>> {
        Ok(self.entries.lock().expect("store lock poisoned").get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> OnboardingResult<()> {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> OnboardingResult<()> {
        self.entries.lock().expect("store lock poisoned").remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> OnboardingResult<Vec<String>> {
        let entries = self.entries.lock().expect("store lock poisoned");
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

// ============================================================================
// Member datastore
// ============================================================================

/// In-memory member datastore, keyed by identity id
#[derive(Default)]
pub struct InMemoryMemberRepository {
    members: Mutex<BTreeMap<IdentityId, Member>>,
}

impl InMemoryMemberRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemberRepository for InMemoryMemberRepository {
    async fn find_by_identity(&self, id: &IdentityId) -> OnboardingResult<Option<Member>> {
        Ok(self.members.lock().expect("member lock poisoned").get(id).cloned())
    }

    async fn create(&self, draft: &MemberDraft) -> OnboardingResult<Member> {
        let mut members = self.members.lock().expect("member lock poisoned");
        if members.contains_key(&draft.identity_id) {
            return Err(OnboardingError::Datastore(format!(
                "Member already exists for identity {}",
                draft.identity_id
            )));
        }

        let now = Utc::now();
        let member = Member {
            member_id: Uuid::new_v4(),
            identity_id: draft.identity_id.clone(),
            display_name: draft.display_name.clone(),
            picture_url: draft.picture_url.clone(),
            joined_at: now,
            updated_at: now,
        };
        members.insert(draft.identity_id.clone(), member.clone());
        Ok(member)
    }

    async fn update(&self, id: &IdentityId, patch: MemberPatch) -> OnboardingResult<Member> {
        let mut members = self.members.lock().expect("member lock poisoned");
        let member = members.get_mut(id).ok_or_else(|| {
            OnboardingError::Datastore(format!("No member for identity {id}"))
        })?;

        if let Some(display_name) = patch.display_name {
            member.display_name = display_name;
        }
        if let Some(picture_url) = patch.picture_url {
            member.picture_url = Some(picture_url);
        }
        member.updated_at = Utc::now();
        Ok(member.clone())
    }
}

// ============================================================================
// Identity provider
// ============================================================================

/// Scriptable identity provider for tests and the demo binary
pub struct InMemoryIdentityProvider {
    state: Mutex<ProviderState>,
}

struct ProviderState {
    identity: Option<Identity>,
    logged_in: bool,
}

impl InMemoryIdentityProvider {
    /// A provider with an established session for `identity`
    pub fn logged_in(identity: Identity) -> Self {
        Self {
            state: Mutex::new(ProviderState {
                identity: Some(identity),
                logged_in: true,
            }),
        }
    }

    /// A provider with no session and no profile
    pub fn logged_out() -> Self {
        Self {
            state: Mutex::new(ProviderState {
                identity: None,
                logged_in: false,
            }),
        }
    }

    /// Script the identity a later `login` call will establish
    pub fn set_identity(&self, identity: Identity) {
        self.state.lock().expect("provider lock poisoned").identity = Some(identity);
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.lock().expect("provider lock poisoned").logged_in
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    async fn cached_profile(&self) -> Option<Identity> {
        let state = self.state.lock().expect("provider lock poisoned");
        if state.logged_in { state.identity.clone() } else { None }
    }

    async fn fetch_profile(&self) -> OnboardingResult<Identity> {
        let state = self.state.lock().expect("provider lock poisoned");
        if !state.logged_in {
            return Err(OnboardingError::Provider("Not logged in".into()));
        }
        state
            .identity
            .clone()
            .ok_or_else(|| OnboardingError::Provider("Profile not available".into()))
    }

    async fn login(&self) -> OnboardingResult<()> {
        let mut state = self.state.lock().expect("provider lock poisoned");
        if state.identity.is_none() {
            return Err(OnboardingError::Provider("No identity to log in".into()));
        }
        state.logged_in = true;
        Ok(())
    }

    async fn logout(&self) -> OnboardingResult<()> {
        let mut state = self.state.lock().expect("provider lock poisoned");
        state.logged_in = false;
        state.identity = None;
        Ok(())
    }
}
