//! Registration Service
//!
//! Reconciles an identity against the member datastore: answers from
//! the TTL cache when it can, otherwise looks the member up, creating
//! the record for a first-time user. Every outcome is folded into a
//! [`RegistrationStatus`]; this boundary never throws, so the flow
//! controller needs no error handling around it.
//!
//! Two calls for the same identity can overlap before the first one
//! writes its cache entry. A per-identity in-flight gate serializes
//! them: the second caller waits, re-checks the cache, and answers
//! from it, so at most one lookup/create reaches the datastore.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::application::analytics::AnalyticsRecorder;
use crate::application::cache::RegistrationCache;
use crate::application::config::OnboardingConfig;
use crate::domain::entity::identity::Identity;
use crate::domain::entity::member::MemberDraft;
use crate::domain::entity::registration::RegistrationStatus;
use crate::domain::repository::{IdentityProvider, MemberRepository, StateStore};
use crate::domain::value_object::identity_id::IdentityId;
use crate::error::{OnboardingError, OnboardingResult};

/// Idempotent, cached auto-registration
pub struct RegistrationService<P, M, S>
where
    P: IdentityProvider,
    M: MemberRepository,
    S: StateStore,
{
    provider: Arc<P>,
    members: Arc<M>,
    cache: RegistrationCache<S>,
    analytics: Arc<AnalyticsRecorder<S>>,
    in_flight: Mutex<HashMap<IdentityId, Arc<Mutex<()>>>>,
}

impl<P, M, S> RegistrationService<P, M, S>
where
    P: IdentityProvider,
    M: MemberRepository,
    S: StateStore,
{
    pub fn new(
        provider: Arc<P>,
        members: Arc<M>,
        store: Arc<S>,
        analytics: Arc<AnalyticsRecorder<S>>,
        config: Arc<OnboardingConfig>,
    ) -> Self {
        Self {
            provider,
            members,
            cache: RegistrationCache::new(store, config),
            analytics,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Ensure the identity has exactly one member record.
    ///
    /// With no identity supplied, falls back to the provider's cached
    /// profile, then to an active profile fetch. All failures come
    /// back as a failed status, never as `Err`.
    pub async fn check_and_register(&self, identity: Option<Identity>) -> RegistrationStatus {
        self.analytics.track_registration_check_start().await;

        let identity = match identity {
            Some(identity) => identity,
            None => match self.resolve_identity().await {
                Ok(identity) => identity,
                Err(e) => {
                    e.log();
                    let status = RegistrationStatus::failed(e.to_error_info());
                    self.analytics.track_registration(&status).await;
                    return status;
                }
            },
        };

        let gate = self.gate_for(&identity.id).await;
        let status = {
            let _guard = gate.lock().await;
            self.check_registered(&identity).await
        };
        drop(gate);
        self.release_gate(&identity.id).await;

        status
    }

    /// Cache probe: whether a non-expired record says "registered"
    pub async fn is_registration_complete(&self, id: &IdentityId) -> bool {
        self.cached_status(id)
            .await
            .is_some_and(|status| status.is_registered)
    }

    /// Cache probe: the non-expired cached status, if any.
    ///
    /// Expired entries are purged by the probe itself; store failures
    /// degrade to "absent".
    pub async fn cached_status(&self, id: &IdentityId) -> Option<RegistrationStatus> {
        match self.cache.get(id).await {
            Ok(status) => status,
            Err(e) => {
                e.log();
                None
            }
        }
    }

    /// Remove one identity's cache entry, or all of them (logout)
    pub async fn clear_cache(&self, id: Option<&IdentityId>) -> OnboardingResult<u64> {
        self.cache.clear(id).await
    }

    // Runs under the identity's in-flight gate.
    async fn check_registered(&self, identity: &Identity) -> RegistrationStatus {
        // A concurrent caller may have resolved and cached while this
        // call waited on the gate; the re-check keeps the network
        // dedup guarantee.
        match self.cache.get(&identity.id).await {
            Ok(Some(status)) => {
                tracing::debug!(identity_id = %identity.id, "Registration answered from cache");
                self.analytics.track_cache_hit(&identity.id).await;
                return status;
            }
            Ok(None) => {}
            Err(e) => {
                // Cache trouble degrades to a miss; the datastore is
                // still the source of truth.
                e.log();
            }
        }

        let status = self.resolve_against_datastore(identity).await;

        // Failures are not cached: the next call should retry against
        // the datastore instead of replaying a stale failure.
        if status.error.is_none() {
            if let Err(e) = self.cache.put(&identity.id, &status).await {
                e.log();
            }
        }

        self.analytics.track_registration(&status).await;
        status
    }

    async fn resolve_against_datastore(&self, identity: &Identity) -> RegistrationStatus {
        match self.members.find_by_identity(&identity.id).await {
            Ok(Some(member)) => {
                tracing::info!(
                    identity_id = %identity.id,
                    member_id = %member.member_id,
                    "Existing member found"
                );
                RegistrationStatus::existing(member)
            }
            // Not-found is not an error: it signals a new user.
            Ok(None) => match self.members.create(&MemberDraft::from_identity(identity)).await {
                Ok(member) => {
                    tracing::info!(
                        identity_id = %identity.id,
                        member_id = %member.member_id,
                        "New member registered"
                    );
                    RegistrationStatus::newly_registered(member, Utc::now())
                }
                Err(e) => {
                    e.log();
                    RegistrationStatus::failed(e.to_error_info())
                }
            },
            Err(e) => {
                e.log();
                RegistrationStatus::failed(e.to_error_info())
            }
        }
    }

    async fn resolve_identity(&self) -> OnboardingResult<Identity> {
        if let Some(identity) = self.provider.cached_profile().await {
            return Ok(identity);
        }
        match self.provider.fetch_profile().await {
            Ok(identity) => Ok(identity),
            Err(e) => {
                e.log();
                Err(OnboardingError::ProfileUnavailable)
            }
        }
    }

    async fn gate_for(&self, id: &IdentityId) -> Arc<Mutex<()>> {
        let mut map = self.in_flight.lock().await;
        map.entry(id.clone()).or_default().clone()
    }

    async fn release_gate(&self, id: &IdentityId) {
        let mut map = self.in_flight.lock().await;
        if let Some(gate) = map.get(id) {
            // Only the map itself still holds the gate: no caller is
            // waiting, so the entry can go.
            if Arc::strong_count(gate) == 1 {
                map.remove(id);
            }
        }
    }
}
