//! Registration Cache
//!
//! TTL-keyed durable cache mapping identity id to the last-known
//! registration status. Used to guarantee at most one network
//! registration check per identity within the validity window.
//!
//! Expiry is lazy: an expired record is purged by the read that finds
//! it; there is no background sweep.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::application::config::OnboardingConfig;
use crate::domain::entity::member::Member;
use crate::domain::entity::registration::RegistrationStatus;
use crate::domain::repository::StateStore;
use crate::domain::value_object::identity_id::IdentityId;
use crate::error::OnboardingResult;

/// Durable cache record (logical shape fixed by the storage contract)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheRecord {
    is_new_user: bool,
    is_registered: bool,
    member: Option<Member>,
    /// When the record was written (Unix ms)
    timestamp: i64,
    /// `timestamp + TTL` (Unix ms); past this the record is absent
    expires_at: i64,
}

impl CacheRecord {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }

    fn into_status(self) -> RegistrationStatus {
        let registered_at = chrono::DateTime::from_timestamp_millis(self.timestamp);
        RegistrationStatus {
            is_new_user: self.is_new_user,
            is_registered: self.is_registered,
            member: self.member,
            error: None,
            // A new-user record is written right after creation, so its
            // write time is the registration time.
            registration_time: if self.is_new_user { registered_at } else { None },
        }
    }
}

/// TTL-keyed registration cache over a durable [`StateStore`]
pub struct RegistrationCache<S>
where
    S: StateStore,
{
    store: Arc<S>,
    config: Arc<OnboardingConfig>,
}

impl<S> RegistrationCache<S>
where
    S: StateStore,
{
    pub fn new(store: Arc<S>, config: Arc<OnboardingConfig>) -> Self {
        Self { store, config }
    }

    /// Look up a non-expired status for an identity.
    ///
    /// An expired record is removed and reported as absent.
    pub async fn get(&self, id: &IdentityId) -> OnboardingResult<Option<RegistrationStatus>> {
        let key = self.config.cache_key(id.as_str());
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let record: CacheRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                // An unreadable record is as good as absent; drop it so
                // the next check goes to the datastore.
                tracing::warn!(identity_id = %id, error = %e, "Dropping unreadable cache record");
                self.store.remove(&key).await?;
                return Ok(None);
            }
        };

        if record.is_expired(Utc::now().timestamp_millis()) {
            tracing::debug!(identity_id = %id, "Registration cache entry expired");
            self.store.remove(&key).await?;
            return Ok(None);
        }

        Ok(Some(record.into_status()))
    }

    /// Write a fresh record for a resolved status.
    ///
    /// Failed statuses must not be cached; the caller enforces that,
    /// this method only records what it is given.
    pub async fn put(&self, id: &IdentityId, status: &RegistrationStatus) -> OnboardingResult<()> {
        let now_ms = Utc::now().timestamp_millis();
        let record = CacheRecord {
            is_new_user: status.is_new_user,
            is_registered: status.is_registered,
            member: status.member.clone(),
            timestamp: now_ms,
            expires_at: now_ms + self.config.cache_ttl_ms(),
        };

        let key = self.config.cache_key(id.as_str());
        self.store.put(&key, serde_json::to_string(&record)?).await?;

        tracing::debug!(
            identity_id = %id,
            is_new_user = status.is_new_user,
            expires_at = record.expires_at,
            "Registration status cached"
        );

        Ok(())
    }

    /// Remove one identity's record, or every record under the cache
    /// prefix when no identity is given (logout path).
    pub async fn clear(&self, id: Option<&IdentityId>) -> OnboardingResult<u64> {
        match id {
            Some(id) => {
                let key = self.config.cache_key(id.as_str());
                if self.store.get(&key).await?.is_none() {
                    return Ok(0);
                }
                self.store.remove(&key).await?;
                Ok(1)
            }
            None => {
                let keys = self
                    .store
                    .keys_with_prefix(&self.config.cache_key_prefix)
                    .await?;
                let mut removed = 0u64;
                for key in keys {
                    self.store.remove(&key).await?;
                    removed += 1;
                }
                tracing::info!(entries_removed = removed, "Registration cache cleared");
                Ok(removed)
            }
        }
    }
}
