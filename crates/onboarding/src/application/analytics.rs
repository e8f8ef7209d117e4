//! Analytics Recorder
//!
//! Append-only, capacity-bounded lifecycle event log plus the derived
//! metrics computed from it. Observes every flow transition and every
//! registration outcome.
//!
//! The log is persisted to the durable store on every append;
//! persistence failures are swallowed (a metrics engine must never
//! break the flow it observes). All derived numbers are recomputed on
//! demand from the log, nothing is accumulated incrementally.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use kernel::error::info::ErrorInfo;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::application::config::OnboardingConfig;
use crate::domain::entity::identity::Identity;
use crate::domain::entity::registration::RegistrationStatus;
use crate::domain::repository::StateStore;
use crate::domain::value_object::event_type::EventType;
use crate::domain::value_object::flow_state::FlowState;
use crate::domain::value_object::identity_id::IdentityId;
use crate::domain::value_object::phase::Phase;

/// One recorded lifecycle event. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl AnalyticsEvent {
    fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            data: None,
            error: None,
        }
    }

    /// Duration attached by a phase-completing tracker, if any
    pub fn duration_ms(&self) -> Option<i64> {
        self.data.as_ref()?.get("duration_ms")?.as_i64()
    }

    /// An event is an error event when its type marks a failure or it
    /// carries an error payload. One predicate, so an event matching
    /// both conditions is still counted once.
    pub fn is_error_event(&self) -> bool {
        self.event_type.is_error() || self.error.is_some()
    }
}

/// Durable event-log record, overwritten on every append
#[derive(Debug, Serialize, Deserialize)]
struct EventLogRecord {
    events: Vec<AnalyticsEvent>,
    start_time: DateTime<Utc>,
}

/// One flow-state change, as reported in metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowStateEntry {
    pub state: FlowState,
    pub timestamp: DateTime<Utc>,
}

/// One recorded error, classified by phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub phase: Phase,
}

/// Session metrics derived from the event log
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationMetrics {
    /// Slice from session start to provider init completion
    pub liff_init_duration_ms: Option<i64>,
    /// Slice from the previous phase boundary to auth completion
    pub authentication_duration_ms: Option<i64>,
    /// Slice from the previous phase boundary to registration completion
    pub registration_duration_ms: Option<i64>,
    /// Wall clock since session start
    pub total_duration_ms: i64,
    pub flow_states: Vec<FlowStateEntry>,
    pub errors: Vec<ErrorRecord>,
}

/// Rate statistics derived over the full event log
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub total_events: usize,
    /// Percentage of events whose type marks a success
    pub success_rate: f64,
    /// Percentage of events that are error events
    pub error_rate: f64,
    /// Cache hits per registration success, as a percentage
    pub cache_hit_rate: f64,
    /// New-user registrations per registration success, as a percentage
    pub new_user_rate: f64,
    /// Mean duration of registration successes that carry one
    pub average_registration_time_ms: Option<f64>,
}

/// Full diagnostics export
#[derive(Debug, Serialize)]
pub struct AnalyticsExport {
    pub summary: AnalyticsSummary,
    pub events: Vec<AnalyticsEvent>,
    pub metrics: RegistrationMetrics,
}

struct RecorderState {
    events: VecDeque<AnalyticsEvent>,
    session_start: DateTime<Utc>,
    /// Completion mark per phase; the duration base is the latest mark
    /// across all phases (the previous phase boundary), defaulting to
    /// session start.
    phase_marks: HashMap<Phase, i64>,
}

impl RecorderState {
    fn new() -> Self {
        Self {
            events: VecDeque::new(),
            session_start: Utc::now(),
            phase_marks: HashMap::new(),
        }
    }

    /// Mark `phase` complete now and return the slice since the
    /// previous phase boundary.
    fn complete_phase(&mut self, phase: Phase) -> i64 {
        let now_ms = Utc::now().timestamp_millis();
        let base = self
            .phase_marks
            .values()
            .max()
            .copied()
            .unwrap_or_else(|| self.session_start.timestamp_millis());
        self.phase_marks.insert(phase, now_ms);
        now_ms - base
    }
}

/// Bounded event log with derived metrics
pub struct AnalyticsRecorder<S>
where
    S: StateStore,
{
    store: Arc<S>,
    config: Arc<OnboardingConfig>,
    state: Mutex<RecorderState>,
}

impl<S> AnalyticsRecorder<S>
where
    S: StateStore,
{
    pub fn new(store: Arc<S>, config: Arc<OnboardingConfig>) -> Self {
        Self {
            store,
            config,
            state: Mutex::new(RecorderState::new()),
        }
    }

    /// Reset the log and phase bookkeeping for a fresh session and
    /// record the session-opening event.
    pub async fn start_session(&self) {
        {
            let mut state = self.state.lock().expect("recorder lock poisoned");
            *state = RecorderState::new();
        }
        tracing::info!("Analytics session started");
        self.track_event(EventType::LiffInitStart, None, None).await;
    }

    /// Append an event, evict past capacity, persist the log.
    pub async fn track_event(
        &self,
        event_type: EventType,
        data: Option<serde_json::Value>,
        error: Option<ErrorInfo>,
    ) {
        let mut event = AnalyticsEvent::new(event_type);
        event.data = data;
        event.error = error;

        tracing::debug!(event = %event_type, "Lifecycle event");

        let record = {
            let mut state = self.state.lock().expect("recorder lock poisoned");
            state.events.push_back(event);
            while state.events.len() > self.config.max_events {
                state.events.pop_front();
            }
            EventLogRecord {
                events: state.events.iter().cloned().collect(),
                start_time: state.session_start,
            }
        };

        self.persist(&record).await;
    }

    async fn persist(&self, record: &EventLogRecord) {
        let raw = match serde_json::to_string(record) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Event log serialization failed");
                return;
            }
        };
        if let Err(e) = self.store.put(&self.config.event_log_key, raw).await {
            tracing::warn!(error = %e, "Event log persistence failed");
        }
    }

    // ========================================================================
    // Phase trackers
    // ========================================================================

    /// Record provider init completion (or failure)
    pub async fn track_liff_init(&self, result: Result<(), ErrorInfo>) {
        match result {
            Ok(()) => {
                let duration = self.complete_phase(Phase::LiffInitialization);
                self.track_event(
                    EventType::LiffInitSuccess,
                    Some(json!({ "duration_ms": duration })),
                    None,
                )
                .await;
            }
            Err(error) => {
                self.track_event(EventType::LiffInitError, None, Some(error)).await;
            }
        }
    }

    /// Record the start of an authentication round trip
    pub async fn track_auth_start(&self) {
        self.track_event(EventType::AuthStart, None, None).await;
    }

    /// Record authentication completion (or failure)
    pub async fn track_authentication(&self, result: Result<(), ErrorInfo>) {
        match result {
            Ok(()) => {
                let duration = self.complete_phase(Phase::Authentication);
                self.track_event(
                    EventType::AuthSuccess,
                    Some(json!({ "duration_ms": duration })),
                    None,
                )
                .await;
            }
            Err(error) => {
                self.track_event(EventType::AuthError, None, Some(error)).await;
            }
        }
    }

    /// Record that the provider profile became available
    pub async fn track_profile_loaded(&self, identity: &Identity) {
        self.track_event(
            EventType::AuthProfileLoaded,
            Some(json!({ "identity_id": identity.id.as_str() })),
            None,
        )
        .await;
    }

    /// Record the start of a registration check
    pub async fn track_registration_check_start(&self) {
        self.track_event(EventType::RegistrationCheckStart, None, None).await;
    }

    /// Record a registration check answered from the cache
    pub async fn track_cache_hit(&self, id: &IdentityId) {
        self.track_event(
            EventType::RegistrationCacheHit,
            Some(json!({ "identity_id": id.as_str() })),
            None,
        )
        .await;
    }

    /// Record a resolved registration outcome.
    ///
    /// A successful outcome produces exactly one of new-user /
    /// existing-user plus one registration-success event carrying the
    /// phase duration; a failed outcome produces one error event.
    pub async fn track_registration(&self, status: &RegistrationStatus) {
        if let Some(error) = &status.error {
            self.track_event(EventType::RegistrationError, None, Some(error.clone()))
                .await;
            return;
        }

        let member_id = status.member.as_ref().map(|m| m.member_id);
        let outcome = if status.is_new_user {
            EventType::RegistrationNewUser
        } else {
            EventType::RegistrationExistingUser
        };
        self.track_event(outcome, Some(json!({ "member_id": member_id })), None)
            .await;

        let duration = self.complete_phase(Phase::Registration);
        self.track_event(
            EventType::RegistrationSuccess,
            Some(json!({
                "duration_ms": duration,
                "is_new_user": status.is_new_user,
                "member_id": member_id,
            })),
            None,
        )
        .await;
    }

    /// Record a flow state transition
    pub async fn track_flow_state_change(&self, from: FlowState, to: FlowState) {
        self.track_event(
            EventType::FlowStateChange,
            Some(json!({ "from": from.code(), "to": to.code() })),
            None,
        )
        .await;
    }

    /// Record onboarding completion
    pub async fn track_flow_complete(&self) {
        self.track_event(EventType::FlowComplete, None, None).await;
    }

    /// Record the flow entering its error state
    pub async fn track_flow_error(&self, error: &ErrorInfo) {
        self.track_event(EventType::FlowError, None, Some(error.clone())).await;
    }

    /// Record a member refresh starting
    pub async fn track_member_refresh(&self, id: &IdentityId) {
        self.track_event(
            EventType::MemberStatusRefresh,
            Some(json!({ "identity_id": id.as_str() })),
            None,
        )
        .await;
    }

    /// Record a member snapshot update
    pub async fn track_member_update(&self, id: &IdentityId, found: bool) {
        self.track_event(
            EventType::MemberStatusUpdate,
            Some(json!({ "identity_id": id.as_str(), "found": found })),
            None,
        )
        .await;
    }

    /// Record a member refresh failure
    pub async fn track_member_error(&self, error: &ErrorInfo) {
        self.track_event(EventType::MemberStatusError, None, Some(error.clone()))
            .await;
    }

    /// Record an ad-hoc timing mark
    pub async fn track_timing(&self, label: &str, duration_ms: i64) {
        self.track_event(
            EventType::PerformanceTiming,
            Some(json!({ "label": label, "duration_ms": duration_ms })),
            None,
        )
        .await;
    }

    fn complete_phase(&self, phase: Phase) -> i64 {
        self.state
            .lock()
            .expect("recorder lock poisoned")
            .complete_phase(phase)
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    /// Snapshot of the current log
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        let state = self.state.lock().expect("recorder lock poisoned");
        state.events.iter().cloned().collect()
    }

    /// Number of events currently retained
    pub fn len(&self) -> usize {
        self.state.lock().expect("recorder lock poisoned").events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Derive phase durations, the ordered state trail, and the error
    /// list from the event log.
    pub fn metrics(&self) -> RegistrationMetrics {
        let state = self.state.lock().expect("recorder lock poisoned");

        let first_duration = |ty: EventType| {
            state
                .events
                .iter()
                .find(|e| e.event_type == ty)
                .and_then(AnalyticsEvent::duration_ms)
        };

        let flow_states = state
            .events
            .iter()
            .filter(|e| e.event_type == EventType::FlowStateChange)
            .filter_map(|e| {
                let to = e.data.as_ref()?.get("to")?.as_str()?;
                Some(FlowStateEntry {
                    state: FlowState::from_code(to)?,
                    timestamp: e.timestamp,
                })
            })
            .collect();

        let errors = state
            .events
            .iter()
            .filter(|e| e.is_error_event())
            .map(|e| ErrorRecord {
                message: e
                    .error
                    .as_ref()
                    .map(|err| err.message.clone())
                    .unwrap_or_else(|| e.event_type.code().to_string()),
                timestamp: e.timestamp,
                phase: e.event_type.phase(),
            })
            .collect();

        RegistrationMetrics {
            liff_init_duration_ms: first_duration(EventType::LiffInitSuccess),
            authentication_duration_ms: first_duration(EventType::AuthSuccess),
            registration_duration_ms: first_duration(EventType::RegistrationSuccess),
            total_duration_ms: Utc::now().timestamp_millis()
                - state.session_start.timestamp_millis(),
            flow_states,
            errors,
        }
    }

    /// Derive rate statistics over the full event log
    pub fn summary(&self) -> AnalyticsSummary {
        let state = self.state.lock().expect("recorder lock poisoned");

        let total = state.events.len();
        let count = |pred: &dyn Fn(&AnalyticsEvent) -> bool| {
            state.events.iter().filter(|e| pred(e)).count()
        };

        let successes = count(&|e| e.event_type.is_success());
        let errors = count(&|e| e.is_error_event());
        let registration_successes =
            count(&|e| e.event_type == EventType::RegistrationSuccess);
        let cache_hits = count(&|e| e.event_type == EventType::RegistrationCacheHit);
        let new_users = count(&|e| e.event_type == EventType::RegistrationNewUser);

        let rate = |part: usize, whole: usize| {
            if whole == 0 {
                0.0
            } else {
                part as f64 / whole as f64 * 100.0
            }
        };

        let registration_durations: Vec<i64> = state
            .events
            .iter()
            .filter(|e| e.event_type == EventType::RegistrationSuccess)
            .filter_map(AnalyticsEvent::duration_ms)
            .collect();
        let average_registration_time_ms = if registration_durations.is_empty() {
            None
        } else {
            Some(
                registration_durations.iter().sum::<i64>() as f64
                    / registration_durations.len() as f64,
            )
        };

        AnalyticsSummary {
            total_events: total,
            success_rate: rate(successes, total),
            error_rate: rate(errors, total),
            cache_hit_rate: rate(cache_hits, registration_successes),
            new_user_rate: rate(new_users, registration_successes),
            average_registration_time_ms,
        }
    }

    /// Full diagnostics export: summary, raw events, derived metrics
    pub fn export(&self) -> AnalyticsExport {
        AnalyticsExport {
            summary: self.summary(),
            events: self.events(),
            metrics: self.metrics(),
        }
    }

    /// Drop all events and remove the durable log record
    pub async fn clear_events(&self) {
        {
            let mut state = self.state.lock().expect("recorder lock poisoned");
            state.events.clear();
        }
        if let Err(e) = self.store.remove(&self.config.event_log_key).await {
            tracing::warn!(error = %e, "Event log removal failed");
        }
    }
}
