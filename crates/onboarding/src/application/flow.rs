//! Onboarding Flow Controller
//!
//! Owns the three input snapshots (identity provider, registration,
//! member fetch), recomputes the flow state through the pure domain
//! reducer whenever any of them changes, and drives the side effects
//! around the edges: auto-registration on first login, the welcome
//! countdown, retry bookkeeping, and analytics.
//!
//! The controller never holds its snapshot lock across an await; every
//! async effect works on a copy taken under the lock.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use kernel::error::info::ErrorInfo;

use crate::application::analytics::AnalyticsRecorder;
use crate::application::config::OnboardingConfig;
use crate::application::countdown::WelcomeCountdown;
use crate::application::registration::RegistrationService;
use crate::domain::entity::identity::Identity;
use crate::domain::flow::{self, FlowInputs, IdentityState};
use crate::domain::repository::{IdentityProvider, MemberRepository, StateStore};
use crate::domain::value_object::flow_state::FlowState;

struct FlowShared {
    inputs: FlowInputs,
    state: FlowState,
    /// Completion callback fired (guards exactly-once)
    completed: bool,
}

/// Orchestrates one onboarding session
pub struct OnboardingFlow<P, M, S>
where
    P: IdentityProvider + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    S: StateStore + Send + Sync + 'static,
{
    provider: Arc<P>,
    members: Arc<M>,
    service: Arc<RegistrationService<P, M, S>>,
    analytics: Arc<AnalyticsRecorder<S>>,
    config: Arc<OnboardingConfig>,
    shared: Mutex<FlowShared>,
    countdown: Mutex<Option<WelcomeCountdown>>,
    /// Session-scoped, monotonic; surfaced to the UI as "attempt N".
    /// Doubles as the staleness generation for in-flight registrations.
    attempt: AtomicU64,
    on_complete: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl<P, M, S> OnboardingFlow<P, M, S>
where
    P: IdentityProvider + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
    S: StateStore + Send + Sync + 'static,
{
    pub fn new(
        provider: Arc<P>,
        members: Arc<M>,
        store: Arc<S>,
        config: Arc<OnboardingConfig>,
    ) -> Arc<Self> {
        let analytics = Arc::new(AnalyticsRecorder::new(store.clone(), config.clone()));
        let service = Arc::new(RegistrationService::new(
            provider.clone(),
            members.clone(),
            store,
            analytics.clone(),
            config.clone(),
        ));

        Arc::new(Self {
            provider,
            members,
            service,
            analytics,
            config,
            shared: Mutex::new(FlowShared {
                inputs: FlowInputs::default(),
                state: FlowState::default(),
                completed: false,
            }),
            countdown: Mutex::new(None),
            attempt: AtomicU64::new(0),
            on_complete: Mutex::new(None),
        })
    }

    /// Register the callback fired once when onboarding completes
    pub fn set_on_complete(&self, callback: impl FnOnce() + Send + 'static) {
        *self.on_complete.lock().expect("flow lock poisoned") = Some(Box::new(callback));
    }

    /// Begin a session: reset the event log and record the opening event
    pub async fn start_session(&self) {
        self.analytics.start_session().await;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current flow state
    pub fn state(&self) -> FlowState {
        self.shared.lock().expect("flow lock poisoned").state
    }

    /// Copy of the current reducer inputs
    pub fn snapshot(&self) -> FlowInputs {
        self.shared.lock().expect("flow lock poisoned").inputs.clone()
    }

    /// The single error payload to surface, if the flow is in error
    pub fn error_message(&self) -> Option<ErrorInfo> {
        let shared = self.shared.lock().expect("flow lock poisoned");
        flow::first_error(&shared.inputs).cloned()
    }

    /// Retry attempts made this session ("attempt N")
    pub fn attempt(&self) -> u64 {
        self.attempt.load(Ordering::SeqCst)
    }

    /// Seconds left on the welcome countdown, when one is running
    pub fn welcome_remaining(&self) -> Option<u32> {
        self.countdown
            .lock()
            .expect("flow lock poisoned")
            .as_ref()
            .map(WelcomeCountdown::remaining)
    }

    /// The analytics engine observing this flow
    pub fn analytics(&self) -> &Arc<AnalyticsRecorder<S>> {
        &self.analytics
    }

    /// The registration service driven by this flow
    pub fn service(&self) -> &Arc<RegistrationService<P, M, S>> {
        &self.service
    }

    // ========================================================================
    // Input changes
    // ========================================================================

    /// Feed a fresh identity-provider snapshot.
    ///
    /// Recomputes the flow state and, when this snapshot is the first
    /// with an authenticated profile, triggers auto-registration for
    /// that identity.
    pub async fn on_identity_change(self: &Arc<Self>, identity: IdentityState) {
        let (previous, register_for) = {
            let mut shared = self.shared.lock().expect("flow lock poisoned");
            let previous = std::mem::replace(&mut shared.inputs.identity, identity.clone());

            let registration = &mut shared.inputs.registration;
            let should_register = identity.is_logged_in
                && identity.profile.is_some()
                && identity.error.is_none()
                && !registration.is_registered
                && !registration.is_registering
                && registration.registration_error.is_none();
            if should_register {
                // Marked before the recompute so the state moves
                // straight from authenticating to registering.
                registration.is_registering = true;
            }
            (previous, should_register.then(|| identity.profile.clone()).flatten())
        };

        self.track_identity_transition(&previous, &identity).await;
        self.recompute().await;

        if let Some(profile) = register_for {
            self.register(profile).await;
        }
    }

    /// Attribute provider snapshot transitions to lifecycle events
    async fn track_identity_transition(&self, previous: &IdentityState, next: &IdentityState) {
        if !previous.is_ready && next.is_ready {
            self.analytics.track_liff_init(Ok(())).await;
        }
        if !previous.is_logged_in && next.is_logged_in {
            self.analytics.track_authentication(Ok(())).await;
        }
        if previous.profile.is_none() {
            if let Some(profile) = &next.profile {
                self.analytics.track_profile_loaded(profile).await;
            }
        }
        if previous.error.is_none() {
            if let Some(error) = &next.error {
                if next.is_ready {
                    self.analytics.track_authentication(Err(error.clone())).await;
                } else {
                    self.analytics.track_liff_init(Err(error.clone())).await;
                }
            }
        }
    }

    /// Run the registration check for an authenticated identity.
    ///
    /// Tagged with the attempt generation at call time; a response that
    /// arrives after a newer `retry` is discarded so it cannot override
    /// fresher state.
    pub async fn register(self: &Arc<Self>, identity: Identity) {
        let generation = self.attempt.load(Ordering::SeqCst);
        {
            let mut shared = self.shared.lock().expect("flow lock poisoned");
            shared.inputs.registration.is_registering = true;
            shared.inputs.registration.error = None;
            shared.inputs.registration.registration_error = None;
        }
        self.recompute().await;

        let status = self.service.check_and_register(Some(identity)).await;

        if self.attempt.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "Discarding stale registration response");
            {
                let mut shared = self.shared.lock().expect("flow lock poisoned");
                // This attempt set the in-flight marker; drop it so a
                // later authenticated snapshot can register again.
                shared.inputs.registration.is_registering = false;
            }
            self.recompute().await;
            return;
        }

        {
            let mut shared = self.shared.lock().expect("flow lock poisoned");
            let registration = &mut shared.inputs.registration;
            registration.is_registering = false;
            registration.is_registered = status.is_registered;
            registration.is_new_user = status.is_new_user;
            registration.registration_error = status.error.clone();
            shared.inputs.member.member = status.member;
        }
        self.recompute().await;
    }

    /// Reload the member record for the current identity
    pub async fn refresh_member(self: &Arc<Self>) {
        let Some(id) = ({
            let shared = self.shared.lock().expect("flow lock poisoned");
            shared.inputs.identity.profile.as_ref().map(|p| p.id.clone())
        }) else {
            return;
        };

        self.analytics.track_member_refresh(&id).await;
        {
            let mut shared = self.shared.lock().expect("flow lock poisoned");
            shared.inputs.member.loading = true;
            shared.inputs.member.error = None;
        }
        self.recompute().await;

        let result = self.members.find_by_identity(&id).await;
        {
            let mut shared = self.shared.lock().expect("flow lock poisoned");
            shared.inputs.member.loading = false;
            match &result {
                Ok(member) => shared.inputs.member.member = member.clone(),
                Err(e) => shared.inputs.member.error = Some(e.to_error_info()),
            }
        }
        match result {
            Ok(member) => self.analytics.track_member_update(&id, member.is_some()).await,
            Err(e) => {
                e.log();
                self.analytics.track_member_error(&e.to_error_info()).await;
            }
        }
        self.recompute().await;
    }

    // ========================================================================
    // User actions
    // ========================================================================

    /// Retry after an error.
    ///
    /// Increments the session-scoped attempt counter (never reset),
    /// clears the locally-clearable error snapshots, and re-invokes
    /// whichever source was failing. A prior in-flight attempt is not
    /// cancelled; bumping the generation makes its late response stale.
    pub async fn retry(self: &Arc<Self>) {
        let attempt = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;

        let (identity_failed, registration_failed, member_failed, profile) = {
            let mut shared = self.shared.lock().expect("flow lock poisoned");
            let inputs = &mut shared.inputs;
            let identity_failed = inputs.identity.error.is_some();
            let registration_failed = inputs.registration.error.is_some()
                || inputs.registration.registration_error.is_some();
            let member_failed = inputs.member.error.is_some();

            inputs.identity.error = None;
            inputs.registration.error = None;
            inputs.registration.registration_error = None;
            inputs.member.error = None;

            (
                identity_failed,
                registration_failed,
                member_failed,
                inputs.identity.profile.clone(),
            )
        };

        tracing::info!(
            attempt,
            identity_failed,
            registration_failed,
            member_failed,
            "Retrying onboarding"
        );
        self.recompute().await;

        if identity_failed {
            self.analytics.track_auth_start().await;
            if let Err(e) = self.provider.login().await {
                e.log();
                let info = e.to_error_info();
                self.analytics.track_authentication(Err(info.clone())).await;
                let mut shared = self.shared.lock().expect("flow lock poisoned");
                shared.inputs.identity.error = Some(info);
            }
            self.recompute().await;
            return;
        }

        if registration_failed {
            let identity = match profile {
                Some(identity) => Some(identity),
                None => self.provider.cached_profile().await,
            };
            if let Some(identity) = identity {
                self.register(identity).await;
            }
            return;
        }

        if member_failed {
            self.refresh_member().await;
        }
    }

    /// Advance out of the welcome screen.
    ///
    /// Invoked by the user's continue action or by countdown expiry;
    /// whichever comes first wins and the other is a no-op. Sets the
    /// welcome flag and fires the completion callback exactly once.
    pub async fn continue_to_ready(self: &Arc<Self>) {
        self.disarm_countdown();

        let fire = {
            let mut shared = self.shared.lock().expect("flow lock poisoned");
            if shared.state != FlowState::Success {
                return;
            }
            shared.inputs.welcome_shown = true;
            !std::mem::replace(&mut shared.completed, true)
        };

        if fire {
            self.analytics.track_flow_complete().await;
            let callback = self.on_complete.lock().expect("flow lock poisoned").take();
            if let Some(callback) = callback {
                callback();
            }
        }

        self.recompute().await;
    }

    /// End the session: provider logout, cache clear, snapshot reset
    pub async fn logout(self: &Arc<Self>) {
        self.disarm_countdown();

        if let Err(e) = self.provider.logout().await {
            e.log();
        }
        if let Err(e) = self.service.clear_cache(None).await {
            e.log();
        }

        {
            let mut shared = self.shared.lock().expect("flow lock poisoned");
            shared.inputs = FlowInputs::default();
            shared.completed = false;
        }
        tracing::info!("Onboarding session ended");
        self.recompute().await;
    }

    // ========================================================================
    // Recomputation
    // ========================================================================

    async fn recompute(self: &Arc<Self>) {
        let (previous, next, error) = {
            let mut shared = self.shared.lock().expect("flow lock poisoned");
            let next = flow::reduce(&shared.inputs);
            let previous = std::mem::replace(&mut shared.state, next);
            (previous, next, flow::first_error(&shared.inputs).cloned())
        };

        if previous == next {
            return;
        }

        tracing::info!(from = %previous, to = %next, "Flow state changed");
        self.analytics.track_flow_state_change(previous, next).await;

        match next {
            FlowState::Success => self.arm_countdown(),
            FlowState::Error => {
                if let Some(error) = error {
                    self.analytics.track_flow_error(&error).await;
                }
            }
            _ => {}
        }
        if previous == FlowState::Success && next != FlowState::Success {
            self.disarm_countdown();
        }
    }

    fn arm_countdown(self: &Arc<Self>) {
        let Some(delay) = self.config.welcome_auto_advance else {
            return;
        };

        let weak = Arc::downgrade(self);
        let countdown = WelcomeCountdown::start(delay, move || {
            // The flow may already be torn down; expiring against a
            // dead session is a no-op.
            if let Some(flow) = weak.upgrade() {
                tokio::spawn(async move {
                    flow.continue_to_ready().await;
                });
            }
        });

        // Replacing an armed countdown cancels it via Drop.
        *self.countdown.lock().expect("flow lock poisoned") = Some(countdown);
    }

    fn disarm_countdown(&self) {
        if let Some(countdown) = self.countdown.lock().expect("flow lock poisoned").take() {
            countdown.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::member::{Member, MemberDraft, MemberPatch};
    use crate::domain::value_object::event_type::EventType;
    use crate::domain::value_object::identity_id::IdentityId;
    use crate::error::OnboardingResult;
    use crate::infra::memory::{
        InMemoryIdentityProvider, InMemoryMemberRepository, InMemoryStateStore,
    };
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Delegates to the in-memory datastore but holds every
    /// `find_by_identity` call until a permit is released.
    struct GatedMemberRepository {
        inner: InMemoryMemberRepository,
        lookups: Semaphore,
    }

    impl GatedMemberRepository {
        fn new() -> Self {
            Self {
                inner: InMemoryMemberRepository::new(),
                lookups: Semaphore::new(0),
            }
        }
    }

    impl MemberRepository for GatedMemberRepository {
        async fn find_by_identity(&self, id: &IdentityId) -> OnboardingResult<Option<Member>> {
            let _permit = self.lookups.acquire().await.expect("semaphore closed");
            self.inner.find_by_identity(id).await
        }

        async fn create(&self, draft: &MemberDraft) -> OnboardingResult<Member> {
            self.inner.create(draft).await
        }

        async fn update(&self, id: &IdentityId, patch: MemberPatch) -> OnboardingResult<Member> {
            self.inner.update(id, patch).await
        }
    }

    type TestFlow =
        OnboardingFlow<InMemoryIdentityProvider, InMemoryMemberRepository, InMemoryStateStore>;

    fn identity(raw: &str) -> Identity {
        Identity::new(IdentityId::new(raw).unwrap(), "Alice")
    }

    fn flow_with_config(config: OnboardingConfig) -> (Arc<TestFlow>, Arc<InMemoryMemberRepository>) {
        let members = Arc::new(InMemoryMemberRepository::new());
        let flow = OnboardingFlow::new(
            Arc::new(InMemoryIdentityProvider::logged_in(identity("U1"))),
            members.clone(),
            Arc::new(InMemoryStateStore::new()),
            Arc::new(config),
        );
        (flow, members)
    }

    fn flow() -> (Arc<TestFlow>, Arc<InMemoryMemberRepository>) {
        flow_with_config(OnboardingConfig::default())
    }

    fn loading() -> IdentityState {
        IdentityState {
            loading: true,
            ..Default::default()
        }
    }

    fn ready_logged_out() -> IdentityState {
        IdentityState {
            is_initialized: true,
            is_ready: true,
            ..Default::default()
        }
    }

    fn logged_in(raw: &str) -> IdentityState {
        IdentityState {
            is_initialized: true,
            is_ready: true,
            is_logged_in: true,
            profile: Some(identity(raw)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_new_user_happy_path() {
        let (flow, _) = flow();
        flow.start_session().await;
        assert_eq!(flow.state(), FlowState::Initializing);

        flow.on_identity_change(loading()).await;
        assert_eq!(flow.state(), FlowState::Initializing);

        flow.on_identity_change(ready_logged_out()).await;
        assert_eq!(flow.state(), FlowState::Authenticating);

        // Login triggers auto-registration, awaited inline.
        flow.on_identity_change(logged_in("U1")).await;
        assert_eq!(flow.state(), FlowState::Success);
        assert!(flow.snapshot().registration.is_new_user);

        flow.continue_to_ready().await;
        assert_eq!(flow.state(), FlowState::Ready);
        assert!(flow.snapshot().welcome_shown);
    }

    #[tokio::test]
    async fn test_existing_user_skips_welcome() {
        let (flow, members) = flow();
        members
            .create(&MemberDraft::from_identity(&identity("U1")))
            .await
            .unwrap();

        flow.start_session().await;
        flow.on_identity_change(logged_in("U1")).await;
        assert_eq!(flow.state(), FlowState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_welcome_auto_advances_and_completes_once() {
        let (flow, _) = flow();
        let completions = Arc::new(AtomicUsize::new(0));
        let in_callback = completions.clone();
        flow.set_on_complete(move || {
            in_callback.fetch_add(1, Ordering::SeqCst);
        });

        flow.start_session().await;
        flow.on_identity_change(logged_in("U1")).await;
        assert_eq!(flow.state(), FlowState::Success);
        assert_eq!(flow.welcome_remaining(), Some(3));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(flow.state(), FlowState::Ready);
        assert_eq!(completions.load(Ordering::SeqCst), 1);

        // A late continue is a no-op.
        flow.continue_to_ready().await;
        assert_eq!(completions.load(Ordering::SeqCst), 1);

        let completes = flow
            .analytics()
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::FlowComplete)
            .count();
        assert_eq!(completes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_continue_cancels_countdown() {
        let (flow, _) = flow();
        flow.start_session().await;
        flow.on_identity_change(logged_in("U1")).await;

        flow.continue_to_ready().await;
        assert_eq!(flow.state(), FlowState::Ready);
        assert!(flow.welcome_remaining().is_none() || flow.welcome_remaining() == Some(0));

        // Countdown expiry later must not fire anything again.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(flow.state(), FlowState::Ready);
    }

    #[tokio::test]
    async fn test_manual_welcome_config_never_auto_advances() {
        let (flow, _) = flow_with_config(OnboardingConfig::manual_welcome());
        flow.start_session().await;
        flow.on_identity_change(logged_in("U1")).await;
        assert_eq!(flow.state(), FlowState::Success);
        assert!(flow.welcome_remaining().is_none());
    }

    #[tokio::test]
    async fn test_identity_error_surfaces_with_priority() {
        let (flow, _) = flow();
        flow.start_session().await;

        let mut snapshot = ready_logged_out();
        snapshot.error = Some(ErrorInfo::new("init failed"));
        flow.on_identity_change(snapshot).await;

        assert_eq!(flow.state(), FlowState::Error);
        assert_eq!(flow.error_message().unwrap().message, "init failed");
    }

    #[tokio::test]
    async fn test_retry_after_identity_error_increments_attempt() {
        let (flow, _) = flow();
        flow.start_session().await;

        let mut snapshot = ready_logged_out();
        snapshot.error = Some(ErrorInfo::new("init failed"));
        flow.on_identity_change(snapshot).await;
        assert_eq!(flow.attempt(), 0);

        flow.retry().await;
        assert_eq!(flow.attempt(), 1);
        assert_ne!(flow.state(), FlowState::Error);

        flow.retry().await;
        assert_eq!(flow.attempt(), 2);
    }

    #[tokio::test]
    async fn test_member_refresh_error_and_retry() {
        let (flow, members) = flow();
        flow.start_session().await;
        flow.on_identity_change(logged_in("U1")).await;
        flow.continue_to_ready().await;
        assert_eq!(flow.state(), FlowState::Ready);

        // Simulate a member snapshot failure pushed from outside.
        {
            let mut shared = flow.shared.lock().unwrap();
            shared.inputs.member.error = Some(ErrorInfo::new("member gone"));
        }
        flow.recompute().await;
        assert_eq!(flow.state(), FlowState::Error);

        flow.retry().await;
        assert_eq!(flow.state(), FlowState::Ready);
        assert!(
            members
                .find_by_identity(&identity("U1").id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_flow_state_trail_is_recorded() {
        let (flow, _) = flow();
        flow.start_session().await;
        flow.on_identity_change(ready_logged_out()).await;
        flow.on_identity_change(logged_in("U1")).await;
        flow.continue_to_ready().await;

        let trail: Vec<FlowState> = flow
            .analytics()
            .metrics()
            .flow_states
            .iter()
            .map(|e| e.state)
            .collect();
        assert_eq!(
            trail,
            vec![
                FlowState::Authenticating,
                FlowState::Registering,
                FlowState::Success,
                FlowState::Ready,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_registration_response_leaves_flow_recoverable() {
        let members = Arc::new(GatedMemberRepository::new());
        let flow = OnboardingFlow::new(
            Arc::new(InMemoryIdentityProvider::logged_in(identity("U1"))),
            members.clone(),
            Arc::new(InMemoryStateStore::new()),
            Arc::new(OnboardingConfig::manual_welcome()),
        );
        flow.start_session().await;

        // The first check blocks inside the datastore lookup.
        let in_flight = {
            let flow = flow.clone();
            tokio::spawn(async move { flow.on_identity_change(logged_in("U1")).await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(flow.state(), FlowState::Registering);

        // A provider failure surfaces while the lookup is in flight;
        // the retry takes the identity branch and bumps the generation.
        {
            let mut shared = flow.shared.lock().unwrap();
            shared.inputs.identity.error = Some(ErrorInfo::new("provider hiccup"));
        }
        flow.recompute().await;
        flow.retry().await;
        assert_eq!(flow.attempt(), 1);

        // The lookup completes; its response is stale and discarded,
        // but the in-flight marker must not stick.
        members.lookups.add_permits(1);
        in_flight.await.unwrap();
        assert!(!flow.snapshot().registration.is_registering);
        assert_ne!(flow.state(), FlowState::Registering);

        // A fresh authenticated snapshot registers again (answered from
        // the cache the discarded attempt wrote).
        flow.on_identity_change(logged_in("U1")).await;
        assert_eq!(flow.state(), FlowState::Success);
    }

    #[tokio::test]
    async fn test_logout_clears_cache_and_resets() {
        let (flow, _) = flow();
        flow.start_session().await;
        flow.on_identity_change(logged_in("U1")).await;

        let id = identity("U1").id;
        assert!(flow.service().is_registration_complete(&id).await);

        flow.logout().await;
        assert!(flow.service().cached_status(&id).await.is_none());
        assert_eq!(flow.state(), FlowState::Initializing);
    }
}
