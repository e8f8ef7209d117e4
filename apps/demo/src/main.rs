//! Demo Entry Point
//!
//! Drives one onboarding session end to end against the in-memory
//! collaborators and prints the analytics export.
//! Uses `anyhow` for startup errors; library-level errors use
//! `onboarding::OnboardingError`.

use std::sync::Arc;

use onboarding::application::flow::OnboardingFlow;
use onboarding::domain::IdentityProvider;
use onboarding::domain::flow::IdentityState;
use onboarding::infra::memory::{
    InMemoryIdentityProvider, InMemoryMemberRepository, InMemoryStateStore,
};
use onboarding::models::{Identity, IdentityId};
use onboarding::OnboardingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demo=info,onboarding=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let identity = Identity::new(IdentityId::new("U4af4980629")?, "Alice")
        .with_picture_url("https://profile.example/alice.jpg");

    let provider = Arc::new(InMemoryIdentityProvider::logged_out());
    provider.set_identity(identity.clone());

    let flow = OnboardingFlow::new(
        provider.clone(),
        Arc::new(InMemoryMemberRepository::new()),
        Arc::new(InMemoryStateStore::new()),
        Arc::new(OnboardingConfig::manual_welcome()),
    );
    flow.set_on_complete(|| tracing::info!("Onboarding completed"));

    flow.start_session().await;

    // Provider comes up ready but without a session.
    flow.on_identity_change(IdentityState {
        is_initialized: true,
        is_ready: true,
        ..Default::default()
    })
    .await;
    tracing::info!(state = %flow.state(), "Provider ready");

    // Login; the authenticated snapshot triggers auto-registration.
    provider.login().await?;
    flow.on_identity_change(IdentityState {
        is_initialized: true,
        is_ready: true,
        is_logged_in: true,
        profile: Some(identity.clone()),
        ..Default::default()
    })
    .await;
    tracing::info!(state = %flow.state(), "Registration resolved");

    // Dismiss the welcome screen.
    flow.continue_to_ready().await;
    tracing::info!(state = %flow.state(), "Flow complete");

    // A second check answers from the cache without datastore traffic.
    let cached = flow.service().check_and_register(Some(identity)).await;
    tracing::info!(
        is_new_user = cached.is_new_user,
        member_id = ?cached.member.as_ref().map(|m| m.member_id),
        "Repeat check served from cache"
    );

    flow.refresh_member().await;

    let export = flow.analytics().export();
    println!("{}", serde_json::to_string_pretty(&export)?);

    Ok(())
}
