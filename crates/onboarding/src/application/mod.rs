//! Application Layer
//!
//! The onboarding services and the controller that orchestrates them.

pub mod analytics;
pub mod cache;
pub mod config;
pub mod countdown;
pub mod flow;
pub mod registration;

// Re-exports
pub use analytics::{
    AnalyticsEvent, AnalyticsExport, AnalyticsRecorder, AnalyticsSummary, RegistrationMetrics,
};
pub use cache::RegistrationCache;
pub use config::OnboardingConfig;
pub use countdown::WelcomeCountdown;
pub use flow::OnboardingFlow;
pub use registration::RegistrationService;
