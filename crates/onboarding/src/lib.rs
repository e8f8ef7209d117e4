//! Membership Onboarding Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, the flow reducer, collaborator traits
//! - `application/` - Registration service, analytics, countdown, flow controller
//! - `infra/` - In-memory implementations for tests and the demo binary
//!
//! ## Features
//! - Idempotent auto-registration with a TTL-cached status per identity
//! - Per-identity in-flight gate so concurrent checks share one lookup
//! - Six-state onboarding flow derived by a pure priority reducer
//! - Bounded lifecycle event log with derived session metrics
//! - Cancellable welcome countdown with a fire-once completion callback

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::config::OnboardingConfig;
pub use application::flow::OnboardingFlow;
pub use application::registration::RegistrationService;
pub use error::{OnboardingError, OnboardingResult};

// Re-export kernel error types for unified error handling
pub use kernel::error::{info::ErrorInfo, kind::ErrorKind};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}

pub mod analytics {
    pub use crate::application::analytics::*;
}

pub mod store {
    pub use crate::infra::memory::InMemoryStateStore as MemoryStore;
}
