//! Domain Layer
//!
//! Contains entities, value objects, collaborator traits, and the pure
//! flow reducer.

pub mod entity;
pub mod flow;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{identity::Identity, member::Member, registration::RegistrationStatus};
pub use flow::{FlowInputs, IdentityState, MemberState, RegistrationState};
pub use repository::{IdentityProvider, MemberRepository, StateStore};
