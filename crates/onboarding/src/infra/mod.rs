//! Infrastructure Layer
//!
//! Process-local implementations of the collaborator traits.

pub mod memory;

pub use memory::{InMemoryIdentityProvider, InMemoryMemberRepository, InMemoryStateStore};
