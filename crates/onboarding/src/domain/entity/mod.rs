//! Entity Module

pub mod identity;
pub mod member;
pub mod registration;

// Re-exports
pub use identity::Identity;
pub use member::{Member, MemberDraft, MemberPatch};
pub use registration::RegistrationStatus;
