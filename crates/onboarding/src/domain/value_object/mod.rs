//! Value Object Module

pub mod event_type;
pub mod flow_state;
pub mod identity_id;
pub mod phase;

// Re-exports
pub use event_type::EventType;
pub use flow_state::FlowState;
pub use identity_id::{IdentityId, IdentityIdError};
pub use phase::Phase;
