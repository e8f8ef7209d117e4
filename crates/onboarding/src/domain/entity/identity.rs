//! Identity Entity
//!
//! The authenticated user's externally-issued profile. Produced by the
//! identity provider at login; immutable for the lifetime of a session
//! and destroyed at logout.

use serde::{Deserialize, Serialize};

use crate::domain::value_object::identity_id::IdentityId;

/// Identity profile issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-issued identifier
    pub id: IdentityId,
    /// Display name from the provider profile
    pub display_name: String,
    /// Avatar URL, if the provider supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
}

impl Identity {
    pub fn new(id: IdentityId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            picture_url: None,
        }
    }

    pub fn with_picture_url(mut self, url: impl Into<String>) -> Self {
        self.picture_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> IdentityId {
        IdentityId::new(raw).unwrap()
    }

    #[test]
    fn test_new() {
        let identity = Identity::new(id("U123"), "Alice");
        assert_eq!(identity.id.as_str(), "U123");
        assert_eq!(identity.display_name, "Alice");
        assert!(identity.picture_url.is_none());
    }

    #[test]
    fn test_with_picture_url() {
        let identity =
            Identity::new(id("U123"), "Alice").with_picture_url("https://example.com/a.png");
        assert_eq!(
            identity.picture_url.as_deref(),
            Some("https://example.com/a.png")
        );
    }
}
