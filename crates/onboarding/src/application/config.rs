//! Application Configuration
//!
//! Configuration for the onboarding application layer.

use std::time::Duration;

/// Onboarding application configuration
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Validity window of a registration cache entry (24 hours)
    pub cache_ttl: Duration,
    /// Key prefix for per-identity cache records
    pub cache_key_prefix: String,
    /// Durable key for the analytics event log
    pub event_log_key: String,
    /// Maximum events retained before FIFO eviction
    pub max_events: usize,
    /// Welcome screen auto-advance delay; `None` means manual-only
    pub welcome_auto_advance: Option<Duration>,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(24 * 3600), // 24 hours
            cache_key_prefix: "onboarding.registration.".to_string(),
            event_log_key: "onboarding.analytics.events".to_string(),
            max_events: 1000,
            welcome_auto_advance: Some(Duration::from_secs(3)),
        }
    }
}

impl OnboardingConfig {
    /// Config with manual-only welcome dismissal
    pub fn manual_welcome() -> Self {
        Self {
            welcome_auto_advance: None,
            ..Default::default()
        }
    }

    /// Get cache TTL in milliseconds
    pub fn cache_ttl_ms(&self) -> i64 {
        self.cache_ttl.as_millis() as i64
    }

    /// Durable key for one identity's cache record
    pub fn cache_key(&self, identity_id: &str) -> String {
        format!("{}{}", self.cache_key_prefix, identity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OnboardingConfig::default();
        assert_eq!(config.cache_ttl_ms(), 24 * 3600 * 1000);
        assert_eq!(config.max_events, 1000);
        assert!(config.welcome_auto_advance.is_some());
    }

    #[test]
    fn test_cache_key() {
        let config = OnboardingConfig::default();
        assert_eq!(config.cache_key("U123"), "onboarding.registration.U123");
    }

    #[test]
    fn test_manual_welcome() {
        assert!(OnboardingConfig::manual_welcome().welcome_auto_advance.is_none());
    }
}
