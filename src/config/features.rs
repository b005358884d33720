//! Feature flags configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Feature flags for enabling/disabling functionality
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    /// Stream replies into Teams instead of sending them whole
    #[serde(default)]
    pub enable_streaming: bool,

    /// Minimum time between streaming updates, in milliseconds
    #[serde(default = "default_flush_interval")]
    pub flush_interval_ms: u64,

    /// Log inbound webhook bodies at debug level
    #[serde(default)]
    pub log_requests: bool,

    /// Expose `POST /api/notify` for proactive messages
    #[serde(default)]
    pub enable_notify_endpoint: bool,
}

impl FeatureFlags {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Validate feature flags
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.flush_interval_ms == 0 {
            return Err(ValidationError::InvalidFlushInterval);
        }
        Ok(())
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_streaming: false,
            flush_interval_ms: default_flush_interval(),
            log_requests: false,
            enable_notify_endpoint: false,
        }
    }
}

fn default_flush_interval() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_flags_defaults() {
        let flags = FeatureFlags::default();
        assert!(!flags.enable_streaming);
        assert!(!flags.log_requests);
        assert!(!flags.enable_notify_endpoint);
        assert_eq!(flags.flush_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_feature_flags_deserialization() {
        let json = r#"{
            "enable_streaming": true,
            "flush_interval_ms": 250,
            "log_requests": true
        }"#;

        let flags: FeatureFlags = serde_json::from_str(json).unwrap();
        assert!(flags.enable_streaming);
        assert!(flags.log_requests);
        assert!(!flags.enable_notify_endpoint);
        assert_eq!(flags.flush_interval_ms, 250);
    }

    #[test]
    fn test_zero_flush_interval_is_invalid() {
        let flags = FeatureFlags {
            flush_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(flags.validate(), Err(ValidationError::InvalidFlushInterval));
    }
}
