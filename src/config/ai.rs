//! AI provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// OpenAI / Azure OpenAI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// API key (OpenAI key, or Azure resource key)
    pub api_key: Option<Secret<String>>,

    /// Model or deployment name
    #[serde(default = "default_model")]
    pub model: String,

    /// Azure OpenAI endpoint; switches the client to Azure mode when set
    pub azure_base_url: Option<String>,

    /// System prompt prepended to every request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    /// Azure endpoint, ignoring blank values
    pub fn azure_base_url(&self) -> Option<&str> {
        self.azure_base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("AI__API_KEY"));
        }
        if let Some(url) = self.azure_base_url() {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ValidationError::InvalidAzureBaseUrl);
            }
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            azure_base_url: None,
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-5-chat".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant integrated with Microsoft Teams.".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_timeout() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed() -> AiConfig {
        AiConfig {
            api_key: Some(Secret::new("sk-test".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.model, "gpt-5-chat");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_tokens, 4000);
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_validation_requires_api_key() {
        assert_eq!(
            AiConfig::default().validate(),
            Err(ValidationError::MissingRequired("AI__API_KEY"))
        );
        assert!(keyed().validate().is_ok());
    }

    #[test]
    fn test_blank_azure_url_is_ignored() {
        let config = AiConfig {
            azure_base_url: Some(" ".to_string()),
            ..keyed()
        };
        assert!(config.azure_base_url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_non_http_azure_url() {
        let config = AiConfig {
            azure_base_url: Some("contoso.openai.azure.com".to_string()),
            ..keyed()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidAzureBaseUrl));
    }

    #[test]
    fn test_validation_rejects_out_of_range_temperature() {
        let config = AiConfig {
            temperature: 2.5,
            ..keyed()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTemperature));
    }

    #[test]
    fn test_validation_rejects_zero_max_tokens() {
        let config = AiConfig {
            max_tokens: 0,
            ..keyed()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxTokens));
    }
}
