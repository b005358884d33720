//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `RELAY_BOT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use relay_bot::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod bot;
mod database;
mod error;
mod features;
mod server;

pub use ai::AiConfig;
pub use bot::BotConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use features::FeatureFlags;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

use crate::application::handlers::conversation::{ReplySettings, RouterConfig};
use crate::application::handlers::streaming::StreamingConfig;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Conversation directory storage (PostgreSQL)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// OpenAI / Azure OpenAI
    #[serde(default)]
    pub ai: AiConfig,

    /// Bot Framework registration
    #[serde(default)]
    pub bot: BotConfig,

    /// Feature flags
    #[serde(default)]
    pub features: FeatureFlags,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `RELAY_BOT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `RELAY_BOT__SERVER__PORT=3978` -> `server.port = 3978`
    /// - `RELAY_BOT__AI__API_KEY=...` -> `ai.api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("RELAY_BOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    /// Production additionally requires a database and bot credentials.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.ai.validate()?;
        self.bot.validate()?;
        self.features.validate()?;

        if self.is_production() {
            if !self.database.is_configured() {
                return Err(ValidationError::MissingRequired("DATABASE__URL"));
            }
            if !self.bot.has_credentials() {
                return Err(ValidationError::MissingRequired("BOT__APP_ID"));
            }
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Model parameters for every completion request
    pub fn reply_settings(&self) -> ReplySettings {
        ReplySettings {
            system_prompt: self.ai.system_prompt.clone(),
            temperature: self.ai.temperature,
            max_tokens: self.ai.max_tokens,
        }
    }

    /// Routing options for inbound messages
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            bot_name: self.bot.name().map(str::to_string),
            enable_streaming: self.features.enable_streaming,
            streaming: StreamingConfig {
                min_flush_interval: self.features.flush_interval(),
                ..StreamingConfig::default()
            },
        }
    }
}
