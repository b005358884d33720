//! Bot registration configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Bot Framework app registration.
///
/// Leaving `app_id` unset runs the bot unauthenticated, which is what the
/// local emulator expects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotConfig {
    pub app_id: Option<String>,

    pub app_password: Option<Secret<String>>,

    /// Tenant of a single-tenant registration
    pub tenant_id: Option<String>,

    /// Display name of the bot in Teams. Messages addressed to any other
    /// recipient name are ignored. Unset accepts every recipient.
    pub name: Option<String>,
}

impl BotConfig {
    /// App id, ignoring blank values
    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Bot display name, ignoring blank values
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.trim().is_empty())
    }

    pub fn has_credentials(&self) -> bool {
        self.app_id().is_some()
    }

    /// Validate bot configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_password = self
            .app_password
            .as_ref()
            .is_some_and(|p| !p.expose_secret().is_empty());
        if self.has_credentials() && !has_password {
            return Err(ValidationError::MissingAppPassword);
        }
        Ok(())
    }
}
