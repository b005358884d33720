//! Bot Framework token provider.
//!
//! Outbound connector calls carry a bearer token obtained with the OAuth
//! client-credentials flow for the bot's app registration. Tokens are cached
//! until shortly before they expire.
//!
//! Without an app id (local emulator) no token is requested and calls go out
//! unauthenticated.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::ports::TransportError;

/// Scope requested for connector tokens.
pub const BOT_FRAMEWORK_SCOPE: &str = "https://api.botframework.com/.default";

/// Tenant used by multi-tenant bot registrations.
const MULTI_TENANT: &str = "botframework.com";

const LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";

/// Tokens are refreshed this long before their stated expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// App registration credentials of the bot.
#[derive(Debug, Clone)]
pub struct BotCredentials {
    pub app_id: String,
    app_password: Secret<String>,
    /// Single-tenant registrations authenticate against their own tenant.
    pub tenant_id: Option<String>,
    login_base_url: String,
}

impl BotCredentials {
    pub fn new(app_id: impl Into<String>, app_password: Secret<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_password,
            tenant_id: None,
            login_base_url: LOGIN_BASE_URL.to_string(),
        }
    }

    /// Blank tenant ids fall back to the multi-tenant authority.
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        let tenant_id = tenant_id.into();
        self.tenant_id = (!tenant_id.trim().is_empty()).then_some(tenant_id);
        self
    }

    /// Points token requests at another authority host.
    pub fn with_login_base_url(mut self, url: impl Into<String>) -> Self {
        self.login_base_url = url.into();
        self
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base_url.trim_end_matches('/'),
            self.tenant_id.as_deref().unwrap_or(MULTI_TENANT)
        )
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: Secret<String>,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

/// Acquires and caches connector tokens.
pub struct BotTokenProvider {
    credentials: Option<BotCredentials>,
    client: Client,
    cache: Arc<RwLock<Option<CachedToken>>>,
}

impl std::fmt::Debug for BotTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotTokenProvider")
            .field("app_id", &self.credentials.as_ref().map(|c| c.app_id.as_str()))
            .finish()
    }
}

impl BotTokenProvider {
    pub fn new(credentials: Option<BotCredentials>, client: Client) -> Self {
        Self {
            credentials,
            client,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Provider that never authenticates.
    pub fn anonymous(client: Client) -> Self {
        Self::new(None, client)
    }

    pub fn is_anonymous(&self) -> bool {
        self.credentials.is_none()
    }

    /// Returns a bearer token, or `None` when running without credentials.
    pub async fn token(&self) -> Result<Option<Secret<String>>, TransportError> {
        let Some(credentials) = self.credentials.as_ref() else {
            return Ok(None);
        };

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh()) {
                return Ok(Some(cached.access_token.clone()));
            }
        }

        let fetched = self.fetch(credentials).await?;
        let token = fetched.access_token.clone();
        *self.cache.write().await = Some(fetched);
        Ok(Some(token))
    }

    async fn fetch(&self, credentials: &BotCredentials) -> Result<CachedToken, TransportError> {
        let url = credentials.token_url();
        tracing::debug!(app_id = %credentials.app_id, "Requesting connector token");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.app_id.as_str()),
                ("client_secret", credentials.app_password.expose_secret().as_str()),
                ("scope", BOT_FRAMEWORK_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reach token endpoint");
                TransportError::authentication(format!("token request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(status = status.as_u16(), "Token endpoint rejected credentials");
            return Err(TransportError::authentication(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| {
            TransportError::authentication(format!("failed to parse token response: {}", e))
        })?;

        Ok(CachedToken {
            access_token: Secret::new(parsed.access_token),
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
        })
    }
}
