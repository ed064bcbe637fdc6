use std::{sync::Arc, time::Duration};

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use tracing::warn;

use super::config::{AppConfig, AuthMode};
use crate::error::AppError;

/// Decides whether a caller-supplied API key may use protected routes.
#[async_trait]
pub trait KeyValidator: Send + Sync {
    async fn validate(&self, api_key: &str) -> Result<(), AppError>;
}

/// Upper bound on one provider check. The provider client retries rate limits
/// with backoff, which would otherwise hold the request open for minutes.
pub const KEY_VALIDATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Accepts a key when the model provider accepts it for a model listing.
pub struct ProviderKeyValidator {
    api_base: String,
    timeout: Duration,
}

impl ProviderKeyValidator {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            timeout: KEY_VALIDATION_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl KeyValidator for ProviderKeyValidator {
    async fn validate(&self, api_key: &str) -> Result<(), AppError> {
        ensure_present(api_key)?;

        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(&self.api_base),
        );

        match tokio::time::timeout(self.timeout, client.models().list()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => {
                warn!(error = %err, "API key validation failed");
                Err(AppError::Auth("Invalid API key".to_string()))
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "API key validation timed out");
                Err(AppError::Auth("API key validation timed out".to_string()))
            }
        }
    }
}

/// Accepts any non-empty key.
pub struct PresenceKeyValidator;

#[async_trait]
impl KeyValidator for PresenceKeyValidator {
    async fn validate(&self, api_key: &str) -> Result<(), AppError> {
        ensure_present(api_key)
    }
}

fn ensure_present(api_key: &str) -> Result<(), AppError> {
    if api_key.trim().is_empty() {
        return Err(AppError::Auth("Empty API key".to_string()));
    }
    Ok(())
}

pub fn validator_from_config(config: &AppConfig) -> Arc<dyn KeyValidator> {
    match config.auth_mode {
        AuthMode::Provider => Arc::new(ProviderKeyValidator::new(&config.openai_base_url)),
        AuthMode::Presence => Arc::new(PresenceKeyValidator),
    }
}
