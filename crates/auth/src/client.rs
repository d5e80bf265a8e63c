//! Identity client bootstrap.
//!
//! `AuthClient` owns the event hub and an at-most-once provider slot. It can
//! be configured synchronously from build-time values or asynchronously from
//! a runtime-configuration endpoint; either way the configuration side
//! effect happens at most once per client. A failed attempt leaves the slot
//! empty, so every identity operation fails with `NotConfigured` until a
//! later attempt succeeds.

use std::sync::Arc;

use tokio::sync::OnceCell;

use poolgate_core::auth::{AuthError as CoreAuthError, IdentityProviderClient};
use poolgate_core::config::RuntimeConfig;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::hub::AuthHub;
use crate::providers::CognitoProvider;

/// Owned handle to the (eventually) configured identity client.
pub struct AuthClient {
    hub: AuthHub,
    http: reqwest::Client,
    provider: OnceCell<Arc<dyn IdentityProviderClient>>,
}

impl AuthClient {
    pub fn new() -> Self {
        Self {
            hub: AuthHub::new(),
            http: reqwest::Client::new(),
            provider: OnceCell::new(),
        }
    }

    /// The auth event bus shared by providers and the state store.
    pub fn hub(&self) -> &AuthHub {
        &self.hub
    }

    pub fn is_configured(&self) -> bool {
        self.provider.initialized()
    }

    /// The configured provider, or `NotConfigured` before bootstrap succeeds.
    pub fn provider(&self) -> Result<Arc<dyn IdentityProviderClient>, CoreAuthError> {
        self.provider
            .get()
            .cloned()
            .ok_or(CoreAuthError::NotConfigured)
    }

    /// Configure from known connection parameters.
    ///
    /// Repeated calls after a success are no-ops; a failure leaves the
    /// client unconfigured so a later call may retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be built from the
    /// configuration (e.g. an unresolvable pool endpoint).
    pub async fn configure(&self, config: AuthConfig) -> Result<(), AuthError> {
        if self.provider.initialized() {
            tracing::debug!("identity client already configured; skipping");
            return Ok(());
        }

        self.provider
            .get_or_try_init(|| async {
                let provider = CognitoProvider::new(&config, self.hub.clone())?;
                tracing::info!(
                    user_pool_id = %config.user_pool_id,
                    "identity client configured"
                );
                Ok::<_, AuthError>(Arc::new(provider) as Arc<dyn IdentityProviderClient>)
            })
            .await?;
        Ok(())
    }

    /// Fetch the runtime Config Record from `url` and configure from it.
    ///
    /// Returns the fetched record so the caller can pick up the gateway URL,
    /// or `None` when the client was already configured and the fetch was
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when the fetch fails, the endpoint reports an error
    /// payload, or the record is incomplete. The client stays unconfigured.
    pub async fn configure_from_url(&self, url: &str) -> Result<Option<RuntimeConfig>, AuthError> {
        if self.provider.initialized() {
            tracing::debug!("identity client already configured; skipping config fetch");
            return Ok(None);
        }

        tracing::info!(url, "fetching runtime configuration");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        // The endpoint reports omissions as an error payload.
        if let Some(error) = body.get("error").and_then(serde_json::Value::as_str) {
            return Err(AuthError::Config(format!("failed to fetch config: {error}")));
        }
        if !status.is_success() {
            return Err(AuthError::Http(format!(
                "failed to fetch config: {status}"
            )));
        }

        let record: RuntimeConfig = serde_json::from_value(body)
            .map_err(|e| AuthError::Config(format!("invalid config record: {e}")))?;
        record.validate()?;

        self.configure(AuthConfig::from_runtime(&record)).await?;
        Ok(Some(record))
    }

    /// Install a pre-built provider. Returns false when one was already
    /// installed. Used by tests and mock-mode wiring.
    pub fn configure_with_provider(&self, provider: Arc<dyn IdentityProviderClient>) -> bool {
        self.provider.set(provider).is_ok()
    }
}

impl Default for AuthClient {
    fn default() -> Self {
        Self::new()
    }
}
