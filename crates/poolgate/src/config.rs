use std::env;

use poolgate_core::config::{ConfigError, RuntimeConfig};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Identity pool id (e.g. `us-east-1_Abc123`).
    pub cognito_user_pool_id: Option<String>,
    /// Identity pool app client id.
    pub cognito_client_id: Option<String>,
    /// Base URL of the protected API gateway.
    pub api_gateway_url: Option<String>,
    /// Runtime-configuration endpoint to bootstrap from instead of the
    /// variables above.
    pub runtime_config_url: Option<String>,
    /// Override for the identity pool endpoint (points at the mock IdP in
    /// local development).
    pub idp_endpoint: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `COGNITO_USER_POOL_ID` - Identity pool id
    /// - `COGNITO_CLIENT_ID` - Identity pool app client id
    /// - `API_GATEWAY_URL` - Protected API base URL
    /// - `RUNTIME_CONFIG_URL` - Config endpoint to bootstrap from (optional)
    /// - `IDP_ENDPOINT` - Identity pool endpoint override (optional)
    pub fn from_env() -> Self {
        Self {
            cognito_user_pool_id: env::var("COGNITO_USER_POOL_ID").ok(),
            cognito_client_id: env::var("COGNITO_CLIENT_ID").ok(),
            api_gateway_url: env::var("API_GATEWAY_URL").ok(),
            runtime_config_url: env::var("RUNTIME_CONFIG_URL").ok(),
            idp_endpoint: env::var("IDP_ENDPOINT").ok(),
        }
    }

    /// Build the runtime Config Record, rejecting any missing value.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or invalid field. Partial
    /// records are never produced.
    pub fn runtime_config(&self) -> Result<RuntimeConfig, ConfigError> {
        RuntimeConfig::from_parts(
            self.cognito_user_pool_id.clone(),
            self.cognito_client_id.clone(),
            self.api_gateway_url.clone(),
        )
    }

    /// Merge a record fetched during runtime bootstrap.
    pub fn absorb_runtime(&mut self, record: &RuntimeConfig) {
        self.cognito_user_pool_id = Some(record.cognito_user_pool_id.clone());
        self.cognito_client_id = Some(record.cognito_client_id.clone());
        self.api_gateway_url = Some(record.api_gateway_url.clone());
    }
}
