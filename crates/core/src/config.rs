//! Runtime configuration record for the identity client.
//!
//! The record travels over `GET /api/config` with camelCase field names and
//! is either fully populated or invalid; bootstrap never accepts a partial
//! record.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid API gateway URL: {0}")]
    InvalidGatewayUrl(String),
}

/// Connection parameters for the identity pool and the API gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub cognito_user_pool_id: String,
    pub cognito_client_id: String,
    pub api_gateway_url: String,
}

impl RuntimeConfig {
    /// Build a record from optional sources, rejecting any missing value.
    pub fn from_parts(
        user_pool_id: Option<String>,
        client_id: Option<String>,
        api_gateway_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            cognito_user_pool_id: user_pool_id.ok_or(ConfigError::Missing("user pool id"))?,
            cognito_client_id: client_id.ok_or(ConfigError::Missing("client id"))?,
            api_gateway_url: api_gateway_url.ok_or(ConfigError::Missing("API gateway URL"))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject empty fields and unparseable gateway URLs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cognito_user_pool_id.is_empty() {
            return Err(ConfigError::Missing("user pool id"));
        }
        if self.cognito_client_id.is_empty() {
            return Err(ConfigError::Missing("client id"));
        }
        if self.api_gateway_url.is_empty() {
            return Err(ConfigError::Missing("API gateway URL"));
        }
        Url::parse(&self.api_gateway_url)
            .map_err(|e| ConfigError::InvalidGatewayUrl(e.to_string()))?;
        Ok(())
    }
}
