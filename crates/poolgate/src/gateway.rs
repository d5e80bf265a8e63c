//! Outbound client for the protected API gateway.
//!
//! Requests carry the pool-issued ID token as a bearer credential. Non-2xx
//! responses are parsed as JSON best-effort for a `message` field; bodies
//! that are not JSON fall back to a generic message.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;

/// Errors from gateway calls. The `Display` text is shown to the user
/// verbatim as a page-level message.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("API request failed with status {status}: {message}")]
    Request { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),
}

/// HTTP client for the API gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Fetch data from the gateway with the given bearer token.
    ///
    /// # Errors
    ///
    /// Returns `Request` for non-2xx responses (with the best-effort error
    /// message) and `Network` for transport failures.
    pub async fn fetch_data(&self, base_url: &str, id_token: &str) -> Result<Value, GatewayError> {
        let response = self
            .http
            .get(base_url)
            .header(AUTHORIZATION, format!("Bearer {id_token}"))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Request {
                status: status.as_u16(),
                message: error_body_message(&body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))
    }
}

impl Default for GatewayClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract an error message from a response body, best-effort.
fn error_body_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| json.to_string()),
        Err(_) => "Failed to fetch data from API.".to_string(),
    }
}
