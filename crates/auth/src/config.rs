use poolgate_core::auth::AuthError;
use poolgate_core::config::RuntimeConfig;
use url::Url;

/// Connection parameters for the identity pool.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub user_pool_id: String,
    pub client_id: String,
    /// Override for the pool endpoint. Used by the mock IdP and local
    /// testing; when unset the endpoint is derived from the pool region.
    pub endpoint: Option<Url>,
}

impl AuthConfig {
    pub fn new(user_pool_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Build from a validated runtime Config Record.
    pub fn from_runtime(record: &RuntimeConfig) -> Self {
        Self::new(
            record.cognito_user_pool_id.clone(),
            record.cognito_client_id.clone(),
        )
    }

    /// Resolve the pool endpoint.
    ///
    /// Pool ids are prefixed with their region (`us-east-1_Abc123`), which
    /// determines the regional service endpoint.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Provider` if no endpoint override is set and the
    /// pool id has no region prefix.
    pub fn endpoint(&self) -> Result<Url, AuthError> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }

        let region = self
            .user_pool_id
            .split_once('_')
            .map(|(region, _)| region)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                AuthError::Provider(format!(
                    "user pool id '{}' has no region prefix",
                    self.user_pool_id
                ))
            })?;

        let url = format!("https://cognito-idp.{region}.amazonaws.com/");
        Url::parse(&url).map_err(|e| AuthError::Provider(e.to_string()))
    }
}
