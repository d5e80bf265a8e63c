use thiserror::Error;

/// Errors for the poolgate_auth crate.
///
/// Wraps the core `AuthError` and adds bootstrap-specific variants for the
/// configuration fetch, which is not part of the provider surface.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module (provider rejections, token parsing).
    #[error(transparent)]
    Core(#[from] poolgate_core::auth::AuthError),

    /// HTTP failure while fetching the runtime configuration.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid or incomplete configuration record.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<poolgate_core::config::ConfigError> for AuthError {
    fn from(err: poolgate_core::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
