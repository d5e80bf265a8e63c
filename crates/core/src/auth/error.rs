use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity client has not been configured yet. Every operation
    /// fails with this until bootstrap succeeds.
    #[error("identity client is not configured")]
    NotConfigured,

    /// No signed-in user. This is the normal empty state, not a failure.
    #[error("no authenticated user")]
    NotAuthenticated,

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("account is not confirmed")]
    UserNotConfirmed,

    #[error("{0}")]
    CodeMismatch(String),

    #[error("{0}")]
    UsernameExists(String),

    #[error("user not found")]
    UserNotFound,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("missing required claim: {0}")]
    MissingClaim(String),

    #[error("network error: {0}")]
    Network(String),

    /// Structured rejection from the pool that has no dedicated variant.
    #[error("{0}")]
    Provider(String),
}

impl AuthError {
    /// Whether this is the expected "nobody is signed in" outcome rather
    /// than a real failure. The state store treats these as an empty
    /// snapshot, never as an error.
    pub fn is_expected_absence(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::NotConfigured)
    }
}
