use async_trait::async_trait;

use super::{AuthError, AuthUser, SignInOutcome, SignUpOutcome, SignUpRequest, TokenSet};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Abstraction over the managed identity pool.
///
/// The pool is externally owned; implementations only call its operations
/// and report the results. Implementations publish `SignedIn`/`SignedOut`
/// on the event hub after the corresponding operation completes, so state
/// synchronization flows through the hub rather than through callers.
#[async_trait]
pub trait IdentityProviderClient: Send + Sync + std::fmt::Debug {
    /// Register a new account. May require confirmation before sign-in.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome>;

    /// Submit the confirmation code delivered during sign-up.
    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<SignUpOutcome>;

    /// Authenticate with username and password.
    async fn sign_in(&self, username: &str, password: &str) -> Result<SignInOutcome>;

    /// Complete the sign-in a prior `sign_up` opted into.
    async fn auto_sign_in(&self) -> Result<SignInOutcome>;

    /// End the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Who is the current user now. `NotAuthenticated` when nobody is.
    async fn current_user(&self) -> Result<AuthUser>;

    /// Tokens for the current session, for bearer-authenticated calls.
    async fn auth_session(&self) -> Result<TokenSet>;
}
