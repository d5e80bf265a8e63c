use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pool-issued unique user identifier (the token's `sub` claim).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The authenticated user as reported by the identity pool.
///
/// Carries both the sign-in name and the pool-issued identifier, so a
/// snapshot either has both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub username: String,
    pub user_id: UserId,
}

/// Point-in-time view of the authentication state.
///
/// `loading` is true only while a who-am-I query is outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user: Option<AuthUser>,
    pub loading: bool,
}

impl AuthSnapshot {
    /// Initial state at store mount: no user known yet, query outstanding.
    pub fn initial() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|u| &u.user_id)
    }
}

/// Tokens issued by the identity pool for the current sign-in.
///
/// The ID token is the bearer credential for gateway calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub id_token: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Auth lifecycle notification published on the event hub.
///
/// The state store acts on `SignedIn` and `SignedOut`; every other kind is
/// ignored by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Inputs for a sign-up call.
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    /// When set, the provider may stash the credentials so `auto_sign_in`
    /// can complete after confirmation without re-entering them.
    pub auto_sign_in: bool,
}

/// Next step the pool requires to finish a sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpStep {
    /// A confirmation code was delivered and must be submitted.
    ConfirmSignUp,
    Done,
}

/// Result of `sign_up` / `confirm_sign_up`.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user_id: Option<UserId>,
    pub next_step: SignUpStep,
}

impl SignUpOutcome {
    pub fn is_complete(&self) -> bool {
        self.next_step == SignUpStep::Done
    }
}

/// Next step the pool requires to finish a sign-in.
///
/// Non-`Done` steps are surfaced to the user as a message; poolgate does not
/// drive MFA or password-reset flows itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStep {
    Done,
    ConfirmSignUp,
    ConfirmSignInWithSmsCode,
    ConfirmSignInWithTotpCode,
    NewPasswordRequired,
}

impl std::fmt::Display for SignInStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Done => "DONE",
            Self::ConfirmSignUp => "CONFIRM_SIGN_UP",
            Self::ConfirmSignInWithSmsCode => "CONFIRM_SIGN_IN_WITH_SMS_CODE",
            Self::ConfirmSignInWithTotpCode => "CONFIRM_SIGN_IN_WITH_TOTP_CODE",
            Self::NewPasswordRequired => "NEW_PASSWORD_REQUIRED",
        };
        write!(f, "{name}")
    }
}

/// Result of `sign_in` / `auto_sign_in`.
#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub is_signed_in: bool,
    pub next_step: SignInStep,
}

impl SignInOutcome {
    pub fn done() -> Self {
        Self {
            is_signed_in: true,
            next_step: SignInStep::Done,
        }
    }
}
