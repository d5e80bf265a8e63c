//! In-memory identity provider for unit tests.
//!
//! Deterministic fake honoring the same contract as the pool client:
//! structured rejections, confirmation gating, hub events on sign-in and
//! sign-out. State lives in maps and is lost when the provider is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use poolgate_core::auth::{
    AuthError, AuthEvent, AuthUser, IdentityProviderClient, Result, SignInOutcome, SignUpOutcome,
    SignUpRequest, SignUpStep, TokenSet, UserId,
};

use crate::hub::AuthHub;

/// The code every mock account accepts.
pub const CONFIRMATION_CODE: &str = "123456";

#[derive(Debug, Clone)]
struct MockAccount {
    password: String,
    user_id: String,
    confirmed: bool,
}

/// In-memory provider for development and testing.
#[derive(Debug)]
pub struct MockProvider {
    hub: AuthHub,
    accounts: Mutex<HashMap<String, MockAccount>>,
    session: Mutex<Option<(AuthUser, TokenSet)>>,
    pending_auto_sign_in: Mutex<Option<String>>,
    fail_auto_sign_in: AtomicBool,
}

impl MockProvider {
    pub fn new(hub: AuthHub) -> Self {
        Self {
            hub,
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            pending_auto_sign_in: Mutex::new(None),
            fail_auto_sign_in: AtomicBool::new(false),
        }
    }

    /// Register an already-confirmed account.
    pub async fn seed_confirmed_user(&self, username: &str, password: &str) {
        self.accounts.lock().await.insert(
            username.to_string(),
            MockAccount {
                password: password.to_string(),
                user_id: Uuid::new_v4().to_string(),
                confirmed: true,
            },
        );
    }

    /// Make the next `auto_sign_in` call fail, for fallback-path tests.
    pub fn fail_auto_sign_in(&self) {
        self.fail_auto_sign_in.store(true, Ordering::SeqCst);
    }

    fn tokens_for(username: &str) -> TokenSet {
        TokenSet {
            id_token: format!("mock-id-token-{username}"),
            access_token: format!("mock-access-token-{username}"),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }
}

#[async_trait]
impl IdentityProviderClient for MockProvider {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome> {
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&request.username) {
            return Err(AuthError::UsernameExists(
                "An account with the given email already exists.".to_string(),
            ));
        }

        let user_id = Uuid::new_v4().to_string();
        accounts.insert(
            request.username.clone(),
            MockAccount {
                password: request.password.clone(),
                user_id: user_id.clone(),
                confirmed: false,
            },
        );
        drop(accounts);

        if request.auto_sign_in {
            *self.pending_auto_sign_in.lock().await = Some(request.username.clone());
        }

        Ok(SignUpOutcome {
            user_id: Some(UserId::new(user_id)),
            next_step: SignUpStep::ConfirmSignUp,
        })
    }

    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<SignUpOutcome> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts.get_mut(username).ok_or(AuthError::UserNotFound)?;

        if code != CONFIRMATION_CODE {
            return Err(AuthError::CodeMismatch(
                "Invalid verification code provided, please try again.".to_string(),
            ));
        }

        account.confirmed = true;
        Ok(SignUpOutcome {
            user_id: None,
            next_step: SignUpStep::Done,
        })
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<SignInOutcome> {
        let account = {
            let accounts = self.accounts.lock().await;
            accounts.get(username).cloned().ok_or(AuthError::UserNotFound)?
        };

        if !account.confirmed {
            return Err(AuthError::UserNotConfirmed);
        }
        if account.password != password {
            return Err(AuthError::InvalidCredentials(
                "Incorrect username or password.".to_string(),
            ));
        }

        let user = AuthUser {
            username: username.to_string(),
            user_id: UserId::new(account.user_id),
        };
        *self.session.lock().await = Some((user, Self::tokens_for(username)));

        self.hub.publish(AuthEvent::SignedIn);
        Ok(SignInOutcome::done())
    }

    async fn auto_sign_in(&self) -> Result<SignInOutcome> {
        if self.fail_auto_sign_in.swap(false, Ordering::SeqCst) {
            return Err(AuthError::Provider(
                "auto sign-in is not available".to_string(),
            ));
        }

        let username = self
            .pending_auto_sign_in
            .lock()
            .await
            .take()
            .ok_or_else(|| AuthError::Provider("auto sign-in is not available".to_string()))?;

        let password = {
            let accounts = self.accounts.lock().await;
            accounts
                .get(&username)
                .map(|a| a.password.clone())
                .ok_or(AuthError::UserNotFound)?
        };

        self.sign_in(&username, &password).await
    }

    async fn sign_out(&self) -> Result<()> {
        self.session.lock().await.take();
        self.pending_auto_sign_in.lock().await.take();
        self.hub.publish(AuthEvent::SignedOut);
        Ok(())
    }

    async fn current_user(&self) -> Result<AuthUser> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|(user, _)| user.clone())
            .ok_or(AuthError::NotAuthenticated)
    }

    async fn auth_session(&self) -> Result<TokenSet> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|(_, tokens)| tokens.clone())
            .ok_or(AuthError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up_request(username: &str) -> SignUpRequest {
        SignUpRequest {
            username: username.to_string(),
            password: "Secret123!".to_string(),
            email: username.to_string(),
            auto_sign_in: false,
        }
    }

    #[tokio::test]
    async fn sign_up_requires_confirmation_before_sign_in() {
        let provider = MockProvider::new(AuthHub::new());

        let outcome = provider.sign_up(&sign_up_request("a@b.com")).await.unwrap();
        assert_eq!(outcome.next_step, SignUpStep::ConfirmSignUp);

        let err = provider.sign_in("a@b.com", "Secret123!").await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotConfirmed));

        provider
            .confirm_sign_up("a@b.com", CONFIRMATION_CODE)
            .await
            .unwrap();
        let outcome = provider.sign_in("a@b.com", "Secret123!").await.unwrap();
        assert!(outcome.is_signed_in);
    }

    #[tokio::test]
    async fn wrong_code_is_rejected_with_message() {
        let provider = MockProvider::new(AuthHub::new());
        provider.sign_up(&sign_up_request("a@b.com")).await.unwrap();

        let err = provider.confirm_sign_up("a@b.com", "000000").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid verification code provided, please try again."
        );
    }

    #[tokio::test]
    async fn current_user_without_session_is_expected_absence() {
        let provider = MockProvider::new(AuthHub::new());
        let err = provider.current_user().await.unwrap_err();
        assert!(err.is_expected_absence());
    }

    #[tokio::test]
    async fn sign_out_clears_session_and_publishes() {
        let hub = AuthHub::new();
        let mut subscription = hub.subscribe();
        let provider = MockProvider::new(hub);
        provider.seed_confirmed_user("alice", "pw").await;

        provider.sign_in("alice", "pw").await.unwrap();
        provider.sign_out().await.unwrap();

        assert!(provider.current_user().await.is_err());
        assert_eq!(
            subscription.next().await,
            crate::hub::SubscriptionMessage::Event(AuthEvent::SignedIn)
        );
        assert_eq!(
            subscription.next().await,
            crate::hub::SubscriptionMessage::Event(AuthEvent::SignedOut)
        );
    }

    #[tokio::test]
    async fn auto_sign_in_consumes_pending_credentials_once() {
        let provider = MockProvider::new(AuthHub::new());
        provider
            .sign_up(&SignUpRequest {
                auto_sign_in: true,
                ..sign_up_request("a@b.com")
            })
            .await
            .unwrap();
        provider
            .confirm_sign_up("a@b.com", CONFIRMATION_CODE)
            .await
            .unwrap();

        assert!(provider.auto_sign_in().await.unwrap().is_signed_in);
        assert!(provider.auto_sign_in().await.is_err());
    }
}
