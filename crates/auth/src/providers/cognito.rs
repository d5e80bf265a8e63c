//! User-pool protocol client.
//!
//! Talks to the managed identity pool with JSON calls dispatched on the
//! `x-amz-target` header (`SignUp`, `ConfirmSignUp`, `InitiateAuth`,
//! `GlobalSignOut`). The signed-in token set lives in memory for the life
//! of the process, mirroring how the pool's own client libraries behave in
//! a browser tab.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use url::Url;

use poolgate_core::auth::{
    is_token_expired, AuthError, AuthEvent, AuthUser, IdentityProviderClient, Result,
    SignInOutcome, SignInStep, SignUpOutcome, SignUpRequest, SignUpStep, TokenSet, UserId,
};

use crate::config::AuthConfig;
use crate::hub::AuthHub;
use crate::token::parse_id_token;

/// Credentials stashed by a sign-up that opted into auto sign-in.
#[derive(Debug, Clone)]
struct StoredCredentials {
    username: String,
    password: String,
}

/// Client for the managed identity pool.
#[derive(Debug)]
pub struct CognitoProvider {
    http: reqwest::Client,
    endpoint: Url,
    client_id: String,
    hub: AuthHub,
    session: RwLock<Option<TokenSet>>,
    pending_auto_sign_in: RwLock<Option<StoredCredentials>>,
}

impl CognitoProvider {
    /// Create a provider for the configured pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool endpoint cannot be resolved from the
    /// configuration.
    pub fn new(config: &AuthConfig, hub: AuthHub) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint()?,
            client_id: config.client_id.clone(),
            hub,
            session: RwLock::new(None),
            pending_auto_sign_in: RwLock::new(None),
        })
    }

    /// Issue one pool operation and parse the JSON response.
    async fn call(&self, target: &str, body: Value) -> Result<Value> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(
                "x-amz-target",
                format!("AWSCognitoIdentityProviderService.{target}"),
            )
            .header(CONTENT_TYPE, "application/x-amz-json-1.1")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let json: Value = if text.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&text).unwrap_or(Value::Null)
        };

        if status.is_success() {
            Ok(json)
        } else {
            Err(map_service_error(status.as_u16(), &json))
        }
    }
}

/// Map a pool error payload (`__type` + `message`) to the auth taxonomy.
fn map_service_error(status: u16, body: &Value) -> AuthError {
    let raw_type = body
        .get("__type")
        .and_then(Value::as_str)
        .unwrap_or_default();
    // The type may arrive fully qualified (`com.amazon...#NotAuthorizedException`).
    let error_type = raw_type.rsplit('#').next().unwrap_or(raw_type);
    let message = body
        .get("message")
        .or_else(|| body.get("Message"))
        .and_then(Value::as_str)
        .unwrap_or("The identity pool rejected the request.")
        .to_string();

    match error_type {
        "NotAuthorizedException" => AuthError::InvalidCredentials(message),
        "UserNotConfirmedException" => AuthError::UserNotConfirmed,
        "UserNotFoundException" => AuthError::UserNotFound,
        "UsernameExistsException" => AuthError::UsernameExists(message),
        "CodeMismatchException" | "ExpiredCodeException" => AuthError::CodeMismatch(message),
        "" => AuthError::Provider(format!("pool returned status {status}")),
        _ => AuthError::Provider(message),
    }
}

#[async_trait]
impl IdentityProviderClient for CognitoProvider {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome> {
        let response = self
            .call(
                "SignUp",
                json!({
                    "ClientId": self.client_id,
                    "Username": request.username,
                    "Password": request.password,
                    "UserAttributes": [
                        { "Name": "email", "Value": request.email },
                    ],
                }),
            )
            .await?;

        if request.auto_sign_in {
            *self.pending_auto_sign_in.write().await = Some(StoredCredentials {
                username: request.username.clone(),
                password: request.password.clone(),
            });
        }

        let confirmed = response
            .get("UserConfirmed")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let user_id = response
            .get("UserSub")
            .and_then(Value::as_str)
            .map(|sub| UserId::new(sub.to_string()));

        Ok(SignUpOutcome {
            user_id,
            next_step: if confirmed {
                SignUpStep::Done
            } else {
                SignUpStep::ConfirmSignUp
            },
        })
    }

    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<SignUpOutcome> {
        self.call(
            "ConfirmSignUp",
            json!({
                "ClientId": self.client_id,
                "Username": username,
                "ConfirmationCode": code,
            }),
        )
        .await?;

        Ok(SignUpOutcome {
            user_id: None,
            next_step: SignUpStep::Done,
        })
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<SignInOutcome> {
        let response = self
            .call(
                "InitiateAuth",
                json!({
                    "AuthFlow": "USER_PASSWORD_AUTH",
                    "ClientId": self.client_id,
                    "AuthParameters": {
                        "USERNAME": username,
                        "PASSWORD": password,
                    },
                }),
            )
            .await?;

        if let Some(result) = response.get("AuthenticationResult") {
            let id_token = result
                .get("IdToken")
                .and_then(Value::as_str)
                .ok_or_else(|| AuthError::Provider("sign-in response missing IdToken".into()))?;
            let access_token = result
                .get("AccessToken")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    AuthError::Provider("sign-in response missing AccessToken".into())
                })?;
            let expires_in = result.get("ExpiresIn").and_then(Value::as_i64).unwrap_or(3600);

            *self.session.write().await = Some(TokenSet {
                id_token: id_token.to_string(),
                access_token: access_token.to_string(),
                expires_at: Utc::now() + Duration::seconds(expires_in),
            });

            self.hub.publish(AuthEvent::SignedIn);
            return Ok(SignInOutcome::done());
        }

        if let Some(challenge) = response.get("ChallengeName").and_then(Value::as_str) {
            let next_step = match challenge {
                "SMS_MFA" => SignInStep::ConfirmSignInWithSmsCode,
                "SOFTWARE_TOKEN_MFA" => SignInStep::ConfirmSignInWithTotpCode,
                "NEW_PASSWORD_REQUIRED" => SignInStep::NewPasswordRequired,
                other => {
                    return Err(AuthError::Provider(format!(
                        "unsupported sign-in challenge: {other}"
                    )))
                }
            };
            return Ok(SignInOutcome {
                is_signed_in: false,
                next_step,
            });
        }

        Err(AuthError::Provider(
            "pool returned neither tokens nor a challenge".into(),
        ))
    }

    async fn auto_sign_in(&self) -> Result<SignInOutcome> {
        let credentials = self
            .pending_auto_sign_in
            .write()
            .await
            .take()
            .ok_or_else(|| AuthError::Provider("auto sign-in is not available".into()))?;

        self.sign_in(&credentials.username, &credentials.password)
            .await
    }

    async fn sign_out(&self) -> Result<()> {
        let tokens = self.session.write().await.take();

        if let Some(tokens) = tokens {
            // Best-effort revocation. The local session is gone either way.
            if let Err(e) = self
                .call("GlobalSignOut", json!({ "AccessToken": tokens.access_token }))
                .await
            {
                tracing::warn!(error = %e, "global sign-out failed; local session cleared anyway");
            }
        }

        self.pending_auto_sign_in.write().await.take();
        self.hub.publish(AuthEvent::SignedOut);
        Ok(())
    }

    async fn current_user(&self) -> Result<AuthUser> {
        let tokens = self
            .session
            .read()
            .await
            .clone()
            .ok_or(AuthError::NotAuthenticated)?;

        if is_token_expired(&tokens, Utc::now()) {
            *self.session.write().await = None;
            return Err(AuthError::NotAuthenticated);
        }

        let claims = parse_id_token(&tokens.id_token)?;
        Ok(AuthUser {
            username: claims.display_name().to_string(),
            user_id: UserId::new(claims.sub),
        })
    }

    async fn auth_session(&self) -> Result<TokenSet> {
        let tokens = self
            .session
            .read()
            .await
            .clone()
            .ok_or(AuthError::NotAuthenticated)?;

        if is_token_expired(&tokens, Utc::now()) {
            *self.session.write().await = None;
            return Err(AuthError::NotAuthenticated);
        }

        Ok(tokens)
    }
}
