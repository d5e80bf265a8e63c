//! Mock identity-pool server.
//!
//! Accepts the pool's JSON operations dispatched on the `x-amz-target`
//! header: `SignUp`, `ConfirmSignUp`, `InitiateAuth` (USER_PASSWORD_AUTH),
//! and `GlobalSignOut`. Accounts are held in memory; confirmation codes are
//! logged instead of emailed, and the fixed dev code is always accepted.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::Rng;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Confirmation code accepted for every mock account.
pub const DEV_CONFIRMATION_CODE: &str = "123456";

/// Signing secret for mock tokens. Dev only, obviously.
const TOKEN_SECRET: &[u8] = b"poolgate-mock-idp";

/// Issued-token lifetime in seconds.
const TOKEN_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    email: String,
    sub: String,
    code: String,
    confirmed: bool,
}

#[derive(Clone, Default)]
struct MockIdpState {
    accounts: Arc<tokio::sync::RwLock<HashMap<String, Account>>>,
}

/// Mock identity-pool server bound to a fixed port.
pub struct MockIdpServer {
    port: u16,
}

impl MockIdpServer {
    /// Create a new mock pool server.
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Run the server until the process exits.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        tracing::info!("mock identity pool listening on http://{}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router()).await
    }
}

/// Build the mock pool router. Tests bind it to an ephemeral port.
pub fn router() -> Router {
    Router::new()
        .route("/", post(dispatch))
        .with_state(MockIdpState::default())
}

/// Route one operation by its `x-amz-target` header.
async fn dispatch(
    State(state): State<MockIdpState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let target = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let operation = target.rsplit('.').next().unwrap_or_default();
    let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

    match operation {
        "SignUp" => sign_up(&state, &request).await,
        "ConfirmSignUp" => confirm_sign_up(&state, &request).await,
        "InitiateAuth" => initiate_auth(&state, &request).await,
        "GlobalSignOut" => global_sign_out(&request),
        other => service_error(
            StatusCode::BAD_REQUEST,
            "UnknownOperationException",
            &format!("Unknown operation: {other}"),
        ),
    }
}

fn service_error(status: StatusCode, error_type: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "__type": error_type, "message": message })),
    )
        .into_response()
}

fn field<'a>(request: &'a Value, name: &str) -> Option<&'a str> {
    request.get(name).and_then(Value::as_str)
}

async fn sign_up(state: &MockIdpState, request: &Value) -> Response {
    let (Some(username), Some(password)) = (field(request, "Username"), field(request, "Password"))
    else {
        return service_error(
            StatusCode::BAD_REQUEST,
            "InvalidParameterException",
            "Username and Password are required.",
        );
    };

    let email = request
        .get("UserAttributes")
        .and_then(Value::as_array)
        .and_then(|attrs| {
            attrs
                .iter()
                .find(|a| a.get("Name").and_then(Value::as_str) == Some("email"))
        })
        .and_then(|a| a.get("Value"))
        .and_then(Value::as_str)
        .unwrap_or(username)
        .to_string();

    let mut accounts = state.accounts.write().await;
    if accounts.contains_key(username) {
        return service_error(
            StatusCode::BAD_REQUEST,
            "UsernameExistsException",
            "An account with the given email already exists.",
        );
    }

    let sub = Uuid::new_v4().to_string();
    let code = format!("{:06}", rand::rng().random_range(0..1_000_000));
    tracing::info!(username, code, "confirmation code issued");

    accounts.insert(
        username.to_string(),
        Account {
            password: password.to_string(),
            email: email.clone(),
            sub: sub.clone(),
            code,
            confirmed: false,
        },
    );

    (
        StatusCode::OK,
        Json(json!({
            "UserConfirmed": false,
            "UserSub": sub,
            "CodeDeliveryDetails": {
                "Destination": mask_email(&email),
                "DeliveryMedium": "EMAIL",
                "AttributeName": "email",
            },
        })),
    )
        .into_response()
}

async fn confirm_sign_up(state: &MockIdpState, request: &Value) -> Response {
    let (Some(username), Some(code)) =
        (field(request, "Username"), field(request, "ConfirmationCode"))
    else {
        return service_error(
            StatusCode::BAD_REQUEST,
            "InvalidParameterException",
            "Username and ConfirmationCode are required.",
        );
    };

    let mut accounts = state.accounts.write().await;
    let Some(account) = accounts.get_mut(username) else {
        return service_error(
            StatusCode::BAD_REQUEST,
            "UserNotFoundException",
            "User does not exist.",
        );
    };

    if code != account.code && code != DEV_CONFIRMATION_CODE {
        return service_error(
            StatusCode::BAD_REQUEST,
            "CodeMismatchException",
            "Invalid verification code provided, please try again.",
        );
    }

    account.confirmed = true;
    (StatusCode::OK, Json(json!({}))).into_response()
}

async fn initiate_auth(state: &MockIdpState, request: &Value) -> Response {
    if field(request, "AuthFlow") != Some("USER_PASSWORD_AUTH") {
        return service_error(
            StatusCode::BAD_REQUEST,
            "InvalidParameterException",
            "Only USER_PASSWORD_AUTH is supported.",
        );
    }

    let parameters = request.get("AuthParameters").cloned().unwrap_or(Value::Null);
    let (Some(username), Some(password)) = (
        field(&parameters, "USERNAME"),
        field(&parameters, "PASSWORD"),
    ) else {
        return service_error(
            StatusCode::BAD_REQUEST,
            "InvalidParameterException",
            "USERNAME and PASSWORD are required.",
        );
    };

    let accounts = state.accounts.read().await;
    let Some(account) = accounts.get(username) else {
        return service_error(
            StatusCode::BAD_REQUEST,
            "UserNotFoundException",
            "User does not exist.",
        );
    };

    if !account.confirmed {
        return service_error(
            StatusCode::BAD_REQUEST,
            "UserNotConfirmedException",
            "User is not confirmed.",
        );
    }
    if account.password != password {
        return service_error(
            StatusCode::BAD_REQUEST,
            "NotAuthorizedException",
            "Incorrect username or password.",
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "AuthenticationResult": {
                "IdToken": mint_id_token(username, account),
                "AccessToken": mint_access_token(username, account),
                "ExpiresIn": TOKEN_TTL_SECONDS,
                "TokenType": "Bearer",
            },
        })),
    )
        .into_response()
}

fn global_sign_out(request: &Value) -> Response {
    let valid = field(request, "AccessToken")
        .and_then(decode_access_token)
        .is_some();

    if valid {
        (StatusCode::OK, Json(json!({}))).into_response()
    } else {
        service_error(
            StatusCode::BAD_REQUEST,
            "NotAuthorizedException",
            "Invalid Access Token",
        )
    }
}

/// Mint an HS256 ID token carrying the claims the client reads.
fn mint_id_token(username: &str, account: &Account) -> String {
    let now = Utc::now().timestamp();
    let claims = json!({
        "sub": account.sub,
        "cognito:username": username,
        "email": account.email,
        "token_use": "id",
        "iat": now,
        "exp": now + TOKEN_TTL_SECONDS,
    });

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TOKEN_SECRET),
    )
    .unwrap_or_default()
}

/// Access tokens are opaque to the client; encode the account handle.
fn mint_access_token(username: &str, account: &Account) -> String {
    base64::engine::general_purpose::STANDARD.encode(
        json!({ "username": username, "sub": account.sub, "nonce": Uuid::new_v4() }).to_string(),
    )
}

fn decode_access_token(token: &str) -> Option<String> {
    let decoded = base64::engine::general_purpose::STANDARD.decode(token).ok()?;
    let json: Value = serde_json::from_slice(&decoded).ok()?;
    json.get("username").and_then(Value::as_str).map(String::from)
}

fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible = local.chars().next().map(String::from).unwrap_or_default();
            format!("{visible}***@{domain}")
        }
        None => "***".to_string(),
    }
}
