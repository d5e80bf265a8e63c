use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        api::runtime_config,
        dashboard::{dashboard, fetch_api_data},
        health::health,
        login::{sign_in, sign_out},
        pages::{home, login_page, signup_page},
        signup::{confirm, sign_up},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    // CORS configuration for the API endpoints
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    // API routes with CORS
    let api_routes = Router::new()
        .route("/config", get(runtime_config))
        .route("/health", get(health))
        .layer(cors);

    // Main application router
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(sign_in))
        .route("/signup", get(signup_page).post(sign_up))
        .route("/signup/confirm", post(confirm))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/fetch", post(fetch_api_data))
        .route("/signout", post(sign_out))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use poolgate_auth::{AuthClient, MockProvider};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_config() -> Config {
        Config {
            cognito_user_pool_id: Some("us-east-1_TestPool".to_string()),
            cognito_client_id: Some("test-client".to_string()),
            api_gateway_url: Some("http://127.0.0.1:1/".to_string()),
            runtime_config_url: None,
            idp_endpoint: None,
        }
    }

    /// App state wired to the in-memory mock provider.
    fn mock_state(config: Config) -> (AppState, Arc<MockProvider>) {
        let auth = Arc::new(AuthClient::new());
        let provider = Arc::new(MockProvider::new(auth.hub().clone()));
        assert!(auth.configure_with_provider(provider.clone()));
        (AppState::new(config, auth), provider)
    }

    async fn wait_for_auth(state: &AppState, signed_in: bool) {
        let mut rx = state.store.subscribe();
        tokio::time::timeout(
            Duration::from_secs(2),
            rx.wait_for(|s| s.is_authenticated() == signed_in && !s.loading),
        )
        .await
        .expect("auth state did not settle in time")
        .unwrap();
    }

    async fn body_string(response: axum::response::Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn form_post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn location(response: &axum::response::Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (state, _provider) = mock_state(test_config());
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn test_config_endpoint_with_full_environment() {
        let (state, _provider) = mock_state(test_config());
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/config")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["cognitoUserPoolId"], "us-east-1_TestPool");
        assert_eq!(json["cognitoClientId"], "test-client");
        assert_eq!(json["apiGatewayUrl"], "http://127.0.0.1:1/");
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_config_endpoint_fails_closed_on_missing_value() {
        let mut config = test_config();
        config.cognito_client_id = None;
        let (state, _provider) = mock_state(config);
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/config")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Server configuration is incomplete.");
        // Never a partial record.
        assert!(json.get("cognitoUserPoolId").is_none());
        assert!(json.get("apiGatewayUrl").is_none());
    }

    #[tokio::test]
    async fn test_home_page() {
        let (state, _provider) = mock_state(test_config());
        let app = create_app(state);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Welcome to Poolgate"));
    }

    #[tokio::test]
    async fn test_login_page_renders_form() {
        let (state, _provider) = mock_state(test_config());
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Sign In"));
        assert!(html.contains("Password"));
    }

    #[tokio::test]
    async fn test_dashboard_redirects_when_unauthenticated() {
        let (state, _provider) = mock_state(test_config());
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login?return_to=/dashboard");
    }

    #[tokio::test]
    async fn test_sign_in_redirects_and_populates_dashboard() {
        let (state, provider) = mock_state(test_config());
        provider.seed_confirmed_user("alice", "Secret123!").await;
        let app = create_app(state.clone());

        let response = app
            .clone()
            .oneshot(form_post("/login", "username=alice&password=Secret123%21"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");

        // The event bridge picks up the signed-in event.
        wait_for_auth(&state, true).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Welcome, alice!"));
        assert!(html.contains("User ID:"));
    }

    #[tokio::test]
    async fn test_sign_in_rejection_renders_message() {
        let (state, provider) = mock_state(test_config());
        provider.seed_confirmed_user("alice", "Secret123!").await;
        let app = create_app(state);

        let response = app
            .oneshot(form_post("/login", "username=alice&password=wrong"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Incorrect username or password."));
    }

    #[tokio::test]
    async fn test_sign_in_with_valid_return_to() {
        let (state, provider) = mock_state(test_config());
        provider.seed_confirmed_user("alice", "Secret123!").await;
        let app = create_app(state);

        let response = app
            .oneshot(form_post(
                "/login",
                "username=alice&password=Secret123%21&return_to=%2Fdashboard",
            ))
            .await
            .unwrap();
        assert_eq!(location(&response), "/dashboard");
    }

    #[tokio::test]
    async fn test_sign_in_rejects_absolute_return_to() {
        let (state, provider) = mock_state(test_config());
        provider.seed_confirmed_user("alice", "Secret123!").await;
        let app = create_app(state);

        let response = app
            .oneshot(form_post(
                "/login",
                "username=alice&password=Secret123%21&return_to=https%3A%2F%2Fevil.com",
            ))
            .await
            .unwrap();
        // Falls back to the default destination.
        assert_eq!(location(&response), "/dashboard");
    }

    #[tokio::test]
    async fn test_sign_up_flow_reaches_confirmation_then_dashboard() {
        let (state, _provider) = mock_state(test_config());
        let app = create_app(state.clone());

        // Initial submission: the pool wants a confirmation code.
        let response = app
            .clone()
            .oneshot(form_post("/signup", "email=a%40b.com&password=Secret123%21"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("confirmation code has been sent to a@b.com"));

        // Wrong code: structured rejection, still on the confirmation form.
        let response = app
            .clone()
            .oneshot(form_post("/signup/confirm", "email=a%40b.com&code=999999"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Invalid verification code"));

        // Correct code: confirmation completes, auto sign-in runs, and the
        // user lands on the dashboard.
        let response = app
            .clone()
            .oneshot(form_post("/signup/confirm", "email=a%40b.com&code=123456"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");

        wait_for_auth(&state, true).await;
        assert_eq!(state.store.snapshot().user.unwrap().username, "a@b.com");
    }

    #[tokio::test]
    async fn test_failed_auto_sign_in_routes_to_login() {
        let (state, provider) = mock_state(test_config());
        let app = create_app(state);

        let response = app
            .clone()
            .oneshot(form_post("/signup", "email=a%40b.com&password=Secret123%21"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        provider.fail_auto_sign_in();

        let response = app
            .clone()
            .oneshot(form_post("/signup/confirm", "email=a%40b.com&code=123456"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");

        // The redirect carries a flash message the login page renders once.
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("flash cookie")
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/login")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Account confirmed. Please sign in."));
    }

    #[tokio::test]
    async fn test_sign_out_redirects_home_and_clears_state() {
        let (state, provider) = mock_state(test_config());
        provider.seed_confirmed_user("alice", "Secret123!").await;
        let app = create_app(state.clone());

        app.clone()
            .oneshot(form_post("/login", "username=alice&password=Secret123%21"))
            .await
            .unwrap();
        wait_for_auth(&state, true).await;

        let response = app
            .clone()
            .oneshot(form_post("/signout", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        wait_for_auth(&state, false).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    async fn spawn_gateway(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_gateway_error_is_rendered_verbatim() {
        let gateway = spawn_gateway(Router::new().route(
            "/",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    axum::Json(serde_json::json!({"message": "expired token"})),
                )
            }),
        ))
        .await;

        let mut config = test_config();
        config.api_gateway_url = Some(gateway);
        let (state, provider) = mock_state(config);
        provider.seed_confirmed_user("alice", "Secret123!").await;
        let app = create_app(state.clone());

        app.clone()
            .oneshot(form_post("/login", "username=alice&password=Secret123%21"))
            .await
            .unwrap();
        wait_for_auth(&state, true).await;

        let response = app
            .oneshot(form_post("/dashboard/fetch", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("API request failed with status 401: expired token"));
    }

    #[tokio::test]
    async fn test_gateway_data_is_rendered() {
        let gateway = spawn_gateway(Router::new().route(
            "/",
            get(|| async { axum::Json(serde_json::json!([{"id": 1, "name": "first"}])) }),
        ))
        .await;

        let mut config = test_config();
        config.api_gateway_url = Some(gateway);
        let (state, provider) = mock_state(config);
        provider.seed_confirmed_user("alice", "Secret123!").await;
        let app = create_app(state.clone());

        app.clone()
            .oneshot(form_post("/login", "username=alice&password=Secret123%21"))
            .await
            .unwrap();
        wait_for_auth(&state, true).await;

        let response = app
            .oneshot(form_post("/dashboard/fetch", ""))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Data Received:"));
        assert!(html.contains("first"));
    }
}
