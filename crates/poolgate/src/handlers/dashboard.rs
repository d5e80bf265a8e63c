//! Dashboard page and the authenticated gateway fetch.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};

use poolgate_core::auth::AuthUser;

use crate::handlers::pages::{DashboardTemplate, HtmlTemplate, NavContext};
use crate::state::AppState;

/// Resolve the signed-in user, settling a pending initial load first.
async fn require_user(state: &AppState) -> Result<AuthUser, Response> {
    let snapshot = state.store.settled_snapshot().await;
    match snapshot.user {
        Some(user) => Ok(user),
        None => {
            tracing::debug!("user not authenticated, redirecting to login");
            Err(Redirect::to("/login?return_to=/dashboard").into_response())
        }
    }
}

fn dashboard_template(state: &AppState, user: &AuthUser) -> DashboardTemplate {
    DashboardTemplate {
        nav: NavContext::from_snapshot(&state.store.snapshot()),
        username: user.username.clone(),
        user_id: user.user_id.to_string(),
        api_data: String::new(),
        api_error: String::new(),
    }
}

/// Handler for GET /dashboard.
pub async fn dashboard(State(state): State<AppState>) -> Response {
    let user = match require_user(&state).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    HtmlTemplate(dashboard_template(&state, &user)).into_response()
}

/// Handler for POST /dashboard/fetch.
///
/// Performs the bearer-authenticated request to the API gateway and
/// renders the dashboard with the data or a page-level error message.
/// Failures are always recovered locally; retry is manual.
pub async fn fetch_api_data(State(state): State<AppState>) -> Response {
    let user = match require_user(&state).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let mut template = dashboard_template(&state, &user);

    let Some(base_url) = state.config.api_gateway_url.clone() else {
        template.api_error =
            "API Gateway URL is not configured in environment variables.".to_string();
        return HtmlTemplate(template).into_response();
    };

    let tokens = match state.auth.provider() {
        Ok(provider) => provider.auth_session().await.ok(),
        Err(_) => None,
    };
    let Some(tokens) = tokens else {
        template.api_error =
            "Could not retrieve ID token. User might not be fully authenticated.".to_string();
        return HtmlTemplate(template).into_response();
    };

    match state.gateway.fetch_data(&base_url, &tokens.id_token).await {
        Ok(data) => {
            template.api_data =
                serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string());
        }
        Err(e) => {
            tracing::error!(error = %e, "error fetching API data");
            template.api_error = e.to_string();
        }
    }

    HtmlTemplate(template).into_response()
}
