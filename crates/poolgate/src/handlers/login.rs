//! Sign-in and sign-out actions.
//!
//! Actions forward to the identity provider and rely on the event bridge
//! to propagate the new state; they never write the auth store directly.
//! Rejections render the form again with a human-readable message.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use poolgate_core::auth::validate_return_to;

use crate::handlers::pages::{HtmlTemplate, LoginTemplate, NavContext};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignInForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub return_to: Option<String>,
}

/// Handler for POST /login.
pub async fn sign_in(State(state): State<AppState>, Form(form): Form<SignInForm>) -> Response {
    let destination = form
        .return_to
        .as_deref()
        .and_then(validate_return_to)
        .unwrap_or("/dashboard")
        .to_string();

    let render_error = |state: &AppState, form: &SignInForm, error: String| {
        let nav = NavContext::from_snapshot(&state.store.snapshot());
        let mut template = LoginTemplate::empty(nav);
        template.username = form.username.clone();
        template.error = error;
        HtmlTemplate(template).into_response()
    };

    let provider = match state.auth.provider() {
        Ok(provider) => provider,
        Err(e) => return render_error(&state, &form, e.to_string()),
    };

    match provider.sign_in(&form.username, &form.password).await {
        Ok(outcome) if outcome.is_signed_in => {
            // The event bridge refreshes the store; this handler only
            // navigates.
            Redirect::to(&destination).into_response()
        }
        Ok(outcome) => {
            tracing::debug!(next_step = %outcome.next_step, "sign-in needs another step");
            render_error(
                &state,
                &form,
                format!("Sign in requires additional steps: {}", outcome.next_step),
            )
        }
        Err(e) => {
            tracing::debug!(error = %e, "sign-in rejected");
            render_error(&state, &form, e.to_string())
        }
    }
}

/// Handler for POST /signout.
///
/// The signed-out event clears the auth store; the redirect to the home
/// page is kept as well, matching the navbar behavior.
pub async fn sign_out(State(state): State<AppState>) -> Response {
    match state.auth.provider() {
        Ok(provider) => {
            if let Err(e) = provider.sign_out().await {
                tracing::error!(error = %e, "error signing out");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "error signing out");
        }
    }

    Redirect::to("/").into_response()
}
