//! Two-state sign-up flow.
//!
//! `awaiting-initial-submission` -> (pool reports confirmation required) ->
//! `awaiting-confirmation-code` -> done. The transition happens only when
//! the provider explicitly asks for confirmation. After a completed
//! confirmation the handler attempts the auto sign-in the sign-up opted
//! into; if that fails the user is routed to the login page instead of
//! being left stuck.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use poolgate_core::auth::{
    validate_confirmation_code, validate_email, SignUpRequest, SignUpStep,
};

use crate::handlers::flash::{redirect_with_flash, FlashMessage};
use crate::handlers::pages::{ConfirmTemplate, HtmlTemplate, NavContext, SignupTemplate};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ConfirmForm {
    pub email: String,
    pub code: String,
}

fn signup_form(state: &AppState, email: String, error: String) -> Response {
    let nav = NavContext::from_snapshot(&state.store.snapshot());
    HtmlTemplate(SignupTemplate { nav, email, error }).into_response()
}

fn confirm_form(state: &AppState, email: String, error: String) -> Response {
    let nav = NavContext::from_snapshot(&state.store.snapshot());
    HtmlTemplate(ConfirmTemplate { nav, email, error }).into_response()
}

/// Handler for POST /signup (initial submission).
pub async fn sign_up(State(state): State<AppState>, Form(form): Form<SignUpForm>) -> Response {
    if !validate_email(&form.email) {
        return signup_form(
            &state,
            form.email,
            "Please enter a valid email address.".to_string(),
        );
    }

    let provider = match state.auth.provider() {
        Ok(provider) => provider,
        Err(e) => return signup_form(&state, form.email, e.to_string()),
    };

    let request = SignUpRequest {
        username: form.email.clone(),
        password: form.password,
        email: form.email.clone(),
        auto_sign_in: true,
    };

    match provider.sign_up(&request).await {
        Ok(outcome) => match outcome.next_step {
            // Switch to the confirmation-code state; no navigation.
            SignUpStep::ConfirmSignUp => confirm_form(&state, form.email, String::new()),
            SignUpStep::Done => match provider.auto_sign_in().await {
                Ok(_) => Redirect::to("/dashboard").into_response(),
                Err(e) => {
                    tracing::error!(error = %e, "auto sign-in failed");
                    redirect_with_flash(
                        "/login",
                        &FlashMessage::info("Account created. Please sign in."),
                    )
                }
            },
        },
        Err(e) => {
            tracing::debug!(error = %e, "sign-up rejected");
            signup_form(&state, form.email, e.to_string())
        }
    }
}

/// Handler for POST /signup/confirm (confirmation-code submission).
pub async fn confirm(State(state): State<AppState>, Form(form): Form<ConfirmForm>) -> Response {
    if !validate_confirmation_code(&form.code) {
        return confirm_form(
            &state,
            form.email,
            "The confirmation code is a 6-digit number.".to_string(),
        );
    }

    let provider = match state.auth.provider() {
        Ok(provider) => provider,
        Err(e) => return confirm_form(&state, form.email, e.to_string()),
    };

    match provider.confirm_sign_up(&form.email, &form.code).await {
        Ok(outcome) if outcome.is_complete() => match provider.auto_sign_in().await {
            // The event bridge picks up the signed-in event.
            Ok(_) => Redirect::to("/dashboard").into_response(),
            Err(e) => {
                tracing::error!(error = %e, "auto sign-in after confirmation failed");
                redirect_with_flash(
                    "/login",
                    &FlashMessage::info("Account confirmed. Please sign in."),
                )
            }
        },
        Ok(_) => confirm_form(
            &state,
            form.email,
            "Confirmation requires an additional step.".to_string(),
        ),
        Err(e) => {
            tracing::debug!(error = %e, "confirmation rejected");
            confirm_form(&state, form.email, e.to_string())
        }
    }
}
