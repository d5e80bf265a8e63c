//! Page templates and the handlers for the static-ish pages.

use askama::Template;
use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use poolgate_core::auth::{validate_return_to, AuthSnapshot};

use crate::handlers::flash;
use crate::state::AppState;

/// Template wrapper that converts askama templates into HTML responses.
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {err}"),
            )
                .into_response(),
        }
    }
}

/// Navbar state shared by every page template.
pub struct NavContext {
    pub loading: bool,
    pub signed_in: bool,
    pub username: String,
}

impl NavContext {
    pub fn from_snapshot(snapshot: &AuthSnapshot) -> Self {
        Self {
            loading: snapshot.loading,
            signed_in: snapshot.is_authenticated(),
            username: snapshot
                .user
                .as_ref()
                .map(|u| u.username.clone())
                .unwrap_or_default(),
        }
    }
}

/// Home page template.
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavContext,
}

/// Sign-in page template.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: NavContext,
    pub username: String,
    pub error: String,
    pub flash_kind: String,
    pub flash_message: String,
    pub return_to: String,
}

impl LoginTemplate {
    pub fn empty(nav: NavContext) -> Self {
        Self {
            nav,
            username: String::new(),
            error: String::new(),
            flash_kind: String::new(),
            flash_message: String::new(),
            return_to: String::new(),
        }
    }
}

/// Sign-up page template (initial submission state).
#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub nav: NavContext,
    pub email: String,
    pub error: String,
}

/// Confirmation-code template (second state of the sign-up flow).
#[derive(Template)]
#[template(path = "confirm.html")]
pub struct ConfirmTemplate {
    pub nav: NavContext,
    pub email: String,
    pub error: String,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub nav: NavContext,
    pub username: String,
    pub user_id: String,
    pub api_data: String,
    pub api_error: String,
}

/// Handler for the home page (GET /).
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let nav = NavContext::from_snapshot(&state.store.snapshot());
    HtmlTemplate(HomeTemplate { nav })
}

#[derive(Deserialize, Default)]
pub struct LoginQuery {
    pub return_to: Option<String>,
}

/// Handler for GET /login.
///
/// Renders the sign-in form; surfaces (and clears) any pending flash
/// message left by a redirect.
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> Response {
    let nav = NavContext::from_snapshot(&state.store.snapshot());

    let mut template = LoginTemplate::empty(nav);
    template.return_to = query
        .return_to
        .as_deref()
        .and_then(validate_return_to)
        .unwrap_or_default()
        .to_string();

    match flash::read_flash(&jar) {
        Some(message) => {
            template.flash_kind = message.kind;
            template.flash_message = message.message;
            (
                [(SET_COOKIE, flash::clear_cookie_header())],
                HtmlTemplate(template),
            )
                .into_response()
        }
        None => HtmlTemplate(template).into_response(),
    }
}

/// Handler for GET /signup.
pub async fn signup_page(State(state): State<AppState>) -> impl IntoResponse {
    let nav = NavContext::from_snapshot(&state.store.snapshot());
    HtmlTemplate(SignupTemplate {
        nav,
        email: String::new(),
        error: String::new(),
    })
}
