//! Flash message utilities for server-to-client communication.
//!
//! Flash messages are short-lived messages stored in a cookie, rendered
//! once on the next page view and then cleared. Used for communicating
//! outcomes across redirects (e.g. "account confirmed, please sign in").

use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

/// Cookie name carrying the pending flash message.
pub const FLASH_COOKIE: &str = "flash_message";

/// Flash message structure stored in the cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashMessage {
    /// Message kind (e.g. "error", "success", "info").
    pub kind: String,
    /// The message content to display.
    pub message: String,
}

impl FlashMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: "error".to_string(),
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: "info".to_string(),
            message: message.into(),
        }
    }

    /// Serialize to JSON for cookie storage.
    fn to_cookie_value(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Build a Set-Cookie header value for the flash message.
    ///
    /// Max-Age 60 is a safety net so a message that is never rendered does
    /// not linger.
    pub fn to_set_cookie_header(&self) -> String {
        let encoded = urlencoding::encode(&self.to_cookie_value()).into_owned();
        format!("{FLASH_COOKIE}={encoded}; Path=/; SameSite=Lax; Max-Age=60")
    }
}

/// Create a redirect response carrying a flash message cookie.
pub fn redirect_with_flash(url: &str, flash: &FlashMessage) -> Response {
    ([(SET_COOKIE, flash.to_set_cookie_header())], Redirect::to(url)).into_response()
}

/// Read the pending flash message, if any.
pub fn read_flash(jar: &CookieJar) -> Option<FlashMessage> {
    let cookie = jar.get(FLASH_COOKIE)?;
    let decoded = urlencoding::decode(cookie.value()).ok()?;
    serde_json::from_str(&decoded).ok()
}

/// Set-Cookie header value that clears the flash cookie.
pub fn clear_cookie_header() -> String {
    format!("{FLASH_COOKIE}=; Path=/; Max-Age=0")
}
