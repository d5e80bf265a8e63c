use chrono::{DateTime, Utc};

use super::TokenSet;

/// Check if a token set has expired.
pub fn is_token_expired(tokens: &TokenSet, now: DateTime<Utc>) -> bool {
    tokens.expires_at <= now
}

/// Derive a display name from an email address.
pub fn email_to_username(email: &str) -> String {
    match email.split('@').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "User".to_string(),
    }
}
