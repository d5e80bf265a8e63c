//! ID-token claims parsing.
//!
//! The pool issues JWTs; the client reads their claims to answer "who is
//! the current user" without a network round trip. Signature verification
//! is the gateway's responsibility - tokens arrive here directly from the
//! pool endpoint over TLS.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use poolgate_core::auth::AuthError;

/// Claims poolgate reads from a pool-issued ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    /// Pool-issued unique user identifier.
    pub sub: String,
    /// Sign-in name. Absent on tokens from pools that alias usernames.
    #[serde(rename = "cognito:username")]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry as seconds since the epoch.
    pub exp: i64,
}

impl IdTokenClaims {
    /// Best display name available: username, then email, then subject.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.sub)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Parse the claims of an ID token without verifying its signature.
pub fn parse_id_token(token: &str) -> Result<IdTokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = Default::default();

    let data =
        jsonwebtoken::decode::<IdTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn mint(claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    #[test]
    fn parses_subject_and_username() {
        let token = mint(json!({
            "sub": "user-1",
            "cognito:username": "alice",
            "email": "alice@example.com",
            "exp": 4_102_444_800_i64,
        }));

        let claims = parse_id_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.display_name(), "alice");
    }

    #[test]
    fn falls_back_to_email_then_subject_for_display_name() {
        let token = mint(json!({
            "sub": "user-2",
            "email": "bob@example.com",
            "exp": 4_102_444_800_i64,
        }));
        assert_eq!(parse_id_token(&token).unwrap().display_name(), "bob@example.com");

        let token = mint(json!({ "sub": "user-3", "exp": 4_102_444_800_i64 }));
        assert_eq!(parse_id_token(&token).unwrap().display_name(), "user-3");
    }

    #[test]
    fn expired_claims_still_parse() {
        // Expiry handling belongs to the caller; parsing must not fail.
        let token = mint(json!({ "sub": "user-4", "exp": 1_000_000_000_i64 }));
        let claims = parse_id_token(&token).unwrap();
        assert!(claims.expires_at() < Utc::now());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_id_token("not-a-jwt").is_err());
        assert!(parse_id_token("a.b.c").is_err());
    }

    #[test]
    fn token_missing_subject_is_rejected() {
        let token = mint(json!({ "exp": 4_102_444_800_i64 }));
        assert!(parse_id_token(&token).is_err());
    }
}
