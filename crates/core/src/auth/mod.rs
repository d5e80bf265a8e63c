mod error;
mod functions;
mod traits;
mod types;
mod validation;

pub use error::AuthError;
pub use functions::{email_to_username, is_token_expired};
pub use traits::{IdentityProviderClient, Result};
pub use types::{
    AuthEvent, AuthSnapshot, AuthUser, SignInOutcome, SignInStep, SignUpOutcome, SignUpRequest,
    SignUpStep, TokenSet, UserId,
};
pub use validation::{validate_confirmation_code, validate_email, validate_return_to};
