//! Identity client for poolgate.
//!
//! This crate provides:
//! - The identity-pool protocol client (`CognitoProvider`)
//! - The auth event hub and the event-synchronized state store
//! - The at-most-once bootstrap (`AuthClient`)
//! - A mock identity-pool server for development and tests (feature `mock`)

mod client;
mod config;
mod error;
mod hub;
mod providers;
mod store;
mod token;

pub use client::AuthClient;
pub use config::AuthConfig;
pub use error::AuthError;
pub use hub::{AuthHub, HubSubscription, SubscriptionMessage};
pub use providers::CognitoProvider;
#[cfg(feature = "mock")]
pub use providers::MockProvider;
pub use store::AuthStore;
pub use token::{parse_id_token, IdTokenClaims};

#[cfg(feature = "mock")]
pub mod mock_idp;
