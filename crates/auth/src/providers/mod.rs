//! Identity-pool provider implementations.
//!
//! This module contains implementations of `IdentityProviderClient` for:
//! - The managed user-pool HTTP protocol (`CognitoProvider`)
//! - An in-memory fake for unit tests (`MockProvider`, feature `mock`)

mod cognito;
#[cfg(feature = "mock")]
mod mock;

pub use cognito::CognitoProvider;
#[cfg(feature = "mock")]
pub use mock::MockProvider;
