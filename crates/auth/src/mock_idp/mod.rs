//! Mock identity pool for development and testing.
//!
//! Speaks the same wire protocol as the managed pool, so `CognitoProvider`
//! runs against it unchanged in integration tests and local development.

mod server;

pub use server::{router, MockIdpServer, DEV_CONFIRMATION_CODE};
