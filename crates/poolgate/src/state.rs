//! Shared application state.
//!
//! `AppState` is injected into axum handlers via the `State` extractor. It
//! owns the single auth session of this process: the identity client handle
//! and the event-synchronized state store, plus the gateway client for
//! outbound authenticated requests.

use std::sync::Arc;

use poolgate_auth::{AuthClient, AuthStore};

use crate::config::Config;
use crate::gateway::GatewayClient;

/// Shared application state. Clone is required by axum - all inner fields
/// are Arc-wrapped or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthClient>,
    pub store: Arc<AuthStore>,
    pub gateway: GatewayClient,
}

impl AppState {
    /// Build the state and mount the auth store. Must be called within a
    /// tokio runtime (the store spawns its event bridge).
    pub fn new(config: Config, auth: Arc<AuthClient>) -> Self {
        let store = AuthStore::mount(auth.clone());
        Self {
            config: Arc::new(config),
            auth,
            store,
            gateway: GatewayClient::new(),
        }
    }
}
