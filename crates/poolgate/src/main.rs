mod app;
mod config;
mod gateway;
mod handlers;
mod state;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use listenfd::ListenFd;
use poolgate_auth::{AuthClient, AuthConfig};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{app::create_app, config::Config, state::AppState};

/// Poolgate - sign in to your identity pool, talk to your API gateway
#[derive(Parser, Debug)]
#[command(name = "poolgate")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "poolgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    #[cfg(feature = "auth-mock")]
    spawn_mock_idp();

    // Bootstrap the identity client before serving the first request.
    let mut config = Config::from_env();
    let auth = Arc::new(AuthClient::new());
    bootstrap(&mut config, &auth).await;

    let state = AppState::new(config, auth);

    // Build the application router
    let app = create_app(state.clone());

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Configure the identity client, either from a runtime-configuration
/// endpoint or from the environment.
///
/// A failed bootstrap is logged and leaves the client unconfigured: the
/// server still starts, and identity operations surface the error when
/// attempted.
async fn bootstrap(config: &mut Config, auth: &Arc<AuthClient>) {
    if let Some(url) = config.runtime_config_url.clone() {
        match auth.configure_from_url(&url).await {
            Ok(Some(record)) => config.absorb_runtime(&record),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "runtime bootstrap failed; identity operations will be unavailable"
                );
            }
        }
        return;
    }

    match config.runtime_config() {
        Ok(record) => {
            let mut auth_config = AuthConfig::from_runtime(&record);
            if let Some(endpoint) = &config.idp_endpoint {
                match url::Url::parse(endpoint) {
                    Ok(endpoint) => auth_config = auth_config.with_endpoint(endpoint),
                    Err(e) => {
                        tracing::error!(error = %e, "invalid IDP_ENDPOINT; using the regional endpoint");
                    }
                }
            }
            if let Err(e) = auth.configure(auth_config).await {
                tracing::error!(error = %e, "identity client configuration failed");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "identity client not configured; sign-in will be unavailable");
        }
    }
}

/// Run the in-process mock identity pool when MOCK_IDP_PORT is set.
#[cfg(feature = "auth-mock")]
fn spawn_mock_idp() {
    use poolgate_auth::mock_idp::MockIdpServer;

    let Ok(port) = std::env::var("MOCK_IDP_PORT") else {
        return;
    };
    match port.parse::<u16>() {
        Ok(port) => {
            tokio::spawn(async move {
                if let Err(e) = MockIdpServer::new(port).run().await {
                    tracing::error!(error = %e, "mock identity pool exited");
                }
            });
        }
        Err(e) => tracing::error!(error = %e, "invalid MOCK_IDP_PORT"),
    }
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM) and tear the auth store
/// down so its hub subscription is released exactly once.
async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    state.store.close();
}
