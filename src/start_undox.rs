//! Startup helpers for the undox server.

use std::process::ExitCode;
use std::sync::Arc;

use crate::proxy::ProxyConfig;
use crate::server::{self, AppState};
use crate::wallet::WalletConfig;

/// Environment variable overriding the listening port.
pub const PORT_ENV: &str = "UNDOX_PORT";

/// Install the `tracing` subscriber used by both binaries.
///
/// Honors `RUST_LOG`, with `info` as the default level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

/// Run the server (used by the `undox-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();
    tracing::info!("Starting undox server v{}", env!("CARGO_PKG_VERSION"));

    let state = match initialize() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    let port = get_port();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server_with_shutdown(state, port, shutdown_signal())) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("undox server stopped");
    ExitCode::SUCCESS
}

/// Initialize application state from the environment without starting the server.
///
/// # Errors
/// Returns an error if state creation fails.
pub fn initialize() -> Result<Arc<AppState>, Box<dyn std::error::Error + Send + Sync>> {
    let proxy = ProxyConfig::from_env();
    let wallet = WalletConfig::from_env();
    tracing::info!(
        upstream = %proxy.upstream_url,
        model = %proxy.model,
        server_key = proxy.has_server_credential(),
        "Upstream model endpoint"
    );
    tracing::info!(near = %wallet.near_rpc_url, eth = %wallet.eth_rpc_url, "Chain RPC endpoints");

    AppState::new(&proxy, &wallet).map_err(|e| format!("Failed to create state: {e}").into())
}

/// Get configured server port.
#[must_use]
pub fn get_port() -> u16 {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
