use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use crate::{
    api::{self, AppState},
    error::{AppError, Result},
};

/// Binds `addr` and serves the API until the process receives Ctrl-C.
pub async fn start_api_server(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = api::router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Configuration(format!("cannot bind {addr}: {e}")))?;
    let local = listener
        .local_addr()
        .map_err(|e| AppError::Configuration(format!("cannot read bound address: {e}")))?;
    info!(address = %local, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Configuration(format!("server error: {e}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
