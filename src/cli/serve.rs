use std::net::SocketAddr;

use crate::{api::AppState, config::Settings, error, server, success};

pub async fn serve(addr: Option<SocketAddr>) {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };
    let addr = addr.unwrap_or(settings.server_addr);

    let state = match AppState::from_settings(&settings).await {
        Ok(state) => state,
        Err(e) => error!("Cannot start service. Err: {}", e),
    };

    success!("Serving the API on http://{}", addr);
    if let Err(e) = server::start_api_server(state, addr).await {
        error!("Server stopped. Err: {}", e);
    }
}
