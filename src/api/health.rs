use axum::{extract::State, response::Json};
use serde_json::{Value, json};
use tracing::warn;

use crate::api::AppState;

/// Liveness plus a database round trip.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "ok",
        Err(err) => {
            warn!(error = %err, "database health check failed");
            "unavailable"
        }
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database
    }))
}
