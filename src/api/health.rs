use crate::api::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Reports the configured collateral branches along with readiness.
pub async fn ready(State(state): State<AppState>) -> Json<Value> {
    let service = &state.service;
    let collaterals: Vec<&str> = service
        .catalog()
        .iter()
        .map(|token| token.symbol.as_str())
        .collect();

    Json(json!({
        "status": "ready",
        "collaterals": collaterals,
        "refreshIntervalMs": service.refresh_interval().as_millis() as u64,
    }))
}
