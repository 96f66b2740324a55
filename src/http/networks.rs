use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::network::NetworkDescriptor;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub networks: usize,
    pub required_chain_id: u64,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        networks: state.registry.len(),
        required_chain_id: state.config.load().wallet.required_chain_id,
    })
}

/// `GET /networks`
pub async fn list_networks(State(state): State<AppState>) -> Json<Vec<NetworkDescriptor>> {
    Json(
        state
            .registry
            .list_supported_networks()
            .iter()
            .map(|network| network.as_ref().clone())
            .collect(),
    )
}
