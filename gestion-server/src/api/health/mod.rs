//! Liveness check (public)

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    /// AFIP credentials loaded
    afip: bool,
    /// Gemini key configured
    gemini: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "gestion-server",
        version: env!("CARGO_PKG_VERSION"),
        afip: state.afip.is_some(),
        gemini: state.gemini.is_some(),
    })
}
