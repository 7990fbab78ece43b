use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::monitor::HealthPulse;

#[derive(Clone)]
struct HealthState {
    module: Arc<str>,
    pulse: Arc<HealthPulse>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    module: String,
}

/// The liveness endpoint every module serves under its path base.
///
/// Each probe also feeds the monitor's pulse: an inbound health check is
/// evidence that the host still routes to this module.
pub fn health_router(module_name: &str, pulse: Arc<HealthPulse>) -> Router {
    let state = HealthState {
        module: Arc::from(module_name),
        pulse,
    };
    Router::new()
        .route("/health", get(module_health))
        .with_state(state)
}

async fn module_health(State(state): State<HealthState>) -> impl IntoResponse {
    state.pulse.touch();
    Json(HealthResponse {
        status: "healthy",
        module: state.module.to_string(),
    })
}
