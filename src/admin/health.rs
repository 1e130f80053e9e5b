//! Liveness and readiness probes.

use super::state::AdminState;
use axum::{extract::State, http::StatusCode};

/// Liveness probe. The process answering is enough.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe. Ready once a discovery client has made its first request.
pub async fn readiness_check(State(state): State<AdminState>) -> Result<&'static str, StatusCode> {
    if state.gate.is_signaled() {
        Ok("READY")
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
