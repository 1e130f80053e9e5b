//! Runtime status endpoint.

use super::state::AdminState;
use crate::control::reconcile::{LoopState, TickOutcome};
use crate::control::snapshot::SnapshotVersion;
use crate::xds::cache::NodeStatus;
use crate::xds::callbacks::CallbackCounters;
use axum::{extract::State, Json};
use serde::Serialize;

/// Response for GET /status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub service_name: String,
    pub version: SnapshotVersion,
    pub ready: bool,
    pub loop_state: LoopState,
    pub last_tick: Option<TickOutcome>,
    pub endpoints: usize,
    pub nodes: Vec<NodeStatus>,
    pub callbacks: CallbackCounters,
}

/// GET /status - reconciliation and discovery state.
pub async fn get_status(State(state): State<AdminState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        service_name: state.service_name().to_string(),
        version: state.reconciler.current_version(),
        ready: state.gate.is_signaled(),
        loop_state: state.reconciler.state(),
        last_tick: state.reconciler.last_tick(),
        endpoints: state.registry.len(),
        nodes: state.cache.node_statuses(),
        callbacks: state.callbacks.counters(),
    })
}
