//! Endpoint registration endpoints.
//!
//! `register` and `deregister` are the admin contract over the registry; the
//! HTTP handlers wrap them with the plain-text responses clients script against.

use super::state::AdminState;
use crate::control::address::EndpointAddress;
use crate::control::registry::{Deregistration, EndpointRegistry, Registration};
use crate::core::error::{AdminErrorMapping, BeaconError, BeaconResult};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

/// Parse and register an address.
pub fn register(registry: &EndpointRegistry, raw: &str) -> BeaconResult<Registration> {
    let addr = EndpointAddress::parse(raw)?;
    Ok(registry.add(addr))
}

/// Parse and deregister an address.
pub fn deregister(registry: &EndpointRegistry, raw: &str) -> BeaconResult<Deregistration> {
    let addr = EndpointAddress::parse(raw)?;
    Ok(registry.remove(&addr))
}

/// Query string for register and deregister.
#[derive(Debug, Default, Deserialize)]
pub struct EndpointQuery {
    pub endpoint: Option<String>,
}

/// Response for GET /edsservice
#[derive(Debug, Serialize)]
pub struct EndpointsResponse {
    pub service_name: String,
    pub endpoints: Vec<EndpointAddress>,
}

/// GET|POST /edsservice/register?endpoint=host:port
#[tracing::instrument(skip(state))]
pub async fn register_endpoint(
    State(state): State<AdminState>,
    Query(query): Query<EndpointQuery>,
) -> (StatusCode, String) {
    let raw = match required_endpoint(query) {
        Ok(raw) => raw,
        Err(resp) => return resp,
    };
    match register(&state.registry, &raw) {
        Ok(Registration::Added) => {
            tracing::info!(endpoint = %raw, "endpoint registered");
            (StatusCode::OK, format!("{} ok", raw))
        }
        Ok(Registration::AlreadyPresent) => {
            (StatusCode::OK, format!("{} already registered", raw))
        }
        Err(e) => error_response(e),
    }
}

/// GET|POST /edsservice/deregister?endpoint=host:port
#[tracing::instrument(skip(state))]
pub async fn deregister_endpoint(
    State(state): State<AdminState>,
    Query(query): Query<EndpointQuery>,
) -> (StatusCode, String) {
    let raw = match required_endpoint(query) {
        Ok(raw) => raw,
        Err(resp) => return resp,
    };
    match deregister(&state.registry, &raw) {
        Ok(Deregistration::Removed) => {
            tracing::info!(endpoint = %raw, "endpoint deregistered");
            (StatusCode::OK, format!("{} ok", raw))
        }
        Ok(Deregistration::NotPresent) => (StatusCode::OK, format!("{} not registered", raw)),
        Err(e) => error_response(e),
    }
}

/// GET /edsservice - current registry contents in insertion order.
pub async fn list_endpoints(State(state): State<AdminState>) -> Json<EndpointsResponse> {
    Json(EndpointsResponse {
        service_name: state.service_name().to_string(),
        endpoints: state.registry.snapshot(),
    })
}

#[allow(clippy::result_large_err)]
fn required_endpoint(query: EndpointQuery) -> Result<String, (StatusCode, String)> {
    match query.endpoint.map(|e| e.trim().to_string()) {
        Some(raw) if !raw.is_empty() => Ok(raw),
        _ => Err((
            StatusCode::BAD_REQUEST,
            "missing endpoint parameter".to_string(),
        )),
    }
}

fn error_response(e: BeaconError) -> (StatusCode, String) {
    let status = StatusCode::from_u16(AdminErrorMapping::to_http_status(&e))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    tracing::debug!(error = %e, %status, "admin request rejected");
    (status, e.to_string())
}
