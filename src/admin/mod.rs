//! Admin HTTP API.
//!
//! - `endpoints`: register, deregister and list registry contents
//! - `health`: liveness and readiness probes
//! - `status`: reconciliation and per-node discovery state
//! - `state`: shared handler state

mod endpoints;
mod health;
mod state;
mod status;

pub use endpoints::{
    deregister, deregister_endpoint, list_endpoints, register, register_endpoint,
    EndpointQuery, EndpointsResponse,
};
pub use health::{health_check, readiness_check};
pub use state::AdminState;
pub use status::{get_status, StatusResponse};

use crate::core::error::{BeaconError, BeaconResult};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Create the admin router with all endpoints.
pub fn create_router(state: AdminState) -> Router {
    Router::new()
        // Registry
        .route("/edsservice", get(list_endpoints))
        .route(
            "/edsservice/register",
            get(register_endpoint).post(register_endpoint),
        )
        .route(
            "/edsservice/deregister",
            get(deregister_endpoint).post(deregister_endpoint),
        )
        // Health checks
        .route("/healthz", get(health_check))
        .route("/readyz", get(readiness_check))
        // Observability
        .route("/status", get(get_status))
        .with_state(state)
}

/// Bound admin listener.
pub struct AdminServer {
    listener: TcpListener,
    router: Router,
    shutdown_rx: watch::Receiver<bool>,
}

impl AdminServer {
    /// Bind the listener. Fails fast if the address is taken.
    pub async fn bind(
        addr: SocketAddr,
        state: AdminState,
        shutdown_rx: watch::Receiver<bool>,
    ) -> BeaconResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| BeaconError::Internal {
                message: format!("failed to bind admin listener on {}: {}", addr, e),
            })?;
        Ok(Self {
            listener,
            router: create_router(state),
            shutdown_rx,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> BeaconResult<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| BeaconError::Internal {
                message: format!("admin listener address unavailable: {}", e),
            })
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(self) -> BeaconResult<()> {
        let mut shutdown_rx = self.shutdown_rx;
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "admin server listening");
        }

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow() {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                tracing::info!("admin server shutting down");
            })
            .await
            .map_err(|e| BeaconError::Internal {
                message: format!("admin server error: {}", e),
            })
    }
}
