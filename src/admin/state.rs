//! Shared state passed to all admin handlers.

use crate::control::gate::ReadinessGate;
use crate::control::reconcile::Reconciler;
use crate::control::registry::EndpointRegistry;
use crate::xds::cache::SnapshotCache;
use crate::xds::callbacks::DiscoveryCallbacks;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<EndpointRegistry>,
    pub gate: ReadinessGate,
    pub cache: Arc<SnapshotCache>,
    pub callbacks: Arc<DiscoveryCallbacks>,
    pub reconciler: Arc<Reconciler>,
}

impl AdminState {
    /// Service name carried by published snapshots.
    pub fn service_name(&self) -> &str {
        &self.reconciler.config().service_name
    }
}
