//! Reconciliation loop.
//!
//! The loop turns registry contents into published snapshots:
//!
//! ```text
//! AwaitingReadiness ──gate opens──▶ Running ──shutdown──▶ Stopped
//!        │                                                   ▲
//!        └───────────────────shutdown────────────────────────┘
//! ```
//!
//! While running, every tick lists the known nodes, bumps the version once,
//! copies the registry and publishes one snapshot per node. Nothing a tick
//! encounters stops the loop; only the shutdown signal does.

use super::gate::ReadinessGate;
use super::registry::EndpointRegistry;
use super::snapshot::{SnapshotBuilder, SnapshotVersion, VersionCounter};
use super::store::SnapshotStore;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Shortest tick period; a zero interval is raised to this.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Reconciliation loop settings.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Logical service (Envoy cluster) name carried by every snapshot.
    pub service_name: String,

    /// Period between ticks.
    pub interval: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            service_name: "myservice".to_string(),
            interval: Duration::from_secs(60),
        }
    }
}

/// Loop lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// Waiting for the first discovery request.
    AwaitingReadiness,
    /// Ticking on the configured interval.
    Running,
    /// Shut down.
    Stopped,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// No known nodes; the version was not bumped.
    Skipped,
    /// A new version was built and offered to every known node.
    Published {
        version: SnapshotVersion,
        published: usize,
        failed: usize,
    },
}

/// Periodically publishes registry snapshots to a [`SnapshotStore`].
pub struct Reconciler {
    config: ReconcileConfig,
    registry: Arc<EndpointRegistry>,
    store: Arc<dyn SnapshotStore>,
    gate: ReadinessGate,
    versions: Arc<VersionCounter>,
    state: RwLock<LoopState>,
    last_tick: RwLock<Option<TickOutcome>>,
}

impl Reconciler {
    /// Create a loop over the given collaborators.
    pub fn new(
        mut config: ReconcileConfig,
        registry: Arc<EndpointRegistry>,
        store: Arc<dyn SnapshotStore>,
        gate: ReadinessGate,
        versions: Arc<VersionCounter>,
    ) -> Self {
        if config.interval.is_zero() {
            tracing::warn!(
                interval = ?MIN_INTERVAL,
                "zero reconcile interval requested; using minimum"
            );
            config.interval = MIN_INTERVAL;
        }
        Self {
            config,
            registry,
            store,
            gate,
            versions,
            state: RwLock::new(LoopState::AwaitingReadiness),
            last_tick: RwLock::new(None),
        }
    }

    /// Get the loop configuration.
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        *self.state.read()
    }

    /// Outcome of the most recent tick, if any ran.
    pub fn last_tick(&self) -> Option<TickOutcome> {
        *self.last_tick.read()
    }

    /// The most recently issued snapshot version.
    pub fn current_version(&self) -> SnapshotVersion {
        self.versions.current()
    }

    /// Run one reconciliation pass.
    pub fn tick(&self) -> TickOutcome {
        let identities = match self.store.known_client_identities() {
            Ok(identities) => identities,
            Err(e) => {
                tracing::warn!(error = %e, "treating client identity list as empty for this tick");
                Vec::new()
            }
        };

        if identities.is_empty() {
            tracing::debug!("no known client identities; skipping publication");
            *self.last_tick.write() = Some(TickOutcome::Skipped);
            return TickOutcome::Skipped;
        }

        let version = self.versions.next();
        let endpoints = self.registry.snapshot();

        tracing::info!(
            service = %self.config.service_name,
            %version,
            endpoints = endpoints.len(),
            nodes = identities.len(),
            "creating snapshot"
        );

        let mut published = 0;
        let mut failed = 0;
        for identity in &identities {
            let snapshot = SnapshotBuilder::build(version, &self.config.service_name, &endpoints);
            match self.store.publish(identity, snapshot) {
                Ok(()) => {
                    published += 1;
                    tracing::debug!(node_id = %identity, %version, "snapshot published");
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(node_id = %identity, %version, error = %e, "snapshot publish failed");
                }
            }
        }

        let outcome = TickOutcome::Published {
            version,
            published,
            failed,
        };
        *self.last_tick.write() = Some(outcome);
        outcome
    }

    /// Wait for readiness, then tick on the configured interval until shutdown.
    ///
    /// The first tick runs as soon as the gate opens.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        *self.state.write() = LoopState::AwaitingReadiness;
        tracing::info!(
            service = %self.config.service_name,
            interval_ms = self.config.interval.as_millis() as u64,
            "reconciliation loop awaiting first discovery request"
        );

        tokio::select! {
            _ = self.gate.wait() => {}
            _ = wait_for_shutdown(&mut shutdown_rx) => {
                *self.state.write() = LoopState::Stopped;
                tracing::info!("reconciliation loop stopped before readiness");
                return;
            }
        }

        *self.state.write() = LoopState::Running;
        tracing::info!("reconciliation loop running");

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }
                _ = wait_for_shutdown(&mut shutdown_rx) => break,
            }
        }

        *self.state.write() = LoopState::Stopped;
        tracing::info!(version = %self.versions.current(), "reconciliation loop stopped");
    }
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}
