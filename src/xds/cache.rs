//! Per-node snapshot cache.
//!
//! The cache is the [`SnapshotStore`] the reconciliation loop publishes into
//! and the source the discovery server answers from. A node becomes known the
//! first time it sends a request; from then on every tick publishes to it.

use crate::control::snapshot::{Snapshot, SnapshotVersion};
use crate::control::store::{ClientIdentity, SnapshotStore};
use crate::core::error::{BeaconError, BeaconResult};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;

/// Request bookkeeping for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    /// Node id.
    pub node_id: ClientIdentity,
    /// First request, in milliseconds since the Unix epoch.
    pub first_seen_ms: u64,
    /// Most recent request, in milliseconds since the Unix epoch.
    pub last_request_ms: u64,
    /// Requests observed across all streams and fetches.
    pub request_count: u64,
    /// Version of the snapshot currently held for the node.
    pub snapshot_version: Option<SnapshotVersion>,
}

#[derive(Debug, Default)]
struct CacheInner {
    snapshots: HashMap<ClientIdentity, Snapshot>,
    nodes: HashMap<ClientIdentity, NodeStatus>,
}

/// Snapshot cache keyed by node id.
#[derive(Debug)]
pub struct SnapshotCache {
    inner: RwLock<CacheInner>,
    generation: watch::Sender<u64>,
}

impl SnapshotCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        let (generation, _rx) = watch::channel(0);
        Self {
            inner: RwLock::new(CacheInner::default()),
            generation,
        }
    }

    /// Record a request from a node, making it a known identity.
    pub fn record_request(&self, identity: &ClientIdentity) {
        let now = unix_millis();
        let mut inner = self.inner.write();
        let snapshot_version = inner.snapshots.get(identity).map(Snapshot::version);
        let status = inner
            .nodes
            .entry(identity.clone())
            .or_insert_with(|| {
                tracing::info!(node_id = %identity, "new discovery node");
                NodeStatus {
                    node_id: identity.clone(),
                    first_seen_ms: now,
                    last_request_ms: now,
                    request_count: 0,
                    snapshot_version,
                }
            });
        status.last_request_ms = now;
        status.request_count += 1;
    }

    /// Snapshot currently held for a node.
    pub fn snapshot(&self, identity: &ClientIdentity) -> Option<Snapshot> {
        self.inner.read().snapshots.get(identity).cloned()
    }

    /// Status of every known node, ordered by node id.
    pub fn node_statuses(&self) -> Vec<NodeStatus> {
        let inner = self.inner.read();
        let mut statuses: Vec<NodeStatus> = inner.nodes.values().cloned().collect();
        statuses.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        statuses
    }

    /// Drop a node's snapshot. The node stays known.
    pub fn clear_snapshot(&self, identity: &ClientIdentity) {
        let mut inner = self.inner.write();
        if inner.snapshots.remove(identity).is_some() {
            if let Some(status) = inner.nodes.get_mut(identity) {
                status.snapshot_version = None;
            }
            drop(inner);
            self.generation.send_modify(|g| *g += 1);
        }
    }

    /// Subscribe to cache changes. The value is a generation counter bumped
    /// on every successful publish.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Current change generation.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for SnapshotCache {
    fn known_client_identities(&self) -> BeaconResult<Vec<ClientIdentity>> {
        let inner = self.inner.read();
        let mut identities: Vec<ClientIdentity> = inner.nodes.keys().cloned().collect();
        identities.sort();
        Ok(identities)
    }

    fn publish(&self, identity: &ClientIdentity, snapshot: Snapshot) -> BeaconResult<()> {
        let version = snapshot.version();
        {
            let mut inner = self.inner.write();
            if let Some(held) = inner.snapshots.get(identity) {
                if held.version() > version {
                    return Err(BeaconError::publish_failure(
                        identity.as_str(),
                        format!("version {} is older than held version {}", version, held.version()),
                    ));
                }
            }
            inner.snapshots.insert(identity.clone(), snapshot);
            if let Some(status) = inner.nodes.get_mut(identity) {
                status.snapshot_version = Some(version);
            }
        }
        self.generation.send_modify(|g| *g += 1);
        Ok(())
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
