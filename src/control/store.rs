//! Contract between the reconciliation loop and the discovery delivery layer.

use super::snapshot::Snapshot;
use crate::core::error::BeaconResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one connected discovery client (an Envoy node id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Wrap a node id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The node id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientIdentity {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ClientIdentity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Versioned resource cache keyed by client identity.
///
/// Implementations must be internally synchronized: the loop, the discovery
/// server and the admin API all hold the same store concurrently.
pub trait SnapshotStore: Send + Sync {
    /// Nodes that have completed at least one request cycle. May be empty.
    fn known_client_identities(&self) -> BeaconResult<Vec<ClientIdentity>>;

    /// Set the snapshot the node will be served next, replacing any prior one.
    fn publish(&self, identity: &ClientIdentity, snapshot: Snapshot) -> BeaconResult<()>;
}
