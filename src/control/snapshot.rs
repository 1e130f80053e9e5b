//! Versioned endpoint snapshots.
//!
//! A [`Snapshot`] is the immutable "endpoint set for service X" value the
//! reconciliation loop publishes. Versions come from a process-wide
//! [`VersionCounter`] and are strictly increasing: one version per
//! publishing tick, shared by every node published in that tick.

use super::address::EndpointAddress;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A snapshot generation number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotVersion(u64);

impl SnapshotVersion {
    /// Create a version from its raw value.
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// The version before any tick has published.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the raw value.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Parse the `version_info` string a discovery client echoes back.
    pub fn from_version_info(version_info: &str) -> Option<Self> {
        version_info.parse::<u64>().ok().map(Self)
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SnapshotVersion {
    fn from(version: u64) -> Self {
        Self::new(version)
    }
}

/// Process-wide monotonic version source.
///
/// Owned by the runtime and injected into the reconciliation loop, so tests
/// can observe and drive versioning in isolation.
#[derive(Debug, Default)]
pub struct VersionCounter {
    current: AtomicU64,
}

impl VersionCounter {
    /// Create a counter that has not issued any version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next version. Never returns the same value twice.
    pub fn next(&self) -> SnapshotVersion {
        SnapshotVersion(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// The most recently issued version, or zero.
    pub fn current(&self) -> SnapshotVersion {
        SnapshotVersion(self.current.load(Ordering::Acquire))
    }
}

/// Immutable endpoint set for one service at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    version: SnapshotVersion,
    service_name: String,
    endpoints: Vec<EndpointAddress>,
}

impl Snapshot {
    /// Snapshot version.
    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    /// Logical service (Envoy cluster) name.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Endpoints in registry order.
    pub fn endpoints(&self) -> &[EndpointAddress] {
        &self.endpoints
    }

    /// Whether the snapshot carries no endpoints.
    ///
    /// An empty snapshot is valid and is still published.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Builds snapshots from registry contents.
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Build a snapshot. Pure: equal inputs give equal snapshots.
    pub fn build(
        version: SnapshotVersion,
        service_name: &str,
        endpoints: &[EndpointAddress],
    ) -> Snapshot {
        Snapshot {
            version,
            service_name: service_name.to_string(),
            endpoints: endpoints.to_vec(),
        }
    }
}
