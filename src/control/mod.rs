//! Registry-to-snapshot synchronization engine.
//!
//! - [`address`] - `host:port` parsing into validated endpoint addresses
//! - [`registry`] - Insertion-ordered, mutex-guarded endpoint set
//! - [`snapshot`] - Versions, immutable snapshots and the snapshot builder
//! - [`gate`] - One-shot readiness gate opened by the first discovery request
//! - [`store`] - Contract to the discovery delivery layer
//! - [`reconcile`] - Periodic loop publishing snapshots per client identity
//!
//! # Consistency
//!
//! Registry mutations that return before a tick copies the registry are
//! visible in that tick's snapshot. Mutations racing with a tick show up in
//! a later tick. Every tick re-derives full state, so a failed publish heals
//! on the next one.

pub mod address;
pub mod gate;
pub mod reconcile;
pub mod registry;
pub mod snapshot;
pub mod store;

pub use address::EndpointAddress;
pub use gate::ReadinessGate;
pub use reconcile::{LoopState, ReconcileConfig, Reconciler, TickOutcome};
pub use registry::{Deregistration, EndpointRegistry, Registration};
pub use snapshot::{Snapshot, SnapshotBuilder, SnapshotVersion, VersionCounter};
pub use store::{ClientIdentity, SnapshotStore};
