//! Envoy discovery delivery layer.
//!
//! - [`proto`] - Hand-written wire types for the EDS subset of the Envoy v3 API
//! - [`cache`] - Per-node snapshot cache backing the reconciliation loop
//! - [`callbacks`] - Stream and fetch counters plus the first-request hook
//! - [`server`] - `EndpointDiscoveryService` over tonic

pub mod cache;
pub mod callbacks;
pub mod proto;
pub mod server;

pub use cache::{NodeStatus, SnapshotCache};
pub use callbacks::{CallbackCounters, DiscoveryCallbacks};
pub use server::{DiscoveryState, EdsServer, EdsService, EndpointDiscoveryServer};
