//! Beacon - Envoy Endpoint Discovery Service control plane.
//!
//! Beacon keeps a mutable registry of `host:port` endpoints for one logical
//! service and periodically publishes it, as an immutable versioned snapshot,
//! to every Envoy node that has contacted the discovery server. Nothing is
//! published until the first discovery request arrives.
//!
//! # Architecture
//!
//! ```text
//!   admin HTTP (axum)                      Envoy nodes (EDS)
//!          │                                      │
//!          ▼                                      ▼
//!   EndpointRegistry                    EDS server (tonic) ──▶ DiscoveryCallbacks
//!          │                                      ▲                   │
//!          │ copy per tick                        │ serve             │ first request
//!          ▼                                      │                   ▼
//!   Reconciler ── SnapshotBuilder ──publish──▶ SnapshotCache     ReadinessGate
//!          ▲                                                          │
//!          └──────────────────────── opens ───────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::runtime`] - Component lifecycle
//! - [`core::error`] - Error types and protocol mapping
//!
//! ## Control
//! - [`control::address`] - Endpoint address parsing
//! - [`control::registry`] - Endpoint registry
//! - [`control::snapshot`] - Versions and snapshot building
//! - [`control::gate`] - Readiness gate
//! - [`control::store`] - Snapshot store contract
//! - [`control::reconcile`] - Reconciliation loop
//!
//! ## Discovery
//! - [`xds::proto`] - Envoy wire types
//! - [`xds::cache`] - Per-node snapshot cache
//! - [`xds::callbacks`] - Server callbacks
//! - [`xds::server`] - EDS gRPC server
//!
//! ## Admin
//! - [`admin`] - Registration and status HTTP API
//!
//! ## CLI
//! - [`cli::commands`] - CLI command implementations
//!
//! # Key Invariants
//!
//! - Versions are strictly increasing and shared by every node in a tick
//! - The registry never holds duplicates and keeps insertion order
//! - No snapshot is built before the first discovery request
//! - A failing tick never stops the loop

// Core infrastructure
pub mod core;

// Registry-to-snapshot engine
pub mod control;

// Envoy discovery delivery
pub mod xds;

// Admin HTTP API
pub mod admin;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, error, runtime};
pub use control::{
    EndpointAddress, EndpointRegistry, ReadinessGate, Reconciler, Snapshot, SnapshotBuilder,
    SnapshotStore, SnapshotVersion,
};
pub use xds::{DiscoveryCallbacks, SnapshotCache};
