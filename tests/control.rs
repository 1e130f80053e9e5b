//! Registry, snapshot and reconciliation tests.

mod common;

use beacon::control::reconcile::{LoopState, ReconcileConfig, Reconciler, TickOutcome};
use beacon::control::registry::{Deregistration, EndpointRegistry, Registration};
use beacon::control::snapshot::{SnapshotBuilder, SnapshotVersion, VersionCounter};
use beacon::control::store::{ClientIdentity, SnapshotStore};
use beacon::control::{EndpointAddress, ReadinessGate};
use beacon::core::error::{AddressParseReason, BeaconError};
use beacon::xds::SnapshotCache;
use common::{addr, RecordingStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn reconciler_with(
    store: Arc<dyn SnapshotStore>,
    registry: Arc<EndpointRegistry>,
    gate: ReadinessGate,
) -> Reconciler {
    Reconciler::new(
        ReconcileConfig::default(),
        registry,
        store,
        gate,
        Arc::new(VersionCounter::new()),
    )
}

// ============================================================================
// Registry tests
// ============================================================================

#[test]
fn registry_keeps_insertion_order_without_duplicates() {
    let registry = EndpointRegistry::new();
    assert_eq!(registry.add(addr("10.0.0.3:80")), Registration::Added);
    assert_eq!(registry.add(addr("10.0.0.1:80")), Registration::Added);
    assert_eq!(registry.add(addr("10.0.0.3:80")), Registration::AlreadyPresent);
    assert_eq!(registry.add(addr("10.0.0.2:80")), Registration::Added);
    assert_eq!(registry.remove(&addr("10.0.0.1:80")), Deregistration::Removed);
    assert_eq!(registry.remove(&addr("10.0.0.1:80")), Deregistration::NotPresent);

    let listed: Vec<String> = registry.snapshot().iter().map(|a| a.to_string()).collect();
    assert_eq!(listed, vec!["10.0.0.3:80", "10.0.0.2:80"]);
}

#[test]
fn malformed_address_leaves_registry_unchanged() {
    let registry = EndpointRegistry::with_endpoints([addr("10.0.0.1:9000")]);

    let err = EndpointAddress::parse("not-an-address").unwrap_err();
    assert!(matches!(
        err,
        BeaconError::AddressParse {
            reason: AddressParseReason::MissingPort,
            ..
        }
    ));
    assert_eq!(registry.len(), 1);
}

#[test]
fn snapshot_is_a_copy() {
    let registry = EndpointRegistry::new();
    registry.add(addr("10.0.0.1:9000"));
    let copy = registry.snapshot();
    registry.add(addr("10.0.0.2:9000"));
    assert_eq!(copy.len(), 1);
}

#[test]
fn concurrent_adds_never_duplicate() {
    let registry = Arc::new(EndpointRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for port in 0..50u16 {
                    registry.add(EndpointAddress::new("10.1.1.1", 9000 + port).unwrap());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(registry.len(), 50);
}

#[test]
fn concurrent_mutations_and_snapshots_stay_consistent() {
    let registry = Arc::new(EndpointRegistry::new());
    let handles: Vec<_> = (0..4u16)
        .map(|worker| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for i in 0..100u16 {
                    let port = 10_000 + worker * 1_000 + i;
                    registry.add(EndpointAddress::new("10.2.2.2", port).unwrap());
                    // Shared addresses contended by every worker.
                    registry.add(EndpointAddress::new("10.9.9.9", i % 10).unwrap());
                    if i % 2 == 0 {
                        registry.remove(&EndpointAddress::new("10.2.2.2", port).unwrap());
                    }

                    let snapshot = registry.snapshot();
                    let unique: HashSet<_> = snapshot.iter().collect();
                    assert_eq!(unique.len(), snapshot.len(), "duplicate in snapshot");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut expected: HashSet<EndpointAddress> = (0..4u16)
        .flat_map(|worker| {
            (0..100u16)
                .filter(|i| i % 2 == 1)
                .map(move |i| {
                    EndpointAddress::new("10.2.2.2", 10_000 + worker * 1_000 + i).unwrap()
                })
        })
        .collect();
    expected.extend((0..10u16).map(|port| EndpointAddress::new("10.9.9.9", port).unwrap()));

    let contents = registry.snapshot();
    assert_eq!(contents.len(), expected.len());
    assert_eq!(contents.into_iter().collect::<HashSet<_>>(), expected);
}

// ============================================================================
// Builder tests
// ============================================================================

#[test]
fn builder_is_pure() {
    let endpoints = vec![addr("10.0.0.1:9000"), addr("[2001:db8::1]:443")];
    let a = SnapshotBuilder::build(SnapshotVersion::new(7), "myservice", &endpoints);
    let b = SnapshotBuilder::build(SnapshotVersion::new(7), "myservice", &endpoints);
    assert_eq!(a, b);
    assert_eq!(a.endpoints(), endpoints.as_slice());

    let empty = SnapshotBuilder::build(SnapshotVersion::new(8), "myservice", &[]);
    assert!(empty.is_empty());
    assert_eq!(empty.service_name(), "myservice");
}

// ============================================================================
// Reconciliation tests
// ============================================================================

#[test]
fn no_identities_means_no_version_bump() {
    let store = Arc::new(RecordingStore::default());
    let registry = Arc::new(EndpointRegistry::new());
    registry.add(addr("10.0.0.1:9000"));
    let reconciler = reconciler_with(store.clone(), registry, ReadinessGate::new());

    assert_eq!(reconciler.tick(), TickOutcome::Skipped);
    assert_eq!(reconciler.tick(), TickOutcome::Skipped);
    assert_eq!(reconciler.current_version(), SnapshotVersion::zero());
    assert!(store.published.lock().is_empty());
}

#[test]
fn listing_failure_skips_tick() {
    let store = Arc::new(RecordingStore::with_identities(&["envoy-1"]));
    *store.fail_listing.lock() = true;
    let reconciler = reconciler_with(
        store.clone(),
        Arc::new(EndpointRegistry::new()),
        ReadinessGate::new(),
    );

    assert_eq!(reconciler.tick(), TickOutcome::Skipped);
    *store.fail_listing.lock() = false;
    assert!(matches!(reconciler.tick(), TickOutcome::Published { .. }));
    assert_eq!(reconciler.current_version(), SnapshotVersion::new(1));
}

#[test]
fn versions_strictly_increase_even_without_changes() {
    let store = Arc::new(RecordingStore::with_identities(&["envoy-1"]));
    let registry = Arc::new(EndpointRegistry::new());
    let reconciler = reconciler_with(store.clone(), registry, ReadinessGate::new());

    for _ in 0..5 {
        reconciler.tick();
    }
    let versions: Vec<u64> = store
        .published_to("envoy-1")
        .iter()
        .map(|s| s.version().get())
        .collect();
    assert_eq!(versions, vec![1, 2, 3, 4, 5]);
    assert!(store.published_to("envoy-1").iter().all(|s| s.is_empty()));
}

#[test]
fn end_to_end_register_then_deregister() {
    let cache = Arc::new(SnapshotCache::new());
    let registry = Arc::new(EndpointRegistry::new());
    let gate = ReadinessGate::new();
    let reconciler = reconciler_with(cache.clone(), registry.clone(), gate.clone());

    registry.add(addr("10.0.0.1:9000"));
    registry.add(addr("10.0.0.2:9000"));

    // Two Envoy nodes have made requests.
    cache.record_request(&ClientIdentity::from("envoy-a"));
    cache.record_request(&ClientIdentity::from("envoy-b"));
    gate.signal();

    reconciler.tick();
    for node in ["envoy-a", "envoy-b"] {
        let snapshot = cache.snapshot(&ClientIdentity::from(node)).unwrap();
        assert_eq!(snapshot.version(), SnapshotVersion::new(1));
        assert_eq!(
            snapshot.endpoints(),
            &[addr("10.0.0.1:9000"), addr("10.0.0.2:9000")]
        );
    }

    registry.remove(&addr("10.0.0.1:9000"));
    reconciler.tick();
    for node in ["envoy-a", "envoy-b"] {
        let snapshot = cache.snapshot(&ClientIdentity::from(node)).unwrap();
        assert_eq!(snapshot.version(), SnapshotVersion::new(2));
        assert_eq!(snapshot.endpoints(), &[addr("10.0.0.2:9000")]);
    }
}

#[tokio::test(start_paused = true)]
async fn loop_publishes_nothing_before_readiness() {
    let store = Arc::new(RecordingStore::with_identities(&["envoy-1"]));
    let gate = ReadinessGate::new();
    let reconciler = Arc::new(Reconciler::new(
        ReconcileConfig {
            service_name: "myservice".to_string(),
            interval: Duration::from_secs(10),
        },
        Arc::new(EndpointRegistry::new()),
        store.clone(),
        gate.clone(),
        Arc::new(VersionCounter::new()),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move { reconciler.run(shutdown_rx).await })
    };

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(store.published.lock().is_empty());
    assert_eq!(reconciler.state(), LoopState::AwaitingReadiness);

    gate.signal();
    tokio::time::sleep(Duration::from_secs(25)).await;
    // Immediate tick plus the ticks at 10s and 20s.
    assert_eq!(store.published_to("envoy-1").len(), 3);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
    assert_eq!(reconciler.state(), LoopState::Stopped);
}
