//! EDS delivery tests: wire types, unary fetch and the streaming protocol.

mod common;

use beacon::control::reconcile::{ReconcileConfig, Reconciler, TickOutcome};
use beacon::control::registry::EndpointRegistry;
use beacon::control::snapshot::{SnapshotBuilder, SnapshotVersion, VersionCounter};
use beacon::control::store::{ClientIdentity, SnapshotStore};
use beacon::control::ReadinessGate;
use beacon::xds::proto::{
    ClusterLoadAssignment, DiscoveryRequest, DiscoveryResponse, CLUSTER_LOAD_ASSIGNMENT_TYPE_URL,
};
use beacon::xds::{DiscoveryCallbacks, DiscoveryState, EdsService, EndpointDiscoveryServer, SnapshotCache};
use bytes::Bytes;
use common::{addr, discovery_request, grpc_frame, FETCH_ENDPOINTS, STREAM_ENDPOINTS};
use http_body_util::{BodyExt, Full};
use prost::Message;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tonic::body::BoxBody;
use tonic::codegen::http::{Request, Response};
use tonic::codegen::Service;

struct Harness {
    registry: Arc<EndpointRegistry>,
    cache: Arc<SnapshotCache>,
    callbacks: Arc<DiscoveryCallbacks>,
    gate: ReadinessGate,
    reconciler: Reconciler,
    service: EndpointDiscoveryServer,
    shutdown_tx: watch::Sender<bool>,
}

fn harness() -> Harness {
    let registry = Arc::new(EndpointRegistry::new());
    let cache = Arc::new(SnapshotCache::new());
    let callbacks = Arc::new(DiscoveryCallbacks::new());
    let gate = ReadinessGate::new();
    {
        let gate = gate.clone();
        callbacks.on_first_request(move || {
            gate.signal();
        });
    }
    let reconciler = Reconciler::new(
        ReconcileConfig::default(),
        registry.clone(),
        cache.clone(),
        gate.clone(),
        Arc::new(VersionCounter::new()),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = DiscoveryState::new(cache.clone(), callbacks.clone(), shutdown_rx);

    Harness {
        registry,
        cache,
        callbacks,
        gate,
        reconciler,
        service: EndpointDiscoveryServer::new(EdsService::new(state)),
        shutdown_tx,
    }
}

fn grpc_request<B>(path: &str, body: B) -> Request<B> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/grpc")
        .body(body)
        .unwrap()
}

async fn fetch(service: &mut EndpointDiscoveryServer, frame: Bytes) -> Response<BoxBody> {
    service
        .call(grpc_request(FETCH_ENDPOINTS, Full::new(frame)))
        .await
        .unwrap()
}

fn grpc_status(response: &Response<BoxBody>) -> Option<String> {
    response
        .headers()
        .get("grpc-status")
        .map(|v| v.to_str().unwrap().to_string())
}

/// Read the next response message off a stream, failing after a second.
async fn next_response(body: &mut BoxBody) -> DiscoveryResponse {
    let frame = tokio::time::timeout(Duration::from_secs(1), body.frame())
        .await
        .expect("response within timeout")
        .expect("stream still open")
        .expect("frame without error");
    let data = frame.into_data().expect("data frame");
    common::decode_grpc_frame(&data)
}

fn endpoints_of(response: &DiscoveryResponse) -> Vec<(String, u32)> {
    assert_eq!(response.resources.len(), 1);
    assert_eq!(response.resources[0].type_url, CLUSTER_LOAD_ASSIGNMENT_TYPE_URL);
    ClusterLoadAssignment::decode(response.resources[0].value.as_slice())
        .unwrap()
        .socket_addresses()
}

// ============================================================================
// FetchEndpoints
// ============================================================================

#[tokio::test]
async fn fetch_without_node_is_invalid() {
    let mut h = harness();
    let response = fetch(&mut h.service, grpc_frame(&discovery_request("", "", ""))).await;
    assert_eq!(grpc_status(&response).as_deref(), Some("3"));
    assert!(!h.gate.is_signaled());
}

#[tokio::test]
async fn fetch_before_publication_is_unavailable_but_opens_gate() {
    let mut h = harness();
    let response = fetch(&mut h.service, grpc_frame(&discovery_request("envoy-1", "", ""))).await;

    assert_eq!(grpc_status(&response).as_deref(), Some("14"));
    assert!(h.gate.is_signaled());
    assert_eq!(
        h.cache.known_client_identities().unwrap(),
        vec![ClientIdentity::from("envoy-1")]
    );
    assert_eq!(h.callbacks.counters().fetches, 1);
}

#[tokio::test]
async fn fetch_returns_published_snapshot() {
    let mut h = harness();
    h.registry.add(addr("10.0.0.1:9000"));
    h.cache.record_request(&ClientIdentity::from("envoy-1"));
    assert!(matches!(h.reconciler.tick(), TickOutcome::Published { .. }));

    let response = fetch(&mut h.service, grpc_frame(&discovery_request("envoy-1", "", ""))).await;
    assert_eq!(grpc_status(&response), None);

    let collected = response.into_body().collect().await.unwrap();
    let trailers = collected.trailers().cloned().expect("trailers");
    assert_eq!(trailers.get("grpc-status").unwrap(), "0");
    let decoded: DiscoveryResponse = common::decode_grpc_frame(&collected.to_bytes());
    assert_eq!(decoded.version_info, "1");
    assert_eq!(decoded.type_url, CLUSTER_LOAD_ASSIGNMENT_TYPE_URL);
    assert_eq!(endpoints_of(&decoded), vec![("10.0.0.1".to_string(), 9000)]);
}

#[tokio::test]
async fn fetch_with_current_version_is_unavailable() {
    let mut h = harness();
    let node = ClientIdentity::from("envoy-1");
    h.cache
        .publish(
            &node,
            SnapshotBuilder::build(SnapshotVersion::new(4), "myservice", &[]),
        )
        .unwrap();

    let response = fetch(&mut h.service, grpc_frame(&discovery_request("envoy-1", "4", ""))).await;
    assert_eq!(grpc_status(&response).as_deref(), Some("14"));
}

#[tokio::test]
async fn fetch_with_wrong_type_url_is_invalid() {
    let mut h = harness();
    let mut request = discovery_request("envoy-1", "", "");
    request.type_url = "type.googleapis.com/envoy.config.cluster.v3.Cluster".to_string();
    let response = fetch(&mut h.service, grpc_frame(&request)).await;
    assert_eq!(grpc_status(&response).as_deref(), Some("3"));
}

#[tokio::test]
async fn unknown_method_is_unimplemented() {
    let mut h = harness();
    let response = h
        .service
        .call(grpc_request(
            "/envoy.service.endpoint.v3.EndpointDiscoveryService/DeltaEndpoints",
            Full::new(Bytes::new()),
        ))
        .await
        .unwrap();
    assert_eq!(grpc_status(&response).as_deref(), Some("12"));
}

// ============================================================================
// StreamEndpoints
// ============================================================================

#[tokio::test]
async fn stream_pushes_versions_as_registry_changes() {
    let mut h = harness();
    h.registry.add(addr("10.0.0.1:9000"));
    h.registry.add(addr("10.0.0.2:9000"));

    let (tx, body) = common::channel_body();
    let response = h
        .service
        .call(grpc_request(STREAM_ENDPOINTS, body))
        .await
        .unwrap();
    let mut response_body = response.into_body();

    // First request: no snapshot yet, so nothing comes back.
    tx.send(grpc_frame(&discovery_request("envoy-1", "", "")))
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(1), h.gate.wait())
        .await
        .expect("first request opens the gate");

    // Tick 1 publishes both endpoints.
    assert_eq!(
        h.reconciler.tick(),
        TickOutcome::Published {
            version: SnapshotVersion::new(1),
            published: 1,
            failed: 0
        }
    );
    let first = next_response(&mut response_body).await;
    assert_eq!(first.version_info, "1");
    assert_eq!(first.nonce, "1");
    assert_eq!(
        endpoints_of(&first),
        vec![
            ("10.0.0.1".to_string(), 9000),
            ("10.0.0.2".to_string(), 9000)
        ]
    );

    // ACK, then deregister and tick again.
    tx.send(grpc_frame(&discovery_request("envoy-1", "1", "1")))
        .await
        .unwrap();
    h.registry.remove(&addr("10.0.0.1:9000"));
    h.reconciler.tick();

    let second = next_response(&mut response_body).await;
    assert_eq!(second.version_info, "2");
    assert_eq!(second.nonce, "2");
    assert_eq!(endpoints_of(&second), vec![("10.0.0.2".to_string(), 9000)]);

    // Half-close ends the stream cleanly.
    drop(tx);
    let trailers = tokio::time::timeout(Duration::from_secs(1), response_body.frame())
        .await
        .unwrap()
        .unwrap()
        .unwrap()
        .into_trailers()
        .expect("trailers frame");
    assert_eq!(trailers.get("grpc-status").unwrap(), "0");

    let counters = h.callbacks.counters();
    assert_eq!(counters.streams_opened, 1);
    assert_eq!(counters.responses, 2);
}

#[tokio::test]
async fn stream_answers_immediately_when_snapshot_exists() {
    let mut h = harness();
    h.registry.add(addr("10.0.0.9:80"));
    h.cache.record_request(&ClientIdentity::from("envoy-1"));
    h.reconciler.tick();

    let (tx, body) = common::channel_body();
    let response = h
        .service
        .call(grpc_request(STREAM_ENDPOINTS, body))
        .await
        .unwrap();
    let mut response_body = response.into_body();

    tx.send(grpc_frame(&discovery_request("envoy-1", "", "")))
        .await
        .unwrap();
    let response = next_response(&mut response_body).await;
    assert_eq!(response.version_info, "1");
    assert_eq!(endpoints_of(&response), vec![("10.0.0.9".to_string(), 80)]);
}

#[tokio::test]
async fn stream_without_node_fails_with_invalid_argument() {
    let mut h = harness();
    let (tx, body) = common::channel_body();
    let response = h
        .service
        .call(grpc_request(STREAM_ENDPOINTS, body))
        .await
        .unwrap();
    let mut response_body = response.into_body();

    tx.send(grpc_frame(&discovery_request("", "", "")))
        .await
        .unwrap();
    let trailers = tokio::time::timeout(Duration::from_secs(1), response_body.frame())
        .await
        .unwrap()
        .unwrap()
        .unwrap()
        .into_trailers()
        .expect("trailers frame");
    assert_eq!(trailers.get("grpc-status").unwrap(), "3");
    assert!(!h.gate.is_signaled());
}

#[tokio::test]
async fn stream_ends_on_shutdown() {
    let mut h = harness();
    let (tx, body) = common::channel_body();
    let response = h
        .service
        .call(grpc_request(STREAM_ENDPOINTS, body))
        .await
        .unwrap();
    let mut response_body = response.into_body();
    tx.send(grpc_frame(&discovery_request("envoy-1", "", "")))
        .await
        .unwrap();

    h.shutdown_tx.send(true).unwrap();
    let trailers = tokio::time::timeout(Duration::from_secs(1), response_body.frame())
        .await
        .unwrap()
        .unwrap()
        .unwrap()
        .into_trailers()
        .expect("trailers frame");
    assert_eq!(trailers.get("grpc-status").unwrap(), "0");
}

fn subscribed(node_id: &str, version: &str, nonce: &str, names: &[&str]) -> DiscoveryRequest {
    let mut request = discovery_request(node_id, version, nonce);
    request.resource_names = names.iter().map(|name| name.to_string()).collect();
    request
}

#[tokio::test]
async fn stream_answers_widened_subscription_at_current_version() {
    let mut h = harness();
    h.registry.add(addr("10.0.0.1:9000"));

    let (tx, body) = common::channel_body();
    let response = h
        .service
        .call(grpc_request(STREAM_ENDPOINTS, body))
        .await
        .unwrap();
    let mut response_body = response.into_body();

    tx.send(grpc_frame(&subscribed("envoy-1", "", "", &["other"])))
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(1), h.gate.wait())
        .await
        .unwrap();
    h.reconciler.tick();

    let first = next_response(&mut response_body).await;
    assert_eq!(first.version_info, "1");
    assert!(first.resources.is_empty());

    // ACK version 1 while adding the service to the subscription.
    tx.send(grpc_frame(&subscribed(
        "envoy-1",
        "1",
        "1",
        &["other", "myservice"],
    )))
    .await
    .unwrap();

    let second = next_response(&mut response_body).await;
    assert_eq!(second.version_info, "1");
    assert_eq!(second.nonce, "2");
    assert_eq!(endpoints_of(&second), vec![("10.0.0.1".to_string(), 9000)]);
}

#[tokio::test]
async fn stale_nonce_does_not_change_subscription() {
    let mut h = harness();
    h.registry.add(addr("10.0.0.1:9000"));

    let (tx, body) = common::channel_body();
    let response = h
        .service
        .call(grpc_request(STREAM_ENDPOINTS, body))
        .await
        .unwrap();
    let mut response_body = response.into_body();

    tx.send(grpc_frame(&discovery_request("envoy-1", "", "")))
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(1), h.gate.wait())
        .await
        .unwrap();
    h.reconciler.tick();
    let first = next_response(&mut response_body).await;
    assert_eq!(endpoints_of(&first).len(), 1);

    // Narrowing request carrying a nonce this stream never sent.
    tx.send(grpc_frame(&subscribed("envoy-1", "1", "99", &["other"])))
        .await
        .unwrap();
    h.registry.add(addr("10.0.0.2:9000"));

    // Wait until the driver has handled the stale request before ticking.
    tokio::time::timeout(Duration::from_secs(1), async {
        while h.callbacks.counters().requests < 2 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    h.reconciler.tick();

    let second = next_response(&mut response_body).await;
    assert_eq!(second.version_info, "2");
    assert_eq!(endpoints_of(&second).len(), 2);
}
