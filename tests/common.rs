//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

#![allow(dead_code)]

use beacon::control::address::EndpointAddress;
use beacon::control::snapshot::Snapshot;
use beacon::control::store::{ClientIdentity, SnapshotStore};
use beacon::core::error::{BeaconError, BeaconResult};
use beacon::xds::proto::{DiscoveryRequest, Node, CLUSTER_LOAD_ASSIGNMENT_TYPE_URL};
use bytes::{BufMut, Bytes, BytesMut};
use parking_lot::Mutex;
use prost::Message;
use std::convert::Infallible;
use std::io::Write;
use std::pin::Pin;
use std::task::{Context, Poll};
use tempfile::NamedTempFile;
use tokio::sync::mpsc;

pub const STREAM_ENDPOINTS: &str =
    "/envoy.service.endpoint.v3.EndpointDiscoveryService/StreamEndpoints";
pub const FETCH_ENDPOINTS: &str =
    "/envoy.service.endpoint.v3.EndpointDiscoveryService/FetchEndpoints";

/// Write a configuration file.
pub fn create_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

/// Create a minimal valid configuration file.
pub fn create_minimal_config() -> NamedTempFile {
    create_config(
        r#"
[discovery]
bind = "127.0.0.1:18080"

[admin]
bind = "127.0.0.1:15000"
"#,
    )
}

/// Parse an address that is known to be valid.
pub fn addr(raw: &str) -> EndpointAddress {
    EndpointAddress::parse(raw).expect("valid test address")
}

/// Snapshot store that records every publish.
#[derive(Default)]
pub struct RecordingStore {
    pub identities: Mutex<Vec<ClientIdentity>>,
    pub published: Mutex<Vec<(ClientIdentity, Snapshot)>>,
    pub fail_listing: Mutex<bool>,
}

impl RecordingStore {
    pub fn with_identities(ids: &[&str]) -> Self {
        let store = Self::default();
        *store.identities.lock() = ids.iter().map(|id| ClientIdentity::from(*id)).collect();
        store
    }

    /// Snapshots published to one identity, oldest first.
    pub fn published_to(&self, id: &str) -> Vec<Snapshot> {
        self.published
            .lock()
            .iter()
            .filter(|(identity, _)| identity.as_str() == id)
            .map(|(_, snapshot)| snapshot.clone())
            .collect()
    }
}

impl SnapshotStore for RecordingStore {
    fn known_client_identities(&self) -> BeaconResult<Vec<ClientIdentity>> {
        if *self.fail_listing.lock() {
            return Err(BeaconError::IdentityListUnavailable {
                message: "store offline".to_string(),
            });
        }
        Ok(self.identities.lock().clone())
    }

    fn publish(&self, identity: &ClientIdentity, snapshot: Snapshot) -> BeaconResult<()> {
        self.published.lock().push((identity.clone(), snapshot));
        Ok(())
    }
}

/// EDS request for the endpoint type.
pub fn discovery_request(node_id: &str, version: &str, nonce: &str) -> DiscoveryRequest {
    DiscoveryRequest {
        version_info: version.to_string(),
        node: if node_id.is_empty() {
            None
        } else {
            Some(Node {
                id: node_id.to_string(),
                ..Default::default()
            })
        },
        resource_names: Vec::new(),
        type_url: CLUSTER_LOAD_ASSIGNMENT_TYPE_URL.to_string(),
        response_nonce: nonce.to_string(),
        error_detail: None,
    }
}

/// Length-prefix a message the way gRPC frames it.
pub fn grpc_frame<M: Message>(msg: &M) -> Bytes {
    let encoded = msg.encode_to_vec();
    let mut buf = BytesMut::with_capacity(5 + encoded.len());
    buf.put_u8(0);
    buf.put_u32(encoded.len() as u32);
    buf.put_slice(&encoded);
    buf.freeze()
}

/// Decode one length-prefixed gRPC message.
pub fn decode_grpc_frame<M: Message + Default>(frame: &[u8]) -> M {
    assert!(frame.len() >= 5, "frame too short");
    let len = u32::from_be_bytes([frame[1], frame[2], frame[3], frame[4]]) as usize;
    M::decode(&frame[5..5 + len]).expect("decodable message")
}

/// Request body fed from a channel, to keep a stream open.
pub struct ChannelBody {
    rx: mpsc::Receiver<Bytes>,
}

/// Create a streaming request body and its sender. Dropping the sender
/// half-closes the request.
pub fn channel_body() -> (mpsc::Sender<Bytes>, ChannelBody) {
    let (tx, rx) = mpsc::channel(8);
    (tx, ChannelBody { rx })
}

impl http_body::Body for ChannelBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        self.rx
            .poll_recv(cx)
            .map(|chunk| chunk.map(|data| Ok(http_body::Frame::data(data))))
    }
}
