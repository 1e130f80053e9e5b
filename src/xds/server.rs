//! gRPC server for the Envoy v3 Endpoint Discovery Service.
//!
//! The service is implemented directly on tonic's `Service` seam with the
//! hand-written messages in [`super::proto`], so no codegen is involved.
//! `FetchEndpoints` is unary. `StreamEndpoints` is bidirectional: each call
//! spawns a driver task that reads requests off the request body and writes
//! responses into a channel-backed response body.

use super::cache::SnapshotCache;
use super::callbacks::DiscoveryCallbacks;
use super::proto::{
    Any, ClusterLoadAssignment, DiscoveryRequest, DiscoveryResponse,
    CLUSTER_LOAD_ASSIGNMENT_TYPE_URL,
};
use crate::control::snapshot::{Snapshot, SnapshotVersion};
use crate::control::store::ClientIdentity;
use crate::core::error::{BeaconError, BeaconResult, DiscoveryErrorMapping};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use http_body_util::BodyExt;
use prost::Message;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tonic::codegen::http::{header, HeaderMap, HeaderValue};
use tonic::Status;

/// Fully-qualified gRPC service name.
pub const EDS_SERVICE_NAME: &str = "envoy.service.endpoint.v3.EndpointDiscoveryService";

const STREAM_ENDPOINTS_PATH: &str =
    "/envoy.service.endpoint.v3.EndpointDiscoveryService/StreamEndpoints";
const FETCH_ENDPOINTS_PATH: &str =
    "/envoy.service.endpoint.v3.EndpointDiscoveryService/FetchEndpoints";

/// Largest request message accepted, matching gRPC's default receive limit.
const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Buffered responses per stream before the driver waits on the client.
const STREAM_BUFFER: usize = 16;

/// State shared by every call the service handles.
#[derive(Clone)]
pub struct DiscoveryState {
    /// Snapshots to serve, keyed by node id.
    pub cache: Arc<SnapshotCache>,
    /// Lifecycle and request callbacks.
    pub callbacks: Arc<DiscoveryCallbacks>,
    /// Shutdown signal receiver.
    pub shutdown_rx: watch::Receiver<bool>,
    stream_ids: Arc<AtomicU64>,
}

impl DiscoveryState {
    pub fn new(
        cache: Arc<SnapshotCache>,
        callbacks: Arc<DiscoveryCallbacks>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            cache,
            callbacks,
            shutdown_rx,
            stream_ids: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_stream_id(&self) -> u64 {
        self.stream_ids.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// EDS request handling, independent of the transport.
#[derive(Clone)]
pub struct EdsService {
    state: DiscoveryState,
}

impl EdsService {
    pub fn new(state: DiscoveryState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &DiscoveryState {
        &self.state
    }

    /// Handle a FetchEndpoints request.
    pub fn fetch(&self, req: DiscoveryRequest) -> BeaconResult<DiscoveryResponse> {
        check_type_url(&req)?;
        let identity = req
            .node_id()
            .map(ClientIdentity::from)
            .ok_or_else(|| BeaconError::invalid_request("fetch request must carry a node"))?;

        self.state.cache.record_request(&identity);
        self.state.callbacks.on_fetch_request(&req);

        let snapshot =
            self.state
                .cache
                .snapshot(&identity)
                .ok_or_else(|| BeaconError::SnapshotUnavailable {
                    node_id: identity.to_string(),
                })?;

        if snapshot.version().to_string() == req.version_info {
            return Err(BeaconError::VersionUpToDate {
                version: req.version_info,
            });
        }

        let response = build_response(&snapshot, &req.resource_names, String::new());
        self.state.callbacks.on_fetch_response(&response);
        Ok(response)
    }
}

fn check_type_url(req: &DiscoveryRequest) -> BeaconResult<()> {
    if req.type_url.is_empty() || req.type_url == CLUSTER_LOAD_ASSIGNMENT_TYPE_URL {
        Ok(())
    } else {
        Err(BeaconError::invalid_request(format!(
            "unsupported type URL {}",
            req.type_url
        )))
    }
}

/// Whether a request's resource names cover the service.
fn subscribes_to(resource_names: &[String], service_name: &str) -> bool {
    resource_names.is_empty() || resource_names.iter().any(|name| name == service_name)
}

/// Build the discovery response for a snapshot.
///
/// The ClusterLoadAssignment is included when the client subscribed to all
/// resources or named the snapshot's service explicitly.
pub fn build_response(
    snapshot: &Snapshot,
    resource_names: &[String],
    nonce: String,
) -> DiscoveryResponse {
    let resources = if subscribes_to(resource_names, snapshot.service_name()) {
        vec![Any::pack(
            CLUSTER_LOAD_ASSIGNMENT_TYPE_URL,
            &ClusterLoadAssignment::from_snapshot(snapshot),
        )]
    } else {
        Vec::new()
    };

    DiscoveryResponse {
        version_info: snapshot.version().to_string(),
        resources,
        type_url: CLUSTER_LOAD_ASSIGNMENT_TYPE_URL.to_string(),
        nonce,
    }
}

// ============================================================================
// Stream driver
// ============================================================================

/// Per-stream protocol state.
struct StreamState {
    stream_id: u64,
    node: Option<ClientIdentity>,
    resource_names: Vec<String>,
    /// Version the client holds or was last sent.
    last_version: Option<SnapshotVersion>,
    last_nonce: Option<String>,
    /// Whether the last response carried the ClusterLoadAssignment.
    service_sent: bool,
    nonce_counter: u64,
}

impl StreamState {
    fn new(stream_id: u64) -> Self {
        Self {
            stream_id,
            node: None,
            resource_names: Vec::new(),
            last_version: None,
            last_nonce: None,
            service_sent: false,
            nonce_counter: 0,
        }
    }
}

struct StreamDriver {
    state: DiscoveryState,
    stream: StreamState,
    tx: mpsc::Sender<Result<Bytes, Status>>,
}

impl StreamDriver {
    async fn run<B>(mut self, body: B)
    where
        B: tonic::codegen::Body + Send + 'static,
        B::Data: Into<Bytes> + Send,
        B::Error: Into<tonic::codegen::StdError> + Send + 'static,
    {
        let stream_id = self.stream.stream_id;
        self.state
            .callbacks
            .on_stream_open(stream_id, CLUSTER_LOAD_ASSIGNMENT_TYPE_URL);

        let mut body = Box::pin(body);
        let mut reader = FrameReader::default();
        let mut changes = self.state.cache.subscribe();
        let mut shutdown_rx = self.state.shutdown_rx.clone();

        let result: Result<(), Status> = loop {
            tokio::select! {
                frame = body.frame() => match frame {
                    Some(Ok(frame)) => {
                        let Ok(chunk) = frame.into_data() else {
                            continue;
                        };
                        reader.push(&chunk.into());
                        if let Err(status) = self.drain_requests(&mut reader).await {
                            break Err(status);
                        }
                    }
                    Some(Err(e)) => {
                        let e: tonic::codegen::StdError = e.into();
                        tracing::warn!(stream_id, error = %e, "error reading stream body");
                        break Err(Status::internal("failed to read request body"));
                    }
                    None => {
                        tracing::debug!(stream_id, "client closed stream");
                        break Ok(());
                    }
                },
                changed = changes.changed() => {
                    if changed.is_err() {
                        break Ok(());
                    }
                    if let Err(status) = self.push_if_changed().await {
                        break Err(status);
                    }
                }
                _ = wait_for_shutdown(&mut shutdown_rx) => {
                    tracing::debug!(stream_id, "closing stream for shutdown");
                    break Ok(());
                }
            }
        };

        self.state.callbacks.on_stream_closed(stream_id);
        if let Err(status) = result {
            // The client may already be gone; nothing else to do then.
            let _ = self.tx.send(Err(status)).await;
        }
    }

    async fn drain_requests(&mut self, reader: &mut FrameReader) -> Result<(), Status> {
        while let Some(message) = reader.next_message()? {
            let req = DiscoveryRequest::decode(message)
                .map_err(|e| Status::invalid_argument(format!("decode error: {}", e)))?;
            self.handle_request(req).await?;
        }
        Ok(())
    }

    async fn handle_request(&mut self, req: DiscoveryRequest) -> Result<(), Status> {
        check_type_url(&req).map_err(|e| DiscoveryErrorMapping::to_status(&e))?;

        let identity = match (&self.stream.node, req.node_id()) {
            (Some(identity), _) => identity.clone(),
            (None, Some(id)) => {
                let identity = ClientIdentity::from(id);
                self.stream.node = Some(identity.clone());
                identity
            }
            (None, None) => {
                return Err(Status::invalid_argument(
                    "first stream request must carry a node",
                ));
            }
        };

        self.state.cache.record_request(&identity);
        self.state
            .callbacks
            .on_stream_request(self.stream.stream_id, &req);

        if let Some(ref detail) = req.error_detail {
            tracing::warn!(
                stream_id = self.stream.stream_id,
                node_id = %identity,
                version_info = %req.version_info,
                code = detail.code,
                message = %detail.message,
                "client rejected update"
            );
            return Ok(());
        }

        if !req.response_nonce.is_empty() {
            if self.stream.last_nonce.as_deref() != Some(req.response_nonce.as_str()) {
                tracing::debug!(
                    stream_id = self.stream.stream_id,
                    nonce = %req.response_nonce,
                    "ignoring request with stale nonce"
                );
                return Ok(());
            }
            let sent = self.stream.last_version.map(|v| v.to_string());
            if sent.as_deref() != Some(req.version_info.as_str()) {
                tracing::warn!(
                    stream_id = self.stream.stream_id,
                    node_id = %identity,
                    version_info = %req.version_info,
                    nonce = %req.response_nonce,
                    "client did not apply last update"
                );
                return Ok(());
            }
        }

        self.stream.resource_names = req.resource_names;

        let Some(snapshot) = self.state.cache.snapshot(&identity) else {
            tracing::debug!(
                stream_id = self.stream.stream_id,
                node_id = %identity,
                "no snapshot yet; waiting for publication"
            );
            return Ok(());
        };

        if snapshot.version().to_string() == req.version_info {
            self.stream.last_version = Some(snapshot.version());
            // A widened subscription is answered at the current version.
            let newly_named = !self.stream.service_sent
                && subscribes_to(&self.stream.resource_names, snapshot.service_name());
            if !newly_named {
                return Ok(());
            }
        }
        self.send(&snapshot).await
    }

    async fn push_if_changed(&mut self) -> Result<(), Status> {
        let Some(identity) = self.stream.node.clone() else {
            return Ok(());
        };
        match self.state.cache.snapshot(&identity) {
            Some(snapshot) if Some(snapshot.version()) != self.stream.last_version => {
                self.send(&snapshot).await
            }
            _ => Ok(()),
        }
    }

    async fn send(&mut self, snapshot: &Snapshot) -> Result<(), Status> {
        self.stream.nonce_counter += 1;
        let nonce = self.stream.nonce_counter.to_string();
        let response = build_response(snapshot, &self.stream.resource_names, nonce.clone());

        self.state
            .callbacks
            .on_stream_response(self.stream.stream_id, &response);
        self.tx
            .send(Ok(encode_grpc_message(&response)))
            .await
            .map_err(|_| Status::cancelled("client went away"))?;

        self.stream.last_version = Some(snapshot.version());
        self.stream.last_nonce = Some(nonce);
        self.stream.service_sent = !response.resources.is_empty();
        Ok(())
    }
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

// ============================================================================
// gRPC framing
// ============================================================================

/// Accumulates body chunks and splits out length-prefixed gRPC messages.
#[derive(Default)]
struct FrameReader {
    buf: BytesMut,
}

impl FrameReader {
    fn push(&mut self, chunk: &Bytes) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete message payload, without its 5-byte header.
    #[allow(clippy::result_large_err)]
    fn next_message(&mut self) -> Result<Option<Bytes>, Status> {
        if self.buf.len() < 5 {
            return Ok(None);
        }
        if self.buf[0] != 0 {
            return Err(Status::unimplemented(
                "compressed gRPC messages are not supported",
            ));
        }
        let len = u32::from_be_bytes([self.buf[1], self.buf[2], self.buf[3], self.buf[4]]) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(Status::resource_exhausted(format!(
                "gRPC message of {} bytes exceeds limit of {}",
                len, MAX_MESSAGE_SIZE
            )));
        }
        if self.buf.len() < 5 + len {
            return Ok(None);
        }
        let mut frame = self.buf.split_to(5 + len);
        frame.advance(5);
        Ok(Some(frame.freeze()))
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Encode gRPC message to bytes (adds the 5-byte header).
fn encode_grpc_message<M: Message>(msg: &M) -> Bytes {
    let encoded = msg.encode_to_vec();
    let len = encoded.len() as u32;

    let mut buf = BytesMut::with_capacity(5 + encoded.len());
    buf.put_u8(0); // not compressed
    buf.put_u32(len);
    buf.put_slice(&encoded);
    buf.freeze()
}

fn grpc_trailers(status: Option<&Status>) -> HeaderMap {
    let mut trailers = HeaderMap::new();
    match status {
        None => {
            trailers.insert("grpc-status", HeaderValue::from_static("0"));
        }
        Some(status) => {
            trailers.insert("grpc-status", HeaderValue::from(status.code() as i32));
            if let Ok(message) = HeaderValue::from_str(status.message()) {
                trailers.insert("grpc-message", message);
            }
        }
    }
    trailers
}

/// A unary gRPC body: one data frame followed by OK trailers.
struct GrpcBody {
    data: Option<Bytes>,
    trailers_sent: bool,
}

impl http_body::Body for GrpcBody {
    type Data = Bytes;
    type Error = Status;

    fn poll_frame(
        mut self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        if let Some(data) = self.data.take() {
            return std::task::Poll::Ready(Some(Ok(http_body::Frame::data(data))));
        }
        if !self.trailers_sent {
            self.trailers_sent = true;
            return std::task::Poll::Ready(Some(Ok(http_body::Frame::trailers(grpc_trailers(
                None,
            )))));
        }
        std::task::Poll::Ready(None)
    }

    fn is_end_stream(&self) -> bool {
        self.data.is_none() && self.trailers_sent
    }
}

/// A streaming gRPC body fed by the stream driver.
///
/// Ends with the status of the first error received, or OK trailers once the
/// driver drops its sender.
struct StreamingBody {
    rx: mpsc::Receiver<Result<Bytes, Status>>,
    done: bool,
}

impl http_body::Body for StreamingBody {
    type Data = Bytes;
    type Error = Status;

    fn poll_frame(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        use std::task::Poll;

        if self.done {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(Ok(data))) => Poll::Ready(Some(Ok(http_body::Frame::data(data)))),
            Poll::Ready(Some(Err(status))) => {
                self.done = true;
                Poll::Ready(Some(Ok(http_body::Frame::trailers(grpc_trailers(Some(
                    &status,
                ))))))
            }
            Poll::Ready(None) => {
                self.done = true;
                Poll::Ready(Some(Ok(http_body::Frame::trailers(grpc_trailers(None)))))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.done
    }
}

fn grpc_response<B>(body: B) -> tonic::codegen::http::Response<tonic::body::BoxBody>
where
    B: http_body::Body<Data = Bytes, Error = Status> + Send + 'static,
{
    let mut response = tonic::codegen::http::Response::new(tonic::body::BoxBody::new(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/grpc"),
    );
    response
}

/// Build a gRPC error response.
fn grpc_error_response(status: Status) -> tonic::codegen::http::Response<tonic::body::BoxBody> {
    status.into_http()
}

// ============================================================================
// Server
// ============================================================================

/// gRPC listener for the EDS service.
pub struct EdsServer {
    /// Bind address.
    bind_addr: SocketAddr,
    /// Per-connection HTTP/2 stream limit.
    max_concurrent_streams: u32,
    /// Shared state.
    state: DiscoveryState,
}

impl EdsServer {
    pub fn new(bind_addr: SocketAddr, max_concurrent_streams: u32, state: DiscoveryState) -> Self {
        Self {
            bind_addr,
            max_concurrent_streams,
            state,
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Run the gRPC server until the shutdown signal fires.
    pub async fn run(self) -> BeaconResult<()> {
        use tonic::transport::Server;

        let addr = self.bind_addr;
        let mut shutdown_rx = self.state.shutdown_rx.clone();
        let service = EndpointDiscoveryServer::new(EdsService::new(self.state));

        tracing::info!(%addr, max_concurrent_streams = self.max_concurrent_streams, "management server listening");

        Server::builder()
            .max_concurrent_streams(self.max_concurrent_streams)
            .add_service(service)
            .serve_with_shutdown(addr, async move {
                wait_for_shutdown(&mut shutdown_rx).await;
                tracing::info!("management server shutting down");
            })
            .await
            .map_err(|e| BeaconError::Internal {
                message: format!("gRPC server error: {}", e),
            })?;

        Ok(())
    }
}

// ============================================================================
// Tonic Service Wrapper
// ============================================================================

/// Routes EDS calls arriving through tonic's transport.
#[derive(Clone)]
pub struct EndpointDiscoveryServer {
    inner: EdsService,
}

impl EndpointDiscoveryServer {
    pub fn new(inner: EdsService) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for EndpointDiscoveryServer {
    const NAME: &'static str = EDS_SERVICE_NAME;
}

impl<B> tonic::codegen::Service<tonic::codegen::http::Request<B>> for EndpointDiscoveryServer
where
    B: tonic::codegen::Body + Send + 'static,
    B::Data: Into<Bytes> + Send,
    B::Error: Into<tonic::codegen::StdError> + Send + 'static,
{
    type Response = tonic::codegen::http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: tonic::codegen::http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        let path = req.uri().path().to_string();
        tracing::debug!(path = %path, "EDS call");

        Box::pin(async move {
            let response = match path.as_str() {
                STREAM_ENDPOINTS_PATH => {
                    let state = inner.state().clone();
                    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
                    let driver = StreamDriver {
                        stream: StreamState::new(state.next_stream_id()),
                        state,
                        tx,
                    };
                    tokio::spawn(driver.run(req.into_body()));
                    grpc_response(StreamingBody { rx, done: false })
                }
                FETCH_ENDPOINTS_PATH => match read_unary_request(req.into_body()).await {
                    Ok(fetch) => match inner.fetch(fetch) {
                        Ok(resp) => grpc_response(GrpcBody {
                            data: Some(encode_grpc_message(&resp)),
                            trailers_sent: false,
                        }),
                        Err(e) => {
                            tracing::debug!(error = %e, "fetch not served");
                            grpc_error_response(DiscoveryErrorMapping::to_status(&e))
                        }
                    },
                    Err(status) => grpc_error_response(status),
                },
                _ => {
                    tracing::warn!(path = %path, "unknown EDS method");
                    grpc_error_response(Status::unimplemented(format!(
                        "Unknown method: {}",
                        path
                    )))
                }
            };
            Ok(response)
        })
    }
}

/// Read exactly one request message from a unary call body.
async fn read_unary_request<B>(body: B) -> Result<DiscoveryRequest, Status>
where
    B: tonic::codegen::Body,
    B::Data: Into<Bytes>,
    B::Error: Into<tonic::codegen::StdError>,
{
    let mut reader = FrameReader::default();
    let mut pinned_body = std::pin::pin!(body);

    loop {
        if let Some(message) = reader.next_message()? {
            return DiscoveryRequest::decode(message)
                .map_err(|e| Status::invalid_argument(format!("decode error: {}", e)));
        }
        match pinned_body.as_mut().frame().await {
            Some(Ok(frame)) => {
                if let Ok(chunk) = frame.into_data() {
                    reader.push(&chunk.into());
                }
            }
            Some(Err(e)) => {
                let e: tonic::codegen::StdError = e.into();
                tracing::error!(error = %e, "error reading body frame");
                return Err(Status::internal("failed to read request body"));
            }
            None => {
                return Err(if reader.is_empty() {
                    Status::invalid_argument("missing request message")
                } else {
                    Status::invalid_argument("gRPC message truncated")
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::address::EndpointAddress;
    use crate::control::snapshot::SnapshotBuilder;

    fn snapshot(version: u64) -> Snapshot {
        SnapshotBuilder::build(
            SnapshotVersion::new(version),
            "myservice",
            &[EndpointAddress::parse("10.0.0.1:9000").unwrap()],
        )
    }

    #[test]
    fn test_frame_reader_splits_messages_across_chunks() {
        let first = encode_grpc_message(&DiscoveryRequest {
            version_info: "1".to_string(),
            ..Default::default()
        });
        let second = encode_grpc_message(&DiscoveryRequest {
            version_info: "2".to_string(),
            ..Default::default()
        });
        let mut joined = BytesMut::new();
        joined.extend_from_slice(&first);
        joined.extend_from_slice(&second);
        let joined = joined.freeze();

        let mut reader = FrameReader::default();
        reader.push(&joined.slice(..3));
        assert!(reader.next_message().unwrap().is_none());
        reader.push(&joined.slice(3..));

        let a = DiscoveryRequest::decode(reader.next_message().unwrap().unwrap()).unwrap();
        let b = DiscoveryRequest::decode(reader.next_message().unwrap().unwrap()).unwrap();
        assert_eq!(a.version_info, "1");
        assert_eq!(b.version_info, "2");
        assert!(reader.next_message().unwrap().is_none());
        assert!(reader.is_empty());
    }

    #[test]
    fn test_frame_reader_rejects_compressed() {
        let mut reader = FrameReader::default();
        reader.push(&Bytes::from_static(&[1, 0, 0, 0, 0]));
        let status = reader.next_message().unwrap_err();
        assert_eq!(status.code(), tonic::Code::Unimplemented);
    }

    #[test]
    fn test_build_response_filters_by_resource_name() {
        let snap = snapshot(3);

        let all = build_response(&snap, &[], "1".to_string());
        assert_eq!(all.version_info, "3");
        assert_eq!(all.resources.len(), 1);

        let named = build_response(&snap, &["myservice".to_string()], "2".to_string());
        assert_eq!(named.resources.len(), 1);

        let other = build_response(&snap, &["other".to_string()], "3".to_string());
        assert!(other.resources.is_empty());
        assert_eq!(other.type_url, CLUSTER_LOAD_ASSIGNMENT_TYPE_URL);
    }

    #[test]
    fn test_error_trailers_carry_code_and_message() {
        let trailers = grpc_trailers(Some(&Status::invalid_argument("bad node")));
        assert_eq!(trailers.get("grpc-status").unwrap(), "3");
        assert_eq!(trailers.get("grpc-message").unwrap(), "bad node");
        assert_eq!(grpc_trailers(None).get("grpc-status").unwrap(), "0");
    }
}
