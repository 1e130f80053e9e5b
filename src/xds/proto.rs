//! Protobuf encoding for Envoy v3 discovery and endpoint types.
//!
//! This module provides manual prost::Message implementations for the subset
//! of the Envoy API that EDS needs, so the server speaks the wire format Envoy
//! expects without proto codegen. Field numbers follow
//! `envoy/service/discovery/v3/discovery.proto` and
//! `envoy/config/endpoint/v3/endpoint*.proto`.

use crate::control::snapshot::Snapshot;
use prost::{DecodeError, Message};

/// Type URL of the EDS resource.
pub const CLUSTER_LOAD_ASSIGNMENT_TYPE_URL: &str =
    "type.googleapis.com/envoy.config.endpoint.v3.ClusterLoadAssignment";

// ============================================================================
// Node
// ============================================================================

/// Wire-format Node matching envoy.config.core.v3.Node.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Node {
    pub id: String,              // field 1
    pub cluster: String,         // field 2
    pub user_agent_name: String, // field 6
}

impl Message for Node {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if !self.id.is_empty() {
            prost::encoding::string::encode(1, &self.id, buf);
        }
        if !self.cluster.is_empty() {
            prost::encoding::string::encode(2, &self.cluster, buf);
        }
        if !self.user_agent_name.is_empty() {
            prost::encoding::string::encode(6, &self.user_agent_name, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::string::merge(wire_type, &mut self.id, buf, ctx),
            2 => prost::encoding::string::merge(wire_type, &mut self.cluster, buf, ctx),
            6 => prost::encoding::string::merge(wire_type, &mut self.user_agent_name, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.id.is_empty() {
            len += prost::encoding::string::encoded_len(1, &self.id);
        }
        if !self.cluster.is_empty() {
            len += prost::encoding::string::encoded_len(2, &self.cluster);
        }
        if !self.user_agent_name.is_empty() {
            len += prost::encoding::string::encoded_len(6, &self.user_agent_name);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// RpcStatus
// ============================================================================

/// Wire-format google.rpc.Status, carried as `error_detail` on NACKs.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct RpcStatus {
    pub code: i32,       // field 1
    pub message: String, // field 2
}

impl Message for RpcStatus {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if self.code != 0 {
            prost::encoding::int32::encode(1, &self.code, buf);
        }
        if !self.message.is_empty() {
            prost::encoding::string::encode(2, &self.message, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::int32::merge(wire_type, &mut self.code, buf, ctx),
            2 => prost::encoding::string::merge(wire_type, &mut self.message, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if self.code != 0 {
            len += prost::encoding::int32::encoded_len(1, &self.code);
        }
        if !self.message.is_empty() {
            len += prost::encoding::string::encoded_len(2, &self.message);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// DiscoveryRequest
// ============================================================================

/// Wire-format DiscoveryRequest matching envoy.service.discovery.v3.DiscoveryRequest.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct DiscoveryRequest {
    pub version_info: String,              // field 1
    pub node: Option<Node>,                // field 2
    pub resource_names: Vec<String>,       // field 3
    pub type_url: String,                  // field 4
    pub response_nonce: String,            // field 5
    pub error_detail: Option<RpcStatus>,   // field 6
}

impl DiscoveryRequest {
    /// Node id, if the request carries a node.
    pub fn node_id(&self) -> Option<&str> {
        self.node
            .as_ref()
            .map(|node| node.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

impl Message for DiscoveryRequest {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if !self.version_info.is_empty() {
            prost::encoding::string::encode(1, &self.version_info, buf);
        }
        if let Some(ref node) = self.node {
            prost::encoding::message::encode(2, node, buf);
        }
        prost::encoding::string::encode_repeated(3, &self.resource_names, buf);
        if !self.type_url.is_empty() {
            prost::encoding::string::encode(4, &self.type_url, buf);
        }
        if !self.response_nonce.is_empty() {
            prost::encoding::string::encode(5, &self.response_nonce, buf);
        }
        if let Some(ref error_detail) = self.error_detail {
            prost::encoding::message::encode(6, error_detail, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::string::merge(wire_type, &mut self.version_info, buf, ctx),
            2 => prost::encoding::message::merge(
                wire_type,
                self.node.get_or_insert_with(Node::default),
                buf,
                ctx,
            ),
            3 => prost::encoding::string::merge_repeated(
                wire_type,
                &mut self.resource_names,
                buf,
                ctx,
            ),
            4 => prost::encoding::string::merge(wire_type, &mut self.type_url, buf, ctx),
            5 => prost::encoding::string::merge(wire_type, &mut self.response_nonce, buf, ctx),
            6 => prost::encoding::message::merge(
                wire_type,
                self.error_detail.get_or_insert_with(RpcStatus::default),
                buf,
                ctx,
            ),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.version_info.is_empty() {
            len += prost::encoding::string::encoded_len(1, &self.version_info);
        }
        if let Some(ref node) = self.node {
            len += prost::encoding::message::encoded_len(2, node);
        }
        len += prost::encoding::string::encoded_len_repeated(3, &self.resource_names);
        if !self.type_url.is_empty() {
            len += prost::encoding::string::encoded_len(4, &self.type_url);
        }
        if !self.response_nonce.is_empty() {
            len += prost::encoding::string::encoded_len(5, &self.response_nonce);
        }
        if let Some(ref error_detail) = self.error_detail {
            len += prost::encoding::message::encoded_len(6, error_detail);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Any
// ============================================================================

/// Wire-format google.protobuf.Any.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Any {
    pub type_url: String, // field 1
    pub value: Vec<u8>,   // field 2
}

impl Any {
    /// Pack a message under the given type URL.
    pub fn pack<M: Message>(type_url: &str, msg: &M) -> Self {
        Self {
            type_url: type_url.to_string(),
            value: msg.encode_to_vec(),
        }
    }
}

impl Message for Any {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if !self.type_url.is_empty() {
            prost::encoding::string::encode(1, &self.type_url, buf);
        }
        if !self.value.is_empty() {
            prost::encoding::bytes::encode(2, &self.value, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::string::merge(wire_type, &mut self.type_url, buf, ctx),
            2 => prost::encoding::bytes::merge(wire_type, &mut self.value, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.type_url.is_empty() {
            len += prost::encoding::string::encoded_len(1, &self.type_url);
        }
        if !self.value.is_empty() {
            len += prost::encoding::bytes::encoded_len(2, &self.value);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// DiscoveryResponse
// ============================================================================

/// Wire-format DiscoveryResponse matching envoy.service.discovery.v3.DiscoveryResponse.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct DiscoveryResponse {
    pub version_info: String, // field 1
    pub resources: Vec<Any>,  // field 2
    pub type_url: String,     // field 4
    pub nonce: String,        // field 5
}

impl Message for DiscoveryResponse {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if !self.version_info.is_empty() {
            prost::encoding::string::encode(1, &self.version_info, buf);
        }
        prost::encoding::message::encode_repeated(2, &self.resources, buf);
        if !self.type_url.is_empty() {
            prost::encoding::string::encode(4, &self.type_url, buf);
        }
        if !self.nonce.is_empty() {
            prost::encoding::string::encode(5, &self.nonce, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::string::merge(wire_type, &mut self.version_info, buf, ctx),
            2 => prost::encoding::message::merge_repeated(wire_type, &mut self.resources, buf, ctx),
            4 => prost::encoding::string::merge(wire_type, &mut self.type_url, buf, ctx),
            5 => prost::encoding::string::merge(wire_type, &mut self.nonce, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.version_info.is_empty() {
            len += prost::encoding::string::encoded_len(1, &self.version_info);
        }
        len += prost::encoding::message::encoded_len_repeated(2, &self.resources);
        if !self.type_url.is_empty() {
            len += prost::encoding::string::encoded_len(4, &self.type_url);
        }
        if !self.nonce.is_empty() {
            len += prost::encoding::string::encoded_len(5, &self.nonce);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// SocketAddress
// ============================================================================

/// SocketAddress.Protocol TCP.
pub const PROTOCOL_TCP: i32 = 0;

/// Wire-format SocketAddress matching envoy.config.core.v3.SocketAddress.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct SocketAddress {
    pub protocol: i32,   // field 1 (enum)
    pub address: String, // field 2
    pub port_value: u32, // field 3 (oneof port_specifier)
}

impl Message for SocketAddress {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if self.protocol != 0 {
            prost::encoding::int32::encode(1, &self.protocol, buf);
        }
        if !self.address.is_empty() {
            prost::encoding::string::encode(2, &self.address, buf);
        }
        // Oneof members are always present on the wire, zero included.
        prost::encoding::uint32::encode(3, &self.port_value, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::int32::merge(wire_type, &mut self.protocol, buf, ctx),
            2 => prost::encoding::string::merge(wire_type, &mut self.address, buf, ctx),
            3 => prost::encoding::uint32::merge(wire_type, &mut self.port_value, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if self.protocol != 0 {
            len += prost::encoding::int32::encoded_len(1, &self.protocol);
        }
        if !self.address.is_empty() {
            len += prost::encoding::string::encoded_len(2, &self.address);
        }
        len += prost::encoding::uint32::encoded_len(3, &self.port_value);
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Address
// ============================================================================

/// Wire-format Address matching envoy.config.core.v3.Address.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Address {
    pub socket_address: Option<SocketAddress>, // field 1 (oneof address)
}

impl Message for Address {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if let Some(ref socket_address) = self.socket_address {
            prost::encoding::message::encode(1, socket_address, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::message::merge(
                wire_type,
                self.socket_address.get_or_insert_with(SocketAddress::default),
                buf,
                ctx,
            ),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.socket_address
            .as_ref()
            .map(|socket_address| prost::encoding::message::encoded_len(1, socket_address))
            .unwrap_or(0)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Endpoint / LbEndpoint / LocalityLbEndpoints
// ============================================================================

/// Wire-format Endpoint matching envoy.config.endpoint.v3.Endpoint.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Endpoint {
    pub address: Option<Address>, // field 1
}

impl Message for Endpoint {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if let Some(ref address) = self.address {
            prost::encoding::message::encode(1, address, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::message::merge(
                wire_type,
                self.address.get_or_insert_with(Address::default),
                buf,
                ctx,
            ),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.address
            .as_ref()
            .map(|address| prost::encoding::message::encoded_len(1, address))
            .unwrap_or(0)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Wire-format LbEndpoint matching envoy.config.endpoint.v3.LbEndpoint.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct LbEndpoint {
    pub endpoint: Option<Endpoint>, // field 1 (oneof host_identifier)
}

impl Message for LbEndpoint {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if let Some(ref endpoint) = self.endpoint {
            prost::encoding::message::encode(1, endpoint, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::message::merge(
                wire_type,
                self.endpoint.get_or_insert_with(Endpoint::default),
                buf,
                ctx,
            ),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.endpoint
            .as_ref()
            .map(|endpoint| prost::encoding::message::encoded_len(1, endpoint))
            .unwrap_or(0)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Wire-format LocalityLbEndpoints matching envoy.config.endpoint.v3.LocalityLbEndpoints.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct LocalityLbEndpoints {
    pub lb_endpoints: Vec<LbEndpoint>, // field 2
}

impl Message for LocalityLbEndpoints {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        prost::encoding::message::encode_repeated(2, &self.lb_endpoints, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            2 => prost::encoding::message::merge_repeated(
                wire_type,
                &mut self.lb_endpoints,
                buf,
                ctx,
            ),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        prost::encoding::message::encoded_len_repeated(2, &self.lb_endpoints)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// ClusterLoadAssignment
// ============================================================================

/// Wire-format ClusterLoadAssignment matching envoy.config.endpoint.v3.ClusterLoadAssignment.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct ClusterLoadAssignment {
    pub cluster_name: String,                // field 1
    pub endpoints: Vec<LocalityLbEndpoints>, // field 2
}

impl ClusterLoadAssignment {
    /// Build the EDS resource for a snapshot.
    ///
    /// Every address becomes its own `LocalityLbEndpoints` holding a single
    /// TCP `LbEndpoint`, in snapshot order.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let endpoints = snapshot
            .endpoints()
            .iter()
            .map(|addr| LocalityLbEndpoints {
                lb_endpoints: vec![LbEndpoint {
                    endpoint: Some(Endpoint {
                        address: Some(Address {
                            socket_address: Some(SocketAddress {
                                protocol: PROTOCOL_TCP,
                                address: addr.host().to_string(),
                                port_value: u32::from(addr.port()),
                            }),
                        }),
                    }),
                }],
            })
            .collect();

        Self {
            cluster_name: snapshot.service_name().to_string(),
            endpoints,
        }
    }

    /// `host:port` pairs in wire order, for logging and tests.
    pub fn socket_addresses(&self) -> Vec<(String, u32)> {
        self.endpoints
            .iter()
            .flat_map(|locality| locality.lb_endpoints.iter())
            .filter_map(|lb| lb.endpoint.as_ref())
            .filter_map(|endpoint| endpoint.address.as_ref())
            .filter_map(|address| address.socket_address.as_ref())
            .map(|socket| (socket.address.clone(), socket.port_value))
            .collect()
    }
}

impl Message for ClusterLoadAssignment {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if !self.cluster_name.is_empty() {
            prost::encoding::string::encode(1, &self.cluster_name, buf);
        }
        prost::encoding::message::encode_repeated(2, &self.endpoints, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::string::merge(wire_type, &mut self.cluster_name, buf, ctx),
            2 => prost::encoding::message::merge_repeated(wire_type, &mut self.endpoints, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.cluster_name.is_empty() {
            len += prost::encoding::string::encoded_len(1, &self.cluster_name);
        }
        len += prost::encoding::message::encoded_len_repeated(2, &self.endpoints);
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::address::EndpointAddress;
    use crate::control::snapshot::{SnapshotBuilder, SnapshotVersion};

    #[test]
    fn test_discovery_request_decode() {
        let req = DiscoveryRequest {
            version_info: "3".to_string(),
            node: Some(Node {
                id: "envoy-1".to_string(),
                cluster: "mycluster".to_string(),
                user_agent_name: "envoy".to_string(),
            }),
            resource_names: vec!["myservice".to_string()],
            type_url: CLUSTER_LOAD_ASSIGNMENT_TYPE_URL.to_string(),
            response_nonce: "7".to_string(),
            error_detail: None,
        };

        let decoded = DiscoveryRequest::decode(req.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, req);
        assert_eq!(decoded.node_id(), Some("envoy-1"));
    }

    #[test]
    fn test_node_id_missing_or_empty() {
        assert_eq!(DiscoveryRequest::default().node_id(), None);
        let req = DiscoveryRequest {
            node: Some(Node::default()),
            ..Default::default()
        };
        assert_eq!(req.node_id(), None);
    }

    #[test]
    fn test_cluster_load_assignment_from_snapshot() {
        let endpoints = [
            EndpointAddress::parse("10.0.0.1:9000").unwrap(),
            EndpointAddress::parse("[::1]:0").unwrap(),
        ];
        let snapshot = SnapshotBuilder::build(SnapshotVersion::new(1), "myservice", &endpoints);

        let cla = ClusterLoadAssignment::from_snapshot(&snapshot);
        assert_eq!(cla.cluster_name, "myservice");
        assert_eq!(cla.endpoints.len(), 2);
        assert!(cla.endpoints.iter().all(|l| l.lb_endpoints.len() == 1));

        // Port zero must survive the oneof encoding.
        let decoded = ClusterLoadAssignment::decode(cla.encode_to_vec().as_slice()).unwrap();
        assert_eq!(
            decoded.socket_addresses(),
            vec![("10.0.0.1".to_string(), 9000), ("::1".to_string(), 0)]
        );
    }

    #[test]
    fn test_response_with_packed_resource() {
        let snapshot = SnapshotBuilder::build(
            SnapshotVersion::new(2),
            "myservice",
            &[EndpointAddress::parse("10.0.0.2:9000").unwrap()],
        );
        let cla = ClusterLoadAssignment::from_snapshot(&snapshot);
        let resp = DiscoveryResponse {
            version_info: "2".to_string(),
            resources: vec![Any::pack(CLUSTER_LOAD_ASSIGNMENT_TYPE_URL, &cla)],
            type_url: CLUSTER_LOAD_ASSIGNMENT_TYPE_URL.to_string(),
            nonce: "1".to_string(),
        };

        let decoded = DiscoveryResponse::decode(resp.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.resources.len(), 1);
        assert_eq!(decoded.resources[0].type_url, CLUSTER_LOAD_ASSIGNMENT_TYPE_URL);
        let inner = ClusterLoadAssignment::decode(decoded.resources[0].value.as_slice()).unwrap();
        assert_eq!(inner, cla);
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        // Field 3 (metadata) of Node is not modelled.
        let mut buf = Vec::new();
        prost::encoding::string::encode(1, &"envoy-1".to_string(), &mut buf);
        prost::encoding::bytes::encode(3, &vec![1u8, 2, 3], &mut buf);
        let node = Node::decode(buf.as_slice()).unwrap();
        assert_eq!(node.id, "envoy-1");
    }
}
