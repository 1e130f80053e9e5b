//! Error types and protocol-specific mapping.
//!
//! Beacon defines the error conditions of the registry-to-snapshot engine
//! and maps them onto the gRPC status codes served by the EDS listener and
//! the HTTP statuses served by the admin API.

use thiserror::Error;

/// Common Beacon error conditions.
#[derive(Debug, Error)]
pub enum BeaconError {
    /// Malformed `host:port` input from an admin caller or the config file.
    #[error("invalid endpoint address {input:?}: {reason}")]
    AddressParse {
        input: String,
        reason: AddressParseReason,
    },

    /// The delivery layer could not enumerate its connected nodes.
    ///
    /// The reconciliation loop treats this as "no known identities" for the
    /// current tick.
    #[error("client identity list unavailable: {message}")]
    IdentityListUnavailable { message: String },

    /// Publishing a snapshot for one node failed.
    #[error("failed to publish snapshot for node {node_id}: {message}")]
    PublishFailure { node_id: String, message: String },

    /// No snapshot has been published for the requesting node yet.
    #[error("no snapshot published for node {node_id}")]
    SnapshotUnavailable { node_id: String },

    /// The requesting node already holds the current snapshot version.
    #[error("skip fetch: version {version} up to date")]
    VersionUpToDate { version: String },

    /// Invalid discovery request.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Internal error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Why an endpoint address failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressParseReason {
    /// No `:port` suffix.
    MissingPort,
    /// Host part is empty.
    EmptyHost,
    /// Unbracketed host containing `:`.
    TooManyColons,
    /// `[` without a matching `]` (or stray brackets).
    MismatchedBrackets,
    /// Port is not a decimal integer in `0..=65535`.
    InvalidPort,
}

impl std::fmt::Display for AddressParseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPort => write!(f, "missing port in address"),
            Self::EmptyHost => write!(f, "missing host in address"),
            Self::TooManyColons => write!(f, "too many colons in address"),
            Self::MismatchedBrackets => write!(f, "mismatched brackets in address"),
            Self::InvalidPort => write!(f, "port must be an integer in 0..=65535"),
        }
    }
}

impl BeaconError {
    /// Create an AddressParse error for the given raw input.
    pub fn address_parse(input: impl Into<String>, reason: AddressParseReason) -> Self {
        Self::AddressParse {
            input: input.into(),
            reason,
        }
    }

    /// Create a PublishFailure error.
    pub fn publish_failure(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PublishFailure {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Create an InvalidRequest error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Check if this error was caused by caller input rather than server state.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::AddressParse { .. } | Self::InvalidRequest { .. }
        )
    }

    /// Check if the next reconciliation tick is expected to clear the condition.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::IdentityListUnavailable { .. }
                | Self::PublishFailure { .. }
                | Self::SnapshotUnavailable { .. }
                | Self::VersionUpToDate { .. }
        )
    }
}

/// Result type using BeaconError.
pub type BeaconResult<T> = Result<T, BeaconError>;

// ============================================================================
// Protocol-specific error mapping
// ============================================================================

/// gRPC status codes used by the EDS listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrpcCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

/// Error mapping for the EDS gRPC listener.
pub struct DiscoveryErrorMapping;

impl DiscoveryErrorMapping {
    /// Map a BeaconError to a gRPC status code.
    pub fn to_grpc_code(error: &BeaconError) -> GrpcCode {
        match error {
            BeaconError::AddressParse { .. } => GrpcCode::InvalidArgument,
            BeaconError::InvalidRequest { .. } => GrpcCode::InvalidArgument,
            BeaconError::IdentityListUnavailable { .. } => GrpcCode::Unavailable,
            BeaconError::PublishFailure { .. } => GrpcCode::Unavailable,
            BeaconError::SnapshotUnavailable { .. } => GrpcCode::Unavailable,
            BeaconError::VersionUpToDate { .. } => GrpcCode::Unavailable,
            BeaconError::Internal { .. } => GrpcCode::Internal,
        }
    }

    /// Convert a BeaconError into a tonic Status.
    pub fn to_status(error: &BeaconError) -> tonic::Status {
        let message = error.to_string();
        match Self::to_grpc_code(error) {
            GrpcCode::InvalidArgument => tonic::Status::invalid_argument(message),
            GrpcCode::Unavailable => tonic::Status::unavailable(message),
            _ => tonic::Status::internal(message),
        }
    }
}

/// Error mapping for the admin HTTP API.
pub struct AdminErrorMapping;

impl AdminErrorMapping {
    /// Map a BeaconError to an HTTP status code.
    pub fn to_http_status(error: &BeaconError) -> u16 {
        if error.is_caller_error() {
            400
        } else if error.is_retriable() {
            503
        } else {
            500
        }
    }
}
