//! Endpoint address parsing.
//!
//! Addresses arrive from the admin API and the config file as a single
//! `host:port` string. Parsing is a precondition of registry mutation: the
//! registry only ever holds validated [`EndpointAddress`] values.

use crate::core::error::{AddressParseReason, BeaconError, BeaconResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A validated (host, port) pair.
///
/// Equality follows the normalized string form, so `"10.0.0.1:09000"` and
/// `"10.0.0.1:9000"` are the same endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointAddress {
    host: String,
    port: u16,
}

impl EndpointAddress {
    /// Create an address from parts. The host must be non-empty.
    pub fn new(host: impl Into<String>, port: u16) -> BeaconResult<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(BeaconError::address_parse(
                format!(":{}", port),
                AddressParseReason::EmptyHost,
            ));
        }
        Ok(Self { host, port })
    }

    /// Parse a `host:port` string. IPv6 hosts must be bracketed.
    pub fn parse(input: &str) -> BeaconResult<Self> {
        let (host, port) =
            split_host_port(input).map_err(|reason| BeaconError::address_parse(input, reason))?;

        if host.is_empty() {
            return Err(BeaconError::address_parse(
                input,
                AddressParseReason::EmptyHost,
            ));
        }

        let port = parse_port(port)
            .ok_or_else(|| BeaconError::address_parse(input, AddressParseReason::InvalidPort))?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Host name or IP literal, without brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port number.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the host is an IPv6 literal.
    pub fn is_ipv6(&self) -> bool {
        self.host.contains(':')
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ipv6() {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for EndpointAddress {
    type Err = BeaconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EndpointAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Split `host:port` at the last colon, unwrapping a bracketed host.
fn split_host_port(input: &str) -> Result<(&str, &str), AddressParseReason> {
    if input.starts_with('[') && input.ends_with(']') {
        return Err(AddressParseReason::MissingPort);
    }

    let colon = input.rfind(':').ok_or(AddressParseReason::MissingPort)?;
    let (host_part, port) = (&input[..colon], &input[colon + 1..]);

    let host = if let Some(rest) = host_part.strip_prefix('[') {
        let inner = rest
            .strip_suffix(']')
            .ok_or(AddressParseReason::MismatchedBrackets)?;
        if inner.contains(['[', ']']) {
            return Err(AddressParseReason::MismatchedBrackets);
        }
        inner
    } else {
        if host_part.contains(':') {
            return Err(AddressParseReason::TooManyColons);
        }
        if host_part.contains(['[', ']']) {
            return Err(AddressParseReason::MismatchedBrackets);
        }
        host_part
    };

    Ok((host, port))
}

fn parse_port(port: &str) -> Option<u16> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    port.parse::<u16>().ok()
}
