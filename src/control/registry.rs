//! Endpoint registry.
//!
//! The registry is the source of truth the reconciliation loop derives
//! snapshots from. It is an insertion-ordered set of [`EndpointAddress`]
//! guarded by a single mutex: admin handlers mutate it, the loop copies it
//! once per tick.

use super::address::EndpointAddress;
use parking_lot::Mutex;

/// Outcome of [`EndpointRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The address was appended.
    Added,
    /// The address was already registered; nothing changed.
    AlreadyPresent,
}

impl Registration {
    /// Whether the address was already registered.
    pub fn already_present(&self) -> bool {
        matches!(self, Self::AlreadyPresent)
    }
}

/// Outcome of [`EndpointRegistry::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deregistration {
    /// The address was removed.
    Removed,
    /// The address was not registered; nothing changed.
    NotPresent,
}

impl Deregistration {
    /// Whether anything was removed.
    pub fn removed(&self) -> bool {
        matches!(self, Self::Removed)
    }
}

/// Insertion-ordered set of registered endpoint addresses.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: Mutex<Vec<EndpointAddress>>,
}

impl EndpointRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the given addresses.
    ///
    /// Duplicates are collapsed, keeping the first occurrence.
    pub fn with_endpoints(endpoints: impl IntoIterator<Item = EndpointAddress>) -> Self {
        let registry = Self::new();
        for addr in endpoints {
            registry.add(addr);
        }
        registry
    }

    /// Register an address, appending it if not already present.
    pub fn add(&self, addr: EndpointAddress) -> Registration {
        let mut endpoints = self.endpoints.lock();
        if endpoints.contains(&addr) {
            return Registration::AlreadyPresent;
        }

        tracing::debug!(endpoint = %addr, count = endpoints.len() + 1, "endpoint registered");
        endpoints.push(addr);
        Registration::Added
    }

    /// Deregister an address.
    pub fn remove(&self, addr: &EndpointAddress) -> Deregistration {
        let mut endpoints = self.endpoints.lock();
        match endpoints.iter().position(|e| e == addr) {
            Some(index) => {
                endpoints.remove(index);
                tracing::debug!(endpoint = %addr, count = endpoints.len(), "endpoint deregistered");
                Deregistration::Removed
            }
            None => Deregistration::NotPresent,
        }
    }

    /// Point-in-time copy of the registered addresses, in insertion order.
    pub fn snapshot(&self) -> Vec<EndpointAddress> {
        self.endpoints.lock().clone()
    }

    /// Whether the address is registered.
    pub fn contains(&self, addr: &EndpointAddress) -> bool {
        self.endpoints.lock().contains(addr)
    }

    /// Number of registered addresses.
    pub fn len(&self) -> usize {
        self.endpoints.lock().len()
    }

    /// Whether no addresses are registered.
    pub fn is_empty(&self) -> bool {
        self.endpoints.lock().is_empty()
    }
}
