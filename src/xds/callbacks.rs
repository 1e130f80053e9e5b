//! Discovery server callbacks.
//!
//! The server reports stream lifecycle and request events here. Besides
//! counting, the callbacks own the first-request hook the runtime uses to
//! open the readiness gate.

use super::proto::{DiscoveryRequest, DiscoveryResponse};
use parking_lot::Mutex;
use serde::Serialize;

type FirstRequestHook = Box<dyn FnOnce() + Send>;

/// Event counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallbackCounters {
    pub streams_opened: u64,
    pub streams_closed: u64,
    pub requests: u64,
    pub responses: u64,
    pub fetches: u64,
}

#[derive(Default)]
struct CallbackState {
    counters: CallbackCounters,
    first_request_seen: bool,
    hook: Option<FirstRequestHook>,
}

/// Counters and hooks invoked by the discovery server.
#[derive(Default)]
pub struct DiscoveryCallbacks {
    state: Mutex<CallbackState>,
}

impl DiscoveryCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the hook run on the first stream or fetch request.
    ///
    /// Runs exactly once. If a request was already seen, the hook runs now.
    pub fn on_first_request(&self, hook: impl FnOnce() + Send + 'static) {
        let mut state = self.state.lock();
        if state.first_request_seen {
            drop(state);
            hook();
        } else {
            state.hook = Some(Box::new(hook));
        }
    }

    pub fn on_stream_open(&self, stream_id: u64, type_url: &str) {
        self.state.lock().counters.streams_opened += 1;
        tracing::debug!(stream_id, type_url, "discovery stream opened");
    }

    pub fn on_stream_closed(&self, stream_id: u64) {
        self.state.lock().counters.streams_closed += 1;
        tracing::debug!(stream_id, "discovery stream closed");
    }

    pub fn on_stream_request(&self, stream_id: u64, request: &DiscoveryRequest) {
        let hook = {
            let mut state = self.state.lock();
            state.counters.requests += 1;
            Self::take_first_request_hook(&mut state)
        };
        tracing::debug!(
            stream_id,
            node_id = request.node_id().unwrap_or(""),
            version_info = %request.version_info,
            nonce = %request.response_nonce,
            "stream request"
        );
        if let Some(hook) = hook {
            hook();
        }
    }

    pub fn on_stream_response(&self, stream_id: u64, response: &DiscoveryResponse) {
        self.state.lock().counters.responses += 1;
        tracing::debug!(
            stream_id,
            version = %response.version_info,
            nonce = %response.nonce,
            resources = response.resources.len(),
            "stream response"
        );
        self.report();
    }

    pub fn on_fetch_request(&self, request: &DiscoveryRequest) {
        let hook = {
            let mut state = self.state.lock();
            state.counters.fetches += 1;
            Self::take_first_request_hook(&mut state)
        };
        tracing::debug!(
            node_id = request.node_id().unwrap_or(""),
            version_info = %request.version_info,
            "fetch request"
        );
        if let Some(hook) = hook {
            hook();
        }
    }

    pub fn on_fetch_response(&self, response: &DiscoveryResponse) {
        tracing::debug!(
            version = %response.version_info,
            resources = response.resources.len(),
            "fetch response"
        );
    }

    /// Whether any stream or fetch request has arrived.
    pub fn first_request_seen(&self) -> bool {
        self.state.lock().first_request_seen
    }

    pub fn counters(&self) -> CallbackCounters {
        self.state.lock().counters
    }

    /// Log the current counters.
    pub fn report(&self) {
        let counters = self.counters();
        tracing::info!(
            fetches = counters.fetches,
            requests = counters.requests,
            responses = counters.responses,
            streams_opened = counters.streams_opened,
            streams_closed = counters.streams_closed,
            "discovery callbacks report"
        );
    }

    fn take_first_request_hook(state: &mut CallbackState) -> Option<FirstRequestHook> {
        if state.first_request_seen {
            return None;
        }
        state.first_request_seen = true;
        state.hook.take()
    }
}

impl std::fmt::Debug for DiscoveryCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DiscoveryCallbacks")
            .field("counters", &state.counters)
            .field("first_request_seen", &state.first_request_seen)
            .finish()
    }
}
