//! Main runtime orchestration.
//!
//! The runtime coordinates component lifecycle:
//! - Start order: registry seed → snapshot cache and callbacks →
//!   reconciliation loop → EDS listener → admin listener
//! - Shutdown order: admin listener → EDS listener → reconciliation loop

use crate::admin::{AdminServer, AdminState};
use crate::control::gate::ReadinessGate;
use crate::control::reconcile::Reconciler;
use crate::control::registry::EndpointRegistry;
use crate::control::snapshot::VersionCounter;
use crate::control::store::SnapshotStore;
use crate::core::config::Config;
use crate::core::error::BeaconResult;
use crate::xds::cache::SnapshotCache;
use crate::xds::callbacks::DiscoveryCallbacks;
use crate::xds::server::{DiscoveryState, EdsServer};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

/// Join timeout applied to each task during shutdown.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Component health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentHealth {
    /// Component is starting.
    Starting,
    /// Component is healthy and operational.
    Healthy,
    /// Component has failed.
    Failed,
    /// Component is stopping.
    Stopping,
    /// Component has stopped.
    Stopped,
}

/// Health status aggregated from all components.
#[derive(Debug, Clone)]
pub struct RuntimeHealth {
    /// Endpoint registry.
    pub registry: ComponentHealth,
    /// Reconciliation loop.
    pub reconciler: ComponentHealth,
    /// EDS gRPC listener.
    pub discovery: ComponentHealth,
    /// Admin HTTP listener.
    pub admin: ComponentHealth,
}

impl Default for RuntimeHealth {
    fn default() -> Self {
        Self {
            registry: ComponentHealth::Starting,
            reconciler: ComponentHealth::Starting,
            discovery: ComponentHealth::Starting,
            admin: ComponentHealth::Starting,
        }
    }
}

impl RuntimeHealth {
    /// Check if every component is serving.
    pub fn is_ready(&self) -> bool {
        [self.registry, self.reconciler, self.discovery, self.admin]
            .iter()
            .all(|h| *h == ComponentHealth::Healthy)
    }

    /// Check if the runtime is alive (no component failed).
    pub fn is_alive(&self) -> bool {
        ![self.registry, self.reconciler, self.discovery, self.admin]
            .iter()
            .any(|h| *h == ComponentHealth::Failed)
    }
}

enum Exit {
    Interrupted,
    Requested,
    Discovery(Result<BeaconResult<()>, JoinError>),
    Admin(Result<BeaconResult<()>, JoinError>),
}

/// Beacon runtime holding all component handles.
pub struct Runtime {
    /// Configuration.
    config: Arc<Config>,

    /// Registered endpoints.
    registry: Arc<EndpointRegistry>,

    /// Opened by the first discovery request.
    gate: ReadinessGate,

    /// Process-wide snapshot versions.
    versions: Arc<VersionCounter>,

    /// Per-node snapshots served to Envoy.
    cache: Arc<SnapshotCache>,

    /// Discovery server callbacks.
    callbacks: Arc<DiscoveryCallbacks>,

    /// Reconciliation loop.
    reconciler: Arc<Reconciler>,

    /// Runtime health status.
    health: RuntimeHealth,

    /// Whether the runtime is running.
    running: Arc<AtomicBool>,

    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,

    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,

    /// Bound admin address, once listening.
    admin_addr: Option<SocketAddr>,

    reconcile_handle: Option<JoinHandle<()>>,
    discovery_handle: Option<JoinHandle<BeaconResult<()>>>,
    admin_handle: Option<JoinHandle<BeaconResult<()>>>,
}

impl Runtime {
    /// Create a new runtime with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let registry = Arc::new(EndpointRegistry::new());
        let gate = ReadinessGate::new();
        let versions = Arc::new(VersionCounter::new());
        let cache = Arc::new(SnapshotCache::new());
        let callbacks = Arc::new(DiscoveryCallbacks::new());
        let store: Arc<dyn SnapshotStore> = cache.clone();
        let reconciler = Arc::new(Reconciler::new(
            config.reconcile.to_reconcile_config(),
            registry.clone(),
            store,
            gate.clone(),
            versions.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            registry,
            gate,
            versions,
            cache,
            callbacks,
            reconciler,
            health: RuntimeHealth::default(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            shutdown_rx,
            admin_addr: None,
            reconcile_handle: None,
            discovery_handle: None,
            admin_handle: None,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the endpoint registry.
    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    /// Get the readiness gate.
    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    /// Get the version counter.
    pub fn versions(&self) -> &Arc<VersionCounter> {
        &self.versions
    }

    /// Get the snapshot cache.
    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// Get the discovery callbacks.
    pub fn callbacks(&self) -> &Arc<DiscoveryCallbacks> {
        &self.callbacks
    }

    /// Get the reconciliation loop.
    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    /// Address the admin listener is bound to, once started.
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_addr
    }

    /// Get the current health status.
    pub fn health(&self) -> &RuntimeHealth {
        &self.health
    }

    /// Check if the runtime is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Get a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Shared state for the admin API.
    pub fn admin_state(&self) -> AdminState {
        AdminState {
            registry: self.registry.clone(),
            gate: self.gate.clone(),
            cache: self.cache.clone(),
            callbacks: self.callbacks.clone(),
            reconciler: self.reconciler.clone(),
        }
    }

    /// Shared state for the EDS service.
    pub fn discovery_state(&self) -> DiscoveryState {
        DiscoveryState::new(
            self.cache.clone(),
            self.callbacks.clone(),
            self.shutdown_rx.clone(),
        )
    }

    /// Initialize and start all runtime components.
    ///
    /// Components are started in order:
    /// 1. Endpoint registry (seeded from configuration)
    /// 2. Snapshot cache and discovery callbacks
    /// 3. Reconciliation loop
    /// 4. EDS listener
    /// 5. Admin listener
    pub async fn start(&mut self) -> Result<()> {
        tracing::info!(
            service = %self.config.reconcile.service_name,
            discovery = %self.config.discovery.bind,
            admin = %self.config.admin.bind,
            "starting Beacon runtime"
        );

        if let Err(e) = self.start_components().await {
            tracing::error!(error = %e, "startup failed; stopping started components");
            self.stop().await?;
            return Err(e);
        }

        self.running.store(true, Ordering::Release);
        tracing::info!("Beacon runtime started");
        Ok(())
    }

    async fn start_components(&mut self) -> Result<()> {
        self.init_core()?;
        self.start_discovery()?;
        self.start_admin().await
    }

    fn init_core(&mut self) -> Result<()> {
        self.init_registry()?;
        self.init_delivery();
        self.start_reconciler();
        Ok(())
    }

    /// Seed the registry from configuration.
    fn init_registry(&mut self) -> Result<()> {
        tracing::debug!("seeding endpoint registry");

        for addr in self.config.seed_endpoints()? {
            self.registry.add(addr);
        }
        self.health.registry = ComponentHealth::Healthy;

        tracing::info!(endpoints = self.registry.len(), "endpoint registry initialized");
        Ok(())
    }

    /// Wire the first-request hook to the readiness gate.
    fn init_delivery(&mut self) {
        let gate = self.gate.clone();
        self.callbacks.on_first_request(move || {
            gate.signal();
        });
        tracing::debug!("discovery callbacks wired to readiness gate");
    }

    fn start_reconciler(&mut self) {
        let reconciler = self.reconciler.clone();
        let shutdown_rx = self.shutdown_rx.clone();
        self.reconcile_handle = Some(tokio::spawn(async move {
            reconciler.run(shutdown_rx).await;
        }));
        self.health.reconciler = ComponentHealth::Healthy;
    }

    fn start_discovery(&mut self) -> Result<()> {
        let bind_addr = self
            .config
            .discovery_addr()
            .context("invalid discovery bind address")?;
        let server = EdsServer::new(
            bind_addr,
            self.config.discovery.max_concurrent_streams,
            self.discovery_state(),
        );

        self.discovery_handle = Some(tokio::spawn(async move { server.run().await }));
        self.health.discovery = ComponentHealth::Healthy;
        tracing::info!(bind = %bind_addr, "EDS listener started");
        Ok(())
    }

    async fn start_admin(&mut self) -> Result<()> {
        let bind_addr = self
            .config
            .admin_addr()
            .context("invalid admin bind address")?;
        let server = AdminServer::bind(bind_addr, self.admin_state(), self.shutdown_rx.clone())
            .await
            .context("failed to start admin listener")?;
        self.admin_addr = Some(server.local_addr()?);

        self.admin_handle = Some(tokio::spawn(async move { server.run().await }));
        self.health.admin = ComponentHealth::Healthy;
        tracing::info!(bind = %bind_addr, "admin listener started");
        Ok(())
    }

    /// Trigger graceful shutdown.
    pub fn shutdown(&self) {
        tracing::info!("shutdown requested");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for shutdown signal.
    pub async fn wait_for_shutdown(&self) {
        wait_for_signal(&mut self.shutdown_rx.clone()).await;
    }

    /// Run the runtime until ctrl-c, a shutdown request, or a listener failure.
    pub async fn run(&mut self) -> Result<()> {
        self.start().await?;

        let mut shutdown_rx = self.shutdown_rx.clone();
        let exit = tokio::select! {
            _ = tokio::signal::ctrl_c() => Exit::Interrupted,
            _ = wait_for_signal(&mut shutdown_rx) => Exit::Requested,
            result = watch_task(self.discovery_handle.as_mut()) => Exit::Discovery(result),
            result = watch_task(self.admin_handle.as_mut()) => Exit::Admin(result),
        };

        match exit {
            Exit::Interrupted => tracing::warn!("shutdown signal received (SIGINT)"),
            Exit::Requested => tracing::info!("shutdown requested by component"),
            Exit::Discovery(result) => {
                self.discovery_handle = None;
                self.health.discovery = log_listener_exit("EDS listener", result);
            }
            Exit::Admin(result) => {
                self.admin_handle = None;
                self.health.admin = log_listener_exit("admin listener", result);
            }
        }

        self.stop().await?;
        Ok(())
    }

    /// Stop all runtime components.
    ///
    /// Components are stopped in reverse order:
    /// 1. Admin listener
    /// 2. EDS listener
    /// 3. Reconciliation loop
    pub async fn stop(&mut self) -> Result<()> {
        tracing::info!("stopping Beacon runtime");
        self.running.store(false, Ordering::Release);

        // Signal shutdown to all components
        let _ = self.shutdown_tx.send(true);

        if let Some(handle) = self.admin_handle.take() {
            self.health.admin = ComponentHealth::Stopping;
            join_listener("admin listener", handle).await;
        }
        self.health.admin = ComponentHealth::Stopped;

        if let Some(handle) = self.discovery_handle.take() {
            self.health.discovery = ComponentHealth::Stopping;
            join_listener("EDS listener", handle).await;
        }
        self.health.discovery = ComponentHealth::Stopped;

        if let Some(handle) = self.reconcile_handle.take() {
            self.health.reconciler = ComponentHealth::Stopping;
            match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => tracing::info!("reconciliation loop stopped"),
                Ok(Err(e)) => tracing::warn!(error = %e, "reconciliation loop task panicked"),
                Err(_) => tracing::warn!("reconciliation loop stop timed out"),
            }
        }
        self.health.reconciler = ComponentHealth::Stopped;
        self.health.registry = ComponentHealth::Stopped;

        self.callbacks.report();
        tracing::info!(version = %self.versions.current(), "Beacon runtime stopped");
        Ok(())
    }

    /// Start the registry, delivery wiring and loop without listeners or
    /// signal handling.
    pub async fn start_for_tests(&mut self) -> Result<()> {
        self.init_core()?;
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    /// Stop the runtime for tests.
    pub async fn shutdown_for_tests(&mut self) -> Result<()> {
        self.stop().await
    }
}

async fn wait_for_signal(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

async fn watch_task(
    handle: Option<&mut JoinHandle<BeaconResult<()>>>,
) -> Result<BeaconResult<()>, JoinError> {
    match handle {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

fn log_listener_exit(name: &str, result: Result<BeaconResult<()>, JoinError>) -> ComponentHealth {
    match result {
        Ok(Ok(())) => {
            tracing::info!(listener = name, "listener stopped normally");
            ComponentHealth::Stopped
        }
        Ok(Err(e)) => {
            tracing::error!(listener = name, error = %e, "listener failed");
            ComponentHealth::Failed
        }
        Err(e) => {
            tracing::error!(listener = name, error = %e, "listener task panicked");
            ComponentHealth::Failed
        }
    }
}

async fn join_listener(name: &str, handle: JoinHandle<BeaconResult<()>>) {
    match tokio::time::timeout(STOP_TIMEOUT, handle).await {
        Ok(Ok(Ok(()))) => tracing::info!(listener = name, "listener stopped"),
        Ok(Ok(Err(e))) => tracing::warn!(listener = name, error = %e, "listener stopped with error"),
        Ok(Err(e)) => tracing::warn!(listener = name, error = %e, "listener task panicked"),
        Err(_) => tracing::warn!(listener = name, "listener stop timed out"),
    }
}
