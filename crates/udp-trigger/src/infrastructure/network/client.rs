//! TransportClient: the per-connection façade callers hold.
//!
//! A `TransportClient` owns one [`Endpoint`] and, while listening, one
//! [`ReceivePipeline`].  It adds the mode-specific `initialize_*` helpers,
//! ties the pipeline's lifetime to the endpoint's, and implements the
//! application layer's [`DatagramTransmitter`] trait so the dispatcher can
//! drive it.
//!
//! # State machine
//!
//! ```text
//!                 initialize_*                      close
//! Uninitialized ───────────────► Initialized(mode) ───────► Closed
//!                                  │      ▲                   │
//!                                  └──────┘                   │
//!                             initialize_* (closes first)     │
//!                                         ▲                   │
//!                                         └───initialize_*────┘
//! ```
//!
//! # Sharing
//!
//! The safe-path methods take `&self`, so an `Arc<TransportClient>` can be
//! handed to as many tasks as needed.  The fast-path methods take
//! `&mut self`: hold the client directly (not behind an `Arc`) in the one
//! task that owns the latency-critical input.

use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use udp_trigger_core::{EndpointConfig, SendMode, SendStamp, TransportError};

use super::endpoint::{resolve_target, Endpoint, Lifecycle};
use super::receiver::{PacketStream, ReceivePipeline};
use crate::application::dispatch_targets::DatagramTransmitter;

/// One transport connection: endpoint plus optional receive pipeline.
#[derive(Debug, Default)]
pub struct TransportClient {
    endpoint: Endpoint,
    listener: Mutex<Option<ReceivePipeline>>,
}

impl TransportClient {
    /// Creates an uninitialized client.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Initialization ───────────────────────────────────────────────────────

    /// Opens a unicast UDP endpoint to `host:port`.
    pub async fn initialize(&self, host: &str, port: u16) -> Result<SocketAddr, TransportError> {
        self.initialize_with(EndpointConfig::unicast(host, port)).await
    }

    /// Opens a broadcast endpoint (`SO_BROADCAST` enabled).
    pub async fn initialize_broadcast(
        &self,
        host: &str,
        port: u16,
    ) -> Result<SocketAddr, TransportError> {
        self.initialize_with(EndpointConfig::broadcast(host, port))
            .await
    }

    /// Opens a multicast sender for `group:port` with hop limit `ttl`.
    pub async fn initialize_multicast(
        &self,
        group: &str,
        port: u16,
        ttl: u32,
    ) -> Result<SocketAddr, TransportError> {
        self.initialize_with(EndpointConfig::multicast(group, port, ttl))
            .await
    }

    /// Binds a listen socket on `port` (all interfaces unless `bind_addr`
    /// is given).  Call [`start_listening`](Self::start_listening) next.
    pub async fn initialize_listen(
        &self,
        port: u16,
        bind_addr: Option<IpAddr>,
    ) -> Result<SocketAddr, TransportError> {
        self.initialize_with(EndpointConfig::listen(port, bind_addr))
            .await
    }

    /// General form: opens an endpoint from a full config (e.g. TCP).
    ///
    /// Any receive pipeline from a previous initialization is stopped
    /// first.  Returns the local address of the new socket.
    pub async fn initialize_with(
        &self,
        config: EndpointConfig,
    ) -> Result<SocketAddr, TransportError> {
        config.validate()?;
        self.shutdown_listener().await;
        self.endpoint.open(config).await
    }

    // ── Sending ──────────────────────────────────────────────────────────────

    /// Safe path to the configured destination.
    pub async fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        self.endpoint.send_safe(payload).await
    }

    /// Fast path to the configured destination.  See [`Endpoint`] for the
    /// single-writer contract.  Returns [`SendStamp::FAILED`] on any failure.
    pub fn send_fast(&mut self, payload: &[u8]) -> SendStamp {
        self.endpoint.send_fast(payload)
    }

    /// Fast path with a structured error instead of the sentinel.
    pub fn try_send_fast(&mut self, payload: &[u8]) -> Result<u64, TransportError> {
        self.endpoint.try_send_fast(payload)
    }

    /// Safe path to an explicit address, e.g. replying to a packet's source.
    pub async fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<(), TransportError> {
        self.endpoint.send_safe_to(payload, target).await
    }

    /// Safe path to `host:port`, resolving `host` first.
    pub async fn send_to_host(
        &self,
        payload: &[u8],
        host: &str,
        port: u16,
    ) -> Result<(), TransportError> {
        if !matches!(self.endpoint.lifecycle().await, Lifecycle::Initialized(_)) {
            return Err(TransportError::NotInitialized);
        }
        let target = resolve_target(host, port).await?;
        self.endpoint.send_safe_to(payload, target).await
    }

    // ── Listening ────────────────────────────────────────────────────────────

    /// Starts the receive pipeline on the listen socket and returns a fresh
    /// packet stream.  A pipeline that is already running is replaced, and
    /// its stream ends.
    ///
    /// # Errors
    ///
    /// [`TransportError::NotInitialized`] unless the client was initialized
    /// in listen mode.
    pub async fn start_listening(&self) -> Result<PacketStream, TransportError> {
        if self.endpoint.lifecycle().await != Lifecycle::Initialized(SendMode::Listen) {
            return Err(TransportError::NotInitialized);
        }
        let socket = self
            .endpoint
            .udp_socket()
            .await
            .ok_or(TransportError::NotInitialized)?;

        let (pipeline, stream) = ReceivePipeline::spawn(socket);
        let previous = self.listener.lock().await.replace(pipeline);
        if let Some(previous) = previous {
            debug!("replacing running receive pipeline");
            previous.shutdown().await;
        }
        Ok(stream)
    }

    /// Stops the receive pipeline and closes the listen socket.
    ///
    /// A no-op when not listening.
    pub async fn stop_listening(&self) {
        if self.shutdown_listener().await {
            self.endpoint.close().await;
        }
    }

    /// True while a receive pipeline is running.
    pub async fn is_listening(&self) -> bool {
        self.listener.lock().await.is_some()
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Stops listening, then releases the socket.  Closing twice is a no-op.
    pub async fn close(&self) {
        self.shutdown_listener().await;
        self.endpoint.close().await;
        info!("transport client closed");
    }

    /// Blocking close for callers that are not async (e.g. a `Drop` impl on
    /// a UI component).  The receive task is signalled but not awaited.
    ///
    /// Inside a Tokio runtime it never blocks: a lock that is busy right
    /// now is skipped with a warning.  Prefer [`close`](Self::close) there.
    pub fn close_sync(&self) {
        let pipeline = if tokio::runtime::Handle::try_current().is_ok() {
            match self.listener.try_lock() {
                Ok(mut listener) => listener.take(),
                Err(_) => {
                    warn!("close_sync inside a runtime found the listener busy; use close().await");
                    None
                }
            }
        } else {
            self.listener.blocking_lock().take()
        };
        if let Some(mut pipeline) = pipeline {
            pipeline.stop();
        }
        self.endpoint.close_blocking();
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> Lifecycle {
        self.endpoint.lifecycle().await
    }

    /// Local address of the open socket, if any.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.endpoint.local_addr().await
    }

    /// Current fast-path buffer capacity.
    pub fn send_buffer_capacity(&mut self) -> usize {
        self.endpoint.send_buffer_capacity()
    }

    /// Number of fast-path buffer allocations so far.
    pub fn send_buffer_allocations(&mut self) -> u64 {
        self.endpoint.send_buffer_allocations()
    }

    /// Shuts the pipeline down and waits for it.  Returns whether one ran.
    async fn shutdown_listener(&self) -> bool {
        let pipeline = self.listener.lock().await.take();
        match pipeline {
            Some(pipeline) => {
                pipeline.shutdown().await;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl DatagramTransmitter for TransportClient {
    async fn send_to_host(
        &self,
        payload: &[u8],
        host: &str,
        port: u16,
    ) -> Result<(), TransportError> {
        TransportClient::send_to_host(self, payload, host, port).await
    }

    fn send_fast_to(&mut self, payload: &[u8], addr: SocketAddr) -> SendStamp {
        self.endpoint.send_fast_to(payload, addr)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
