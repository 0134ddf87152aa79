//! ReceivePipeline: background task turning inbound datagrams into a stream.
//!
//! # How it works (for beginners)
//!
//! ```text
//!   UdpSocket (Arc clone)
//!        │ recv_from (64 KiB buffer)
//!        ▼
//!   receive task ── Ok(ReceivedPacket) / Err(ReceiveError) ──► unbounded mpsc
//!        ▲                                                         │
//!        │ oneshot stop signal                                     ▼
//!   ReceivePipeline handle                                   PacketStream
//! ```
//!
//! The task waits on two things at once with `tokio::select!`: the next
//! datagram and the stop signal.  Firing the stop signal therefore aborts a
//! pending receive immediately instead of waiting for one more packet.
//!
//! The queue is unbounded: a consumer that stops pulling lets packets pile
//! up in memory.  Pull from the stream or stop the pipeline.
//!
//! When the pipeline stops, the task exits and drops its sender, so the
//! consumer's stream ends after the packets already queued.

use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use udp_trigger_core::{EndpointConfig, ReceiveError, ReceivedPacket, TransportError};

use super::endpoint::Endpoint;

/// Largest datagram the receive loop accepts in one read.
pub const MAX_DATAGRAM_BYTES: usize = 65_535;

/// One item of the packet stream.
pub type PacketResult = Result<ReceivedPacket, ReceiveError>;

/// Handle to a running receive loop.
///
/// Dropping the handle stops the loop.
#[derive(Debug)]
pub struct ReceivePipeline {
    stop_tx: Option<oneshot::Sender<()>>,
    stopping: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
    /// Set only by [`bind`](Self::bind): the endpoint the pipeline owns.
    owned_endpoint: Option<Endpoint>,
}

impl ReceivePipeline {
    /// Starts a receive loop on `socket` and returns the handle together
    /// with the consumer's stream.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(socket: Arc<UdpSocket>) -> (Self, PacketStream) {
        let (packet_tx, packet_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let stopping = Arc::new(AtomicBool::new(false));
        let local_addr = socket.local_addr().ok();

        let task = tokio::spawn(receive_loop(
            socket,
            packet_tx,
            stop_rx,
            Arc::clone(&stopping),
        ));

        match local_addr {
            Some(addr) => info!("receive pipeline started on {addr}"),
            None => info!("receive pipeline started"),
        }

        let pipeline = Self {
            stop_tx: Some(stop_tx),
            stopping,
            task: Some(task),
            local_addr,
            owned_endpoint: None,
        };
        (pipeline, PacketStream { rx: packet_rx })
    }

    /// Opens a dedicated listen socket on `port` and starts receiving on it.
    ///
    /// `bind_addr` defaults to all interfaces.  The socket is released by
    /// [`shutdown`](Self::shutdown).
    ///
    /// # Errors
    ///
    /// - [`TransportError::Configuration`] for port 0.
    /// - [`TransportError::Resource`] if the port cannot be bound.
    pub async fn bind(
        port: u16,
        bind_addr: Option<IpAddr>,
    ) -> Result<(Self, PacketStream), TransportError> {
        let endpoint = Endpoint::new();
        endpoint.open(EndpointConfig::listen(port, bind_addr)).await?;
        let socket = endpoint
            .udp_socket()
            .await
            .ok_or(TransportError::NotInitialized)?;

        let (mut pipeline, stream) = Self::spawn(socket);
        pipeline.owned_endpoint = Some(endpoint);
        Ok((pipeline, stream))
    }

    /// Local address the loop is reading from.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// True until [`stop`](Self::stop) has been called.
    pub fn is_running(&self) -> bool {
        !self.stopping.load(Ordering::Acquire)
    }

    /// Signals the loop to exit.  Returns immediately; a pending receive is
    /// aborted.  Calling it again is a no-op.
    pub fn stop(&mut self) {
        self.stopping.store(true, Ordering::Release);
        if let Some(tx) = self.stop_tx.take() {
            // The task may already have exited; nothing to signal then.
            let _ = tx.send(());
            debug!("receive pipeline stop requested");
        }
    }

    /// Stops the loop and waits for the task to finish, so its socket
    /// clone is dropped before this returns.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("receive task ended abnormally: {e}");
            }
        }
        if let Some(endpoint) = self.owned_endpoint.take() {
            endpoint.close().await;
        }
        info!("receive pipeline stopped");
    }
}

impl Drop for ReceivePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn receive_loop(
    socket: Arc<UdpSocket>,
    packets: mpsc::UnboundedSender<PacketResult>,
    mut stop_rx: oneshot::Receiver<()>,
    stopping: Arc<AtomicBool>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];

    loop {
        let received = tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            r = socket.recv_from(&mut buf) => r,
        };

        let item = match received {
            Ok((len, source)) => Ok(ReceivedPacket::new(buf[..len].to_vec(), source)),
            Err(e) => {
                if stopping.load(Ordering::Acquire) {
                    break;
                }
                warn!("receive error: {e}");
                Err(ReceiveError::from(e))
            }
        };

        if packets.send(item).is_err() {
            debug!("packet stream dropped, stopping receive loop");
            break;
        }
    }
}

/// Consumer side of a [`ReceivePipeline`].
///
/// Pull with [`next_packet`](Self::next_packet) or through the
/// `futures_util::Stream` implementation.  Ends once the pipeline stops and
/// the queued packets are drained.
#[derive(Debug)]
pub struct PacketStream {
    rx: mpsc::UnboundedReceiver<PacketResult>,
}

impl PacketStream {
    /// Waits for the next packet or error.  `None` means the stream ended.
    pub async fn next_packet(&mut self) -> Option<PacketResult> {
        self.rx.recv().await
    }
}

impl Stream for PacketStream {
    type Item = PacketResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
