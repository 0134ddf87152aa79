//! Endpoint: owns one socket and mediates every access to it.
//!
//! An [`Endpoint`] holds at most one live socket (UDP or TCP), the resolved
//! destination, and the reusable buffer of the fast send path.  All of that
//! lives behind a `tokio::sync::Mutex`.
//!
//! # Two send paths (for beginners)
//!
//! ```text
//!  send_safe(&self)             send_fast(&mut self)
//!  ─────────────────            ────────────────────
//!  lock().await                 Mutex::get_mut()   (no lock: &mut proves
//!  payload.to_vec()                                 nobody else holds it)
//!  socket.send_to().await       buffer.stage()     (reused allocation)
//!  unlock                       raw send_to()      (non-blocking syscall)
//! ```
//!
//! The safe path is what burst, scheduled, and reply sends use: any number
//! of tasks may call it through a shared `&Endpoint`, and the mutex
//! serializes them (and orders them against `close`).
//!
//! A safe send can stall while holding the lock, e.g. a TCP write to a
//! peer that stopped reading.  `close` and `open` therefore raise a close
//! signal before they queue for the lock.  An in-flight safe send races
//! its I/O against that signal and gives up with
//! [`TransportError::SendFailed`], so the lock is released and the close
//! goes through.
//!
//! The fast path is for a single input source such as a hardware key.  It
//! takes `&mut self`, so the compiler guarantees there is exactly one caller
//! at a time and no safe-path call can be in flight.  That single-writer
//! contract is what lets it skip both the lock and the allocation.  Do not
//! wrap an `Endpoint` in another mutex just to call `send_fast` from
//! several threads: route those callers to the safe path instead.
//!
//! # Socket duplication
//!
//! Each socket is opened as a non-blocking std socket and duplicated once:
//! one handle is registered with Tokio for the async safe path and the
//! receive loop, the other is kept raw so the fast path can issue a plain
//! non-blocking `send_to` that never waits for the reactor.  Both handles
//! are dropped together on `close`.

use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol as SockProtocol, Socket as RawSocket, Type};
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream, UdpSocket};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use udp_trigger_core::{
    clock::monotonic_nanos,
    domain::endpoint::{is_broadcast_address, is_ipv4_multicast},
    ConfigError, EndpointConfig, Protocol, SendBuffer, SendMode, SendStamp, TransportError,
};

/// Receive buffer requested for listen sockets.
pub const LISTEN_RECV_BUFFER_BYTES: usize = 256 * 1024;

/// Upper bound on a TCP connect during `open`.
pub const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle of an endpoint (and of the client wrapping it).
///
/// ```text
/// Uninitialized ──open──► Initialized(mode) ──close──► Closed
///                               ▲                        │
///                               └─────────open───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initialized(SendMode),
    Closed,
}

/// The two handles of a socket.  See the module docs.
#[derive(Debug)]
enum Socket {
    Udp {
        shared: Arc<UdpSocket>,
        raw: std::net::UdpSocket,
    },
    Tcp {
        stream: TcpStream,
        raw: std::net::TcpStream,
    },
}

#[derive(Debug)]
struct OpenSocket {
    config: EndpointConfig,
    socket: Socket,
    /// `None` for listen endpoints.
    destination: Option<SocketAddr>,
    local_addr: SocketAddr,
}

#[derive(Debug)]
struct Inner {
    lifecycle: Lifecycle,
    open: Option<OpenSocket>,
    send_buffer: SendBuffer,
}

/// Owner of one socket resource.
#[derive(Debug)]
pub struct Endpoint {
    inner: Mutex<Inner>,
    /// Number of `close`/`open` calls waiting for or holding the lock.
    closing: AtomicUsize,
    /// Bumped once per `close`/`open`; safe sends watch it while doing I/O.
    close_signal: watch::Sender<u64>,
}

/// Marks a close (or re-open) as pending until dropped.
struct PendingClose<'a> {
    closing: &'a AtomicUsize,
}

impl Drop for PendingClose<'_> {
    fn drop(&mut self) {
        self.closing.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Endpoint {
    /// Creates an endpoint with no socket.
    pub fn new() -> Self {
        let (close_signal, _) = watch::channel(0);
        Self {
            inner: Mutex::new(Inner {
                lifecycle: Lifecycle::Uninitialized,
                open: None,
                send_buffer: SendBuffer::new(),
            }),
            closing: AtomicUsize::new(0),
            close_signal,
        }
    }

    /// Raises the close signal.  Must be called before taking the lock.
    fn announce_close(&self) -> PendingClose<'_> {
        self.closing.fetch_add(1, Ordering::SeqCst);
        self.close_signal
            .send_modify(|generation| *generation = generation.wrapping_add(1));
        PendingClose {
            closing: &self.closing,
        }
    }

    fn close_pending(&self) -> bool {
        self.closing.load(Ordering::SeqCst) > 0
    }

    /// Validates `config`, releases any socket already open, and opens a
    /// new one.  Returns the local address the socket is bound to.
    ///
    /// A config that fails validation leaves the endpoint untouched.  A
    /// failure after validation (resolution, bind, connect) leaves it
    /// without a socket.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Configuration`] for invalid or unresolvable config.
    /// - [`TransportError::Resource`] if the OS refuses the socket.
    pub async fn open(&self, config: EndpointConfig) -> Result<SocketAddr, TransportError> {
        config.validate()?;

        let _pending = self.announce_close();
        let mut inner = self.inner.lock().await;
        if let Some(previous) = inner.open.take() {
            debug!(
                "re-initializing: releasing {} socket on {}",
                previous.config.mode, previous.local_addr
            );
            inner.lifecycle = Lifecycle::Closed;
        }

        let opened = open_socket(config).await?;
        let local_addr = opened.local_addr;
        info!(
            "opened {} {} endpoint on {local_addr}{}",
            opened.config.protocol,
            opened.config.mode,
            opened
                .destination
                .map(|d| format!(" → {d}"))
                .unwrap_or_default()
        );
        inner.lifecycle = Lifecycle::Initialized(opened.config.mode);
        inner.open = Some(opened);
        Ok(local_addr)
    }

    /// Releases the socket.  Closing a closed or never-opened endpoint is a
    /// no-op.
    ///
    /// A safe send stalled in I/O is aborted rather than waited for.
    pub async fn close(&self) {
        let pending = self.announce_close();
        let mut inner = self.inner.lock().await;
        close_inner(&mut inner);
        drop(pending);
    }

    /// Blocking variant of [`close`](Self::close) for callers outside an
    /// async context.
    ///
    /// Inside a Tokio runtime it must not block, so it only closes if the
    /// lock is free right now.  Otherwise it logs a warning and returns
    /// with the socket still open; call `close().await` there instead.
    pub fn close_blocking(&self) {
        let pending = self.announce_close();
        if tokio::runtime::Handle::try_current().is_ok() {
            match self.inner.try_lock() {
                Ok(mut inner) => close_inner(&mut inner),
                Err(_) => warn!("close_blocking inside a runtime found the endpoint busy; use close().await"),
            }
            return;
        }
        let mut inner = self.inner.blocking_lock();
        close_inner(&mut inner);
        drop(pending);
    }

    /// Current lifecycle state.
    pub async fn lifecycle(&self) -> Lifecycle {
        self.inner.lock().await.lifecycle
    }

    /// Local address of the open socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.lock().await.open.as_ref().map(|o| o.local_addr)
    }

    /// Resolved destination of the open socket.
    pub async fn destination(&self) -> Option<SocketAddr> {
        self.inner
            .lock()
            .await
            .open
            .as_ref()
            .and_then(|o| o.destination)
    }

    /// The Tokio UDP handle, for the receive pipeline.
    ///
    /// Returns `None` when no UDP socket is open.
    pub async fn udp_socket(&self) -> Option<Arc<UdpSocket>> {
        match self.inner.lock().await.open.as_ref().map(|o| &o.socket) {
            Some(Socket::Udp { shared, .. }) => Some(Arc::clone(shared)),
            _ => None,
        }
    }

    /// Safe path: sends `payload` to the configured destination.
    ///
    /// Holds the endpoint lock for the whole call and copies the payload
    /// into a freshly allocated packet.
    ///
    /// # Errors
    ///
    /// - [`TransportError::NotInitialized`] if no socket is open, a close
    ///   is pending, or the endpoint has no destination (listen mode).
    /// - [`TransportError::SendFailed`] if the OS rejects the send or a
    ///   close interrupts it.
    pub async fn send_safe(&self, payload: &[u8]) -> Result<(), TransportError> {
        let mut closed = self.close_signal.subscribe();
        let mut inner = self.inner.lock().await;
        if self.close_pending() {
            return Err(TransportError::NotInitialized);
        }
        let open = inner.open.as_mut().ok_or(TransportError::NotInitialized)?;
        let destination = open.destination.ok_or(TransportError::NotInitialized)?;

        let packet = payload.to_vec();
        let send = async {
            match &mut open.socket {
                Socket::Udp { shared, .. } => shared.send_to(&packet, destination).await.map(|_| ()),
                Socket::Tcp { stream, .. } => stream.write_all(&packet).await,
            }
        };
        let result = tokio::select! {
            result = send => result,
            _ = closed.changed() => Err(closed_during_send()),
        };
        result.map_err(|e| {
            warn!("send to {destination} failed: {e}");
            TransportError::SendFailed(e)
        })
    }

    /// Safe path to an explicit address, ignoring the configured
    /// destination.  Used to reply to the sender of a received packet.
    ///
    /// # Errors
    ///
    /// - [`TransportError::NotInitialized`] if no socket is open or a close
    ///   is pending.
    /// - [`TransportError::Configuration`] on a TCP endpoint.
    /// - [`TransportError::SendFailed`] if the OS rejects the send or a
    ///   close interrupts it.
    pub async fn send_safe_to(
        &self,
        payload: &[u8],
        target: SocketAddr,
    ) -> Result<(), TransportError> {
        let mut closed = self.close_signal.subscribe();
        let inner = self.inner.lock().await;
        if self.close_pending() {
            return Err(TransportError::NotInitialized);
        }
        let open = inner.open.as_ref().ok_or(TransportError::NotInitialized)?;
        let Socket::Udp { shared, .. } = &open.socket else {
            return Err(ConfigError::UnsupportedProtocol {
                mode: open.config.mode,
                protocol: Protocol::Tcp,
            }
            .into());
        };

        let packet = payload.to_vec();
        let result = tokio::select! {
            result = shared.send_to(&packet, target) => result.map(|_| ()),
            _ = closed.changed() => Err(closed_during_send()),
        };
        result.map_err(|e| {
            warn!("send to {target} failed: {e}");
            TransportError::SendFailed(e)
        })
    }

    /// Fast path: sends `payload` to the configured destination without
    /// locking or allocating (unless the payload outgrows the buffer).
    ///
    /// Returns the monotonic completion time, or [`SendStamp::FAILED`].
    pub fn send_fast(&mut self, payload: &[u8]) -> SendStamp {
        match self.try_send_fast(payload) {
            Ok(nanos) => SendStamp::at(nanos),
            Err(_) => SendStamp::FAILED,
        }
    }

    /// Fast path with a structured error instead of the sentinel.
    pub fn try_send_fast(&mut self, payload: &[u8]) -> Result<u64, TransportError> {
        let inner = self.inner.get_mut();
        let open = inner.open.as_mut().ok_or(TransportError::NotInitialized)?;
        let destination = open.destination.ok_or(TransportError::NotInitialized)?;
        let staged = inner.send_buffer.stage(payload);
        raw_send(&mut open.socket, staged, destination)?;
        Ok(monotonic_nanos())
    }

    /// Fast path to an explicit, already-resolved address (UDP only).
    pub fn send_fast_to(&mut self, payload: &[u8], target: SocketAddr) -> SendStamp {
        match self.try_send_fast_to(payload, target) {
            Ok(nanos) => SendStamp::at(nanos),
            Err(_) => SendStamp::FAILED,
        }
    }

    /// [`send_fast_to`](Self::send_fast_to) with a structured error.
    pub fn try_send_fast_to(
        &mut self,
        payload: &[u8],
        target: SocketAddr,
    ) -> Result<u64, TransportError> {
        let inner = self.inner.get_mut();
        let open = inner.open.as_mut().ok_or(TransportError::NotInitialized)?;
        let Socket::Udp { raw, .. } = &open.socket else {
            return Err(ConfigError::UnsupportedProtocol {
                mode: open.config.mode,
                protocol: Protocol::Tcp,
            }
            .into());
        };
        let staged = inner.send_buffer.stage(payload);
        raw.send_to(staged, target)
            .map_err(TransportError::SendFailed)?;
        Ok(monotonic_nanos())
    }

    /// Current capacity of the fast-path send buffer.
    pub fn send_buffer_capacity(&mut self) -> usize {
        self.inner.get_mut().send_buffer.capacity()
    }

    /// Number of buffers the fast path has allocated so far.
    pub fn send_buffer_allocations(&mut self) -> u64 {
        self.inner.get_mut().send_buffer.allocations()
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new()
    }
}

fn close_inner(inner: &mut Inner) {
    if let Some(open) = inner.open.take() {
        info!("closed {} endpoint on {}", open.config.mode, open.local_addr);
        inner.lifecycle = Lifecycle::Closed;
    }
}

fn closed_during_send() -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::ConnectionAborted,
        "endpoint closed during send",
    )
}

/// Non-blocking send on the raw handle.
fn raw_send(socket: &mut Socket, bytes: &[u8], destination: SocketAddr) -> Result<(), TransportError> {
    match socket {
        Socket::Udp { raw, .. } => raw
            .send_to(bytes, destination)
            .map(|_| ())
            .map_err(TransportError::SendFailed),
        Socket::Tcp { raw, .. } => {
            let mut written = 0;
            while written < bytes.len() {
                match raw.write(&bytes[written..]) {
                    Ok(0) => {
                        return Err(TransportError::SendFailed(std::io::Error::new(
                            std::io::ErrorKind::WriteZero,
                            "connection closed mid-write",
                        )))
                    }
                    Ok(n) => written += n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    // WouldBlock lands here too: the fast path never waits.
                    Err(e) => return Err(TransportError::SendFailed(e)),
                }
            }
            Ok(())
        }
    }
}

// ── Socket construction ───────────────────────────────────────────────────────

async fn open_socket(config: EndpointConfig) -> Result<OpenSocket, TransportError> {
    match (config.mode, config.protocol) {
        (SendMode::Listen, _) => open_listen(config),
        (_, Protocol::Tcp) => open_tcp(config).await,
        _ => open_udp_sender(config).await,
    }
}

async fn open_udp_sender(config: EndpointConfig) -> Result<OpenSocket, TransportError> {
    let destination = resolve(&config.host, config.port).await?;
    let ip = destination.ip();

    match config.mode {
        SendMode::Broadcast if !ip.is_ipv4() => {
            return Err(ConfigError::RequiresIpv4 {
                mode: config.mode,
                host: config.host.clone(),
            }
            .into())
        }
        SendMode::Multicast if !is_ipv4_multicast(&ip) => {
            return Err(ConfigError::NotMulticastGroup(config.host.clone()).into())
        }
        _ => {}
    }

    let bind_addr = wildcard_for(&ip);
    let std_socket = std::net::UdpSocket::bind(bind_addr)
        .map_err(|e| TransportError::resource(format!("binding {bind_addr}"), e))?;

    let wants_broadcast =
        config.mode == SendMode::Broadcast || (config.mode == SendMode::Unicast && is_broadcast_address(&ip));
    if wants_broadcast {
        std_socket
            .set_broadcast(true)
            .map_err(|e| TransportError::resource("enabling SO_BROADCAST", e))?;
    }

    if config.mode == SendMode::Multicast {
        configure_multicast(&std_socket, &ip, config.multicast_ttl)?;
    }

    let (shared, raw, local_addr) = register_udp(std_socket)?;
    Ok(OpenSocket {
        config,
        socket: Socket::Udp { shared, raw },
        destination: Some(destination),
        local_addr,
    })
}

fn configure_multicast(
    socket: &std::net::UdpSocket,
    group: &IpAddr,
    ttl: u32,
) -> Result<(), TransportError> {
    socket
        .set_multicast_ttl_v4(ttl)
        .map_err(|e| TransportError::resource("setting multicast TTL", e))?;
    socket
        .set_multicast_loop_v4(false)
        .map_err(|e| TransportError::resource("disabling multicast loopback", e))?;
    if let IpAddr::V4(group_v4) = group {
        // Sending does not require membership; a host without a multicast
        // route still gets a working sender.
        if let Err(e) = socket.join_multicast_v4(group_v4, &Ipv4Addr::UNSPECIFIED) {
            warn!("could not join multicast group {group_v4}: {e}");
        }
    }
    Ok(())
}

fn open_listen(config: EndpointConfig) -> Result<OpenSocket, TransportError> {
    let addr = config
        .listen_addr()
        .ok_or(TransportError::Configuration(ConfigError::MissingBindPort))?;
    let std_socket = bind_listen_socket(addr)
        .map_err(|e| TransportError::resource(format!("binding {addr}"), e))?;
    let (shared, raw, local_addr) = register_udp(std_socket)?;
    Ok(OpenSocket {
        config,
        socket: Socket::Udp { shared, raw },
        destination: None,
        local_addr,
    })
}

/// Binds a UDP socket with `SO_REUSEADDR` and an enlarged receive buffer.
fn bind_listen_socket(addr: SocketAddr) -> std::io::Result<std::net::UdpSocket> {
    let socket = RawSocket::new(Domain::for_address(addr), Type::DGRAM, Some(SockProtocol::UDP))?;
    socket.set_reuse_address(true)?;
    if let Err(e) = socket.set_recv_buffer_size(LISTEN_RECV_BUFFER_BYTES) {
        // The kernel may cap the size; a smaller buffer still works.
        warn!("could not enlarge receive buffer: {e}");
    }
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

async fn open_tcp(config: EndpointConfig) -> Result<OpenSocket, TransportError> {
    let destination = resolve(&config.host, config.port).await?;
    let stream = tokio::time::timeout(TCP_CONNECT_TIMEOUT, TcpStream::connect(destination))
        .await
        .map_err(|_| {
            TransportError::resource(
                format!("connecting to {destination}"),
                std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
            )
        })?
        .map_err(|e| TransportError::resource(format!("connecting to {destination}"), e))?;

    stream
        .set_nodelay(true)
        .map_err(|e| TransportError::resource("enabling TCP_NODELAY", e))?;

    // Duplicate the descriptor: one copy goes back to Tokio, the other
    // stays raw for the fast path.  Both are already non-blocking.
    let std_stream = stream
        .into_std()
        .map_err(|e| TransportError::resource("detaching TCP stream", e))?;
    let raw = std_stream
        .try_clone()
        .map_err(|e| TransportError::resource("duplicating TCP stream", e))?;
    let local_addr = std_stream
        .local_addr()
        .map_err(|e| TransportError::resource("reading local address", e))?;
    let stream = TcpStream::from_std(std_stream)
        .map_err(|e| TransportError::resource("registering TCP stream", e))?;

    Ok(OpenSocket {
        config,
        socket: Socket::Tcp { stream, raw },
        destination: Some(destination),
        local_addr,
    })
}

/// Splits a bound std socket into the Tokio handle and the raw handle.
fn register_udp(
    std_socket: std::net::UdpSocket,
) -> Result<(Arc<UdpSocket>, std::net::UdpSocket, SocketAddr), TransportError> {
    std_socket
        .set_nonblocking(true)
        .map_err(|e| TransportError::resource("setting non-blocking mode", e))?;
    let local_addr = std_socket
        .local_addr()
        .map_err(|e| TransportError::resource("reading local address", e))?;
    let raw = std_socket
        .try_clone()
        .map_err(|e| TransportError::resource("duplicating UDP socket", e))?;
    let shared = UdpSocket::from_std(std_socket)
        .map_err(|e| TransportError::resource("registering UDP socket", e))?;
    Ok((Arc::new(shared), raw, local_addr))
}

/// Resolves `host:port`, preferring an IPv4 result.
async fn resolve(host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let host = host.trim();
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    let unresolvable = |reason: String| ConfigError::Unresolvable {
        host: host.to_string(),
        reason,
    };
    let addrs: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|e| unresolvable(e.to_string()))?
        .collect();
    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| unresolvable("no addresses returned".to_string()))
}

/// Resolves a caller-supplied `host:port` for the safe `send_to` path.
pub(crate) async fn resolve_target(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    if port == 0 {
        return Err(ConfigError::InvalidPort(0).into());
    }
    if host.trim().is_empty() {
        return Err(ConfigError::EmptyHost.into());
    }
    Ok(resolve(host, port).await?)
}

fn wildcard_for(ip: &IpAddr) -> SocketAddr {
    match ip {
        IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
