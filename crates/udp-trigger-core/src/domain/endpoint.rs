//! Endpoint configuration: which socket to open and where it sends.
//!
//! An [`EndpointConfig`] is built once per `initialize` call and stays
//! immutable until the next `initialize` or `close`.  The constructors cover
//! the four modes the transport supports:
//!
//! ```text
//! Unicast    one destination host:port, ephemeral local port
//! Broadcast  like unicast, SO_BROADCAST always on
//! Multicast  group address + TTL, loopback disabled
//! Listen     bind port (+ optional bind address), receive loop
//! ```
//!
//! # Validation
//!
//! [`EndpointConfig::validate`] enforces the rules that can be checked
//! without touching the network:
//!
//! - every send-capable mode needs a non-empty host and a port in 1-65535;
//! - `Listen` needs a bind port in 1-65535;
//! - the multicast TTL must fit in 0-255;
//! - `Broadcast`, `Multicast`, and `Listen` are UDP-only;
//! - a multicast host given as an IP literal must be an IPv4 multicast group.
//!
//! Host resolution happens later, when the infrastructure opens the socket.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest TTL a multicast datagram can carry.
pub const MAX_MULTICAST_TTL: u32 = 255;

/// TTL used when a caller does not pick one: stay on the local subnet.
pub const DEFAULT_MULTICAST_TTL: u32 = 1;

/// Addressing mode of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMode {
    /// One destination host.
    #[default]
    Unicast,
    /// A broadcast address; the socket gets `SO_BROADCAST`.
    Broadcast,
    /// An IPv4 multicast group.
    Multicast,
    /// Bound to a local port; used by the receive pipeline.
    Listen,
}

impl SendMode {
    /// Returns `true` for the modes that carry a destination.
    pub fn is_send_capable(self) -> bool {
        !matches!(self, SendMode::Listen)
    }
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SendMode::Unicast => "unicast",
            SendMode::Broadcast => "broadcast",
            SendMode::Multicast => "multicast",
            SendMode::Listen => "listen",
        };
        f.write_str(name)
    }
}

/// Transport protocol of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Udp,
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Udp => f.write_str("UDP"),
            Protocol::Tcp => f.write_str("TCP"),
        }
    }
}

/// Validation failures for [`EndpointConfig`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("destination host is empty")]
    EmptyHost,
    #[error("port {0} is outside 1-65535")]
    InvalidPort(u16),
    #[error("listen mode requires a bind port")]
    MissingBindPort,
    #[error("multicast TTL {0} is outside 0-255")]
    InvalidTtl(u32),
    #[error("{0} is not an IPv4 multicast group address")]
    NotMulticastGroup(String),
    #[error("{mode} mode needs an IPv4 destination, {host} is not one")]
    RequiresIpv4 { mode: SendMode, host: String },
    #[error("{mode} mode does not support {protocol}")]
    UnsupportedProtocol { mode: SendMode, protocol: Protocol },
    #[error("cannot resolve host {host}: {reason}")]
    Unresolvable { host: String, reason: String },
}

/// Everything needed to open one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub mode: SendMode,
    /// Destination host name or IP literal.  Empty for `Listen`.
    pub host: String,
    /// Destination port.  Unused for `Listen`.
    pub port: u16,
    /// Local port to bind.  Required for `Listen`, ignored otherwise.
    pub bind_port: Option<u16>,
    /// Local address to bind in `Listen` mode; `None` binds all interfaces.
    pub bind_address: Option<IpAddr>,
    /// Hop limit for multicast datagrams.  Only read in `Multicast` mode.
    pub multicast_ttl: u32,
    pub protocol: Protocol,
}

impl EndpointConfig {
    /// Unicast UDP to `host:port`.
    pub fn unicast(host: impl Into<String>, port: u16) -> Self {
        Self {
            mode: SendMode::Unicast,
            host: host.into(),
            port,
            bind_port: None,
            bind_address: None,
            multicast_ttl: DEFAULT_MULTICAST_TTL,
            protocol: Protocol::Udp,
        }
    }

    /// Broadcast UDP to `host:port` (typically `255.255.255.255` or a subnet
    /// broadcast address).
    pub fn broadcast(host: impl Into<String>, port: u16) -> Self {
        Self {
            mode: SendMode::Broadcast,
            ..Self::unicast(host, port)
        }
    }

    /// Multicast UDP to `group:port` with the given TTL.
    pub fn multicast(group: impl Into<String>, port: u16, ttl: u32) -> Self {
        Self {
            mode: SendMode::Multicast,
            multicast_ttl: ttl,
            ..Self::unicast(group, port)
        }
    }

    /// Listen on `bind_port`, optionally restricted to one local address.
    pub fn listen(bind_port: u16, bind_address: Option<IpAddr>) -> Self {
        Self {
            mode: SendMode::Listen,
            host: String::new(),
            port: 0,
            bind_port: Some(bind_port),
            bind_address,
            multicast_ttl: DEFAULT_MULTICAST_TTL,
            protocol: Protocol::Udp,
        }
    }

    /// Switches the protocol (builder style).
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Checks every rule that does not need the network.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol == Protocol::Tcp && self.mode != SendMode::Unicast {
            return Err(ConfigError::UnsupportedProtocol {
                mode: self.mode,
                protocol: self.protocol,
            });
        }

        if self.mode == SendMode::Listen {
            return match self.bind_port {
                None => Err(ConfigError::MissingBindPort),
                Some(0) => Err(ConfigError::InvalidPort(0)),
                Some(_) => Ok(()),
            };
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.mode == SendMode::Multicast {
            if self.multicast_ttl > MAX_MULTICAST_TTL {
                return Err(ConfigError::InvalidTtl(self.multicast_ttl));
            }
            // Host names are checked after resolution.
            if let Ok(ip) = self.host.trim().parse::<IpAddr>() {
                if !is_ipv4_multicast(&ip) {
                    return Err(ConfigError::NotMulticastGroup(self.host.clone()));
                }
            }
        }

        Ok(())
    }

    /// The local address a `Listen` endpoint binds to.
    ///
    /// Returns `None` for the other modes.
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        if self.mode != SendMode::Listen {
            return None;
        }
        let ip = self
            .bind_address
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        self.bind_port.map(|port| SocketAddr::new(ip, port))
    }
}

/// Returns `true` for the limited broadcast address and for IPv4 addresses
/// whose last octet is 255 (the usual subnet broadcast on /24 networks).
pub fn is_broadcast_address(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_broadcast() || v4.octets()[3] == 255,
        IpAddr::V6(_) => false,
    }
}

/// Returns `true` for addresses in 224.0.0.0/4.
pub fn is_ipv4_multicast(ip: &IpAddr) -> bool {
    matches!(ip, IpAddr::V4(v4) if v4.is_multicast())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
