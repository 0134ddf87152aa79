//! udp-trigger command-line front end.
//!
//! Sends trigger payloads, listens for them, and fans them out to the
//! target list stored in the config file.
//!
//! # Usage
//!
//! ```text
//! udp-trigger [--config <PATH>] <COMMAND>
//!
//! Commands:
//!   send       Send a payload to one destination (unicast, broadcast, or TCP)
//!   multicast  Send a payload to a multicast group
//!   listen     Print incoming datagrams, optionally replying to each sender
//!   dispatch   Send a payload to every enabled target in the config file
//! ```
//!
//! Defaults for host, ports, dispatch mode, and log level come from the
//! `[network]`, `[dispatch]`, and `[general]` sections of the config file.
//! `RUST_LOG` overrides the configured log level.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use udp_trigger::application::DispatchTargetsUseCase;
use udp_trigger::infrastructure::network::TransportClient;
use udp_trigger::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig,
};
use udp_trigger_core::{DispatchMode, EndpointConfig, Protocol, ReceivedPacket};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Low-latency UDP/TCP trigger sender and listener.
#[derive(Debug, Parser)]
#[command(name = "udp-trigger", version, about)]
struct Cli {
    /// Config file to read defaults and targets from.
    ///
    /// Defaults to the platform config directory
    /// (e.g. `~/.config/udp-trigger/config.toml`).
    #[arg(long, global = true, env = "UDP_TRIGGER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a payload to one destination.
    Send(SendArgs),
    /// Send a payload to a multicast group.
    Multicast(MulticastArgs),
    /// Print incoming datagrams until Ctrl-C.
    Listen(ListenArgs),
    /// Send a payload to every enabled target in the config file.
    Dispatch(DispatchArgs),
}

/// How the positional payload is turned into bytes.
#[derive(Debug, Args)]
struct PayloadArgs {
    /// Payload text (UTF-8), or hex digits with `--hex`.
    payload: String,

    /// Interpret the payload as hex, e.g. `de:ad:be:ef` or `0xDEADBEEF`.
    #[arg(long)]
    hex: bool,
}

#[derive(Debug, Args)]
struct SendArgs {
    #[command(flatten)]
    payload: PayloadArgs,

    /// Destination host.  Defaults to `[network] host`.
    #[arg(long)]
    host: Option<String>,

    /// Destination port.  Defaults to `[network] port`.
    #[arg(long)]
    port: Option<u16>,

    /// Use the lock-free fast path and print its timestamp.
    #[arg(long)]
    fast: bool,

    /// Number of times to send.
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Pause between repeated sends, in milliseconds.
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,

    /// Enable SO_BROADCAST and send to a broadcast address.
    #[arg(long, conflicts_with = "tcp")]
    broadcast: bool,

    /// Send over a TCP connection instead of UDP.
    #[arg(long)]
    tcp: bool,
}

#[derive(Debug, Args)]
struct MulticastArgs {
    #[command(flatten)]
    payload: PayloadArgs,

    /// IPv4 multicast group, e.g. `239.1.2.3`.
    #[arg(long)]
    group: String,

    /// Destination port.  Defaults to `[network] port`.
    #[arg(long)]
    port: Option<u16>,

    /// Hop limit (0-255).  Defaults to `[network] multicast_ttl`.
    #[arg(long)]
    ttl: Option<u32>,
}

#[derive(Debug, Args)]
struct ListenArgs {
    /// Port to bind.  Defaults to `[network] listen_port`.
    #[arg(long)]
    port: Option<u16>,

    /// Interface to bind.  Defaults to `[network] bind_address`.
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Reply to every sender with this text.
    #[arg(long)]
    reply: Option<String>,
}

#[derive(Debug, Args)]
struct DispatchArgs {
    #[command(flatten)]
    payload: PayloadArgs,

    /// Dispatch mode.  Defaults to `[dispatch] mode`.
    #[arg(long, value_parser = parse_dispatch_mode)]
    mode: Option<DispatchMode>,

    /// Pause between sequential sends.  Defaults to `[dispatch] delay_ms`.
    #[arg(long)]
    delay_ms: Option<u64>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => config_file_path().context("no --config given and no platform config dir")?,
    };
    let loaded = load_config_from(&config_path);

    // `RUST_LOG` wins; otherwise the configured level; otherwise `info`.
    let fallback_level = loaded
        .as_ref()
        .map(|cfg| cfg.general.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level)),
        )
        .init();

    let mut config =
        loaded.with_context(|| format!("loading config from {}", config_path.display()))?;

    match cli.command {
        Command::Send(args) => run_send(&config, args).await,
        Command::Multicast(args) => run_multicast(&config, args).await,
        Command::Listen(args) => run_listen(&config, args).await,
        Command::Dispatch(args) => {
            run_dispatch(&mut config, args).await?;
            save_config_to(&config, &config_path)
                .with_context(|| format!("saving target status to {}", config_path.display()))
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn run_send(config: &AppConfig, args: SendArgs) -> anyhow::Result<()> {
    let payload = parse_payload(&args.payload.payload, args.payload.hex)?;
    let host = args.host.unwrap_or_else(|| config.network.host.clone());
    let port = args.port.unwrap_or(config.network.port);

    let endpoint = if args.broadcast {
        EndpointConfig::broadcast(host, port)
    } else if args.tcp {
        EndpointConfig::unicast(host, port).with_protocol(Protocol::Tcp)
    } else {
        EndpointConfig::unicast(host, port).with_protocol(config.network.protocol)
    };

    let mut client = TransportClient::new();
    client
        .initialize_with(endpoint)
        .await
        .context("opening endpoint")?;

    let interval = Duration::from_millis(args.interval_ms);
    let mut failures = 0u32;
    for i in 0..args.count {
        if i > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        if args.fast {
            match client.try_send_fast(&payload) {
                Ok(nanos) => println!("sent {} bytes (t={nanos} ns)", payload.len()),
                Err(e) => {
                    failures += 1;
                    warn!("fast send failed: {e}");
                }
            }
        } else {
            match client.send(&payload).await {
                Ok(()) => println!("sent {} bytes", payload.len()),
                Err(e) => {
                    failures += 1;
                    warn!("send failed: {e}");
                }
            }
        }
    }

    client.close().await;
    if failures > 0 {
        bail!("{failures} of {} sends failed", args.count);
    }
    Ok(())
}

async fn run_multicast(config: &AppConfig, args: MulticastArgs) -> anyhow::Result<()> {
    let payload = parse_payload(&args.payload.payload, args.payload.hex)?;
    let port = args.port.unwrap_or(config.network.port);
    let ttl = args.ttl.unwrap_or(config.network.multicast_ttl);

    let client = TransportClient::new();
    client
        .initialize_multicast(&args.group, port, ttl)
        .await
        .context("opening multicast endpoint")?;
    let result = client.send(&payload).await;
    client.close().await;

    result.context("multicast send")?;
    println!("sent {} bytes to {}:{port} (ttl {ttl})", payload.len(), args.group);
    Ok(())
}

async fn run_listen(config: &AppConfig, args: ListenArgs) -> anyhow::Result<()> {
    let mut endpoint = config.network.to_listen_config();
    if let Some(port) = args.port {
        endpoint.bind_port = Some(port);
    }
    if let Some(bind) = args.bind {
        endpoint.bind_address = Some(bind);
    }
    let reply = args.reply.map(String::into_bytes);

    let client = TransportClient::new();
    let local = client
        .initialize_with(endpoint)
        .await
        .context("binding listen socket")?;
    let mut packets = client.start_listening().await?;
    info!("listening on {local}.  Press Ctrl-C to exit.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            item = packets.next_packet() => match item {
                Some(Ok(packet)) => {
                    println!("{}", describe_packet(&packet));
                    if let Some(reply) = &reply {
                        if let Err(e) = client.send_to(reply, packet.source).await {
                            warn!("reply to {} failed: {e}", packet.source);
                        }
                    }
                }
                Some(Err(e)) => warn!("{e}"),
                None => break,
            },
        }
    }

    client.close().await;
    Ok(())
}

async fn run_dispatch(config: &mut AppConfig, args: DispatchArgs) -> anyhow::Result<()> {
    let payload = parse_payload(&args.payload.payload, args.payload.hex)?;
    let mode = args.mode.unwrap_or(config.dispatch.mode);
    let delay = args
        .delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.dispatch.delay());

    if !config.targets.iter().any(|t| t.enabled) {
        warn!("no enabled targets in config, nothing to send");
        return Ok(());
    }

    // The fan-out sends through explicit addresses; the endpoint only
    // supplies the local UDP socket.
    let mut client = TransportClient::new();
    client
        .initialize_with(config.network.to_endpoint_config().with_protocol(Protocol::Udp))
        .await
        .context("opening dispatch endpoint")?;

    let dispatcher = DispatchTargetsUseCase::new(delay);
    let outcomes = dispatcher
        .dispatch(&mut client, &payload, &mut config.targets, mode)
        .await;
    client.close().await;

    for outcome in outcomes.iter() {
        match outcome.stamp.nanos() {
            Some(nanos) => println!("{:<24} sent (t={nanos} ns)", outcome.key),
            None => println!("{:<24} FAILED", outcome.key),
        }
    }
    info!(
        "{mode} dispatch: {} sent, {} failed",
        outcomes.len() - outcomes.failure_count(),
        outcomes.failure_count()
    );
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_dispatch_mode(s: &str) -> Result<DispatchMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "sequential" => Ok(DispatchMode::Sequential),
        "parallel" => Ok(DispatchMode::Parallel),
        "round-robin" | "roundrobin" | "rr" => Ok(DispatchMode::RoundRobin),
        other => Err(format!(
            "unknown mode '{other}' (expected sequential, parallel, or round-robin)"
        )),
    }
}

/// Converts the command-line payload into bytes.
///
/// Hex input may carry a `0x` prefix and `:`, `-`, or whitespace separators.
fn parse_payload(text: &str, hex: bool) -> anyhow::Result<Vec<u8>> {
    if !hex {
        return Ok(text.as_bytes().to_vec());
    }

    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = body
        .bytes()
        .filter(|b| !matches!(b, b':' | b'-' | b' ' | b'\t'))
        .collect();

    if digits.len() % 2 != 0 {
        bail!("hex payload has an odd number of digits");
    }
    digits
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair).context("hex payload is not ASCII")?;
            u8::from_str_radix(s, 16).with_context(|| format!("'{s}' is not a hex byte"))
        })
        .collect()
}

/// One line per packet: source, size, and the payload as text when it is
/// printable UTF-8, as hex otherwise.
fn describe_packet(packet: &ReceivedPacket) -> String {
    let body = match std::str::from_utf8(&packet.data) {
        Ok(text) if !text.chars().any(char::is_control) => format!("\"{text}\""),
        _ => packet
            .data
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" "),
    };
    format!("{} ({} bytes): {body}", packet.source, packet.len())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
