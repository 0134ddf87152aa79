//! TOML-based configuration persistence for the command-line front end.
//!
//! Reads and writes [`AppConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\udp-trigger\config.toml`
//! - Linux:    `~/.config/udp-trigger/config.toml`
//! - macOS:    `~/Library/Application Support/udp-trigger/config.toml`
//!
//! # File layout (for beginners)
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [network]
//! host = "127.0.0.1"
//! port = 5000
//! listen_port = 5001
//! bind_address = "0.0.0.0"
//! multicast_ttl = 1
//! protocol = "udp"
//!
//! [dispatch]
//! mode = "sequential"
//! delay_ms = 0
//!
//! [[targets]]
//! id = "5c1f…"
//! name = "desk lamp"
//! host = "192.168.1.20"
//! port = 5000
//! ```
//!
//! Every field has a serde default, so an empty file (or no file at all)
//! yields a working configuration.  After a dispatch the CLI writes each
//! target's last outcome back into its `[[targets]]` entry.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use udp_trigger_core::{
    domain::endpoint::DEFAULT_MULTICAST_TTL, DispatchMode, EndpointConfig, Protocol, Target,
};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralSection {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Default destination and listen settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Interface the listen socket binds to.  `0.0.0.0` binds all.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    #[serde(default = "default_multicast_ttl")]
    pub multicast_ttl: u32,
    #[serde(default)]
    pub protocol: Protocol,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchSection {
    #[serde(default)]
    pub mode: DispatchMode,
    /// Pause between two sequential sends, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_listen_port() -> u16 {
    5001
}
fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_multicast_ttl() -> u32 {
    DEFAULT_MULTICAST_TTL
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            listen_port: default_listen_port(),
            bind_address: default_bind_address(),
            multicast_ttl: default_multicast_ttl(),
            protocol: Protocol::default(),
        }
    }
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            mode: DispatchMode::default(),
            delay_ms: 0,
        }
    }
}

impl NetworkSection {
    /// The unicast endpoint described by `host`, `port`, and `protocol`.
    ///
    /// Not validated here; `Endpoint::open` validates on use.
    pub fn to_endpoint_config(&self) -> EndpointConfig {
        EndpointConfig::unicast(self.host.clone(), self.port).with_protocol(self.protocol)
    }

    /// The listen endpoint described by `listen_port` and `bind_address`.
    pub fn to_listen_config(&self) -> EndpointConfig {
        let bind = (!self.bind_address.is_unspecified()).then_some(self.bind_address);
        EndpointConfig::listen(self.listen_port, bind)
    }
}

impl DispatchSection {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigFileError::NoPlatformConfigDir`] when the platform config
/// base directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigFileError> {
    platform_config_dir().ok_or(ConfigFileError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigFileError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigFileError::Io`] for file-system errors other than "not
/// found", and [`ConfigFileError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigFileError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            debug!("loaded config from {}", path.display());
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no config at {}, using defaults", path.display());
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigFileError::Io`] for file-system failures or
/// [`ConfigFileError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigFileError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigFileError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("saved config to {}", path.display());
    Ok(())
}

/// [`load_config_from`] on the platform config file.
pub fn load_config() -> Result<AppConfig, ConfigFileError> {
    load_config_from(&config_file_path()?)
}

/// [`save_config_to`] on the platform config file.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigFileError> {
    save_config_to(config, &config_file_path()?)
}

/// Resolves the platform config directory, including the `udp-trigger`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("udp-trigger"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("udp-trigger"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("udp-trigger")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use udp_trigger_core::{AttemptOutcome, SendMode};
    use uuid::Uuid;

    fn temp_config_path() -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("udp_trigger_test_{}", Uuid::new_v4()));
        let path = dir.join("nested").join("config.toml");
        (dir, path)
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_values() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.general.log_level, "info");
        assert_eq!(cfg.network.host, "127.0.0.1");
        assert_eq!(cfg.network.port, 5000);
        assert_eq!(cfg.network.listen_port, 5001);
        assert_eq!(cfg.network.multicast_ttl, 1);
        assert_eq!(cfg.network.protocol, Protocol::Udp);
        assert_eq!(cfg.dispatch.mode, DispatchMode::Sequential);
        assert_eq!(cfg.dispatch.delay(), Duration::ZERO);
        assert!(cfg.targets.is_empty());
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("empty document");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_unspecified_defaults() {
        // Arrange
        let toml_str = r#"
[network]
port = 9999
protocol = "tcp"

[dispatch]
mode = "round-robin"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.network.port, 9999);
        assert_eq!(cfg.network.protocol, Protocol::Tcp);
        assert_eq!(cfg.network.host, "127.0.0.1");
        assert_eq!(cfg.dispatch.mode, DispatchMode::RoundRobin);
        assert_eq!(cfg.dispatch.delay_ms, 0);
    }

    #[test]
    fn test_targets_parse_with_enabled_default() {
        // Arrange
        let id = Uuid::new_v4();
        let toml_str = format!(
            r#"
[[targets]]
id = "{id}"
name = "desk lamp"
host = "192.168.1.20"
port = 5000

[[targets]]
id = "{}"
host = "192.168.1.21"
port = 5000
enabled = false
"#,
            Uuid::new_v4()
        );

        // Act
        let cfg: AppConfig = toml::from_str(&toml_str).expect("deserialize targets");

        // Assert
        assert_eq!(cfg.targets.len(), 2);
        assert_eq!(cfg.targets[0].id, id);
        assert_eq!(cfg.targets[0].name, "desk lamp");
        assert!(cfg.targets[0].enabled);
        assert!(!cfg.targets[1].enabled);
        assert_eq!(cfg.targets[1].last_outcome, None);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        // Arrange
        let (dir, path) = temp_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        // Act
        let result = load_config_from(&path);

        // Assert
        assert!(matches!(result, Err(ConfigFileError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    // ── load / save ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let (_dir, path) = temp_config_path();
        let cfg = load_config_from(&path).expect("missing file is not an error");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_then_load_preserves_target_status() {
        // Arrange
        let (dir, path) = temp_config_path();
        let mut cfg = AppConfig::default();
        cfg.general.log_level = "debug".to_string();
        cfg.dispatch.mode = DispatchMode::Parallel;
        cfg.dispatch.delay_ms = 25;
        let mut ok = Target::new("10.0.0.1", 5000).named("ok");
        ok.record_attempt(AttemptOutcome::Sent);
        let mut bad = Target::new("10.0.0.2", 5000).named("bad");
        bad.record_attempt(AttemptOutcome::Failed {
            reason: "unreachable".to_string(),
        });
        cfg.targets = vec![ok, bad];

        // Act
        save_config_to(&cfg, &path).expect("save");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.dispatch.delay(), Duration::from_millis(25));
        std::fs::remove_dir_all(&dir).ok();
    }

    // ── Conversions ───────────────────────────────────────────────────────────

    #[test]
    fn test_network_section_to_endpoint_config() {
        // Arrange
        let section = NetworkSection {
            host: "192.168.1.50".to_string(),
            port: 7000,
            protocol: Protocol::Tcp,
            ..NetworkSection::default()
        };

        // Act
        let config = section.to_endpoint_config();

        // Assert
        assert_eq!(config.mode, SendMode::Unicast);
        assert_eq!(config.host, "192.168.1.50");
        assert_eq!(config.port, 7000);
        assert_eq!(config.protocol, Protocol::Tcp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_listen_config_binds_all_interfaces_for_unspecified_address() {
        let section = NetworkSection::default();
        let config = section.to_listen_config();
        assert_eq!(config.mode, SendMode::Listen);
        assert_eq!(config.bind_port, Some(5001));
        assert_eq!(config.bind_address, None);
    }

    #[test]
    fn test_listen_config_keeps_explicit_bind_address() {
        let section = NetworkSection {
            bind_address: "127.0.0.1".parse().unwrap(),
            ..NetworkSection::default()
        };
        let config = section.to_listen_config();
        assert_eq!(config.bind_address, Some("127.0.0.1".parse().unwrap()));
    }

    // ── Platform paths ────────────────────────────────────────────────────────

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("udp-trigger/config.toml"), "got {path:?}");
        }
        // NoPlatformConfigDir is acceptable in a stripped environment.
    }
}
