//! Configuration management
//!
//! Config file is `config.toml`, looked up next to the executable (or the
//! project root for dev builds) unless `--config` names one explicitly.

use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_DEVICE_PIDS, DEFAULT_DEVICE_VID, DEFAULT_FLUSH_INTERVAL_MS,
    DEFAULT_READ_TIMEOUT_MS, DEFAULT_RECORD_MAX_BYTES, DEFAULT_RECORD_MAX_FILES,
    DEFAULT_RECORD_PATH, DEFAULT_REQUEST_BYTE, SINK_CHANNEL_CAPACITY,
};
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Device Configuration
// =============================================================================

/// USB device detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Display name for the device
    pub name: String,
    /// USB Vendor ID
    pub vid: u16,
    /// List of accepted USB Product IDs
    pub pid_list: Vec<u16>,
    /// Platform-specific port name hints (optional)
    pub name_hint: PlatformNameHint,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "MindWave".to_string(),
            vid: DEFAULT_DEVICE_VID,
            pid_list: DEFAULT_DEVICE_PIDS.to_vec(),
            name_hint: PlatformNameHint::default(),
        }
    }
}

/// Platform-specific port name hints for device detection fallback
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformNameHint {
    /// Windows port name pattern (e.g., "COM")
    pub windows: Option<String>,
    /// macOS port name pattern (e.g., "MindWave")
    pub macos: Option<String>,
    /// Linux port name pattern (e.g., "rfcomm")
    pub linux: Option<String>,
}

impl PlatformNameHint {
    /// Returns the hint for the current platform
    pub fn current(&self) -> Option<&str> {
        #[cfg(windows)]
        {
            self.windows.as_deref()
        }
        #[cfg(target_os = "macos")]
        {
            self.macos.as_deref()
        }
        #[cfg(target_os = "linux")]
        {
            self.linux.as_deref()
        }
        #[cfg(not(any(windows, target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub device: DeviceConfig,
    pub sink: SinkConfig,
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port name (empty = auto-detect using [device])
    pub port: String,
    pub baud_rate: u32,
    /// Send `request_byte` once after opening to start data output
    pub send_request: bool,
    pub request_byte: u8,
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            send_request: true,
            request_byte: DEFAULT_REQUEST_BYTE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

/// Where decoded events go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Labelled lines on stdout
    #[default]
    Console,
    /// `timestamp,code,name,value` lines in a rotating file
    Csv,
    /// One JSON object per line in a rotating file
    Jsonl,
}

impl SinkKind {
    pub fn is_file(self) -> bool {
        matches!(self, Self::Csv | Self::Jsonl)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    /// Console only: also print 512 Hz raw wave samples
    pub show_raw: bool,
    /// Record file (csv / jsonl only)
    pub path: PathBuf,
    /// Rotate once the active file reaches this size
    pub max_bytes: u64,
    /// Rotated files kept (`path.1` .. `path.N`)
    pub max_files: usize,
    pub flush_interval_ms: u64,
    /// Writer queue depth; events are dropped when it is full
    pub channel_capacity: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Console,
            show_raw: false,
            path: PathBuf::from(DEFAULT_RECORD_PATH),
            max_bytes: DEFAULT_RECORD_MAX_BYTES,
            max_files: DEFAULT_RECORD_MAX_FILES,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            channel_capacity: SINK_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Tracing filter directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(BridgeError::ConfigValidation {
                field: "serial.baud_rate",
                reason: "must be greater than 0".into(),
            });
        }
        if self.sink.channel_capacity == 0 {
            return Err(BridgeError::ConfigValidation {
                field: "sink.channel_capacity",
                reason: "must be greater than 0".into(),
            });
        }
        if self.sink.kind.is_file() && self.sink.path.as_os_str().is_empty() {
            return Err(BridgeError::ConfigValidation {
                field: "sink.path",
                reason: "required for file sinks".into(),
            });
        }
        Ok(())
    }
}

/// Get the project root directory
///
/// Searches in order:
/// 1. Next to executable (production deployment)
/// 2. Up from target/release or target/debug (dev builds)
fn find_project_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| BridgeError::ConfigRead {
        path: PathBuf::from("executable"),
        source: e,
    })?;
    let exe_dir = exe.parent().ok_or_else(|| BridgeError::ConfigValidation {
        field: "exe_path",
        reason: "no parent directory".into(),
    })?;

    if exe_dir.join("config.toml").exists() {
        return Ok(exe_dir.to_path_buf());
    }

    // exe_dir = .../target/release, we want the crate root
    if let Some(target_dir) = exe_dir.parent() {
        if target_dir
            .file_name()
            .map(|n| n == "target")
            .unwrap_or(false)
        {
            if let Some(project_root) = target_dir.parent() {
                return Ok(project_root.to_path_buf());
            }
        }
    }

    Ok(exe_dir.to_path_buf())
}

/// Get the config file path, honoring an explicit override
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(find_project_root()?.join("config.toml")),
    }
}

/// Parse a config file
pub fn load_from(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| BridgeError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| BridgeError::ConfigValidation {
        field: "config",
        reason: format!("{}: {}", path.display(), e),
    })
}

/// Load config from file, or create default if not exists
///
/// Parse failures and a failed default write are returned so the caller
/// can fall back to defaults once logging is up.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = config_path(explicit)?;

    if !path.exists() {
        let config = Config::default();
        save(&config, &path)?;
        return Ok(config);
    }

    load_from(&path)
}

/// Save config to file
pub fn save(config: &Config, path: &Path) -> Result<()> {
    let content =
        toml::to_string_pretty(config).map_err(|e| BridgeError::ConfigValidation {
            field: "config",
            reason: e.to_string(),
        })?;
    fs::write(path, content).map_err(|e| BridgeError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Serial port from config (explicit port or auto-detection via [device])
pub fn detect_serial(cfg: &Config) -> Result<String> {
    use crate::transport::SerialTransport;

    if !cfg.serial.port.is_empty() {
        return Ok(cfg.serial.port.clone());
    }
    SerialTransport::detect(&cfg.device)
}

// ============================================================================
// Tests
// ============================================================================
