//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the file-sharing server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShareConfig {
    /// Listener configuration (bind address, timeouts).
    pub listener: ListenerConfig,

    /// Network allow-list settings.
    pub access: AccessConfig,

    /// Per-client rate limiting.
    pub rate_limit: RateLimitConfig,

    /// File serving settings (root directory, MIME overrides).
    pub serve: ServeConfig,

    /// Upload limits and extension blocklist.
    pub upload: UploadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Request timeout in seconds. Bounds how long a slow client can
    /// hold a connection, including stalled upload body reads.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            request_timeout_secs: 300,
        }
    }
}

/// Network allow-list configuration.
///
/// A client is admitted when its address falls inside at least one of the
/// configured networks. Entries are CIDR blocks ("192.168.1.0/24"); a bare
/// address is accepted as a host-length prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Allowed client networks.
    pub allowed_networks: Vec<String>,

    /// Networks whose `X-Forwarded-For` header is honored. Empty by
    /// default: the gate judges the connection peer only, so clients
    /// cannot pick their own address.
    pub trusted_proxies: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allowed_networks: vec!["0.0.0.0/0".to_string(), "::/0".to_string()],
            trusted_proxies: Vec::new(),
        }
    }
}

/// Rate limiting configuration (sliding window, per client address).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per window per client.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Interval between sweeps of stale client entries, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 80,
            window_secs: 60,
            sweep_interval_secs: 300,
        }
    }
}

/// File serving configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Root of the directory tree to expose.
    pub root_dir: PathBuf,

    /// Files served in place of a directory listing when present.
    pub index_files: Vec<String>,

    /// Extensions hidden from directory listings (lowercase, no dot).
    /// The files themselves remain downloadable by direct URL.
    pub hidden_extensions: Vec<String>,

    /// Content-Type overrides keyed by extension (lowercase, no dot),
    /// consulted before the built-in MIME table.
    pub mime_overrides: BTreeMap<String, String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            index_files: vec!["index.html".to_string(), "index.htm".to_string()],
            hidden_extensions: vec![
                "lnk".to_string(),
                "ini".to_string(),
                "url".to_string(),
                "db".to_string(),
                "parts".to_string(),
            ],
            mime_overrides: BTreeMap::new(),
        }
    }
}

/// Upload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Upload size limit in bytes. A part at or above this size is
    /// rejected, and the whole request body is never buffered beyond
    /// this plus a small envelope allowance.
    pub max_upload_bytes: u64,

    /// Extensions refused for upload (lowercase, dot optional in config).
    /// Covers executables, scripts, shortcut files, macro-enabled
    /// documents, and disk images.
    pub blocked_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 5000 * 1024 * 1024,
            blocked_extensions: [
                "exe", "msi", "dll", "scr", "com", "bat", "cmd", "vbs", "ps1", "js", "jar",
                "sh", "php", "py", "lnk", "url", "docm", "xlsm", "pptm", "ipa", "iso", "img",
                "vhd",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}
