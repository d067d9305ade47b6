// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Service configuration for the MCP gateway.
//!
//! This is process-level configuration (where to listen, where the settings
//! record lives). The administrator-managed record itself is in
//! [`crate::settings`] and is re-read on every request.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the gateway service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path of the JSON settings record (default: mcp-settings.json)
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    /// Optional JSON fixture describing forms, posts and attachments
    #[serde(default)]
    pub site_data_path: Option<PathBuf>,

    /// Public base URL used for the discovery link
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Request authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Request authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Maximum allowed distance between request timestamp and server time
    /// in seconds (default: 300)
    #[serde(default = "default_signature_window_secs")]
    pub signature_window_secs: i64,

    /// Largest request body the signature middleware will buffer
    /// (default: 1 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("mcp-settings.json")
}

fn default_public_base_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_signature_window_secs() -> i64 {
    crate::signature::SIGNATURE_WINDOW_SECS
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            settings_path: default_settings_path(),
            site_data_path: None,
            public_base_url: default_public_base_url(),
            auth: AuthConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signature_window_secs: default_signature_window_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            settings_path: std::env::var("SETTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_path),
            site_data_path: std::env::var("SITE_DATA_PATH").ok().map(PathBuf::from),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or(defaults.public_base_url),
            auth: AuthConfig {
                signature_window_secs: std::env::var("SIGNATURE_WINDOW_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.auth.signature_window_secs),
                max_body_bytes: std::env::var("MAX_BODY_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.auth.max_body_bytes),
            },
            metrics: MetricsConfig {
                enabled: std::env::var("METRICS_ENABLED")
                    .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
                    .unwrap_or(defaults.metrics.enabled),
                ..defaults.metrics
            },
        }
    }
}
