//! Configuration schema for Gantry
//!
//! Configuration is stored at `~/.config/gantry/config.toml`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Container daemon endpoint
    pub daemon: DaemonConfig,

    /// Image build settings
    pub build: BuildConfig,

    /// Container run settings
    pub container: ContainerRunConfig,

    /// Readiness wait settings
    pub wait: WaitConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Container daemon endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Base URL of the daemon HTTP API
    pub url: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:2375".to_string(),
        }
    }
}

/// Image build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build backend: "daemon" or "cli"
    pub backend: String,

    /// CLI builder executable for the cli backend
    pub builder: String,

    /// Image tag to produce
    pub tag: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            backend: "daemon".to_string(),
            builder: "pack".to_string(),
            tag: String::new(),
        }
    }
}

/// Container run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerRunConfig {
    /// Image to run
    pub image: String,

    /// Environment variables to set
    pub env: HashMap<String, String>,

    /// Additional volume mounts (host:container)
    pub volumes: Vec<String>,

    /// Network mode
    pub network: Option<String>,

    /// Working directory inside container
    pub workdir: Option<String>,

    /// Published ports (host:container)
    pub publish: Vec<String>,
}

impl Default for ContainerRunConfig {
    fn default() -> Self {
        Self {
            image: String::new(),
            env: HashMap::new(),
            volumes: vec![],
            network: None,
            workdir: None,
            publish: vec![],
        }
    }
}

/// Readiness wait configuration.
///
/// Decides which checkers the deploy pipeline assembles for a
/// container: health check, expected exit code, log pattern, TCP ports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Overall deadline in milliseconds; 0 means the built-in default
    pub timeout_ms: u64,

    /// Host to probe for TCP port readiness
    pub host: String,

    /// Ports that must accept TCP connections
    pub ports: Vec<u16>,

    /// Regex the container log must match
    pub log: Option<String>,

    /// Wait on the image's HEALTHCHECK status
    pub healthcheck: bool,

    /// Expected container exit code
    pub exit_code: Option<i64>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            host: "127.0.0.1".to_string(),
            ports: vec![],
            log: None,
            healthcheck: false,
            exit_code: None,
        }
    }
}
