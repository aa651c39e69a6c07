//! Error types for Gantry
//!
//! All modules use `GantryResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Gantry operations
pub type GantryResult<T> = Result<T, GantryError>;

/// All errors that can occur in Gantry
#[derive(Error, Debug)]
pub enum GantryError {
    // Environment errors
    #[error("Podman not found. Install podman and run: podman system migrate")]
    PodmanNotFound,

    #[error("Container daemon unreachable at {url}: {reason}")]
    DaemonUnreachable { url: String, reason: String },

    // Build errors
    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Image build failed for {tag}: {reason}")]
    ImageBuild { tag: String, reason: String },

    #[error("Image pull failed: {image}: {reason}")]
    ImagePull { image: String, reason: String },

    #[error("Malformed response stream: {0}")]
    MalformedStream(String),

    // Wait errors
    #[error("Timed out after {elapsed_ms}ms waiting on: {labels}")]
    WaitTimeout { elapsed_ms: u64, labels: String },

    #[error("Container stopped before becoming ready (waited {elapsed_ms}ms)")]
    PreconditionFailed { elapsed_ms: u64 },

    #[error("Container {container} has no HEALTHCHECK configured; cannot wait on health status")]
    HealthCheckMissing { container: String },

    #[error("Invalid wait log pattern '{pattern}': {reason}")]
    InvalidLogPattern { pattern: String, reason: String },

    #[error("Cannot resolve {host}:{port} to a socket address")]
    UnresolvableAddress { host: String, port: u16 },

    // Container errors
    #[error("Container failed to start: {0}")]
    ContainerStart(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    #[error("Process exited with code {code}: {command}")]
    ProcessExit {
        command: String,
        code: i32,
        stderr: String,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl GantryError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// True for conditions that a retry of the whole operation may resolve
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DaemonUnreachable { .. } | Self::ContainerStart(_) | Self::WaitTimeout { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PodmanNotFound => Some("Install podman, then run: podman system migrate"),
            Self::DaemonUnreachable { .. } => {
                Some("Check the [daemon] url in gantry.toml and that the daemon is running")
            }
            Self::HealthCheckMissing { .. } => {
                Some("Add a HEALTHCHECK to the image or disable wait.healthcheck")
            }
            Self::WaitTimeout { .. } => Some("Increase wait.timeout_ms or check container logs"),
            _ => None,
        }
    }
}
