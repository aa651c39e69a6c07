//! Container runtime abstraction
//!
//! Provides a trait for the container operations the build and wait
//! subsystems need, implemented by a podman CLI backend.

mod podman;

pub use podman::PodmanRuntime;

use crate::error::GantryResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Container configuration for starting a new container
#[derive(Debug, Clone, Default)]
pub struct ContainerSpec {
    /// Container image to use
    pub image: String,
    /// Working directory inside the container
    pub workdir: Option<String>,
    /// Volume mounts (host:container format)
    pub volumes: Vec<String>,
    /// Environment variables
    pub env: HashMap<String, String>,
    /// Network mode
    pub network: Option<String>,
    /// Published ports (host:container format)
    pub publish: Vec<String>,
}

/// Reported health of a container with a HEALTHCHECK directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Health probes have not concluded yet
    Starting,
    /// The last health probe passed
    Healthy,
    /// The last health probe failed
    Unhealthy,
}

/// Abstract container runtime interface
///
/// The wait checkers poll these queries; the deploy pipeline uses the
/// lifecycle operations. Implementations must be shareable across tasks.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Check if the runtime is available on this system
    async fn is_available(&self) -> GantryResult<bool>;

    /// Run a container detached and return the container ID
    async fn run(&self, spec: &ContainerSpec, command: &[String]) -> GantryResult<String>;

    /// Stop a container gracefully
    async fn stop(&self, container_id: &str) -> GantryResult<()>;

    /// Remove a container
    async fn remove(&self, container_id: &str) -> GantryResult<()>;

    /// Whether the container is currently running
    async fn is_running(&self, container_id: &str) -> GantryResult<bool>;

    /// Current health status; `None` when the image has no HEALTHCHECK
    async fn health(&self, container_id: &str) -> GantryResult<Option<HealthStatus>>;

    /// Exit code once the container has exited, `None` while it runs
    async fn exit_code(&self, container_id: &str) -> GantryResult<Option<i64>>;

    /// Subscribe to the container's live log stream.
    ///
    /// Lines arrive on the returned channel until the subscription is
    /// dropped or the container stops logging.
    async fn logs_stream(&self, container_id: &str) -> GantryResult<mpsc::Receiver<String>>;

    /// Check if an image exists locally
    async fn image_exists(&self, image: &str) -> GantryResult<bool>;

    /// Pull an image
    async fn pull(&self, image: &str) -> GantryResult<()>;

    /// Get the human-readable runtime name for display
    fn runtime_name(&self) -> &'static str;
}
