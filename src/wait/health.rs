//! Health-check status checker

use crate::error::{GantryError, GantryResult};
use crate::runtime::{ContainerRuntime, HealthStatus};
use crate::wait::WaitChecker;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Waits until the container's HEALTHCHECK reports healthy.
///
/// A container without any HEALTHCHECK directive fails the wait session
/// immediately: no amount of waiting resolves a missing probe. A daemon
/// query failure is "not yet healthy" and retried next poll.
pub struct HealthCheckChecker {
    runtime: Arc<dyn ContainerRuntime>,
    container_id: String,
    first_poll: AtomicBool,
}

impl HealthCheckChecker {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, container_id: &str) -> Self {
        Self {
            runtime,
            container_id: container_id.to_string(),
            first_poll: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl WaitChecker for HealthCheckChecker {
    async fn check(&self) -> GantryResult<bool> {
        if self.first_poll.swap(false, Ordering::SeqCst) {
            info!("Waiting for container {} to become healthy", self.container_id);
        } else {
            debug!("Polling health of container {}", self.container_id);
        }

        match self.runtime.health(&self.container_id).await {
            Ok(None) => Err(GantryError::HealthCheckMissing {
                container: self.container_id.clone(),
            }),
            Ok(Some(status)) => Ok(status == HealthStatus::Healthy),
            Err(e) => {
                warn!("Cannot query health of {}: {}", self.container_id, e);
                Ok(false)
            }
        }
    }

    async fn clean_up(&self) {}

    fn label(&self) -> String {
        format!("health check on container {}", self.container_id)
    }
}
