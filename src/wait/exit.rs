//! Exit-code wait checker

use crate::error::GantryResult;
use crate::runtime::ContainerRuntime;
use crate::wait::WaitChecker;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Waits until the container has exited with an expected code.
///
/// A still-running container (no exit code yet) and a daemon query
/// failure both mean "not yet".
pub struct ExitCodeChecker {
    runtime: Arc<dyn ContainerRuntime>,
    container_id: String,
    expected: i64,
}

impl ExitCodeChecker {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, container_id: &str, expected: i64) -> Self {
        Self {
            runtime,
            container_id: container_id.to_string(),
            expected,
        }
    }
}

#[async_trait]
impl WaitChecker for ExitCodeChecker {
    async fn check(&self) -> GantryResult<bool> {
        match self.runtime.exit_code(&self.container_id).await {
            Ok(Some(code)) => Ok(code == self.expected),
            Ok(None) => Ok(false),
            Err(e) => {
                warn!("Cannot query exit code of {}: {}", self.container_id, e);
                Ok(false)
            }
        }
    }

    async fn clean_up(&self) {}

    fn label(&self) -> String {
        format!(
            "exit code {} on container {}",
            self.expected, self.container_id
        )
    }
}
