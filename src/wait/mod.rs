//! Readiness-wait subsystem
//!
//! Composable wait strategies polled by an engine until a container
//! reaches an observable ready state. Each strategy is an independent
//! [`WaitChecker`]; a [`Precondition`] decides whether continuing to
//! wait is still meaningful (e.g. the container is still running).

mod engine;
mod exit;
mod health;
mod log;
mod tcp;

pub use engine::{wait_until_ready, with_timeout};
pub use exit::ExitCodeChecker;
pub use health::HealthCheckChecker;
pub use log::{LineMatcher, LogMatchOutcome, LogWaitChecker};
pub use tcp::TcpPortChecker;

use crate::config::schema::WaitConfig;
use crate::error::GantryResult;
use crate::runtime::ContainerRuntime;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Interval between poll iterations
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Deadline applied when the caller gives a zero timeout
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10);

/// A readiness predicate polled repeatedly by the wait engine.
#[async_trait]
pub trait WaitChecker: Send + Sync {
    /// Poll once. Transient query failures report `Ok(false)`;
    /// structural configuration errors abort the whole wait session.
    async fn check(&self) -> GantryResult<bool>;

    /// Release held resources. Called exactly once per wait session,
    /// regardless of which checker succeeded or how the session ended.
    async fn clean_up(&self);

    /// Human-readable description used in timeout reports
    fn label(&self) -> String;
}

/// External gate evaluated once per poll iteration.
#[async_trait]
pub trait Precondition: Send + Sync {
    /// Whether continuing to wait is still meaningful
    async fn is_ok(&self) -> bool;

    /// Release held resources at session end
    async fn cleanup(&self);
}

/// Precondition that holds while the container is still running.
pub struct ContainerRunning {
    runtime: Arc<dyn ContainerRuntime>,
    container_id: String,
}

impl ContainerRunning {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, container_id: &str) -> Self {
        Self {
            runtime,
            container_id: container_id.to_string(),
        }
    }
}

#[async_trait]
impl Precondition for ContainerRunning {
    async fn is_ok(&self) -> bool {
        match self.runtime.is_running(&self.container_id).await {
            Ok(running) => running,
            Err(e) => {
                // A flaky daemon must not be reported as a dead container
                warn!("Cannot query state of {}: {}", self.container_id, e);
                true
            }
        }
    }

    async fn cleanup(&self) {}
}

/// Assemble the checkers appropriate to a container's wait configuration.
///
/// Order matters: health check, exit code, log pattern, then TCP ports.
/// The first checker (in this order) to succeed ends the wait session.
pub async fn checkers_for(
    config: &WaitConfig,
    runtime: Arc<dyn ContainerRuntime>,
    container_id: &str,
) -> GantryResult<Vec<Box<dyn WaitChecker>>> {
    let mut checkers: Vec<Box<dyn WaitChecker>> = Vec::new();

    if config.healthcheck {
        checkers.push(Box::new(HealthCheckChecker::new(
            runtime.clone(),
            container_id,
        )));
    }

    if let Some(code) = config.exit_code {
        checkers.push(Box::new(ExitCodeChecker::new(
            runtime.clone(),
            container_id,
            code,
        )));
    }

    if let Some(ref pattern) = config.log {
        checkers.push(Box::new(
            LogWaitChecker::new(pattern, runtime.clone(), container_id).await?,
        ));
    }

    if !config.ports.is_empty() {
        checkers.push(Box::new(TcpPortChecker::new(&config.host, &config.ports)?));
    }

    Ok(checkers)
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Shared fake runtime for checker tests

    use super::*;
    use crate::error::GantryError;
    use crate::runtime::{ContainerSpec, HealthStatus};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Scripted container runtime: tests set the answers up front.
    #[derive(Default)]
    pub struct FakeRuntime {
        pub running: Mutex<bool>,
        pub health: Mutex<Option<Option<HealthStatus>>>,
        pub exit_code: Mutex<Option<Option<i64>>>,
        pub fail_queries: Mutex<bool>,
        pub log_lines: Mutex<Vec<String>>,
    }

    impl FakeRuntime {
        fn query_failure() -> GantryError {
            GantryError::command_exec("podman inspect", "daemon unreachable")
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn is_available(&self) -> GantryResult<bool> {
            Ok(true)
        }

        async fn run(&self, _spec: &ContainerSpec, _command: &[String]) -> GantryResult<String> {
            Ok("fake-container".to_string())
        }

        async fn stop(&self, _container_id: &str) -> GantryResult<()> {
            Ok(())
        }

        async fn remove(&self, _container_id: &str) -> GantryResult<()> {
            Ok(())
        }

        async fn is_running(&self, _container_id: &str) -> GantryResult<bool> {
            if *self.fail_queries.lock().unwrap() {
                return Err(Self::query_failure());
            }
            Ok(*self.running.lock().unwrap())
        }

        async fn health(&self, _container_id: &str) -> GantryResult<Option<HealthStatus>> {
            if *self.fail_queries.lock().unwrap() {
                return Err(Self::query_failure());
            }
            let scripted = *self.health.lock().unwrap();
            scripted.ok_or_else(|| GantryError::Internal("health not scripted".to_string()))
        }

        async fn exit_code(&self, _container_id: &str) -> GantryResult<Option<i64>> {
            if *self.fail_queries.lock().unwrap() {
                return Err(Self::query_failure());
            }
            let scripted = *self.exit_code.lock().unwrap();
            scripted.ok_or_else(|| GantryError::Internal("exit code not scripted".to_string()))
        }

        async fn logs_stream(&self, _container_id: &str) -> GantryResult<mpsc::Receiver<String>> {
            let (tx, rx) = mpsc::channel(64);
            let lines: Vec<String> = self.log_lines.lock().unwrap().clone();
            tokio::spawn(async move {
                for line in lines {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
            });
            Ok(rx)
        }

        async fn image_exists(&self, _image: &str) -> GantryResult<bool> {
            Ok(true)
        }

        async fn pull(&self, _image: &str) -> GantryResult<()> {
            Ok(())
        }

        fn runtime_name(&self) -> &'static str {
            "Fake"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::FakeRuntime;
    use super::*;
    use crate::config::schema::WaitConfig;
    use crate::runtime::HealthStatus;

    #[tokio::test]
    async fn assembles_checkers_in_configured_order() {
        let runtime = Arc::new(FakeRuntime::default());
        *runtime.health.lock().unwrap() = Some(Some(HealthStatus::Starting));

        let config = WaitConfig {
            healthcheck: true,
            exit_code: Some(0),
            log: Some("ready".to_string()),
            ports: vec![8080],
            host: "127.0.0.1".to_string(),
            ..Default::default()
        };

        let checkers = checkers_for(&config, runtime, "abc").await.unwrap();
        let labels: Vec<String> = checkers.iter().map(|c| c.label()).collect();

        assert_eq!(checkers.len(), 4);
        assert!(labels[0].contains("health"));
        assert!(labels[1].contains("exit code"));
        assert!(labels[2].contains("ready"));
        assert!(labels[3].contains("8080"));

        for checker in &checkers {
            checker.clean_up().await;
        }
    }

    #[tokio::test]
    async fn empty_config_assembles_nothing() {
        let runtime = Arc::new(FakeRuntime::default());
        let checkers = checkers_for(&WaitConfig::default(), runtime, "abc")
            .await
            .unwrap();
        assert!(checkers.is_empty());
    }

    #[tokio::test]
    async fn container_running_precondition_tolerates_query_failure() {
        let runtime = Arc::new(FakeRuntime::default());
        *runtime.fail_queries.lock().unwrap() = true;

        let precondition = ContainerRunning::new(runtime, "abc");
        assert!(precondition.is_ok().await);
    }

    #[tokio::test]
    async fn container_running_precondition_reflects_state() {
        let runtime = Arc::new(FakeRuntime::default());
        *runtime.running.lock().unwrap() = true;

        let precondition = ContainerRunning::new(runtime.clone(), "abc");
        assert!(precondition.is_ok().await);

        *runtime.running.lock().unwrap() = false;
        assert!(!precondition.is_ok().await);
    }
}
