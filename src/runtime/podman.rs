//! Podman container runtime
//!
//! Implements the ContainerRuntime trait by shelling out to rootless
//! podman. Readiness queries go through `podman inspect --format`.

use crate::error::{GantryError, GantryResult};
use crate::runtime::{ContainerRuntime, ContainerSpec, HealthStatus};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Container runtime using rootless podman
pub struct PodmanRuntime;

impl PodmanRuntime {
    /// Create a new podman runtime
    pub fn new() -> Self {
        Self
    }

    /// Check if podman is installed
    async fn podman_installed() -> bool {
        Command::new("podman")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Execute a podman command and return the output
    async fn exec(&self, args: &[&str]) -> GantryResult<std::process::Output> {
        debug!("Executing: podman {:?}", args);

        Command::new("podman")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GantryError::command_failed(format!("podman {:?}", args), e))
    }

    /// Run `podman inspect --format <format>` and return the trimmed output
    async fn inspect(&self, container_id: &str, format: &str) -> GantryResult<String> {
        let output = self
            .exec(&["inspect", "--format", format, container_id])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("no such") {
                return Err(GantryError::ContainerNotFound(container_id.to_string()));
            }
            return Err(GantryError::command_exec("podman inspect", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for PodmanRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for PodmanRuntime {
    async fn is_available(&self) -> GantryResult<bool> {
        Ok(Self::podman_installed().await)
    }

    async fn run(&self, spec: &ContainerSpec, command: &[String]) -> GantryResult<String> {
        // Ensure image is available
        if !self.image_exists(&spec.image).await? {
            self.pull(&spec.image).await?;
        }

        let mut args = vec!["run".to_string(), "-d".to_string()];

        if let Some(ref workdir) = spec.workdir {
            args.push("-w".to_string());
            args.push(workdir.clone());
        }
        if let Some(ref network) = spec.network {
            args.push("--network".to_string());
            args.push(network.clone());
        }
        for p in &spec.publish {
            args.push("-p".to_string());
            args.push(p.clone());
        }
        for v in &spec.volumes {
            args.push("-v".to_string());
            args.push(v.clone());
        }
        for (k, v) in &spec.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", k, v));
        }

        args.push(spec.image.clone());
        args.extend(command.iter().cloned());

        debug!("Running container: podman {:?}", args);

        let args_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.exec(&args_refs).await?;

        if output.status.success() {
            let container_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
            info!(
                "Container started: {}",
                &container_id[..12.min(container_id.len())]
            );
            Ok(container_id)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(GantryError::ContainerStart(stderr.to_string()))
        }
    }

    async fn stop(&self, container_id: &str) -> GantryResult<()> {
        debug!("Stopping container: {}", container_id);

        let output = self.exec(&["stop", container_id]).await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(GantryError::command_exec("podman stop", stderr))
        }
    }

    async fn remove(&self, container_id: &str) -> GantryResult<()> {
        debug!("Removing container: {}", container_id);

        let output = self.exec(&["rm", "-f", container_id]).await?;

        if output.status.success() {
            Ok(())
        } else {
            // Ignore error if container doesn't exist
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("no such container") {
                Ok(())
            } else {
                Err(GantryError::command_exec("podman rm", stderr))
            }
        }
    }

    async fn is_running(&self, container_id: &str) -> GantryResult<bool> {
        let state = self.inspect(container_id, "{{.State.Running}}").await?;
        Ok(state == "true")
    }

    async fn health(&self, container_id: &str) -> GantryResult<Option<HealthStatus>> {
        // Empty when the image carries no HEALTHCHECK directive
        let status = self
            .inspect(container_id, "{{.State.Health.Status}}")
            .await?;

        match status.as_str() {
            "" | "<no value>" => Ok(None),
            "healthy" => Ok(Some(HealthStatus::Healthy)),
            "unhealthy" => Ok(Some(HealthStatus::Unhealthy)),
            "starting" => Ok(Some(HealthStatus::Starting)),
            other => Err(GantryError::Internal(format!(
                "unexpected health status '{}' for {}",
                other, container_id
            ))),
        }
    }

    async fn exit_code(&self, container_id: &str) -> GantryResult<Option<i64>> {
        let state = self
            .inspect(container_id, "{{.State.Status}} {{.State.ExitCode}}")
            .await?;

        // The exit code field is only meaningful once the container exited
        match state.split_once(' ') {
            Some(("exited", code)) => {
                let code = code.trim().parse::<i64>().map_err(|e| {
                    GantryError::Internal(format!("unparseable exit code '{}': {}", code, e))
                })?;
                Ok(Some(code))
            }
            _ => Ok(None),
        }
    }

    async fn logs_stream(&self, container_id: &str) -> GantryResult<mpsc::Receiver<String>> {
        debug!("Following logs for container: {}", container_id);

        let mut child = Command::new("podman")
            .args(["logs", "-f", "--tail", "0", container_id])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GantryError::command_failed("podman logs -f", e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GantryError::Internal("podman logs stdout not piped".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| GantryError::Internal("podman logs stderr not piped".to_string()))?;

        let (tx, rx) = mpsc::channel(64);
        let id = container_id.to_string();

        tokio::spawn(async move {
            let mut out_lines = BufReader::new(stdout).lines();
            let mut err_lines = BufReader::new(stderr).lines();
            let mut out_done = false;
            let mut err_done = false;

            while !out_done || !err_done {
                tokio::select! {
                    line = out_lines.next_line(), if !out_done => {
                        match line {
                            Ok(Some(line)) => {
                                if tx.send(line).await.is_err() {
                                    // Subscriber gone, stop following
                                    break;
                                }
                            }
                            _ => out_done = true,
                        }
                    }
                    line = err_lines.next_line(), if !err_done => {
                        match line {
                            Ok(Some(line)) => warn!("podman logs ({}): {}", id, line),
                            _ => err_done = true,
                        }
                    }
                }
            }

            let _ = child.kill().await;
        });

        Ok(rx)
    }

    async fn image_exists(&self, image: &str) -> GantryResult<bool> {
        let output = self.exec(&["image", "exists", image]).await?;
        Ok(output.status.success())
    }

    async fn pull(&self, image: &str) -> GantryResult<()> {
        info!("Pulling image: {}", image);

        let output = self.exec(&["pull", image]).await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(GantryError::ImagePull {
                image: image.to_string(),
                reason: stderr.to_string(),
            })
        }
    }

    fn runtime_name(&self) -> &'static str {
        "Podman"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn podman_runtime_new() {
        let runtime = PodmanRuntime::new();
        assert_eq!(runtime.runtime_name(), "Podman");
    }

    #[test]
    fn podman_runtime_default() {
        let runtime = PodmanRuntime::default();
        assert_eq!(runtime.runtime_name(), "Podman");
    }
}
