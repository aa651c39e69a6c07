//! Run command - start a container and wait until it is ready

use crate::cli::args::RunArgs;
use crate::config::Config;
use crate::error::{GantryError, GantryResult};
use crate::runtime::{ContainerRuntime, ContainerSpec, PodmanRuntime};
use crate::wait::{checkers_for, wait_until_ready, with_timeout, ContainerRunning};
use console::style;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bound on starting the container, including any implied image pull
const START_TIMEOUT: Duration = Duration::from_secs(300);

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config) -> GantryResult<()> {
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(PodmanRuntime::new());
    debug!("Using runtime: {}", runtime.runtime_name());

    if !runtime.is_available().await? {
        return Err(GantryError::PodmanNotFound);
    }

    let spec = build_spec(&args, config)?;
    info!("Starting container from {}", spec.image);

    // Starting can block on an image pull; bound it separately from the
    // readiness deadline
    let container_id = with_timeout(
        START_TIMEOUT,
        "container start",
        runtime.run(&spec, &args.command),
    )
    .await??;
    println!(
        "{} Container {} started",
        style("✓").green(),
        style(&container_id[..container_id.len().min(12)]).cyan()
    );

    let checkers = checkers_for(&config.wait, runtime.clone(), &container_id).await?;
    if checkers.is_empty() {
        info!("No readiness checks configured; not waiting");
        return Ok(());
    }

    let precondition = ContainerRunning::new(runtime.clone(), &container_id);
    let max_wait = Duration::from_millis(args.timeout_ms.unwrap_or(config.wait.timeout_ms));

    match wait_until_ready(&precondition, max_wait, &checkers).await {
        Ok(elapsed) => {
            println!(
                "{} Ready after {}ms",
                style("✓").green(),
                elapsed.as_millis()
            );
            Ok(())
        }
        Err(e) => {
            if args.rm {
                remove_failed(&*runtime, &container_id).await;
            }
            Err(e)
        }
    }
}

fn build_spec(args: &RunArgs, config: &Config) -> GantryResult<ContainerSpec> {
    let image = args
        .image
        .clone()
        .or_else(|| {
            if config.container.image.is_empty() {
                None
            } else {
                Some(config.container.image.clone())
            }
        })
        .ok_or_else(|| {
            GantryError::User(
                "no image given; pass --image or set container.image in the config".to_string(),
            )
        })?;

    Ok(ContainerSpec {
        image,
        workdir: config.container.workdir.clone(),
        volumes: config.container.volumes.clone(),
        env: config.container.env.clone(),
        network: config.container.network.clone(),
        publish: config.container.publish.clone(),
    })
}

async fn remove_failed(runtime: &dyn ContainerRuntime, container_id: &str) {
    if let Err(e) = runtime.stop(container_id).await {
        warn!("Failed to stop container {}: {}", container_id, e);
    }
    if let Err(e) = runtime.remove(container_id).await {
        warn!("Failed to remove container {}: {}", container_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn spec_prefers_image_flag() {
        let args = RunArgs::parse_from(["run", "--image", "flag:1"]);
        let mut config = Config::default();
        config.container.image = "cfg:1".to_string();
        assert_eq!(build_spec(&args, &config).unwrap().image, "flag:1");
    }

    #[test]
    fn spec_carries_config_run_settings() {
        let args = RunArgs::parse_from(["run"]);
        let mut config = Config::default();
        config.container.image = "cfg:1".to_string();
        config.container.publish = vec!["8080:80".to_string()];
        config.container.network = Some("bridge".to_string());

        let spec = build_spec(&args, &config).unwrap();
        assert_eq!(spec.image, "cfg:1");
        assert_eq!(spec.publish, vec!["8080:80"]);
        assert_eq!(spec.network.as_deref(), Some("bridge"));
    }

    #[test]
    fn missing_image_is_a_user_error() {
        let args = RunArgs::parse_from(["run"]);
        let err = build_spec(&args, &Config::default()).unwrap_err();
        assert!(matches!(err, GantryError::User(_)));
    }
}
