//! Status command - check daemon and runtime availability

use crate::build::DockerDaemon;
use crate::config::Config;
use crate::error::{GantryError, GantryResult};
use crate::runtime::{ContainerRuntime, PodmanRuntime};
use console::{style, Emoji};
use std::sync::Arc;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");

/// Execute the status command
pub async fn execute(config: &Config) -> GantryResult<()> {
    println!("{}", style("Gantry System Status").bold().cyan());
    println!();

    let mut all_ok = true;
    all_ok &= check_runtime().await;
    all_ok &= check_daemon(config).await;

    println!();
    if all_ok {
        println!("{}", style("All checks passed").green().bold());
    } else {
        println!(
            "{}",
            style("Some checks failed - see above for details").yellow().bold()
        );
    }

    Ok(())
}

async fn check_runtime() -> bool {
    println!("{}", style("Container runtime:").bold());

    let runtime = PodmanRuntime::new();
    match runtime.is_available().await {
        Ok(true) => {
            println!("  {} {}", CHECK, style("podman available").green());
            true
        }
        Ok(false) => {
            println!(
                "  {} {} - Install: sudo dnf install podman (or apt-get)",
                CROSS,
                style("podman not found").red()
            );
            false
        }
        Err(e) => {
            println!("  {} {} - {}", CROSS, style("Error").red(), e);
            false
        }
    }
}

async fn check_daemon(config: &Config) -> bool {
    println!();
    println!("{}", style("Container daemon:").bold());

    let daemon = Arc::new(DockerDaemon::new(&config.daemon.url));
    let result = tokio::task::spawn_blocking(move || daemon.ping())
        .await
        .unwrap_or_else(|e| Err(GantryError::Internal(format!("ping task panicked: {e}"))));

    match result {
        Ok(()) => {
            println!(
                "  {} {} at {}",
                CHECK,
                style("Reachable").green(),
                config.daemon.url
            );
            true
        }
        Err(e) => {
            println!("  {} {} - {}", CROSS, style("Unreachable").red(), e);
            false
        }
    }
}
