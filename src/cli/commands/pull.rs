//! Pull command - fetch an image through the daemon

use crate::build::DockerDaemon;
use crate::cli::args::PullArgs;
use crate::config::Config;
use crate::error::{GantryError, GantryResult};
use crate::ui::{TermLog, UiContext};
use console::style;
use std::sync::Arc;

/// Execute the pull command
pub async fn execute(args: PullArgs, config: &Config) -> GantryResult<()> {
    let daemon = Arc::new(DockerDaemon::new(&config.daemon.url));
    let log = Arc::new(TermLog::new(&UiContext::detect()));

    let image = args.image.clone();
    // ureq is blocking; keep it off the async runtime
    tokio::task::spawn_blocking(move || daemon.pull(&image, &*log))
        .await
        .map_err(|e| GantryError::Internal(format!("pull task panicked: {e}")))??;

    println!("{} Pulled {}", style("✓").green(), style(&args.image).cyan());
    Ok(())
}
