//! Push command - publish an image through the daemon

use crate::build::DockerDaemon;
use crate::cli::args::PushArgs;
use crate::config::Config;
use crate::error::{GantryError, GantryResult};
use crate::ui::{TermLog, UiContext};
use console::style;
use std::sync::Arc;

/// Execute the push command
pub async fn execute(args: PushArgs, config: &Config) -> GantryResult<()> {
    let daemon = Arc::new(DockerDaemon::new(&config.daemon.url));
    let log = Arc::new(TermLog::new(&UiContext::detect()));

    let image = args.image.clone();
    // ureq is blocking; keep it off the async runtime
    tokio::task::spawn_blocking(move || daemon.push(&image, &*log))
        .await
        .map_err(|e| GantryError::Internal(format!("push task panicked: {e}")))??;

    println!("{} Pushed {}", style("✓").green(), style(&args.image).cyan());
    Ok(())
}
