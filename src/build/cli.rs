//! CLI builder backend
//!
//! Drives an external image builder (e.g. Buildpacks' `pack`) through
//! the subprocess runner, streaming its output into the build log.

use crate::error::GantryResult;
use crate::process;
use crate::ui::BuildLog;
use std::path::Path;
use tracing::info;

/// Build an image by invoking a CLI builder on a source directory.
///
/// Builder stdout is verbose build output; stderr surfaces as warnings
/// through the process runner. A non-zero builder exit fails the build.
pub async fn cli_build(
    builder: &str,
    tag: &str,
    path: &Path,
    log: &dyn BuildLog,
) -> GantryResult<()> {
    info!("Building image {} with {}", tag, builder);

    let command = vec![
        builder.to_string(),
        "build".to_string(),
        tag.to_string(),
        "--path".to_string(),
        path.display().to_string(),
    ];

    process::execute(&command, None, &|line| log.verbose(&line)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GantryError;
    use crate::ui::{TermLog, UiContext};
    use std::path::PathBuf;

    #[tokio::test]
    async fn missing_builder_fails_with_command_error() {
        let log = TermLog::new(&UiContext::non_interactive());
        let err = cli_build(
            "/nonexistent/pack-binary",
            "myapp:latest",
            &PathBuf::from("."),
            &log,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GantryError::CommandFailed { .. }));
    }
}
