//! Build command - produce a container image

use crate::build::{cli_build, DockerDaemon};
use crate::cli::args::{BuildArgs, BuildBackend};
use crate::config::Config;
use crate::error::{GantryError, GantryResult};
use crate::ui::{TermLog, UiContext};
use console::style;
use std::sync::Arc;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> GantryResult<()> {
    let tag = resolve_tag(&args, config)?;
    let backend = resolve_backend(&args, config)?;
    debug!("Building {} via {:?} backend", tag, backend);

    let log = Arc::new(TermLog::new(&UiContext::detect()));

    match backend {
        BuildBackend::Daemon => {
            let archive = args.archive.ok_or_else(|| {
                GantryError::User("the daemon backend needs --archive <context.tar>".to_string())
            })?;
            let context_tar = tokio::fs::read(&archive)
                .await
                .map_err(|e| GantryError::io(format!("reading {}", archive.display()), e))?;

            let daemon = Arc::new(DockerDaemon::new(&config.daemon.url));
            let build_log = log.clone();
            let build_tag = tag.clone();
            // ureq is blocking; keep it off the async runtime
            tokio::task::spawn_blocking(move || {
                daemon.build(&build_tag, &context_tar, &*build_log)
            })
            .await
            .map_err(|e| GantryError::Internal(format!("build task panicked: {e}")))??;
        }
        BuildBackend::Cli => {
            let builder = args
                .builder
                .as_deref()
                .unwrap_or(&config.build.builder)
                .to_string();
            cli_build(&builder, &tag, &args.path, &*log).await?;
        }
    }

    println!("{} Built {}", style("✓").green(), style(&tag).cyan());
    Ok(())
}

fn resolve_tag(args: &BuildArgs, config: &Config) -> GantryResult<String> {
    if let Some(ref tag) = args.tag {
        return Ok(tag.clone());
    }
    if !config.build.tag.is_empty() {
        return Ok(config.build.tag.clone());
    }
    Err(GantryError::User(
        "no image tag given; pass --tag or set build.tag in the config".to_string(),
    ))
}

fn resolve_backend(args: &BuildArgs, config: &Config) -> GantryResult<BuildBackend> {
    if let Some(backend) = args.backend {
        return Ok(backend);
    }
    match config.build.backend.as_str() {
        "daemon" => Ok(BuildBackend::Daemon),
        "cli" => Ok(BuildBackend::Cli),
        other => Err(GantryError::ConfigInvalid {
            path: "build.backend".into(),
            reason: format!("unknown backend '{other}' (expected 'daemon' or 'cli')"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::BuildArgs;
    use clap::Parser;

    fn parse(argv: &[&str]) -> BuildArgs {
        BuildArgs::parse_from(argv)
    }

    #[test]
    fn tag_prefers_flag_over_config() {
        let args = parse(&["build", "--tag", "cli:1"]);
        let mut config = Config::default();
        config.build.tag = "cfg:1".to_string();
        assert_eq!(resolve_tag(&args, &config).unwrap(), "cli:1");
    }

    #[test]
    fn missing_tag_is_a_user_error() {
        let args = parse(&["build"]);
        let err = resolve_tag(&args, &Config::default()).unwrap_err();
        assert!(matches!(err, GantryError::User(_)));
    }

    #[test]
    fn backend_falls_back_to_config() {
        let args = parse(&["build"]);
        let mut config = Config::default();
        config.build.backend = "cli".to_string();
        assert!(matches!(
            resolve_backend(&args, &config).unwrap(),
            BuildBackend::Cli
        ));
    }

    #[test]
    fn unknown_config_backend_rejected() {
        let args = parse(&["build"]);
        let mut config = Config::default();
        config.build.backend = "buildah".to_string();
        assert!(matches!(
            resolve_backend(&args, &config),
            Err(GantryError::ConfigInvalid { .. })
        ));
    }
}
