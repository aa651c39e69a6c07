//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Gantry - container build and readiness-wait toolchain
///
/// Builds a container image for a project, starts it, and blocks
/// until the container is observably ready.
#[derive(Parser, Debug)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "GANTRY_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a container image
    Build(BuildArgs),

    /// Pull an image through the daemon with layer progress
    Pull(PullArgs),

    /// Push an image through the daemon with layer progress
    Push(PushArgs),

    /// Start a container and wait for it to become ready
    Run(RunArgs),

    /// Check daemon and runtime availability
    Status,
}

/// Build backend selection
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BuildBackend {
    /// Container daemon HTTP build API
    Daemon,
    /// CLI builder subprocess (e.g. pack)
    Cli,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Image tag to produce (falls back to build.tag in config)
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Build backend (falls back to build.backend in config)
    #[arg(short, long)]
    pub backend: Option<BuildBackend>,

    /// Pre-assembled context tar for the daemon backend
    #[arg(long, required_if_eq("backend", "daemon"))]
    pub archive: Option<PathBuf>,

    /// Source directory for the cli backend
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// CLI builder executable (falls back to build.builder in config)
    #[arg(long)]
    pub builder: Option<String>,
}

/// Arguments for the pull command
#[derive(Parser, Debug)]
pub struct PullArgs {
    /// Image reference to pull
    pub image: String,
}

/// Arguments for the push command
#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Image reference to push
    pub image: String,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Image to run (falls back to container.image in config)
    #[arg(short, long)]
    pub image: Option<String>,

    /// Overall readiness deadline in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Remove the container if it fails to become ready
    #[arg(long)]
    pub rm: bool,

    /// Command and arguments to run in the container
    #[arg(last = true)]
    pub command: Vec<String>,
}
