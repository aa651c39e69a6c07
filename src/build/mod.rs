//! Image build backends
//!
//! Two ways to produce an image: the container daemon's HTTP build API
//! (streaming JSON progress) and a CLI builder subprocess such as
//! Cloud-Native Buildpacks' `pack`.

mod cli;
mod daemon;

pub use cli::cli_build;
pub use daemon::DockerDaemon;
