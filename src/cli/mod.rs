//! Command-line interface

mod args;
pub mod commands;

pub use args::{BuildArgs, BuildBackend, Cli, Commands, PullArgs, PushArgs, RunArgs};
