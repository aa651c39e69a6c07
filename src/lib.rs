//! Gantry - container build and readiness-wait toolchain
//!
//! Builds container images through a daemon HTTP backend or a CLI
//! builder, then blocks deployment until containers are observably
//! ready using composable wait strategies.

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod process;
pub mod runtime;
pub mod stream;
pub mod ui;
pub mod wait;

pub use error::{GantryError, GantryResult};
