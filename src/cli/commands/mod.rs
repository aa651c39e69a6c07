//! CLI command implementations

pub mod build;
pub mod pull;
pub mod push;
pub mod run;
pub mod status;

pub use build::execute as build;
pub use pull::execute as pull;
pub use push::execute as push;
pub use run::execute as run;
pub use status::execute as status;
