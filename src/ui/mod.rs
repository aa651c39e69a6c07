//! Terminal output: progress sink and environment detection

mod context;
mod progress;

pub use context::UiContext;
pub use progress::{BuildLog, TermLog};
