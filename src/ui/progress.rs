//! Progress sink for daemon streams with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Logging sink driven by the build/pull/push response handlers.
///
/// Implementations must be safe to call from concurrent producers
/// (the stderr pump task logs warnings while the main task logs
/// progress), so all methods take `&self`.
pub trait BuildLog: Send + Sync {
    /// Log an info-level line
    fn info(&self, message: &str);

    /// Log a warning line
    fn warn(&self, message: &str);

    /// Log verbose build output
    fn verbose(&self, message: &str);

    /// Open a progress bar for incremental layer progress
    fn progress_start(&self);

    /// Update the open progress bar with a layer's status
    fn progress_update(&self, id: &str, status: &str, progress: &str);

    /// Finish and clear the open progress bar (no-op if none is open)
    fn progress_finish(&self);
}

/// Terminal implementation of [`BuildLog`].
///
/// Interactive mode renders an indicatif spinner whose message tracks
/// the most recent layer update; CI mode prints plain lines. The bar
/// handle lives behind a mutex so interleaved writers serialize.
pub struct TermLog {
    bar: Mutex<Option<ProgressBar>>,
    interactive: bool,
}

impl TermLog {
    /// Create a sink for the given UI context
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            bar: Mutex::new(None),
            interactive: ctx.use_fancy_output(),
        }
    }

    fn make_bar() -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg:.dim}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }
}

impl BuildLog for TermLog {
    fn info(&self, message: &str) {
        let guard = self.bar.lock().unwrap();
        match guard.as_ref() {
            // Route through the bar so the line doesn't tear the render
            Some(bar) => bar.println(message),
            None => println!("{}", message),
        }
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
        let guard = self.bar.lock().unwrap();
        let line = format!("{} {}", style("[WARN]").yellow(), message);
        match guard.as_ref() {
            Some(bar) => bar.println(line),
            None => eprintln!("{}", line),
        }
    }

    fn verbose(&self, message: &str) {
        debug!("{}", message);
    }

    fn progress_start(&self) {
        let mut guard = self.bar.lock().unwrap();
        if guard.is_none() && self.interactive {
            *guard = Some(Self::make_bar());
        }
    }

    fn progress_update(&self, id: &str, status: &str, progress: &str) {
        let guard = self.bar.lock().unwrap();
        if let Some(bar) = guard.as_ref() {
            let message = if id.is_empty() {
                format!("{} {}", status, progress)
            } else {
                format!("{}: {} {}", id, status, progress)
            };
            bar.set_message(message.trim_end().to_string());
        } else {
            debug!("{}: {} {}", id, status, progress);
        }
    }

    fn progress_finish(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(bar) = guard.take() {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_lifecycle() {
        let log = TermLog::new(&UiContext::non_interactive());
        log.progress_start();
        log.progress_update("abc", "Downloading", "[=> ] 2MB/10MB");
        log.info("Pulling layer");
        log.progress_finish();
        // No bar is created outside a terminal; nothing should panic
    }

    #[test]
    fn finish_without_start_is_noop() {
        let log = TermLog::new(&UiContext::non_interactive());
        log.progress_finish();
        log.progress_finish();
    }
}
