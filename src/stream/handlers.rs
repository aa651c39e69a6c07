//! Interpreters for decoded daemon messages
//!
//! A daemon message is a flat JSON object with well-known optional keys:
//! `error`, `errorDetail.message`, `stream`, `status`, `id`, `progress`,
//! and `progressDetail`. Key names and presence checks here must stay
//! bit-for-bit compatible with the daemon protocol.

use crate::error::{GantryError, GantryResult};
use crate::stream::decoder::StreamHandler;
use crate::ui::BuildLog;
use serde_json::Value;

/// Raise a build failure from a daemon `error` message, appending
/// `errorDetail.message` in parentheses only when it differs.
fn daemon_error(value: &Value, error: &str) -> GantryError {
    let detail = value
        .pointer("/errorDetail/message")
        .and_then(Value::as_str);

    let message = match detail {
        Some(detail) if detail != error => format!("{} ({})", error, detail),
        _ => error.to_string(),
    };

    GantryError::BuildFailed(message)
}

/// Handler for image-build progress streams.
///
/// Daemon errors abort the build; `stream` chunks are verbose build
/// output; download/pull `status` lines surface at info level.
pub struct BuildResponseHandler<'a> {
    log: &'a dyn BuildLog,
}

impl<'a> BuildResponseHandler<'a> {
    pub fn new(log: &'a dyn BuildLog) -> Self {
        Self { log }
    }
}

impl StreamHandler for BuildResponseHandler<'_> {
    fn process(&mut self, value: Value) -> GantryResult<()> {
        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Err(daemon_error(&value, error));
        }

        if let Some(stream) = value.get("stream").and_then(Value::as_str) {
            self.log.verbose(stream.trim());
        } else if let Some(status) = value.get("status").and_then(Value::as_str) {
            let lower = status.to_lowercase();
            if lower.contains("download") || lower.contains("pulling") {
                match value.get("id").and_then(Value::as_str) {
                    Some(id) => self.log.info(&format!("{}: {}", id, status)),
                    None => self.log.info(status),
                }
            }
        }

        Ok(())
    }
}

/// Handler for image pull/push progress streams.
///
/// Layer progress updates feed the progress bar; plain info lines close
/// the bar, print, and reopen it so progress rendering and log lines
/// don't interleave. The bar lifecycle spans the whole stream.
pub struct PullPushResponseHandler<'a> {
    log: &'a dyn BuildLog,
}

impl<'a> PullPushResponseHandler<'a> {
    pub fn new(log: &'a dyn BuildLog) -> Self {
        Self { log }
    }
}

impl StreamHandler for PullPushResponseHandler<'_> {
    fn start(&mut self) {
        self.log.progress_start();
    }

    fn process(&mut self, value: Value) -> GantryResult<()> {
        if value.get("progressDetail").is_some() {
            let id = value.get("id").and_then(Value::as_str).unwrap_or("");
            let status = value.get("status").and_then(Value::as_str).unwrap_or("");
            let progress = value.get("progress").and_then(Value::as_str).unwrap_or("");
            self.log.progress_update(id, status, progress);
            return Ok(());
        }

        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Err(daemon_error(&value, error));
        }

        self.log.progress_finish();
        match value.get("stream").and_then(Value::as_str) {
            Some(stream) => self.log.info(stream.trim_end_matches('\n')),
            None => match value.get("status").and_then(Value::as_str) {
                Some(status) => self.log.info(status),
                None => self.log.info(&value.to_string()),
            },
        }
        self.log.progress_start();

        Ok(())
    }

    fn stop(&mut self) {
        self.log.progress_finish();
    }
}
