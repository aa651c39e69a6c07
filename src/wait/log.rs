//! Log-pattern wait checker
//!
//! Matching happens asynchronously on the task that receives log lines;
//! the polling task only reads a one-shot flag. The flag is set at most
//! once and never resets, which is the only synchronization the two
//! sides need.

use crate::error::{GantryError, GantryResult};
use crate::runtime::ContainerRuntime;
use crate::wait::WaitChecker;
use async_trait::async_trait;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

/// Decision after feeding one log line to the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMatchOutcome {
    /// No match yet, keep consuming lines
    Continue,
    /// The pattern matched; stop consuming
    StopMatched,
}

/// Line-matching state machine.
///
/// Patterns are tested with a substring search, not a full match.
/// A pattern enabling the dot-matches-newline flag (`s` in any inline
/// flag group, e.g. `(?s)`, `(?is)`, `(?s:...)`) switches the matcher
/// into buffered mode where lines accumulate and the whole buffer is
/// tested; otherwise each line is tested on its own and discarded.
#[derive(Debug)]
pub struct LineMatcher {
    pattern: Regex,
    buffer: Option<String>,
}

/// Whether the pattern enables the `s` flag in any `(?...)` flag group.
/// An `s` after a `-` in the same group is a negation, not an enable.
fn enables_dotall(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'(' if bytes.get(i + 1) == Some(&b'?') => {
                let mut j = i + 2;
                let mut negated = false;
                while let Some(&b) = bytes.get(j) {
                    match b {
                        b'-' => negated = true,
                        b's' if !negated => return true,
                        b'i' | b'm' | b'x' | b'u' | b'U' | b'R' | b's' => {}
                        _ => break,
                    }
                    j += 1;
                }
                i = j + 1;
            }
            _ => i += 1,
        }
    }
    false
}

impl LineMatcher {
    pub fn new(pattern: &str) -> GantryResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| GantryError::InvalidLogPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern: regex,
            buffer: enables_dotall(pattern).then(String::new),
        })
    }

    /// Feed one log line; returns whether to keep consuming.
    pub fn feed(&mut self, line: &str) -> LogMatchOutcome {
        match self.buffer {
            Some(ref mut buffer) => {
                buffer.push_str(line);
                buffer.push('\n');
                if self.pattern.is_match(buffer) {
                    LogMatchOutcome::StopMatched
                } else {
                    LogMatchOutcome::Continue
                }
            }
            None => {
                if self.pattern.is_match(line) {
                    LogMatchOutcome::StopMatched
                } else {
                    LogMatchOutcome::Continue
                }
            }
        }
    }
}

/// Waits until the container's log output matches a pattern.
///
/// Subscribes to the live log stream on construction. `check` only
/// reads the completion flag; once set it stays set.
pub struct LogWaitChecker {
    pattern: String,
    matched: Arc<AtomicBool>,
    follow_task: Mutex<Option<JoinHandle<()>>>,
}

impl LogWaitChecker {
    pub async fn new(
        pattern: &str,
        runtime: Arc<dyn ContainerRuntime>,
        container_id: &str,
    ) -> GantryResult<Self> {
        let mut matcher = LineMatcher::new(pattern)?;
        let mut lines = runtime.logs_stream(container_id).await?;

        let matched = Arc::new(AtomicBool::new(false));
        let flag = matched.clone();
        let wanted = pattern.to_string();

        // Channel closure covers the source-error case: the runtime
        // logs the failure and stops delivering, and we simply never
        // set the flag.
        let follow_task = tokio::spawn(async move {
            while let Some(line) = lines.recv().await {
                if matcher.feed(&line) == LogMatchOutcome::StopMatched {
                    debug!("Log pattern '{}' matched", wanted);
                    flag.store(true, Ordering::SeqCst);
                    break;
                }
            }
            // Dropping the receiver ends the log subscription
        });

        Ok(Self {
            pattern: pattern.to_string(),
            matched,
            follow_task: Mutex::new(Some(follow_task)),
        })
    }
}

#[async_trait]
impl WaitChecker for LogWaitChecker {
    async fn check(&self) -> GantryResult<bool> {
        Ok(self.matched.load(Ordering::SeqCst))
    }

    async fn clean_up(&self) {
        // Idempotent: the handle is taken on the first call
        let task = self.follow_task.lock().unwrap().take();
        if let Some(task) = task {
            task.abort();
        }
    }

    fn label(&self) -> String {
        format!("log pattern '{}'", self.pattern)
    }
}
