//! Generic subprocess driver for CLI-based builders
//!
//! Pumps stdout line-by-line into a caller callback while a background
//! task drains stderr into the warning log. Draining both pipes
//! concurrently avoids the deadlock where the child blocks on a full
//! stderr buffer while only stdout is being read.

use crate::error::{GantryError, GantryResult};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Bound on waiting for the stderr pump after stdout is drained.
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of one subprocess invocation
#[derive(Debug)]
pub struct ProcessResult {
    /// Exit status code reported by the OS
    pub exit_code: i32,
    /// Captured stderr text, newline-separated
    pub stderr: String,
}

/// Run `command`, feeding each stdout line to `on_line`.
///
/// If `stdin` is given, the blob is written to the child's stdin which
/// is then closed. Stderr lines are logged at warn level and collected
/// into the result. A non-zero exit code is an error naming the command
/// line and code and carrying the captured stderr; the child is killed
/// before any I/O error propagates.
pub async fn execute(
    command: &[String],
    stdin: Option<&str>,
    on_line: &(dyn Fn(String) + Send + Sync),
) -> GantryResult<ProcessResult> {
    let command_line = command.join(" ");
    debug!("Executing: {}", command_line);

    let (program, args) = command
        .split_first()
        .ok_or_else(|| GantryError::Internal("empty command line".to_string()))?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| GantryError::command_failed(&command_line, e))?;

    if let Some(input) = stdin {
        let mut handle = child
            .stdin
            .take()
            .ok_or_else(|| GantryError::Internal("child stdin not piped".to_string()))?;
        if let Err(e) = handle.write_all(input.as_bytes()).await {
            return Err(destroy(child, &command_line, e).await);
        }
        // Dropping the handle closes the child's stdin
        drop(handle);
    }

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| GantryError::Internal("child stderr not piped".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| GantryError::Internal("child stdout not piped".to_string()))?;

    // Background pump: stderr -> warn log + capture
    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut collected = String::new();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    warn!("{}", line);
                    collected.push_str(&line);
                    collected.push('\n');
                }
                Ok(None) => return Ok(collected),
                Err(e) => return Err(e),
            }
        }
    });

    // Stdout pumped on the calling task
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => on_line(line),
            Ok(None) => break,
            Err(e) => {
                stderr_task.abort();
                return Err(destroy(child, &command_line, e).await);
            }
        }
    }

    let stderr_text = match timeout(STDERR_DRAIN_TIMEOUT, stderr_task).await {
        Ok(Ok(Ok(text))) => text,
        Ok(Ok(Err(e))) => return Err(destroy(child, &command_line, e).await),
        Ok(Err(join_err)) => {
            warn!("stderr pump task failed: {}", join_err);
            String::new()
        }
        Err(_) => {
            warn!("stderr pump did not finish within {:?}", STDERR_DRAIN_TIMEOUT);
            String::new()
        }
    };

    let status = child
        .wait()
        .await
        .map_err(|e| GantryError::command_failed(&command_line, e))?;

    let exit_code = status.code().unwrap_or(-1);
    if !status.success() {
        return Err(GantryError::ProcessExit {
            command: command_line,
            code: exit_code,
            stderr: stderr_text,
        });
    }

    Ok(ProcessResult {
        exit_code,
        stderr: stderr_text,
    })
}

/// Force-kill the child, then wrap the I/O failure with the command line.
async fn destroy(mut child: Child, command_line: &str, source: std::io::Error) -> GantryError {
    let _ = child.kill().await;
    GantryError::command_failed(command_line, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn sh(script: &str) -> Vec<String> {
        vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn stdout_lines_arrive_in_order() {
        let lines = Mutex::new(Vec::new());
        let result = execute(&sh("echo one; echo two; echo three"), None, &|line| {
            lines.lock().unwrap().push(line)
        })
        .await
        .unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(*lines.lock().unwrap(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn nonzero_exit_names_command_and_code() {
        let err = execute(&sh("exit 2"), None, &|_| {}).await.unwrap_err();

        match err {
            GantryError::ProcessExit { command, code, .. } => {
                assert!(command.contains("/bin/sh"));
                assert_eq!(code, 2);
            }
            other => panic!("expected ProcessExit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failing_command_stderr_is_preserved() {
        let err = execute(&sh("echo oops >&2; exit 4"), None, &|_| {})
            .await
            .unwrap_err();

        match err {
            GantryError::ProcessExit { code, stderr, .. } => {
                assert_eq!(code, 4);
                assert!(stderr.contains("oops"));
            }
            other => panic!("expected ProcessExit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn stdout_delivered_before_failure_exit() {
        let lines = Mutex::new(Vec::new());
        let err = execute(&sh("echo partial; exit 3"), None, &|line| {
            lines.lock().unwrap().push(line)
        })
        .await
        .unwrap_err();

        assert!(matches!(err, GantryError::ProcessExit { code: 3, .. }));
        assert_eq!(*lines.lock().unwrap(), vec!["partial"]);
    }

    #[tokio::test]
    async fn stdin_blob_is_written_and_closed() {
        let lines = Mutex::new(Vec::new());
        let result = execute(
            &vec!["/bin/cat".to_string()],
            Some("hello\nworld\n"),
            &|line| lines.lock().unwrap().push(line),
        )
        .await
        .unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(*lines.lock().unwrap(), vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn stderr_is_captured_separately() {
        let result = execute(&sh("echo out; echo err >&2"), None, &|_| {})
            .await
            .unwrap();

        assert!(result.stderr.contains("err"));
        assert!(!result.stderr.contains("out"));
    }

    #[tokio::test]
    async fn missing_binary_is_command_failed() {
        let err = execute(
            &vec!["/nonexistent/gantry-test-binary".to_string()],
            None,
            &|_| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GantryError::CommandFailed { .. }));
    }
}
