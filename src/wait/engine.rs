//! Wait engine: deadline-bounded polling over a set of checkers

use crate::error::{GantryError, GantryResult};
use crate::wait::{Precondition, WaitChecker, DEFAULT_MAX_WAIT, POLL_INTERVAL};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

/// Poll `checkers` until one succeeds, the precondition fails, or the
/// deadline elapses. Returns the elapsed wait time on success.
///
/// The precondition is evaluated once per iteration before the checkers;
/// when it fails, the current check pass still runs so a checker
/// succeeding in that final iteration counts as overall success. A zero
/// `max_wait` falls back to the 10 s default. Every checker's
/// `clean_up` and the precondition's `cleanup` run exactly once, on
/// every exit path.
pub async fn wait_until_ready(
    precondition: &dyn Precondition,
    max_wait: Duration,
    checkers: &[Box<dyn WaitChecker + '_>],
) -> GantryResult<Duration> {
    let max_wait = if max_wait.is_zero() {
        DEFAULT_MAX_WAIT
    } else {
        max_wait
    };

    let result = poll_loop(precondition, max_wait, checkers).await;

    precondition.cleanup().await;
    for checker in checkers {
        checker.clean_up().await;
    }

    result
}

async fn poll_loop(
    precondition: &dyn Precondition,
    max_wait: Duration,
    checkers: &[Box<dyn WaitChecker + '_>],
) -> GantryResult<Duration> {
    let started = Instant::now();

    loop {
        let still_ok = precondition.is_ok().await;

        for checker in checkers {
            if checker.check().await? {
                let elapsed = started.elapsed();
                debug!("Readiness met by '{}' after {:?}", checker.label(), elapsed);
                return Ok(elapsed);
            }
        }

        if !still_ok {
            return Err(GantryError::PreconditionFailed {
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }

        sleep(POLL_INTERVAL).await;

        if started.elapsed() >= max_wait {
            let labels: Vec<String> = checkers.iter().map(|c| c.label()).collect();
            return Err(GantryError::WaitTimeout {
                elapsed_ms: started.elapsed().as_millis() as u64,
                labels: labels.join(", "),
            });
        }
    }
}

/// Run one unit of work with a hard timeout.
///
/// The work itself is not cancelled beyond being dropped; this only
/// stops waiting for it.
pub async fn with_timeout<T>(
    duration: Duration,
    label: &str,
    work: impl Future<Output = T>,
) -> GantryResult<T> {
    timeout(duration, work)
        .await
        .map_err(|_| GantryError::WaitTimeout {
            elapsed_ms: duration.as_millis() as u64,
            labels: label.to_string(),
        })
}
