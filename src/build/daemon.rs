//! Docker daemon HTTP build backend
//!
//! Issues build/pull requests against the daemon REST API and feeds the
//! chunked JSON response bodies through the stream decoder.

use crate::error::{GantryError, GantryResult};
use crate::stream::{decode_stream, BuildResponseHandler, PullPushResponseHandler};
use crate::ui::BuildLog;
use tracing::{debug, info};

/// Client for a container daemon's HTTP API.
///
/// The client is blocking; async callers run it on a blocking task.
pub struct DockerDaemon {
    base_url: String,
    agent: ureq::Agent,
}

impl DockerDaemon {
    /// Create a client for the daemon at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    /// Check that the daemon answers its ping endpoint
    pub fn ping(&self) -> GantryResult<()> {
        let url = format!("{}/_ping", self.base_url);
        self.agent
            .get(&url)
            .call()
            .map_err(|e| self.unreachable(e))?;
        Ok(())
    }

    /// Build an image from an already-assembled context tar.
    ///
    /// Daemon-reported errors in the response stream abort the build.
    pub fn build(&self, tag: &str, context_tar: &[u8], log: &dyn BuildLog) -> GantryResult<()> {
        let url = format!("{}/build?t={}", self.base_url, encode_query(tag));
        info!("Building image {} via daemon", tag);

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/x-tar")
            .send(context_tar)
            .map_err(|e| self.unreachable(e))?;

        let mut handler = BuildResponseHandler::new(log);
        decode_stream(&mut handler, response.into_body().into_reader())?;

        debug!("Image {} built", tag);
        Ok(())
    }

    /// Pull an image, rendering per-layer progress
    pub fn pull(&self, image: &str, log: &dyn BuildLog) -> GantryResult<()> {
        let url = format!(
            "{}/images/create?fromImage={}",
            self.base_url,
            encode_query(image)
        );
        info!("Pulling image {} via daemon", image);

        let response = self
            .agent
            .post(&url)
            .send_empty()
            .map_err(|e| self.unreachable(e))?;

        let mut handler = PullPushResponseHandler::new(log);
        decode_stream(&mut handler, response.into_body().into_reader())?;

        Ok(())
    }

    /// Push an image, rendering per-layer progress
    pub fn push(&self, image: &str, log: &dyn BuildLog) -> GantryResult<()> {
        let url = format!("{}/images/{}/push", self.base_url, encode_query(image));
        info!("Pushing image {} via daemon", image);

        let response = self
            .agent
            .post(&url)
            .send_empty()
            .map_err(|e| self.unreachable(e))?;

        let mut handler = PullPushResponseHandler::new(log);
        decode_stream(&mut handler, response.into_body().into_reader())?;

        Ok(())
    }

    fn unreachable(&self, error: ureq::Error) -> GantryError {
        GantryError::DaemonUnreachable {
            url: self.base_url.clone(),
            reason: error.to_string(),
        }
    }
}

/// Percent-encode a query parameter value
fn encode_query(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}
