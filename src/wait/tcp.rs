//! TCP port reachability checker

use crate::error::{GantryError, GantryResult};
use crate::wait::WaitChecker;
use async_trait::async_trait;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Bound on each connect attempt during a poll
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Waits until every configured port accepts a TCP connection.
///
/// The pending address set shrinks as ports become reachable and never
/// grows back; the checker reports success only once it is empty.
pub struct TcpPortChecker {
    host: String,
    ports: Vec<u16>,
    pending: Mutex<Vec<SocketAddr>>,
}

impl TcpPortChecker {
    /// Resolve one socket address per port on `host`.
    pub fn new(host: &str, ports: &[u16]) -> GantryResult<Self> {
        let mut pending = Vec::with_capacity(ports.len());
        for &port in ports {
            let addr = (host, port)
                .to_socket_addrs()
                .map_err(|e| GantryError::io(format!("resolving {}:{}", host, port), e))?
                .next()
                .ok_or(GantryError::UnresolvableAddress {
                    host: host.to_string(),
                    port,
                })?;
            pending.push(addr);
        }

        Ok(Self {
            host: host.to_string(),
            ports: ports.to_vec(),
            pending: Mutex::new(pending),
        })
    }
}

#[async_trait]
impl WaitChecker for TcpPortChecker {
    async fn check(&self) -> GantryResult<bool> {
        let snapshot: Vec<SocketAddr> = self.pending.lock().unwrap().clone();

        let mut reached = Vec::new();
        for addr in snapshot {
            // Connection refusal is expected while the service starts up
            match timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    debug!("Port {} is reachable", addr);
                    drop(stream);
                    reached.push(addr);
                }
                _ => {}
            }
        }

        let mut pending = self.pending.lock().unwrap();
        pending.retain(|addr| !reached.contains(addr));
        Ok(pending.is_empty())
    }

    async fn clean_up(&self) {
        // Sockets are closed right after each connect attempt
    }

    fn label(&self) -> String {
        let ports: Vec<String> = self.ports.iter().map(u16::to_string).collect();
        format!("TCP port check on {}:[{}]", self.host, ports.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    /// Grab a port no one is listening on by binding and dropping
    async fn free_port() -> u16 {
        let (listener, port) = listener().await;
        drop(listener);
        port
    }

    #[tokio::test]
    async fn reports_true_once_all_ports_reachable() {
        let (_a, port_a) = listener().await;
        let (_b, port_b) = listener().await;

        let checker = TcpPortChecker::new("127.0.0.1", &[port_a, port_b]).unwrap();
        assert!(checker.check().await.unwrap());
        checker.clean_up().await;
    }

    #[tokio::test]
    async fn pending_set_shrinks_monotonically() {
        let (_open, open_port) = listener().await;
        let closed_port = free_port().await;

        let checker = TcpPortChecker::new("127.0.0.1", &[open_port, closed_port]).unwrap();

        assert!(!checker.check().await.unwrap());
        assert_eq!(checker.pending.lock().unwrap().len(), 1);

        // The open port stays satisfied; once the second opens, success
        let late = TcpListener::bind(("127.0.0.1", closed_port)).await.unwrap();
        assert!(checker.check().await.unwrap());
        // Success is sticky: the pending set stays empty
        assert!(checker.check().await.unwrap());
        drop(late);
    }

    #[tokio::test]
    async fn unreachable_port_is_not_an_error() {
        let port = free_port().await;
        let checker = TcpPortChecker::new("127.0.0.1", &[port]).unwrap();
        assert!(!checker.check().await.unwrap());
    }

    #[test]
    fn label_names_host_and_ports() {
        let checker = TcpPortChecker::new("127.0.0.1", &[80, 443]).unwrap();
        assert_eq!(checker.label(), "TCP port check on 127.0.0.1:[80, 443]");
    }
}
