//! Byte exchange with a name server.
//!
//! The resolver only needs "send these bytes, give me the reply or tell me
//! it timed out", so that is all [`Transport`] asks for. [`UdpTransport`]
//! is the RFC 1035 §4.2.1 implementation: one datagram out, one back, no
//! EDNS(0), so replies are limited to 512 bytes.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ResolveError, Result};
use crate::packetbuff::PacketBuffer;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `query` to `server` and waits at most `timeout` for the reply.
    ///
    /// Dropping the returned future abandons the exchange.
    async fn exchange(&self, server: SocketAddr, query: &[u8], timeout: Duration)
        -> Result<Vec<u8>>;
}

/// DNS over UDP, a fresh ephemeral socket per exchange.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpTransport;

impl UdpTransport {
    pub fn new() -> Self {
        UdpTransport
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;

        let bind_addr: SocketAddr = if server.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };

        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            ResolveError::TransportError(format!("failed to bind UDP socket: {}", e))
        })?;

        let bytes_sent = tokio::time::timeout_at(deadline, socket.send_to(query, server))
            .await
            .map_err(|_| ResolveError::Timeout(server))?
            .map_err(|e| {
                ResolveError::TransportError(format!("failed to send to {}: {}", server, e))
            })?;

        debug!(server = %server, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; PacketBuffer::MAX_WRITE_LEN];
        loop {
            let (bytes_received, from) =
                tokio::time::timeout_at(deadline, socket.recv_from(&mut recv_buf))
                    .await
                    .map_err(|_| ResolveError::Timeout(server))?
                    .map_err(|e| {
                        ResolveError::TransportError(format!(
                            "failed to receive from {}: {}",
                            server, e
                        ))
                    })?;

            // only the server we asked may answer
            if from != server {
                warn!(expected = %server, received_from = %from, "UDP response from unexpected source");
                continue;
            }

            debug!(server = %server, bytes_received, "UDP response received");

            recv_buf.truncate(bytes_received);
            return Ok(recv_buf);
        }
    }
}
