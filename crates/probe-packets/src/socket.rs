//! Raw IPv4 ICMP socket.

use async_trait::async_trait;
use probe_core::ProbeError;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, trace};

/// Datagram transport used by the ICMP driver.
///
/// Calls are independent: nothing read by one `recv_from` is kept for the next.
#[async_trait]
pub trait PacketSocket: Send + Sync {
    /// Sends an ICMP message to `destination`, setting the outbound TTL first
    /// when one is given.
    async fn send_to(
        &mut self,
        packet: &[u8],
        destination: Ipv4Addr,
        ttl: Option<u8>,
    ) -> Result<(), ProbeError>;

    /// Reads one IPv4 datagram, waiting at most `timeout`.
    ///
    /// Returns the datagram length and sender, or `Ok(None)` on timeout.
    async fn recv_from(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<(usize, Ipv4Addr)>, ProbeError>;

    /// Closes the socket.
    async fn close(&mut self) -> Result<(), ProbeError>;
}

/// A raw `AF_INET`/`SOCK_RAW`/`IPPROTO_ICMP` socket driven by tokio.
///
/// The kernel builds the IP header on send and hands back whole IP
/// datagrams on receive.
pub struct RawIcmpSocket {
    socket: Option<UdpSocket>,
}

impl RawIcmpSocket {
    /// Opens the socket. Requires root or `CAP_NET_RAW`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open() -> Result<Self, ProbeError> {
        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)).map_err(|e| {
            if e.kind() == ErrorKind::PermissionDenied {
                ProbeError::PermissionDenied(e)
            } else {
                ProbeError::SocketCreation(e)
            }
        })?;
        socket
            .set_nonblocking(true)
            .map_err(ProbeError::SocketCreation)?;

        // Raw sockets are datagram-oriented, so tokio's UDP wrapper drives
        // them without extra glue.
        let socket = UdpSocket::from_std(std::net::UdpSocket::from(socket))
            .map_err(ProbeError::SocketCreation)?;
        debug!("Opened raw ICMP socket");

        Ok(Self {
            socket: Some(socket),
        })
    }

    fn socket(&self) -> Result<&UdpSocket, ProbeError> {
        self.socket
            .as_ref()
            .ok_or_else(|| ProbeError::Internal("socket already closed".to_string()))
    }
}

#[async_trait]
impl PacketSocket for RawIcmpSocket {
    async fn send_to(
        &mut self,
        packet: &[u8],
        destination: Ipv4Addr,
        ttl: Option<u8>,
    ) -> Result<(), ProbeError> {
        let socket = self.socket()?;
        if let Some(ttl) = ttl {
            socket
                .set_ttl(ttl as u32)
                .map_err(|source| ProbeError::SetTtl { ttl, source })?;
        }

        // ICMP has no ports; the kernel ignores this one.
        let addr = SocketAddr::new(destination.into(), 0);
        socket
            .send_to(packet, addr)
            .await
            .map_err(ProbeError::WriteFailed)?;
        trace!(%destination, len = packet.len(), ttl = ?ttl, "Sent ICMP packet");
        Ok(())
    }

    async fn recv_from(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<(usize, Ipv4Addr)>, ProbeError> {
        let socket = self.socket()?;
        match tokio::time::timeout(timeout, socket.recv_from(buf)).await {
            Err(_) => Ok(None),
            Ok(Ok((n, SocketAddr::V4(sender)))) => Ok(Some((n, *sender.ip()))),
            Ok(Ok((_, SocketAddr::V6(_)))) => Err(ProbeError::PacketMismatch),
            Ok(Err(e)) => match e.kind() {
                ErrorKind::TimedOut | ErrorKind::WouldBlock => Err(ProbeError::ReadTimeout),
                _ => Err(ProbeError::ReadFailed(e)),
            },
        }
    }

    async fn close(&mut self) -> Result<(), ProbeError> {
        if self.socket.take().is_some() {
            debug!("Closed raw ICMP socket");
        }
        Ok(())
    }
}
