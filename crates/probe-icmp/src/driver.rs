//! ICMP probe driver implementation.

use crate::packet::build_echo_request;
use async_trait::async_trait;
use probe_core::{ProbeDriver, ProbeError, ProbeReply};
use probe_packets::{parse_datagram, PacketSocket};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, trace};

/// Receive buffer size; large enough for any reply to a maximum-size probe.
const RECV_BUFFER_LEN: usize = 65536;

/// ICMP echo driver.
pub struct IcmpDriver {
    /// Target address.
    destination: Ipv4Addr,
    /// Filler bytes per request.
    payload_size: usize,
    /// Datagram transport.
    socket: Box<dyn PacketSocket>,
    /// Read buffer.
    buffer: Vec<u8>,
}

impl IcmpDriver {
    /// Creates a new ICMP driver.
    pub fn new(destination: Ipv4Addr, payload_size: usize, socket: Box<dyn PacketSocket>) -> Self {
        Self {
            destination,
            payload_size,
            socket,
            buffer: vec![0u8; RECV_BUFFER_LEN],
        }
    }

    fn handle_datagram(&self, len: usize, sender: Ipv4Addr) -> Result<ProbeReply, ProbeError> {
        let parsed = parse_datagram(&self.buffer[..len])?;

        let Some(kind) = parsed.reply_kind() else {
            trace!(
                icmp_type = parsed.icmp_type,
                icmp_code = parsed.icmp_code,
                %sender,
                "Ignored ICMP message that is not a probe reply"
            );
            return Err(ProbeError::PacketMismatch);
        };

        Ok(ProbeReply {
            responder: sender,
            ttl: parsed.header.ttl,
            size: parsed.header.reply_size(),
            sequence: parsed.sequence,
            kind,
        })
    }
}

#[async_trait]
impl ProbeDriver for IcmpDriver {
    async fn send_probe(&mut self, sequence: u32, ttl: Option<u8>) -> Result<(), ProbeError> {
        let packet = build_echo_request(self.payload_size, sequence);

        trace!(
            sequence,
            ttl = ?ttl,
            len = packet.len(),
            "Sending ICMP Echo Request probe"
        );
        self.socket.send_to(&packet, self.destination, ttl).await
    }

    async fn receive_probe(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<ProbeReply>, ProbeError> {
        let Some((n, sender)) = self.socket.recv_from(&mut self.buffer, timeout).await? else {
            return Ok(None);
        };

        match self.handle_datagram(n, sender) {
            Ok(reply) => Ok(Some(reply)),
            Err(e) => {
                if !matches!(e, ProbeError::PacketMismatch) {
                    debug!(error = %e, %sender, "Failed to parse packet");
                }
                Err(e)
            }
        }
    }

    async fn close(&mut self) -> Result<(), ProbeError> {
        self.socket.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_core::ReplyKind;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        sent: Vec<(Vec<u8>, Ipv4Addr, Option<u8>)>,
        closed: bool,
    }

    /// Hands out queued datagrams and records what was sent.
    struct ScriptedSocket {
        inbound: VecDeque<(Vec<u8>, Ipv4Addr)>,
        recorded: Arc<Mutex<Recorded>>,
    }

    #[async_trait]
    impl PacketSocket for ScriptedSocket {
        async fn send_to(
            &mut self,
            packet: &[u8],
            destination: Ipv4Addr,
            ttl: Option<u8>,
        ) -> Result<(), ProbeError> {
            self.recorded
                .lock()
                .unwrap()
                .sent
                .push((packet.to_vec(), destination, ttl));
            Ok(())
        }

        async fn recv_from(
            &mut self,
            buf: &mut [u8],
            _timeout: Duration,
        ) -> Result<Option<(usize, Ipv4Addr)>, ProbeError> {
            Ok(self.inbound.pop_front().map(|(datagram, sender)| {
                buf[..datagram.len()].copy_from_slice(&datagram);
                (datagram.len(), sender)
            }))
        }

        async fn close(&mut self) -> Result<(), ProbeError> {
            self.recorded.lock().unwrap().closed = true;
            Ok(())
        }
    }

    fn datagram(icmp_type: u8, ttl: u8, sequence: u16, payload: usize) -> Vec<u8> {
        let total = 28 + payload;
        let mut d = vec![0u8; total];
        d[0] = 0x45;
        d[2..4].copy_from_slice(&(total as u16).to_be_bytes());
        d[8] = ttl;
        d[9] = 1;
        d[12..16].copy_from_slice(&[10, 1, 1, 1]);
        d[20] = icmp_type;
        d[26..28].copy_from_slice(&sequence.to_be_bytes());
        d
    }

    fn driver(inbound: Vec<(Vec<u8>, Ipv4Addr)>) -> (IcmpDriver, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let socket = ScriptedSocket {
            inbound: inbound.into(),
            recorded: recorded.clone(),
        };
        (
            IcmpDriver::new(Ipv4Addr::new(10, 1, 1, 1), 56, Box::new(socket)),
            recorded,
        )
    }

    #[tokio::test]
    async fn test_send_probe_builds_echo_request() {
        let (mut driver, recorded) = driver(vec![]);
        driver.send_probe(3, Some(7)).await.unwrap();

        let recorded = recorded.lock().unwrap();
        let (packet, destination, ttl) = &recorded.sent[0];
        assert_eq!(packet.len(), 64);
        assert_eq!(packet[0], 8);
        assert_eq!(u16::from_be_bytes([packet[6], packet[7]]), 3);
        assert_eq!(*destination, Ipv4Addr::new(10, 1, 1, 1));
        assert_eq!(*ttl, Some(7));
    }

    #[tokio::test]
    async fn test_receive_echo_reply() {
        let sender = Ipv4Addr::new(10, 1, 1, 1);
        let (mut driver, _) = driver(vec![(datagram(0, 61, 3, 56), sender)]);

        let reply = driver
            .receive_probe(Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.responder, sender);
        assert_eq!(reply.ttl, 61);
        assert_eq!(reply.size, 64);
        assert_eq!(reply.sequence, 3);
        assert_eq!(reply.kind, ReplyKind::EchoReply);
    }

    #[tokio::test]
    async fn test_receive_time_exceeded_uses_sender() {
        let router = Ipv4Addr::new(172, 16, 0, 1);
        let (mut driver, _) = driver(vec![(datagram(11, 254, 0, 28), router)]);

        let reply = driver
            .receive_probe(Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.responder, router);
        assert_eq!(reply.kind, ReplyKind::TimeExceeded);
    }

    #[tokio::test]
    async fn test_receive_timeout_and_mismatch() {
        let sender = Ipv4Addr::new(10, 1, 1, 1);
        let (mut driver, _) = driver(vec![
            (datagram(8, 64, 1, 56), sender),
            (vec![0x45, 0, 0], sender),
        ]);

        let own_request = driver.receive_probe(Duration::from_millis(100)).await;
        assert!(matches!(own_request, Err(ProbeError::PacketMismatch)));

        let truncated = driver.receive_probe(Duration::from_millis(100)).await;
        assert!(truncated.unwrap_err().is_retryable());

        let nothing = driver.receive_probe(Duration::from_millis(100)).await;
        assert!(nothing.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_releases_socket() {
        let (mut driver, recorded) = driver(vec![]);
        driver.close().await.unwrap();
        assert!(recorded.lock().unwrap().closed);
    }
}
