//! Catch-all DNS responder for the onboarding access point.
//!
//! Every A query is answered with the portal address so that phones joining
//! the access point pop up the config page. Other query types get an empty
//! NOERROR answer, which makes clients fall back to A.

use std::io::ErrorKind as IoErrorKind;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use crate::traits::CaptiveDns;

const HEADER_LEN: usize = 12;
const TYPE_A: u16 = 1;
const TYPE_ANY: u16 = 255;
const CLASS_IN: u16 = 1;
const ANSWER_TTL_SECS: u32 = 60;

/// UDP DNS responder on port 53.
#[derive(Debug)]
pub struct UdpCaptiveDns {
    port: u16,
    socket: Option<UdpSocket>,
    ip: Ipv4Addr,
}

impl UdpCaptiveDns {
    /// Creates a stopped responder listening on the standard DNS port.
    pub fn new() -> Self {
        Self::with_port(53)
    }

    /// Creates a stopped responder on a custom port (useful on desktop).
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            socket: None,
            ip: Ipv4Addr::UNSPECIFIED,
        }
    }

    /// Local address once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

impl Default for UdpCaptiveDns {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptiveDns for UdpCaptiveDns {
    type Error = std::io::Error;

    fn start(&mut self, ip: Ipv4Addr) -> Result<(), Self::Error> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, self.port))?;
        socket.set_nonblocking(true)?;
        self.socket = Some(socket);
        self.ip = ip;
        Ok(())
    }

    fn process_next_request(&mut self) {
        let Some(socket) = self.socket.as_ref() else {
            return;
        };

        let mut buf = [0u8; 512];
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if e.kind() == IoErrorKind::WouldBlock => return,
            Err(e) => {
                log::debug!("[WiFi] DNS receive failed: {}", e);
                return;
            }
        };

        if let Some(reply) = build_reply(&buf[..len], self.ip) {
            if let Err(e) = socket.send_to(&reply, peer) {
                log::debug!("[WiFi] DNS reply to {} failed: {}", peer, e);
            }
        }
    }

    fn is_running(&self) -> bool {
        self.socket.is_some()
    }
}

/// Builds the reply to a standard query, or `None` if the packet is not one.
pub fn build_reply(query: &[u8], ip: Ipv4Addr) -> Option<Vec<u8>> {
    if query.len() < HEADER_LEN {
        return None;
    }
    let flags = u16::from_be_bytes([query[2], query[3]]);
    let is_response = flags & 0x8000 != 0;
    let opcode = (flags >> 11) & 0xF;
    let qdcount = u16::from_be_bytes([query[4], query[5]]);
    if is_response || opcode != 0 || qdcount == 0 {
        return None;
    }

    // Walk the first question's name
    let mut pos = HEADER_LEN;
    loop {
        let len = *query.get(pos)? as usize;
        if len & 0xC0 != 0 {
            return None;
        }
        pos += 1;
        if len == 0 {
            break;
        }
        pos += len;
    }
    let question_end = pos + 4;
    let question = query.get(HEADER_LEN..question_end)?;
    let qtype = u16::from_be_bytes([query[pos], query[pos + 1]]);
    let qclass = u16::from_be_bytes([query[pos + 2], query[pos + 3]]);
    let answer = (qtype == TYPE_A || qtype == TYPE_ANY) && qclass == CLASS_IN;

    let mut reply = Vec::with_capacity(question_end + 16);
    reply.extend_from_slice(&query[0..2]);
    // QR, opcode 0, AA, RD copied, RA, NOERROR
    let reply_flags = 0x8400 | (flags & 0x0100) | 0x0080;
    reply.extend_from_slice(&reply_flags.to_be_bytes());
    reply.extend_from_slice(&1u16.to_be_bytes());
    reply.extend_from_slice(&u16::from(answer).to_be_bytes());
    reply.extend_from_slice(&[0, 0, 0, 0]);
    reply.extend_from_slice(question);

    if answer {
        reply.extend_from_slice(&[0xC0, HEADER_LEN as u8]);
        reply.extend_from_slice(&TYPE_A.to_be_bytes());
        reply.extend_from_slice(&CLASS_IN.to_be_bytes());
        reply.extend_from_slice(&ANSWER_TTL_SECS.to_be_bytes());
        reply.extend_from_slice(&4u16.to_be_bytes());
        reply.extend_from_slice(&ip.octets());
    }
    Some(reply)
}
