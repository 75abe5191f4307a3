//! Datagram read loop (spec §4.G / SPEC_FULL §4.M): binds a
//! `SO_REUSEADDR` UDP socket, joins the configured IPv4 multicast
//! group, and feeds each datagram's RTP-stripped payload to a
//! [`crate::teletext::decoder::Decoder`] seven TS packets at a time.
//!
//! `original_source/teletext-ingest.c`'s own RTP header check
//! (`rtp_check_hdr`) is referenced but not present in the retained
//! source, so the validation here is grounded on the teacher's
//! `format::rtp::RTPPacket::parse` (version/length checks), trimmed to
//! this deployment's fixed minimal header: no extension, no CSRC.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use socket2::{Domain, SockAddr, Socket, Type};
use tokio::net::UdpSocket;

use crate::config::Config;
use crate::error::Result;
use crate::teletext::decoder::Decoder;
use crate::teletext::render::FrameSink;
use crate::ts::types::TS_PACKET_SIZE;

/// Fixed RTP header size this deployment expects (no extension, no CSRC).
pub const RTP_HEADER_SIZE: usize = 12;
/// TS packets carried in one RTP/UDP datagram (spec §4.G: "a source of
/// 7×TS chunks per datagram").
pub const TS_PACKETS_PER_DATAGRAM: usize = 7;
/// Total expected datagram size: RTP header plus seven TS packets.
pub const DATAGRAM_SIZE: usize = RTP_HEADER_SIZE + TS_PACKETS_PER_DATAGRAM * TS_PACKET_SIZE;

/// Validates the 12-byte RTP header (version 2, no extension, no CSRC)
/// and returns the slice past it, or `None` if the header is invalid
/// (spec §7 class 2 "invalid RTP header" — the datagram is skipped).
fn strip_rtp_header(datagram: &[u8]) -> Option<&[u8]> {
    if datagram.len() < RTP_HEADER_SIZE {
        return None;
    }
    let first = datagram[0];
    let version = (first >> 6) & 0x03;
    let extension = first & 0x10 != 0;
    let csrc_count = first & 0x0f;
    if version != 2 || extension || csrc_count != 0 {
        log::debug!(
            "invalid RTP header (version {version}, extension {extension}, csrc {csrc_count}), dropping datagram"
        );
        return None;
    }
    Some(&datagram[RTP_HEADER_SIZE..])
}

fn bind_multicast_socket(config: &Config) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
    socket.set_reuse_address(true)?;
    let bind_addr: SocketAddr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port).into();
    socket.bind(&SockAddr::from(bind_addr))?;
    socket.set_nonblocking(true)?;
    socket.join_multicast_v4(&config.multicast_addr, &Ipv4Addr::UNSPECIFIED)?;
    Ok(UdpSocket::from_std(socket.into())?)
}

/// Runs the datagram read loop until the socket errors. Each datagram
/// is expected to carry exactly [`TS_PACKETS_PER_DATAGRAM`] TS packets
/// behind the minimal RTP header; anything else is logged and skipped,
/// matching spec §4.G's "short reads and invalid RTP are logged and
/// skipped".
pub async fn run<S: FrameSink>(config: Config, sink: &mut S) -> Result<()> {
    let socket = bind_multicast_socket(&config)?;
    let mut decoder = Decoder::new(config);
    let mut buf = [0u8; DATAGRAM_SIZE];

    loop {
        let (len, _from) = socket.recv_from(&mut buf).await?;
        if len != DATAGRAM_SIZE {
            log::debug!("short read ({len} of {DATAGRAM_SIZE} bytes), dropping datagram");
            continue;
        }
        let Some(payload) = strip_rtp_header(&buf[..len]) else {
            continue;
        };
        for chunk in payload.chunks_exact(TS_PACKET_SIZE) {
            decoder.feed_ts_packet(chunk, sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_datagram() {
        assert!(strip_rtp_header(&[0u8; 4]).is_none());
    }

    #[test]
    fn rejects_wrong_version() {
        let datagram = [0u8; DATAGRAM_SIZE];
        assert!(strip_rtp_header(&datagram).is_none());
    }

    #[test]
    fn rejects_extension_and_csrc() {
        let mut with_extension = [0u8; DATAGRAM_SIZE];
        with_extension[0] = 0x80 | 0x10; // version 2, extension set
        assert!(strip_rtp_header(&with_extension).is_none());

        let mut with_csrc = [0u8; DATAGRAM_SIZE];
        with_csrc[0] = 0x80 | 0x01; // version 2, csrc_count 1
        assert!(strip_rtp_header(&with_csrc).is_none());
    }

    #[test]
    fn strips_valid_minimal_header() {
        let mut datagram = [0u8; DATAGRAM_SIZE];
        datagram[0] = 0x80; // version 2, no padding/extension/csrc
        datagram[RTP_HEADER_SIZE] = 0x47;
        let payload = strip_rtp_header(&datagram).unwrap();
        assert_eq!(payload.len(), DATAGRAM_SIZE - RTP_HEADER_SIZE);
        assert_eq!(payload[0], 0x47);
    }
}
