//! Continuity tracking, PCR extraction and PES byte-buffer reassembly
//! for a single configured PID.

use bytes::{Bytes, BytesMut};

use super::types::{TsHeader, PID_NULL, TS_HEADER_SIZE, TS_PACKET_SIZE};

/// Capacity, in bytes, of the per-PID PES reassembly buffer (spec §3).
pub const PES_BUFFER_CAPACITY: usize = 4096;

/// Tracks the last-seen TS continuity counter for the configured PID.
///
/// `None` is the "unset" sentinel (the C source's `0xff`): either no
/// packet has been seen yet, or the last packet broke continuity
/// without a discontinuity indicator and the assembly was dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Continuity(Option<u8>);

/// Outcome of a continuity observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuityCheck {
    /// Counter matched the expected value (or a discontinuity was
    /// flagged, which resets the expectation without an error).
    Ok,
    /// Counter broke sequence with no discontinuity flag; the caller
    /// must drop the in-flight PES assembly.
    Break,
}

impl Continuity {
    /// Observes one packet's continuity counter, advancing or
    /// resetting internal state per spec §3.
    pub fn check(&mut self, cc: u8, discontinuity: bool) -> ContinuityCheck {
        match self.0 {
            None => {
                self.0 = Some(cc);
                ContinuityCheck::Ok
            }
            Some(prev) => {
                let expected = (prev + 1) % 16;
                if cc == expected || discontinuity {
                    self.0 = Some(cc);
                    ContinuityCheck::Ok
                } else {
                    self.0 = None;
                    ContinuityCheck::Break
                }
            }
        }
    }
}

/// The per-PID PES reassembly buffer described in spec §3.
///
/// Backed by `bytes::BytesMut` (the teacher's own `av::Packet::data`
/// and TS/RTP/RTCP layers all pass completed frames around as
/// `bytes::Bytes`) so a flushed PES hands downstream a cheaply
/// clonable, zero-copy buffer instead of an owned `Vec<u8>` copy.
#[derive(Debug, Clone, Default)]
pub struct PesAssembly {
    buf: BytesMut,
}

impl PesAssembly {
    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn clear(&mut self) {
        self.buf.clear();
    }

    /// Appends `payload`, refusing the append (and keeping the
    /// existing contents) if it would overflow [`PES_BUFFER_CAPACITY`].
    fn try_append(&mut self, payload: &[u8]) {
        if self.buf.len() + payload.len() <= PES_BUFFER_CAPACITY {
            self.buf.extend_from_slice(payload);
        } else {
            log::debug!(
                "PES assembly buffer overflow ({} + {} > {}), dropping append",
                self.buf.len(),
                payload.len(),
                PES_BUFFER_CAPACITY
            );
        }
    }

    /// Takes the accumulated bytes, leaving the buffer empty.
    fn take(&mut self) -> Bytes {
        std::mem::take(&mut self.buf).freeze()
    }
}

struct AdaptationInfo {
    discontinuity: bool,
    pcr_ms: Option<u64>,
}

fn parse_adaptation(packet: &[u8; TS_PACKET_SIZE], header: &TsHeader) -> AdaptationInfo {
    let mut info = AdaptationInfo {
        discontinuity: false,
        pcr_ms: None,
    };
    if !header.adaptation_field_present {
        return info;
    }
    let len = packet[TS_HEADER_SIZE] as usize;
    if len == 0 {
        return info;
    }
    let flags = packet[TS_HEADER_SIZE + 1];
    info.discontinuity = flags & 0x80 != 0;
    let pcr_flag = flags & 0x10 != 0;
    if pcr_flag && len >= 7 {
        let p = &packet[TS_HEADER_SIZE + 2..TS_HEADER_SIZE + 8];
        let base = ((p[0] as u64) << 25)
            | ((p[1] as u64) << 17)
            | ((p[2] as u64) << 9)
            | ((p[3] as u64) << 1)
            | ((p[4] as u64) >> 7);
        let extension = (((p[4] & 0x01) as u64) << 8) | p[5] as u64;
        info.pcr_ms = Some(base / 90 + extension / 27_000);
    }
    info
}

fn payload_offset(packet: &[u8; TS_PACKET_SIZE], header: &TsHeader) -> usize {
    if header.adaptation_field_present {
        TS_HEADER_SIZE + 1 + packet[TS_HEADER_SIZE] as usize
    } else {
        TS_HEADER_SIZE
    }
}

/// Demultiplexes TS packets for a single configured PID, tracking
/// continuity and the global PCR snapshot and reassembling PES bytes.
#[derive(Debug, Clone)]
pub struct TsDemuxer {
    pid: u16,
    continuity: Continuity,
    assembly: PesAssembly,
    pcr_ms: Option<u64>,
}

impl TsDemuxer {
    /// Creates a demuxer that reassembles payload for `pid` only.
    pub fn new(pid: u16) -> Self {
        Self {
            pid,
            continuity: Continuity::default(),
            assembly: PesAssembly::default(),
            pcr_ms: None,
        }
    }

    /// Latest PCR snapshot, in milliseconds, observed on any PID.
    pub fn pcr_ms(&self) -> Option<u64> {
        self.pcr_ms
    }

    /// Feeds one 188-byte TS packet. Returns the completed PES byte
    /// buffer when a payload-unit-start flushes a non-empty assembly.
    pub fn feed(&mut self, packet: &[u8; TS_PACKET_SIZE]) -> Option<Bytes> {
        let header = TsHeader::parse(packet);
        if !header.sync_ok() || header.transport_error {
            return None;
        }

        let adaptation = parse_adaptation(packet, &header);
        if let Some(pcr_ms) = adaptation.pcr_ms {
            self.pcr_ms = Some(pcr_ms);
        }

        if header.pid == PID_NULL || header.pid != self.pid {
            return None;
        }

        if self.continuity.check(header.continuity_counter, adaptation.discontinuity)
            == ContinuityCheck::Break
        {
            log::debug!("TS continuity break on PID {:#x}, dropping PES assembly", self.pid);
            self.assembly.clear();
        }

        if !header.payload_present {
            return None;
        }
        let offset = payload_offset(&packet[..], &header);
        if offset >= TS_PACKET_SIZE {
            return None;
        }
        let payload = &packet[offset..];

        if header.payload_unit_start {
            let completed = if !self.assembly.is_empty() {
                Some(self.assembly.take())
            } else {
                None
            };
            self.assembly.try_append(payload);
            completed
        } else if !self.assembly.is_empty() {
            self.assembly.try_append(payload);
            None
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(pid: u16, pu_start: bool, cc: u8, payload_byte: u8) -> [u8; TS_PACKET_SIZE] {
        let mut p = [payload_byte; TS_PACKET_SIZE];
        p[0] = 0x47;
        p[1] = ((pu_start as u8) << 6) | ((pid >> 8) as u8 & 0x1f);
        p[2] = (pid & 0xff) as u8;
        p[3] = 0x10 | (cc & 0x0f);
        p
    }

    #[test]
    fn rejects_bad_sync() {
        let mut demux = TsDemuxer::new(0x100);
        let mut p = packet(0x100, true, 0, 0xAA);
        p[0] = 0;
        assert!(demux.feed(&p).is_none());
    }

    #[test]
    fn ignores_other_pids() {
        let mut demux = TsDemuxer::new(0x100);
        let p = packet(0x200, true, 0, 0xAA);
        assert!(demux.feed(&p).is_none());
    }

    #[test]
    fn assembles_across_packets_and_flushes_on_next_start() {
        let mut demux = TsDemuxer::new(0x100);
        assert!(demux.feed(&packet(0x100, true, 0, 1)).is_none());
        assert!(demux.feed(&packet(0x100, false, 1, 2)).is_none());
        let completed = demux.feed(&packet(0x100, true, 2, 3)).unwrap();
        assert_eq!(completed.len(), 184 * 2);
        assert!(completed.iter().take(184).all(|&b| b == 1));
        assert!(completed.iter().skip(184).all(|&b| b == 2));
    }

    #[test]
    fn continuity_break_drops_assembly() {
        let mut demux = TsDemuxer::new(0x100);
        assert!(demux.feed(&packet(0x100, true, 0, 1)).is_none());
        // cc jumps from 0 to 5: break, no discontinuity flag.
        assert!(demux.feed(&packet(0x100, false, 5, 2)).is_none());
        // next start flushes nothing because the assembly was dropped
        // and the off-sequence packet before it was discarded (buffer
        // was empty, pu_start clear).
        let completed = demux.feed(&packet(0x100, true, 6, 3));
        assert!(completed.is_none());
    }

    #[test]
    fn extracts_pcr_from_any_pid() {
        let mut demux = TsDemuxer::new(0x100);
        let mut p = packet(0x200, false, 0, 0);
        p[1] = (p[1] & 0xc0) | ((0x200u16 >> 8) as u8 & 0x1f);
        p[3] |= 0x20; // adaptation field present
        p[4] = 7; // adaptation field length
        p[5] = 0x10; // pcr_flag
        // base=1, extension=0 -> 1/90 = 0ms
        p[6] = 0;
        p[7] = 0;
        p[8] = 0;
        p[9] = 2; // base lsb via >>1 of byte4... simplified, just check it doesn't panic
        p[10] = 0;
        p[11] = 0;
        demux.feed(&p);
        assert!(demux.pcr_ms().is_some());
    }
}
