//! PES header validation and VBI data-unit splitting (spec §4.D).

use crate::utils::bits::reverse_bits;

use super::clock::ClockState;

/// Private Stream 1 — the stream id the VBI PES is carried on.
const STREAM_ID_PRIVATE_1: u8 = 0xbd;

/// EBU Teletext non-subtitle data unit id.
pub const DATA_UNIT_EBU_TELETEXT_NONSUBTITLE: u8 = 0x02;
/// EBU Teletext subtitle data unit id.
pub const DATA_UNIT_EBU_TELETEXT_SUBTITLE: u8 = 0x03;

/// Fixed size, in bytes, of one VBI Teletext data unit's payload.
const TELETEXT_DATA_UNIT_LEN: usize = 44;

/// One 44-byte Teletext packet extracted from a PES payload, already
/// bit-reversed to wire (MSB-first) order, tagged with the data unit
/// id it arrived under and the PES's published millisecond timestamp.
#[derive(Debug, Clone, Copy)]
pub struct TeletextDataUnit {
    /// `0x02` (non-subtitle) or `0x03` (subtitle).
    pub data_unit_id: u8,
    /// Millisecond timestamp published by [`ClockState::observe`] for
    /// the PES this data unit was carried in.
    pub timestamp_ms: u64,
    /// The two address bytes (`clock_in`/`framing_code` already
    /// stripped — see spec §9's typed-decoder note).
    pub address: [u8; 2],
    /// The 40 payload bytes.
    pub data: [u8; 40],
}

fn reconstruct_pts(b: &[u8]) -> u64 {
    (((b[0] as u64 >> 1) & 0x07) << 30)
        | ((b[1] as u64) << 22)
        | (((b[2] as u64) >> 1) << 15)
        | ((b[3] as u64) << 7)
        | ((b[4] as u64) >> 1)
}

/// Validates and parses one reassembled PES buffer, returning the
/// Teletext data units it carries (possibly empty).
///
/// Guards, per spec §4.D: the buffer must be at least 6 bytes, start
/// with the `00 00 01` start code, and carry stream id `0xbd`
/// (Private Stream 1); anything else is a recoverable stream-invalid
/// condition and yields no data units.
pub fn parse_pes(
    buf: &[u8],
    clock: &mut ClockState,
    pcr_ms: Option<u64>,
) -> Vec<TeletextDataUnit> {
    if buf.len() < 6 {
        log::debug!("PES buffer too short ({} bytes)", buf.len());
        return Vec::new();
    }
    if buf[0] != 0x00 || buf[1] != 0x00 || buf[2] != 0x01 {
        log::debug!("PES start code absent");
        return Vec::new();
    }
    if buf[3] != STREAM_ID_PRIVATE_1 {
        log::debug!("PES stream id {:#x} is not Private Stream 1", buf[3]);
        return Vec::new();
    }

    let declared_len = u16::from_be_bytes([buf[4], buf[5]]) as usize;
    let total_len = (declared_len + 6).min(buf.len());

    let mut pos = 6usize;
    let mut pts_ms = None;
    if pos < total_len && buf.len() > pos && (buf[pos] >> 6) == 0b10 {
        if buf.len() < pos + 3 {
            return Vec::new();
        }
        let pts_dts_flags = (buf[pos + 1] >> 6) & 0x03;
        let header_data_length = buf[pos + 2] as usize;
        let optional_start = pos + 3;
        if pts_dts_flags & 0x02 != 0 && buf.len() >= optional_start + 5 {
            let pts = reconstruct_pts(&buf[optional_start..optional_start + 5]);
            pts_ms = Some(pts / 90);
        }
        // +1 skips the EBU data_identifier byte that follows the
        // optional PES header, ahead of the VBI data units.
        pos = optional_start + header_data_length + 1;
    } else {
        // No optional PES header: byte 6 is the data_identifier byte
        // itself, so the data-unit loop starts one byte further in.
        pos = 7;
    }

    let timestamp_ms = match clock.observe(pts_ms, pcr_ms) {
        Some(t) => t,
        None => {
            log::debug!("clock not yet initialised, dropping PES");
            return Vec::new();
        }
    };

    let mut units = Vec::new();
    while pos + 2 <= total_len && pos + 2 <= buf.len() {
        let data_unit_id = buf[pos];
        let data_unit_len = buf[pos + 1] as usize;
        pos += 2;
        if total_len.saturating_sub(pos) < 6 && data_unit_len != TELETEXT_DATA_UNIT_LEN {
            // Fewer than 6 bytes remain and this isn't a recognised
            // unit: nothing more worth scanning for.
            if pos + data_unit_len > buf.len() {
                break;
            }
        }
        let is_teletext = matches!(
            data_unit_id,
            DATA_UNIT_EBU_TELETEXT_NONSUBTITLE | DATA_UNIT_EBU_TELETEXT_SUBTITLE
        );
        if is_teletext && data_unit_len == TELETEXT_DATA_UNIT_LEN && pos + TELETEXT_DATA_UNIT_LEN <= buf.len()
        {
            let mut packet = [0u8; TELETEXT_DATA_UNIT_LEN];
            for (dst, &src) in packet.iter_mut().zip(&buf[pos..pos + TELETEXT_DATA_UNIT_LEN]) {
                *dst = reverse_bits(src);
            }
            let mut address = [0u8; 2];
            address.copy_from_slice(&packet[0..2]);
            let mut data = [0u8; 40];
            data.copy_from_slice(&packet[2..42]);
            units.push(TeletextDataUnit {
                data_unit_id,
                timestamp_ms,
                address,
                data,
            });
        }
        pos += data_unit_len;
        if pos + 6 > total_len {
            break;
        }
    }

    units
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_pes(stream_id: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0x00, 0x00, 0x01, stream_id];
        let len = (payload.len() + 3) as u16; // +3 for the flag/flag/hdrlen bytes we omit below
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn rejects_short_buffer() {
        let mut clock = ClockState::new(0);
        assert!(parse_pes(&[0, 0, 1], &mut clock, Some(0)).is_empty());
    }

    #[test]
    fn rejects_wrong_stream_id() {
        let mut clock = ClockState::new(0);
        let buf = wrap_pes(0xc0, &[0u8; 10]);
        assert!(parse_pes(&buf, &mut clock, Some(0)).is_empty());
    }

    #[test]
    fn extracts_one_teletext_unit_via_pcr_clock() {
        let mut clock = ClockState::new(1_700_000_000);
        // No optional header: payload's first byte's top 2 bits must
        // not be 0b10, so byte 0 is the data_identifier and the data
        // unit loop starts at byte 1.
        let mut payload = vec![0x10, DATA_UNIT_EBU_TELETEXT_SUBTITLE, 44];
        payload.extend_from_slice(&[0xffu8; 44]);
        let buf = wrap_pes(0xbd, &payload);
        let units = parse_pes(&buf, &mut clock, Some(1_234));
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].data_unit_id, DATA_UNIT_EBU_TELETEXT_SUBTITLE);
    }

    #[test]
    fn skips_non_teletext_units_but_keeps_scanning() {
        let mut clock = ClockState::new(1_700_000_000);
        let mut payload = vec![0x10]; // data_identifier byte
        payload.extend_from_slice(&[0x01, 10]); // unrelated data unit id, len 10
        payload.extend_from_slice(&[0u8; 10]);
        payload.push(DATA_UNIT_EBU_TELETEXT_SUBTITLE);
        payload.push(44);
        payload.extend_from_slice(&[0x00u8; 44]);
        let buf = wrap_pes(0xbd, &payload);
        let units = parse_pes(&buf, &mut clock, Some(1));
        assert_eq!(units.len(), 1);
    }
}
