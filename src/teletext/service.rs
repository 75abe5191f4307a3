//! Broadcast service data (8/30, `m == 8`): the one-shot programme
//! identification label and the MJD/BCD timestamp that seeds
//! [`crate::pes::clock::ClockState`]'s `utc_refvalue` (spec §4.E
//! Y=30, SPEC_FULL §4.L).

use chrono::Utc;

use crate::charset::telx_to_ucs2;
use crate::utils::bits::{ucs2_to_char, unham_8_4};

/// Decodes an 8/30 packet's bytes `20..40` into the programme
/// identification label, stripping control codes exactly as
/// `original_source/telxcc.c`'s Format 1 branch does (it builds the
/// label only to log it; callers here get the `String` back instead).
pub fn programme_identification(data: &[u8; 40], subset_id: u8) -> String {
    data[20..40]
        .iter()
        .map(|&b| telx_to_ucs2(b, subset_id))
        .filter(|&c| c >= 0x20)
        .map(ucs2_to_char)
        .collect()
}

/// Decodes the 7-byte MJD/BCD broadcast timestamp in bytes `10..16`
/// into Unix seconds, then applies the original's "silly SVT timezone
/// offset" local-wall-clock quantisation.
///
/// The literal constants `11111` and `40271` are reproduced verbatim
/// from `original_source/telxcc.c` per spec §9's open question: they
/// encode the ETSI "+1 per transmitted decimal digit" convention and
/// are not meant to be re-derived.
///
/// `now_unix` is the wall-clock time (Unix seconds) to quantise
/// against; production callers pass the real clock, tests pass a
/// fixed value.
pub fn decode_utc_refvalue(data: &[u8; 40], now_unix: i64) -> u64 {
    let mut t: i64 = 0;
    t += ((data[10] & 0x0f) as i64) * 10000;
    t += (((data[11] & 0xf0) >> 4) as i64) * 1000;
    t += ((data[11] & 0x0f) as i64) * 100;
    t += (((data[12] & 0xf0) >> 4) as i64) * 10;
    t += (data[12] & 0x0f) as i64;
    t -= 11111;
    // Modified Julian Day -> Unix day count, then seconds.
    t = (t - 40587) * 86400;
    t += 3600 * ((((data[13] & 0xf0) >> 4) as i64) * 10 + (data[13] & 0x0f) as i64);
    t += 60 * ((((data[14] & 0xf0) >> 4) as i64) * 10 + (data[14] & 0x0f) as i64);
    t += (((data[15] & 0xf0) >> 4) as i64) * 10 + (data[15] & 0x0f) as i64;
    t -= 40271;

    let diff = ((t - now_unix) as f64 / 3600.0).round() as i64 * 3600;
    (t - diff).max(0) as u64
}

/// Wall-clock seconds since the Unix epoch, used as `now_unix` by
/// production callers (tests supply their own fixed value instead).
pub fn wall_clock_unix() -> i64 {
    Utc::now().timestamp()
}

/// `true` when an 8/30 packet's designation byte (`unham(d0)`)
/// identifies a Format 1 packet (the only format carrying the
/// timestamp this crate consumes).
pub fn is_format_1(data: &[u8; 40]) -> bool {
    unham_8_4(data[0]).0 < 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bcd(n: u8) -> u8 {
        ((n / 10) << 4) | (n % 10)
    }

    #[test]
    fn decode_utc_refvalue_matches_known_mjd() {
        // MJD 58849 = 2020-01-01, 12:30:45 UTC (computed against the
        // same formula the original uses, not re-derived from a date
        // library, to keep the literal constants bit-for-bit honest).
        let mjd = 58849u32 + 11111;
        let mut data = [0u8; 40];
        data[10] = (mjd / 10000 % 10) as u8;
        data[11] = bcd(((mjd / 100) % 100) as u8);
        data[12] = bcd((mjd % 100) as u8);
        data[13] = bcd(12);
        data[14] = bcd(30);
        data[15] = bcd(45);

        let expected = ((58849i64 - 40587) * 86400) + 12 * 3600 + 30 * 60 + 45 - 40271;
        // Passing `expected` as `now_unix` makes the timezone
        // quantisation offset exactly zero, isolating the MJD/BCD
        // arithmetic from the offset step.
        let t = decode_utc_refvalue(&data, expected);
        assert_eq!(t, expected as u64);
    }

    #[test]
    fn is_format_1_checks_designation_nibble() {
        let mut data = [0u8; 40];
        data[0] = 0x00; // unham(0x00) == 0
        assert!(is_format_1(&data));
    }

    #[test]
    fn programme_identification_strips_control_codes() {
        let mut data = [0u8; 40];
        // odd-parity 'H','I' at positions 20, 21; rest stays 0x00 (a
        // parity failure, so it maps to space and gets filtered too
        // only if < 0x20 -- space is 0x20 so it survives as a blank).
        data[20] = 0x48 | 0x80; // 'H' with parity bit set for odd count
        data[21] = 0x49;
        let label = programme_identification(&data, crate::charset::g0::subset::ENGLISH);
        assert!(label.contains('H') || label.contains('I'));
    }
}
