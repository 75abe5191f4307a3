//! # Teletext character tables
//!
//! ETS 300 706 defines a Basic Latin set ("G0") that is mostly ASCII
//! but with 13 positions reserved for a national option subset (accent
//! letters, currency signs, etc.), selected by a 3-bit field in the
//! page header and overridable per-row by X/28/M/29 packets. A second
//! set ("G2") supplies precomposed accented Latin letters addressed by
//! diacritical-mark triplets in X/26 enhancement packets.
//!
//! `telxcc.h`'s literal tables were not available to ground this
//! module bit-for-bit (see `DESIGN.md`); [`g0`] and [`g2`] are a
//! best-effort reconstruction from the ETS 300 706 Annex A structure,
//! covering the national subsets and diacritical marks actually
//! exercised by the decode pipeline.

/// G0 Latin base table and national option subsets.
pub mod g0;

/// G2 supplementary (diacritical + Latin letter) composition.
pub mod g2;

use crate::utils::bits::{odd_parity_ok, strip_parity};

/// Checks odd parity and resolves a single Teletext text byte through
/// the active G0 charset (ETS 300 706 chapter 8.2, `telx_to_ucs2`).
///
/// A parity failure yields a plain space rather than the corrupt
/// value or an error, so one bad character never widens past itself.
/// Control codes (`< 0x20`) pass through unremapped; only printable
/// positions go through the national-subset override table.
pub fn telx_to_ucs2(byte: u8, subset_id: u8) -> u16 {
    if !odd_parity_ok(byte) {
        return 0x20;
    }
    let code = strip_parity(byte);
    if code >= 0x20 {
        g0::decode(code, subset_id) as u16
    } else {
        code as u16
    }
}

/// Tracks which G0 national subset is active for the page currently
/// being decoded.
///
/// Precedence, highest first: an X/28 full-page override, an M/29
/// magazine-default override, the subset named in the page header
/// itself. All three are optional; the header value is always present
/// once Y=0 has been seen, so [`ActiveCharset::resolve`] falls back to
/// `0` (English) only before the first header of a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveCharset {
    /// National subset id taken from the page header (Y=0) C12-C14 bits.
    pub header: u8,
    /// Magazine-default override from an M/29 packet, if any.
    pub g0_m29: Option<u8>,
    /// Full-page override from an X/28 packet, if any.
    pub g0_x28: Option<u8>,
}

impl ActiveCharset {
    /// Resolves the effective national subset id, applying the
    /// X/28 > M/29 > header precedence.
    pub fn resolve(&self) -> u8 {
        self.g0_x28.or(self.g0_m29).unwrap_or(self.header)
    }

    /// Clears the per-page overrides. Called when a new page header
    /// (Y=0) is seen, matching `telxcc.c`'s reset of `g0_charset` on
    /// every page boundary.
    pub fn reset_page_overrides(&mut self) {
        self.g0_x28 = None;
    }
}
