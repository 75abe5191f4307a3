//! # PES parsing and clock recovery
//!
//! Validates the Private-Stream-1 PES packets reassembled by
//! [`crate::ts`], selects the PTS-vs-PCR clock source, computes the
//! per-PES millisecond timestamp (surviving wraparound across the
//! three clock domains named in spec §3), and splits the PES payload
//! into the 44-byte VBI data units handed to [`crate::teletext`].

/// Sticky PTS-vs-PCR clock selection and `utc_refvalue`/wraparound
/// bookkeeping.
pub mod clock;

/// PES header validation, PTS reconstruction, VBI data-unit splitting.
pub mod parser;

pub use clock::ClockState;
pub use parser::{parse_pes, TeletextDataUnit};
