//! # Utility Functions and Types
//!
//! Bit-level and byte-level primitives shared by every layer of the
//! pipeline: the Hamming 8/4 and Hamming 24/18 error-correcting
//! decodes used throughout ETS 300 706, wire-order bit reversal, the
//! odd-parity check used by Level 1 text, and UCS-2 -> UTF-8
//! conversion.
//!
//! ```rust
//! use ttx_ingest::utils::bits::unham_8_4;
//!
//! let (value, corrupt) = unham_8_4(0x00);
//! assert!(!corrupt);
//! assert_eq!(value, 0x00);
//! ```

/// Hamming decode, parity check and character-encoding primitives.
pub mod bits;

// Re-export commonly used functions
pub use bits::*;
