//! # Error Types
//!
//! This module provides the error types used throughout the crate. It
//! defines a central error type `TtxError` for everything that aborts
//! the *process* (bad usage, a socket that will not bind, a multicast
//! group that cannot be joined). Per-datagram, per-packet and
//! per-character decode failures are never represented as `TtxError` —
//! ETS 300 706 decoding is best-effort, so those are logged and the
//! offending unit is skipped in place, matching the source's
//! "stream-invalid, recoverable" error class.
//!
//! ## Example Usage
//!
//! ```rust
//! use ttx_ingest::error::{Result, TtxError};
//!
//! fn bind_multicast(addr: &str) -> Result<()> {
//!     if addr.is_empty() {
//!         return Err(TtxError::Usage("missing multicast address".into()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Primary error type for the ttx-ingest crate.
///
/// Only infrastructure failures reach this type: socket setup,
/// multicast membership, and command-line usage. Everything downstream
/// of a successfully bound socket is decoded best-effort and never
/// propagates an error upward (see [`crate::teletext`] module docs).
#[derive(Error, Debug)]
pub enum TtxError {
    /// I/O errors from socket setup (bind, `recv`, multicast join).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad CLI invocation: wrong argument count or an argument that
    /// does not parse as the expected type.
    #[error("usage error: {0}")]
    Usage(String),
}

/// A specialized `Result` type for ttx-ingest operations.
pub type Result<T> = std::result::Result<T, TtxError>;
