//! # MPEG-2 Transport Stream demultiplexing
//!
//! Parses the fixed 188-byte TS packet header, tracks per-PID
//! continuity, extracts the Program Clock Reference from the
//! adaptation field, and reassembles the configured PID's payload
//! bytes into complete PES packets handed to [`crate::pes`].
//!
//! This module only demultiplexes the single PID named in
//! [`crate::config::Config`] — PAT/PMT walking is out of scope (the
//! PID is supplied on the command line, see spec §1).

/// TS header layout and packet-size/PID constants.
pub mod types;

/// Continuity tracking, PCR extraction and PES reassembly.
pub mod demux;

pub use demux::{Continuity, PesAssembly, TsDemuxer};
pub use types::TsHeader;
