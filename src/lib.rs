#![doc(html_root_url = "https://docs.rs/ttx-ingest/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

//! # ttx-ingest
//!
//! `ttx-ingest` extracts a single DVB Teletext subtitle page from a
//! live MPEG-2 Transport Stream carried over RTP-encapsulated UDP
//! multicast, decodes it per ETSI ETS 300 706 (Presentation Level 1.5,
//! plus the X/26, X/28, M/29 and 8/30 Level 2.5 features listed in the
//! design docs), and emits one record per displayable subtitle
//! instance with show/hide timestamps and HTML-colour-marked-up text.
//!
//! ## Layered pipeline
//!
//! ```text
//! UDP datagram -> RTP strip -> TS demux -> PES reassembly -> VBI data units
//!   -> Teletext packet decode -> page buffer -> rendered frame -> sink
//! ```
//!
//! Each arrow is a module boundary:
//!
//! - [`utils::bits`]: Hamming 8/4 and 24/18 decoders, bit-reversal,
//!   odd-parity check, UCS-2 -> UTF-8.
//! - [`charset`]: G0 Latin base table, national subset overrides, G2
//!   accent composition.
//! - [`ts`]: TS packet header parsing, continuity tracking, PCR
//!   extraction, PES byte-buffer assembly.
//! - [`pes`]: PES header validation, PTS-vs-PCR clock selection,
//!   millisecond timestamp computation, VBI data-unit splitting.
//! - [`teletext`]: Teletext packet decode (header, rows, X/26 overlay,
//!   X/28/M29 charset control, 8/30 service data), the page buffer,
//!   and the page renderer.
//! - [`ingest`]: the datagram read loop, RTP header strip, and
//!   dispatch of the seven TS packets per datagram.
//!
//! ## Quick start (library embedding)
//!
//! ```rust,no_run
//! use ttx_ingest::config::Config;
//! use ttx_ingest::teletext::decoder::Decoder;
//! use ttx_ingest::teletext::render::{Frame, FrameSink};
//!
//! struct PrintSink;
//! impl FrameSink for PrintSink {
//!     fn emit(&mut self, frame: Frame) {
//!         println!("{}\t{}\t{}", frame.show_ms, frame.hide_ms, frame.text);
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_args("4455", "888", "239.0.0.1", "5004")?;
//! let mut decoder = Decoder::new(config);
//! let mut sink = PrintSink;
//! let ts_packet = [0u8; 188];
//! decoder.feed_ts_packet(&ts_packet, &mut sink);
//! # Ok(())
//! # }
//! ```

/// Bit-level and byte-level decode primitives shared by every layer.
pub mod utils;

/// Teletext character tables (G0 Latin base, national subsets, G2 accents).
pub mod charset;

/// MPEG-2 Transport Stream demultiplexing.
pub mod ts;

/// Packetized Elementary Stream parsing and clock recovery.
pub mod pes;

/// ETS 300 706 Teletext packet decoding, page assembly and rendering.
pub mod teletext;

/// Datagram read loop: RTP header validation/strip and TS packet dispatch.
pub mod ingest;

/// Error types and utilities.
pub mod error;

/// Run configuration.
pub mod config;

pub use error::{Result, TtxError};
