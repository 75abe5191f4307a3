//! # ETS 300 706 Teletext decoding
//!
//! Turns the 44-byte VBI data units handed up from [`crate::pes`] into
//! rendered subtitle frames: [`packet`] decodes a unit's magazine/row
//! address, [`decoder`] dispatches on that address into page-header,
//! row-content, X/26 overlay, X/28/M-29 charset-control and 8/30
//! service-data handling, [`page`] holds the 25x40 cell matrix being
//! assembled, and [`render`] turns a flushed page into a [`Frame`].

/// Teletext packet addressing (magazine/row/designation) decode.
pub mod packet;

/// The 25x40 page buffer.
pub mod page;

/// The main packet dispatcher and page-selection state machine.
pub mod decoder;

/// Broadcast service data (8/30): programme ID label and UTC reference.
pub mod service;

/// Page rendering: subtitle box trimming, colour spans, HTML escaping.
pub mod render;

pub use decoder::Decoder;
pub use render::{Frame, FrameSink};
