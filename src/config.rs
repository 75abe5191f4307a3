//! # Configuration
//!
//! Unlike the C original this crate is based on (which keeps `config`
//! as a process-wide mutable global, see `original_source/telxcc.c`),
//! [`Config`] is an ordinary value owned by the ingest loop and passed
//! by shared reference into every decoder entry point. There is no
//! legitimate need for any of this to be global (spec design note).

use std::net::Ipv4Addr;

use crate::error::{Result, TtxError};

/// Runtime configuration for a single ingest run.
///
/// `page` is already BCD-encoded on construction (see
/// [`Config::from_args`]) because every comparison against a Teletext
/// page number in [`crate::teletext`] is done in BCD, matching the
/// wire format (ETS 300 706 stores page numbers as BCD digits).
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// TS PID carrying the VBI (Private Stream 1) PES.
    pub pid: u16,
    /// Target Teletext page, BCD-encoded. `0` means "auto-select the
    /// first page whose subtitle flag is observed set".
    pub page: u16,
    /// Multicast group to join.
    pub multicast_addr: Ipv4Addr,
    /// UDP port to bind.
    pub port: u16,
    /// Diagnostic verbosity. Maps to `log::LevelFilter::Debug` vs
    /// `Info` in the binary's logger setup.
    pub verbose: bool,
}

impl Config {
    /// Converts a decimal page number into the BCD form used on the
    /// wire, e.g. `888 -> 0x888`.
    pub fn decimal_page_to_bcd(page: u16) -> u16 {
        ((page / 100) << 8) | ((page / 10 % 10) << 4) | (page % 10)
    }

    /// Parses the four positional CLI arguments `pid page addr port`
    /// into a [`Config`]. `page` is given in decimal and converted to
    /// BCD per [`Config::decimal_page_to_bcd`].
    pub fn from_args(pid: &str, page: &str, addr: &str, port: &str) -> Result<Self> {
        let pid: u16 = pid
            .parse()
            .map_err(|_| TtxError::Usage(format!("invalid pid: {pid}")))?;
        let page: u16 = page
            .parse()
            .map_err(|_| TtxError::Usage(format!("invalid page: {page}")))?;
        let multicast_addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| TtxError::Usage(format!("invalid multicast address: {addr}")))?;
        let port: u16 = port
            .parse()
            .map_err(|_| TtxError::Usage(format!("invalid port: {port}")))?;

        Ok(Self {
            pid,
            page: Self::decimal_page_to_bcd(page),
            multicast_addr,
            port,
            verbose: false,
        })
    }

    /// Returns a copy of this configuration with `verbose` set.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
