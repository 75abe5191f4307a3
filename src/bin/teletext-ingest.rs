//! CLI entry point: `teletext-ingest <pid> <page> <addr> <port>`.
//!
//! Joins the given multicast group, decodes the selected Teletext
//! subtitle page, and writes one line per completed frame to stdout:
//! `show_ms\thide_ms\tline1\tline2\t...\n`, flushed after every line
//! (matching `original_source/telxcc.c`'s `process_page`, which
//! `fflush(stdout)`s after each emitted frame).

use std::io::Write;

use log::LevelFilter;

use ttx_ingest::config::Config;
use ttx_ingest::teletext::render::{Frame, FrameSink};
use ttx_ingest::{ingest, Result, TtxError};

struct StdoutSink;

impl FrameSink for StdoutSink {
    fn emit(&mut self, frame: Frame) {
        let Frame {
            show_ms,
            hide_ms,
            text,
        } = frame;
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        if writeln!(handle, "{show_ms}\t{hide_ms}\t{text}").is_ok() {
            let _ = handle.flush();
        }
    }
}

fn parse_args() -> Result<Config> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 5 {
        return Err(TtxError::Usage(format!(
            "usage: {} <pid> <page> <addr> <port>",
            args.first().map(String::as_str).unwrap_or("teletext-ingest")
        )));
    }
    Config::from_args(&args[1], &args[2], &args[3], &args[4])
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let verbose = std::env::var("TTX_VERBOSE").is_ok();
    env_logger::Builder::new()
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let config = match parse_args() {
        Ok(config) => config.with_verbose(verbose),
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    let mut sink = StdoutSink;
    if let Err(err) = ingest::run(config, &mut sink).await {
        log::error!("{err}");
        std::process::exit(1);
    }
}
