//! The page renderer (spec §4.F): trims each row to its subtitle box,
//! opens/closes inline `<font>` colour spans, escapes the three HTML
//! entities, and joins rows into one tab-separated frame.

use crate::utils::bits::ucs2_to_char;

use super::page::{PageBuffer, CELL_END_BOX, CELL_START_BOX, COLS};

/// One emitted subtitle instance: show/hide timestamps plus
/// `\t`-joined rendered rows (library-embedding surface, spec §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Millisecond timestamp the subtitle should appear.
    pub show_ms: u64,
    /// Millisecond timestamp the subtitle should disappear. Always
    /// `>= show_ms` (spec §8 invariant 1).
    pub hide_ms: u64,
    /// Rendered text, `\t`-separated rows, no trailing newline.
    pub text: String,
}

/// Receives one [`Frame`] per flushed, non-empty page.
///
/// Implemented by the CLI binary's stdout writer and by any embedding
/// application (spec §6 "Frame sink interface").
pub trait FrameSink {
    /// Emits a completed frame. Implementations should not panic; a
    /// sink that cannot accept a frame should drop it silently,
    /// matching spec §7's "no failure is propagated to the sink".
    fn emit(&mut self, frame: Frame);
}

fn colour_hex(code: u8) -> &'static str {
    match code {
        0 => "#000000",
        1 => "#ff0000",
        2 => "#00ff00",
        3 => "#ffff00",
        4 => "#0000ff",
        5 => "#ff00ff",
        6 => "#00ffff",
        _ => "#ffffff",
    }
}

fn render_row(page: &PageBuffer, row: usize) -> Option<String> {
    let col_start = (0..COLS).rev().find(|&c| page.cell(row, c) == CELL_START_BOX)?;

    let mut col_stop = None;
    for c in (col_start + 1)..COLS {
        let v = page.cell(row, c);
        if v == CELL_END_BOX {
            break;
        }
        if v > 0x20 {
            col_stop = Some(c);
        }
    }
    let col_stop = col_stop?;

    let mut fg: u8 = 7;
    let mut open = false;
    let mut out = String::new();

    for c in 0..=col_stop {
        let v = page.cell(row, c);

        if c < col_start && v <= 7 {
            fg = v as u8;
        }

        if c == col_start && fg != 7 {
            out.push_str("<font color=\"");
            out.push_str(colour_hex(fg));
            out.push_str("\">");
            open = true;
        }

        if c >= col_start && v <= 7 {
            if open {
                out.push_str("</font> ");
                open = false;
            }
            if (1..=6).contains(&v) {
                fg = v as u8;
                out.push_str("<font color=\"");
                out.push_str(colour_hex(fg));
                out.push_str("\">");
                open = true;
            } else {
                fg = 7;
            }
        }

        if v >= 0x20 {
            match v {
                0x3c => out.push_str("&lt;"),
                0x3e => out.push_str("&gt;"),
                0x26 => out.push_str("&amp;"),
                _ => out.push(ucs2_to_char(v)),
            }
        }
    }

    if open {
        out.push_str("</font>");
    }
    Some(out)
}

/// Renders a flushed page into a [`Frame`], or `None` if the page has
/// no start-box cell at all (spec §4.F: "Only invoked on pages that
/// contain at least one start-box cell ... empty pages are silently
/// dropped").
pub fn render(page: &PageBuffer) -> Option<Frame> {
    if !page.has_start_box() {
        return None;
    }

    let lines: Vec<String> = (1..=24).filter_map(|row| render_row(page, row)).collect();
    if lines.is_empty() {
        return None;
    }

    Some(Frame {
        show_ms: page.show_ms,
        hide_ms: page.hide_ms.max(page.show_ms),
        text: lines.join("\t"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn s1_trivial_subtitle() {
        let mut page = PageBuffer::default();
        page.reset(1000);
        page.set(1, 0, CELL_START_BOX);
        page.set(1, 1, b'H' as u16);
        page.set(1, 2, b'i' as u16);
        page.set(1, 3, CELL_END_BOX);
        page.hide_ms = 2000;
        let frame = render(&page).unwrap();
        assert_eq!(frame.text, "Hi");
        assert_eq!(frame.show_ms, 1000);
        assert_eq!(frame.hide_ms, 2000);
    }

    #[test]
    fn s2_coloured_span() {
        let mut page = PageBuffer::default();
        page.reset(0);
        page.set(1, 0, 2); // green
        page.set(1, 1, CELL_START_BOX);
        page.set(1, 2, b'O' as u16);
        page.set(1, 3, b'K' as u16);
        page.set(1, 4, CELL_END_BOX);
        let frame = render(&page).unwrap();
        assert_eq!(frame.text, "<font color=\"#00ff00\">OK</font>");
    }

    #[test]
    fn s3_entity_escape() {
        let mut page = PageBuffer::default();
        page.reset(0);
        page.set(1, 0, CELL_START_BOX);
        page.set(1, 1, b'<' as u16);
        page.set(1, 2, CELL_END_BOX);
        let frame = render(&page).unwrap();
        assert_eq!(frame.text, "&lt;");
    }

    #[test]
    fn empty_page_yields_no_frame() {
        let page = PageBuffer::default();
        assert!(render(&page).is_none());
    }

    #[test]
    fn row_without_printable_content_is_skipped() {
        let mut page = PageBuffer::default();
        page.set(1, 0, CELL_START_BOX);
        page.set(1, 1, CELL_END_BOX);
        page.set(2, 0, CELL_START_BOX);
        page.set(2, 1, b'x' as u16);
        page.set(2, 2, CELL_END_BOX);
        let frame = render(&page).unwrap();
        assert_eq!(frame.text, "x");
    }

    #[test]
    fn multiple_rows_join_with_tab() {
        let mut page = PageBuffer::default();
        page.set(1, 0, CELL_START_BOX);
        page.set(1, 1, b'a' as u16);
        page.set(2, 0, CELL_START_BOX);
        page.set(2, 1, b'b' as u16);
        let frame = render(&page).unwrap();
        assert_eq!(frame.text, "a\tb");
    }
}
