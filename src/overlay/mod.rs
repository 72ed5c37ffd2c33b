//! Overlay: the shared, redrawable temporary line of one destination.
//!
//! Every destination has at most one overlay row. It shows the pending
//! partial lines of all streams writing there, joined with `" | "`. The
//! renderer keeps the exact bytes it last put on that row so that it can:
//!
//! 1. Append only the new suffix when the row merely grew
//! 2. Otherwise reset, return to column 0, redraw, and blank leftovers
//! 3. Commit a finished line to scrollback and start a fresh row
//!
//! All bytes of one operation are staged in an [`OutputBuffer`] and handed
//! to the destination in a single write.

use crate::ansi::{self, ActiveStyle};
use crate::error::{Error, Result};
use crate::terminal::{Destination, OutputBuffer, StagedWriteError};

/// Width assumed when the destination's terminal cannot be queried.
pub const FALLBACK_WIDTH: usize = 80;
/// Separator between fragments of different streams.
pub const SEPARATOR: &[u8] = b" | ";
/// Suffix marking a truncated overlay.
pub const ELLIPSIS: &[u8] = b" ...";

/// What may be on the row after a write that stopped part way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stale {
    /// Reset for the style the partial bytes may have left open.
    reset: &'static [u8],
    /// Columns that may hold leftover text.
    width: usize,
}

/// Per-destination overlay record.
#[derive(Debug, Clone, Default)]
pub struct WriterState {
    /// Bytes currently shown, uncommitted, on the overlay row.
    displayed: Vec<u8>,
    /// Set when a failed write left the row in an unknown state. The next
    /// redraw then starts from column 0 unconditionally.
    stale: Option<Stale>,
    /// Cached display width (0 = unresolved).
    width: u16,
}

impl WriterState {
    /// A record with nothing displayed and no width resolved.
    pub const fn new() -> Self {
        Self {
            displayed: Vec::new(),
            stale: None,
            width: 0,
        }
    }

    /// Whether a failed write left the row in an unknown state.
    #[inline]
    pub const fn is_stale(&self) -> bool {
        self.stale.is_some()
    }

    /// Bytes currently on the overlay row.
    #[inline]
    pub fn displayed(&self) -> &[u8] {
        &self.displayed
    }

    /// Cached width, 0 when unresolved.
    #[inline]
    pub const fn cached_width(&self) -> u16 {
        self.width
    }

    /// Pin the display width instead of querying the terminal.
    #[inline]
    pub const fn set_width(&mut self, width: u16) {
        self.width = width;
    }

    /// Display width, querying and caching it on first use.
    ///
    /// A failed query is not cached, so a terminal attached later is
    /// picked up by the next redraw.
    pub fn resolve_width(&mut self, destination: &Destination) -> usize {
        if self.width == 0 {
            match destination.query_width() {
                Some(width) => self.width = width,
                None => {
                    log::debug!(
                        "destination {} has no terminal width, assuming {FALLBACK_WIDTH}",
                        destination.id()
                    );
                    return FALLBACK_WIDTH;
                }
            }
        }
        usize::from(self.width)
    }

    /// Stage the bytes that turn the overlay row into `content`.
    pub fn set_temp_output(&mut self, out: &mut OutputBuffer, content: &[u8]) {
        let last = self.displayed.as_slice();
        if let Some(stale) = self.stale.take() {
            out.write_raw(stale.reset);
            out.carriage_return();
            out.write_raw(content);
            out.pad_spaces(stale.width.max(last.len()).saturating_sub(content.len()));
        } else if let Some(suffix) = content.strip_prefix(last) {
            out.write_raw(suffix);
        } else {
            out.write_raw(ActiveStyle::scan(last).reset_bytes());
            out.carriage_return();
            out.write_raw(content);
            // Leaves the cursor past the end when the row shrank. The row is
            // transient; write_line ends it right after anyway.
            out.pad_spaces(last.len().saturating_sub(content.len()));
        }
        self.displayed.clear();
        self.displayed.extend_from_slice(content);
    }

    /// Stage `content` as a permanent line and clear the overlay record.
    pub fn write_line(&mut self, out: &mut OutputBuffer, content: &[u8]) {
        self.set_temp_output(out, content);
        out.write_raw(ActiveStyle::scan(content).reset_bytes());
        out.newline();
        self.displayed.clear();
    }

    /// Run `render`, then hand its bytes to `destination` in one write.
    ///
    /// On failure the record is rolled back to what was last written
    /// successfully and the error is returned. If the destination took
    /// some of the bytes, the row is also marked stale so that the next
    /// redraw rewrites it from column 0.
    pub fn commit<F>(
        &mut self,
        destination: &Destination,
        out: &mut OutputBuffer,
        render: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut Self, &mut OutputBuffer),
    {
        let before = self.displayed.clone();
        let stale_before = self.stale;
        out.clear();
        render(self, out);
        let result = destination.write_staged(out);
        if let Err(StagedWriteError { written, .. }) = &result {
            self.displayed = before;
            self.stale = stale_before;
            if *written > 0 {
                self.mark_stale(&out.as_bytes()[..*written]);
            }
        }
        out.clear();
        result.map_err(|StagedWriteError { source, .. }| Error::Write {
            destination: destination.id(),
            source,
        })
    }

    /// Account for `partial`, the bytes that reached the row before a
    /// write failed.
    fn mark_stale(&mut self, partial: &[u8]) {
        let mut style = ActiveStyle::scan(&self.displayed);
        style.scan_more(partial);
        let mut width = self.stale.map_or(0, |s| s.width).max(self.displayed.len());
        width += ansi::strip(partial).len();
        if self.width > 0 {
            width = width.min(usize::from(self.width) - 1);
        }
        self.stale = Some(Stale {
            reset: style.reset_bytes(),
            width,
        });
    }
}

/// Join overlay fragments and fit them into `max_width` bytes.
///
/// Overlong rows are cut so that row plus [`ELLIPSIS`] is exactly
/// `max_width`. A width too small for the ellipsis gets a plain cut. The
/// cut never splits an escape sequence or a UTF-8 character, so it may
/// land a few bytes earlier.
pub fn compose<'a, I>(fragments: I, max_width: usize) -> Vec<u8>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut row = Vec::new();
    for (i, fragment) in fragments.into_iter().enumerate() {
        if i > 0 {
            row.extend_from_slice(SEPARATOR);
        }
        row.extend_from_slice(fragment);
    }
    if row.len() > max_width {
        if max_width >= ELLIPSIS.len() {
            let cut = safe_cut(&row, max_width - ELLIPSIS.len());
            row.truncate(cut);
            row.extend_from_slice(ELLIPSIS);
        } else {
            let cut = safe_cut(&row, max_width);
            row.truncate(cut);
        }
    }
    row
}

/// Largest position `<= cut` that is neither inside an unterminated
/// `ESC[` sequence nor inside a multi-byte character.
fn safe_cut(row: &[u8], mut cut: usize) -> usize {
    while cut > 0 && cut < row.len() && (row[cut] & 0xC0) == 0x80 {
        cut -= 1;
    }
    let head = &row[..cut];
    if let Some(esc) = head.iter().rposition(|&b| b == 0x1b) {
        let terminated = head[esc + 1..]
            .iter()
            .skip(1)
            .any(|b| (0x40..=0x7e).contains(b));
        if !terminated {
            cut = esc;
        }
    }
    cut
}
