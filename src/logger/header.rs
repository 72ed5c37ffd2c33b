//! Line headers: prefix, date, time and caller location.

use super::caller::CallerLocation;
use bitflags::bitflags;
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::io::Write;

bitflags! {
    /// Fields written in front of every line.
    ///
    /// There is no control over field order or format. `DATE | TIME`
    /// produces `2009/01/23 01:23:23 message`, while
    /// `DATE | TIME | MICROSECONDS | LONG_FILE` produces
    /// `2009/01/23 01:23:23.123123 /a/b/c/d.rs:23: message`.
    ///
    /// # Example
    /// ```
    /// use overlog::HeaderFlags;
    /// let flags = HeaderFlags::STD | HeaderFlags::SHORT_FILE;
    /// assert!(flags.needs_caller());
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HeaderFlags: u8 {
        /// Date in the configured zone: `2009/01/23`.
        const DATE = 0b0000_0001;
        /// Time in the configured zone: `01:23:23`.
        const TIME = 0b0000_0010;
        /// Microsecond resolution: `01:23:23.123123`. Implies `TIME`.
        const MICROSECONDS = 0b0000_0100;
        /// Full file path and line: `/a/b/c/d.rs:23`.
        const LONG_FILE = 0b0000_1000;
        /// Final path element and line: `d.rs:23`. Overrides `LONG_FILE`.
        const SHORT_FILE = 0b0001_0000;
        /// Use UTC rather than the local zone.
        const UTC = 0b0010_0000;
        /// Date and time.
        const STD = Self::DATE.bits() | Self::TIME.bits();
    }
}

impl std::fmt::Debug for HeaderFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

impl HeaderFlags {
    /// Whether any field needs the caller's file and line.
    #[inline]
    pub const fn needs_caller(self) -> bool {
        self.intersects(Self::LONG_FILE.union(Self::SHORT_FILE))
    }

    /// Whether any time-of-day field is present.
    #[inline]
    pub const fn has_clock(self) -> bool {
        self.intersects(Self::TIME.union(Self::MICROSECONDS))
    }
}

/// Everything needed to render one header.
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    /// Color-expanded prefix.
    pub prefix: &'a [u8],
    /// Fields to render.
    pub flags: HeaderFlags,
    /// Timestamp, already in the configured zone.
    pub now: &'a NaiveDateTime,
    /// Caller location (only read when a file flag is set).
    pub caller: &'a CallerLocation,
}

impl Header<'_> {
    /// Append the rendered header to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.prefix);
        let flags = self.flags;
        let now = self.now;

        if flags.contains(HeaderFlags::DATE) {
            let _ = write!(out, "{:04}/{:02}/{:02} ", now.year(), now.month(), now.day());
        }
        if flags.has_clock() {
            let _ = write!(
                out,
                "{:02}:{:02}:{:02}",
                now.hour(),
                now.minute(),
                now.second()
            );
            if flags.contains(HeaderFlags::MICROSECONDS) {
                // leap seconds report nanoseconds past 1e9
                let micros = (now.nanosecond() / 1_000).min(999_999);
                let _ = write!(out, ".{micros:06}");
            }
            out.push(b' ');
        }
        if flags.needs_caller() {
            let file: &str = &self.caller.file;
            let file = if flags.contains(HeaderFlags::SHORT_FILE) {
                short_file(file)
            } else {
                file
            };
            let _ = write!(out, "{file}:{}: ", self.caller.line);
        }
    }
}

/// The final element of `path`.
///
/// A separator at index 0 is kept, so `/main.rs` stays `/main.rs`. The
/// input is never modified, which makes repeated application a no-op.
pub fn short_file(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(i) if i > 0 => &path[i + 1..],
        _ => path,
    }
}
