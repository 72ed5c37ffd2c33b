//! Active-style tracking over raw SGR escape sequences.
//!
//! Only `ESC[<digits>m` sequences are understood, and only two axes are
//! modeled: intensity (bold/dim) and foreground color. That is enough to
//! know which reset closes a run of styled text and which escapes reopen it
//! after a line break.

use regex::bytes::{NoExpand, Regex};
use std::borrow::Cow;
use std::io::Write;
use std::sync::LazyLock;

/// SGR code that resets every attribute.
pub const RESET_ALL: u32 = 0;
/// Highest SGR code treated as an intensity change (`1` bright, `2` dim).
pub const HIGHEST_INTENSITY: u32 = 2;
/// SGR code that restores the default foreground color.
pub const RESET_FORECOLOR: u32 = 39;

const RESET_ALL_BYTES: &[u8] = b"\x1b[0m";
const RESET_FORECOLOR_BYTES: &[u8] = b"\x1b[39m";

static SGR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[([0-9]+)m").expect("SGR pattern is valid"));

/// The style left in effect after a span of bytes.
///
/// # Example
/// ```
/// use overlog::ActiveStyle;
///
/// let style = ActiveStyle::scan(b"\x1b[1m\x1b[31mwarning");
/// assert!(style.any_active());
/// assert_eq!(style.reset_bytes(), b"\x1b[0m");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveStyle {
    intensity: u32,
    forecolor: u32,
}

impl ActiveStyle {
    /// A neutral style (nothing active).
    pub const fn new() -> Self {
        Self {
            intensity: 0,
            forecolor: 0,
        }
    }

    /// Scan `bytes` from a neutral start and return the resulting style.
    pub fn scan(bytes: &[u8]) -> Self {
        let mut style = Self::new();
        style.scan_more(bytes);
        style
    }

    /// Apply every SGR sequence found in `bytes`, in order.
    pub fn scan_more(&mut self, bytes: &[u8]) {
        for caps in SGR.captures_iter(bytes) {
            // Digit runs too long for a u32 are not meaningful SGR codes.
            let code = std::str::from_utf8(&caps[1])
                .ok()
                .and_then(|digits| digits.parse::<u32>().ok());
            if let Some(code) = code {
                self.apply(code);
            }
        }
    }

    /// Apply a single SGR code.
    pub const fn apply(&mut self, code: u32) {
        if code == RESET_ALL {
            self.intensity = 0;
            self.forecolor = 0;
        } else if code <= HIGHEST_INTENSITY {
            self.intensity = code;
        } else if code == RESET_FORECOLOR {
            self.forecolor = 0;
        } else {
            self.forecolor = code;
        }
    }

    /// Active intensity code (0 when neutral).
    #[inline]
    pub const fn intensity(&self) -> u32 {
        self.intensity
    }

    /// Active foreground code (0 when neutral).
    #[inline]
    pub const fn forecolor(&self) -> u32 {
        self.forecolor
    }

    /// Whether any non-neutral style is in effect.
    #[inline]
    pub const fn any_active(&self) -> bool {
        self.intensity != 0 || self.forecolor != 0
    }

    /// The shortest sequence that returns the terminal to neutral.
    ///
    /// Intensity can only be cleared by a full reset; a lone foreground
    /// color gets the narrower `ESC[39m`.
    pub const fn reset_bytes(&self) -> &'static [u8] {
        if self.intensity != 0 {
            RESET_ALL_BYTES
        } else if self.forecolor != 0 {
            RESET_FORECOLOR_BYTES
        } else {
            b""
        }
    }

    /// Append the escapes that re-establish this style (intensity first).
    pub fn write_escapes(&self, out: &mut Vec<u8>) {
        if self.intensity != 0 {
            write_escape(out, self.intensity);
        }
        if self.forecolor != 0 {
            write_escape(out, self.forecolor);
        }
    }
}

/// Append `ESC[<code>m` to `out`.
#[inline]
pub fn write_escape(out: &mut Vec<u8>, code: u32) {
    let _ = write!(out, "\x1b[{code}m");
}

/// Remove every SGR sequence from `bytes`.
pub fn strip(bytes: &[u8]) -> Cow<'_, [u8]> {
    SGR.replace_all(bytes, NoExpand(b""))
}

/// Whether `bytes` still holds anything once SGR sequences are removed.
pub fn has_visible_text(bytes: &[u8]) -> bool {
    !strip(bytes).is_empty()
}
