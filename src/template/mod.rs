//! Color templates: compact markup expanded into raw SGR escapes.
//!
//! ```text
//! @[red]persistent        -> ESC[31m persistent
//! @[bright,red:scoped] x  -> ESC[1m ESC[31m scoped ESC[0m  x
//! @[notacolor]hello       -> @[notacolor]hello   (unknown name, untouched)
//! ```
//!
//! A scoped token (`name:literal`) closes itself with the minimal reset for
//! the codes it applied. A persistent token emits no reset.

mod codes;

pub use codes::CodeTable;

use crate::ansi::{write_escape, ActiveStyle};
use crate::error::{Error, Result};
use regex::bytes::{Captures, Regex};
use std::borrow::Cow;

/// Pattern recognized when no custom pattern is installed.
///
/// Group 1 holds the comma-separated names, group 2 the optional colon
/// part and group 3 the literal text.
pub const DEFAULT_PATTERN: &str = r"@\[([\w,]+?)(:([^)]*?))?\]";

/// A compiled template pattern.
#[derive(Debug, Clone)]
pub struct ColorTemplate {
    regex: Regex,
}

impl ColorTemplate {
    /// Compile a custom pattern.
    ///
    /// The pattern must expose the same three groups as
    /// [`DEFAULT_PATTERN`]. Matches are expanded independently, so a
    /// pattern should match a token on its own without surrounding context.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        // captures_len counts the implicit whole-match group
        let found = regex.captures_len() - 1;
        if found < 3 {
            return Err(Error::TemplateGroups { found });
        }
        Ok(Self { regex })
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Expand every token in `input` using `codes`.
    pub fn expand<'a>(&self, codes: &CodeTable, input: &'a [u8]) -> Cow<'a, [u8]> {
        self.regex
            .replace_all(input, |caps: &Captures<'_>| expand_token(codes, caps))
    }
}

impl Default for ColorTemplate {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_PATTERN).expect("default template pattern is valid"),
        }
    }
}

fn expand_token(codes: &CodeTable, caps: &Captures<'_>) -> Vec<u8> {
    let token = caps.get(0).map_or(&b""[..], |m| m.as_bytes());
    let Some(names) = caps.get(1) else {
        return token.to_vec();
    };

    let mut out = Vec::with_capacity(token.len() + 8);
    let mut style = ActiveStyle::new();
    for name in names.as_bytes().split(|&b| b == b',') {
        let code = std::str::from_utf8(name)
            .ok()
            .and_then(|name| codes.get(name));
        let Some(code) = code else {
            // one unknown name keeps the whole token literal
            return token.to_vec();
        };
        style.apply(code);
        write_escape(&mut out, code);
    }

    if caps.get(2).is_some_and(|m| !m.is_empty()) {
        if let Some(literal) = caps.get(3) {
            out.extend_from_slice(literal.as_bytes());
        }
        out.extend_from_slice(style.reset_bytes());
    }
    out
}
