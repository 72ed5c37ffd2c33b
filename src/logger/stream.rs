//! Per-stream state owned by the registry.

use super::caller::CallerLocation;
use super::header::{Header, HeaderFlags};
use super::settings::{Defaults, LoggerConfig, Toggle};
use crate::ansi::{self, ActiveStyle};
use crate::template::{CodeTable, ColorTemplate};
use crate::terminal::Destination;
use chrono::NaiveDateTime;
use std::borrow::Cow;

/// Buffers and settings of one logical log stream.
///
/// Only touched with the registry lock held.
#[derive(Debug)]
pub(crate) struct StreamState {
    pub destination: Destination,
    pub flags: HeaderFlags,
    prefix: Vec<u8>,
    prefix_expanded: Vec<u8>,
    /// Text after the last committed newline.
    pub pending: Vec<u8>,
    /// Formatting space for the line being rendered.
    scratch: Vec<u8>,
    pub partial_lines_visible: Toggle,
    pub color_enabled: Toggle,
    pub color_template_enabled: Toggle,
    pub template: Option<ColorTemplate>,
    /// Last resolved caller, reused by overlay renders.
    pub caller: CallerLocation,
    /// Timestamp of the last emission, reused by overlay renders.
    pub now: NaiveDateTime,
    /// Bumped by every reconfiguration.
    pub generation: u64,
    /// An emit owns this stream, possibly with the registry lock released.
    pub emitting: bool,
}

impl StreamState {
    pub fn new(
        destination: Destination,
        config: LoggerConfig,
        defaults: &Defaults,
        codes: &CodeTable,
    ) -> Self {
        let mut stream = Self {
            destination,
            flags: config.flags,
            prefix: config.prefix.into_bytes(),
            prefix_expanded: Vec::new(),
            pending: Vec::new(),
            scratch: Vec::new(),
            partial_lines_visible: config.partial_lines_visible,
            color_enabled: config.color_enabled,
            color_template_enabled: config.color_template_enabled,
            template: config.template,
            caller: CallerLocation::unknown(),
            now: NaiveDateTime::default(),
            generation: 0,
            emitting: false,
        };
        stream.reprocess_prefix(defaults, codes);
        stream
    }

    pub const fn is_partial_lines_visible(&self, defaults: &Defaults) -> bool {
        self.partial_lines_visible.resolve(defaults.partial_lines_visible)
    }

    pub const fn is_color_enabled(&self, defaults: &Defaults) -> bool {
        self.color_enabled.resolve(defaults.color_enabled)
    }

    /// The template to expand with, or `None` when expansion is off.
    pub fn active_template<'a>(&'a self, defaults: &'a Defaults) -> Option<&'a ColorTemplate> {
        self.color_template_enabled
            .resolve(defaults.color_template_enabled)
            .then(|| self.template.as_ref().unwrap_or(&defaults.template))
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: Vec<u8>, defaults: &Defaults, codes: &CodeTable) {
        self.prefix = prefix;
        self.reprocess_prefix(defaults, codes);
    }

    pub fn reprocess_prefix(&mut self, defaults: &Defaults, codes: &CodeTable) {
        let expanded = match self.active_template(defaults) {
            Some(template) => template.expand(codes, &self.prefix).into_owned(),
            None => self.prefix.clone(),
        };
        self.prefix_expanded = expanded;
    }

    /// Mark the stream as reconfigured.
    pub const fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Append caller text, expanding templates when enabled.
    pub fn append(&mut self, text: &[u8], defaults: &Defaults, codes: &CodeTable) {
        let expanded = match self.active_template(defaults) {
            Some(template) => template.expand(codes, text),
            None => Cow::Borrowed(text),
        };
        self.pending.extend_from_slice(&expanded);
    }

    /// Remove the first complete line from pending, without its newline.
    pub fn take_line(&mut self) -> Option<Vec<u8>> {
        let index = self.pending.iter().position(|&b| b == b'\n')?;
        let rest = self.pending.split_off(index + 1);
        let mut line = std::mem::replace(&mut self.pending, rest);
        line.pop();
        Some(line)
    }

    /// Put a line that could not be written back in front of pending.
    pub fn restore_line(&mut self, line: Vec<u8>) {
        let mut restored = line;
        restored.push(b'\n');
        restored.extend_from_slice(&self.pending);
        self.pending = restored;
    }

    /// Reopen `style` at the start of pending so a styled run continues
    /// across the line break.
    pub fn continue_style(&mut self, style: ActiveStyle) {
        if !style.any_active() {
            return;
        }
        let mut continued = Vec::with_capacity(self.pending.len() + 10);
        style.write_escapes(&mut continued);
        continued.extend_from_slice(&self.pending);
        self.pending = continued;
    }

    /// Render a committed line into scratch.
    pub fn render_line(&mut self, line: &[u8], color_enabled: bool) -> &[u8] {
        let header = Header {
            prefix: &self.prefix_expanded,
            flags: self.flags,
            now: &self.now,
            caller: &self.caller,
        };
        render_into(&mut self.scratch, &header, line, color_enabled);
        &self.scratch
    }

    /// Render the pending partial line into scratch.
    pub fn render_pending(&mut self, color_enabled: bool) -> &[u8] {
        let header = Header {
            prefix: &self.prefix_expanded,
            flags: self.flags,
            now: &self.now,
            caller: &self.caller,
        };
        render_into(&mut self.scratch, &header, &self.pending, color_enabled);
        &self.scratch
    }
}

/// `header + reset implied by header + body`, stripped of escapes when
/// color is off.
fn render_into(scratch: &mut Vec<u8>, header: &Header<'_>, body: &[u8], color_enabled: bool) {
    scratch.clear();
    header.write_to(scratch);
    let reset = ActiveStyle::scan(scratch).reset_bytes();
    scratch.extend_from_slice(reset);
    scratch.extend_from_slice(body);
    if !color_enabled {
        let stripped = match ansi::strip(scratch) {
            Cow::Owned(stripped) => Some(stripped),
            Cow::Borrowed(_) => None,
        };
        if let Some(stripped) = stripped {
            *scratch = stripped;
        }
    }
}
