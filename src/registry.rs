//! Registry: every stream, every destination's overlay, one lock.
//!
//! The terminal is a single shared resource, so all stream mutation, all
//! overlay bookkeeping and all destination writes are serialized by the
//! registry's mutex. The lock is dropped only while a caller location is
//! being resolved (see [`crate::Logger::output`]); the stream doing so stays
//! reserved, so other emits on it wait on a condition variable.
//!
//! ```text
//!  Logger ─┐                      ┌── WriterState (stderr)
//!  Logger ─┼── Arc<Registry> ─────┤
//!  Logger ─┘   Mutex<State>       └── WriterState (file)
//! ```

use crate::ansi;
use crate::error::Result;
use crate::logger::{
    Clock, Defaults, Logger, LoggerConfig, LocationResolver, StreamState, SystemClock,
    TrackCaller,
};
use crate::overlay::{self, WriterState};
use crate::template::{CodeTable, ColorTemplate};
use crate::terminal::{Destination, DestinationId, OutputBuffer};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// State guarded by the registry lock.
pub(crate) struct RegistryState {
    /// Streams in registration order. Never shrinks.
    pub streams: Vec<StreamState>,
    writers: HashMap<DestinationId, WriterState>,
    pub defaults: Defaults,
    pub codes: CodeTable,
    out: OutputBuffer,
}

impl RegistryState {
    fn writer(&mut self, id: DestinationId) -> &mut WriterState {
        self.writers.entry(id).or_default()
    }

    /// Re-expand every prefix after a default changed.
    fn reprocess_prefixes(&mut self) {
        let Self {
            streams,
            defaults,
            codes,
            ..
        } = self;
        for stream in streams.iter_mut() {
            stream.reprocess_prefix(defaults, codes);
        }
    }

    /// Render `line` for stream `index` and commit it to scrollback.
    ///
    /// On success, any style left open by `line` is reopened in front of
    /// the stream's pending text.
    pub fn commit_line(&mut self, index: usize, line: &[u8]) -> Result<()> {
        let Self {
            streams,
            writers,
            defaults,
            out,
            ..
        } = self;
        let stream = &mut streams[index];
        let style = ansi::ActiveStyle::scan(line);
        let color_enabled = stream.is_color_enabled(defaults);
        let destination = stream.destination.clone();
        let rendered = stream.render_line(line, color_enabled);

        let writer = writers.entry(destination.id()).or_default();
        writer.commit(&destination, out, |w, o| w.write_line(o, rendered))?;
        stream.continue_style(style);
        Ok(())
    }

    /// Redraw the overlay row of `destination` from every stream's
    /// pending partial line.
    pub fn update_temp_output(&mut self, destination: &Destination) -> Result<()> {
        let id = destination.id();
        let Self {
            streams,
            writers,
            defaults,
            out,
            ..
        } = self;
        let writer = writers.entry(id).or_default();
        let max_width = writer.resolve_width(destination).saturating_sub(1);

        let mut fragments: Vec<Vec<u8>> = Vec::new();
        for stream in streams.iter_mut() {
            if stream.destination.id() != id || !stream.is_partial_lines_visible(defaults) {
                continue;
            }
            if !ansi::has_visible_text(&stream.pending) {
                continue;
            }
            let color_enabled = stream.is_color_enabled(defaults);
            fragments.push(stream.render_pending(color_enabled).to_vec());
        }

        let row = overlay::compose(fragments.iter().map(Vec::as_slice), max_width);
        writer.commit(destination, out, |w, o| w.set_temp_output(o, &row))
    }
}

/// Shared home of all log streams.
///
/// Create one with [`Registry::new`] or [`Registry::builder`], then hand
/// out streams with [`Registry::logger`].
pub struct Registry {
    state: Mutex<RegistryState>,
    /// Signalled whenever a stream's emit finishes.
    emit_done: Condvar,
    clock: Box<dyn Clock>,
    resolver: Box<dyn LocationResolver>,
}

impl Registry {
    /// A registry with the system clock, `#[track_caller]` locations and
    /// default settings.
    pub fn new() -> Arc<Self> {
        Self::builder().build()
    }

    /// Start configuring a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Register a new stream writing to `destination`.
    pub fn logger(self: &Arc<Self>, destination: Destination, config: LoggerConfig) -> Logger {
        let mut state = self.lock();
        let stream = StreamState::new(destination, config, &state.defaults, &state.codes);
        state.streams.push(stream);
        let index = state.streams.len() - 1;
        drop(state);
        Logger::from_parts(Arc::clone(self), index)
    }

    /// Number of registered streams.
    pub fn stream_count(&self) -> usize {
        self.lock().streams.len()
    }

    /// Add or replace a template color name.
    pub fn add_ansi_code(&self, name: impl Into<String>, code: u32) {
        self.lock().codes.insert(name, code);
    }

    /// Default partial-line visibility.
    pub fn set_default_partial_lines_visible(&self, flag: bool) {
        self.lock().defaults.partial_lines_visible = flag;
    }

    /// Default color output.
    pub fn set_default_color_enabled(&self, flag: bool) {
        self.lock().defaults.color_enabled = flag;
    }

    /// Default template expansion. Re-expands inheriting prefixes.
    pub fn set_default_color_template_enabled(&self, flag: bool) {
        let mut state = self.lock();
        state.defaults.color_template_enabled = flag;
        state.reprocess_prefixes();
    }

    /// Default template pattern. Re-expands inheriting prefixes.
    pub fn set_default_template(&self, template: ColorTemplate) {
        let mut state = self.lock();
        state.defaults.template = template;
        state.reprocess_prefixes();
    }

    /// Snapshot of the current defaults.
    pub fn defaults(&self) -> Defaults {
        self.lock().defaults.clone()
    }

    /// Pin the display width of `destination`.
    pub fn set_term_width(&self, destination: &Destination, width: u16) {
        self.lock().writer(destination.id()).set_width(width);
    }

    /// Bytes currently shown on the overlay row of `destination`.
    pub fn overlay_contents(&self, destination: &Destination) -> Vec<u8> {
        self.lock()
            .writers
            .get(&destination.id())
            .map(|w| w.displayed().to_vec())
            .unwrap_or_default()
    }

    /// Redraw the overlay row of `destination`.
    pub fn refresh(&self, destination: &Destination) -> Result<()> {
        self.lock().update_temp_output(destination)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock()
    }

    pub(crate) const fn emit_done(&self) -> &Condvar {
        &self.emit_done
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn resolver(&self) -> &dyn LocationResolver {
        self.resolver.as_ref()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}

/// Builder for [`Registry`].
pub struct RegistryBuilder {
    clock: Box<dyn Clock>,
    resolver: Box<dyn LocationResolver>,
    defaults: Defaults,
    codes: CodeTable,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            clock: Box::new(SystemClock),
            resolver: Box::new(TrackCaller),
            defaults: Defaults::default(),
            codes: CodeTable::default(),
        }
    }
}

impl RegistryBuilder {
    /// Use a custom clock.
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Use a custom caller-location resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: impl LocationResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Start from these defaults.
    #[must_use]
    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Start from this code table.
    #[must_use]
    pub fn codes(mut self, codes: CodeTable) -> Self {
        self.codes = codes;
        self
    }

    /// Finish.
    pub fn build(self) -> Arc<Registry> {
        Arc::new(Registry {
            state: Mutex::new(RegistryState {
                streams: Vec::new(),
                writers: HashMap::new(),
                defaults: self.defaults,
                codes: self.codes,
                out: OutputBuffer::new(),
            }),
            emit_done: Condvar::new(),
            clock: self.clock,
            resolver: self.resolver,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::HeaderFlags;
    use crate::terminal::Capture;

    fn quiet() -> LoggerConfig {
        LoggerConfig::new("", HeaderFlags::empty())
    }

    #[test]
    fn test_streams_are_appended_in_order() {
        let registry = Registry::new();
        let dest = Destination::new(Capture::new());
        registry.logger(dest.clone(), quiet());
        registry.logger(dest, quiet());
        assert_eq!(registry.stream_count(), 2);
    }

    #[test]
    fn test_multi_stream_overlay_order() {
        let registry = Registry::new();
        let capture = Capture::new();
        let dest = Destination::new(capture.clone());
        let a = registry.logger(dest.clone(), quiet());
        let b = registry.logger(dest.clone(), quiet());
        a.print("foo").unwrap();
        b.print("bar").unwrap();
        assert_eq!(registry.overlay_contents(&dest), b"foo | bar");
        assert_eq!(capture.contents(), b"foo | bar");
    }

    #[test]
    fn test_stderr_handles_share_one_overlay() {
        let registry = Registry::new();
        let fetch = registry.logger(Destination::stderr(), quiet());
        let build = registry.logger(Destination::stderr(), quiet());
        fetch.set_term_width(80);

        fetch.print("fetching").unwrap();
        build.print("building").unwrap();
        assert_eq!(
            registry.overlay_contents(&Destination::stderr()),
            b"fetching | building"
        );

        fetch.close().unwrap();
        build.close().unwrap();
        assert!(registry.overlay_contents(&Destination::stderr()).is_empty());
    }

    #[test]
    fn test_overlay_skips_other_destinations_and_hidden_streams() {
        let registry = Registry::new();
        let dest = Destination::new(Capture::new());
        let other = Destination::new(Capture::new());
        let a = registry.logger(dest.clone(), quiet());
        let hidden = registry.logger(dest.clone(), quiet().partial_lines_visible(false));
        let elsewhere = registry.logger(other.clone(), quiet());
        a.print("a").unwrap();
        hidden.print("h").unwrap();
        elsewhere.print("e").unwrap();
        assert_eq!(registry.overlay_contents(&dest), b"a");
        assert_eq!(registry.overlay_contents(&other), b"e");
    }

    #[test]
    fn test_overlay_skips_style_only_pending() {
        let registry = Registry::new();
        let dest = Destination::new(Capture::new());
        let a = registry.logger(dest.clone(), quiet());
        let b = registry.logger(dest.clone(), quiet());
        a.print("\x1b[31m").unwrap();
        b.print("b").unwrap();
        assert_eq!(registry.overlay_contents(&dest), b"b");
    }

    #[test]
    fn test_refresh_twice_writes_nothing_more() {
        let registry = Registry::new();
        let capture = Capture::new();
        let dest = Destination::new(capture.clone());
        let a = registry.logger(dest.clone(), quiet());
        a.print("steady").unwrap();
        let before = capture.len();
        registry.refresh(&dest).unwrap();
        registry.refresh(&dest).unwrap();
        assert_eq!(capture.len(), before);
    }

    #[test]
    fn test_width_truncation() {
        let registry = Registry::new();
        let dest = Destination::new(Capture::new());
        registry.set_term_width(&dest, 20);
        let a = registry.logger(dest.clone(), quiet());
        a.print("abcdefghijklmnopqrstuvwxyz").unwrap();
        let overlay = registry.overlay_contents(&dest);
        assert_eq!(overlay, b"abcdefghijklmno ...");
        assert_eq!(overlay.len(), 19);
    }

    #[test]
    fn test_default_template_change_reexpands_prefix() {
        let registry = Registry::new();
        let capture = Capture::new();
        let dest = Destination::new(capture.clone());
        let a = registry.logger(dest, LoggerConfig::new("@[red:E] ", HeaderFlags::empty()));
        registry.set_default_color_template_enabled(true);
        a.println("x").unwrap();
        assert_eq!(capture.contents(), b"\x1b[31mE\x1b[39m x\n");
    }

    #[test]
    fn test_added_code_is_used() {
        let registry = Registry::new();
        registry.set_default_color_template_enabled(true);
        registry.add_ansi_code("warn", 33);
        let capture = Capture::new();
        let dest = Destination::new(capture.clone());
        let a = registry.logger(dest, quiet());
        a.println("@[warn:w]").unwrap();
        assert_eq!(capture.contents(), b"\x1b[33mw\x1b[39m\n");
    }

    #[test]
    fn test_global_color_disable_strips_everything() {
        let registry = Registry::new();
        registry.set_default_color_template_enabled(true);
        registry.set_default_color_enabled(false);
        let capture = Capture::new();
        let dest = Destination::new(capture.clone());
        let a = registry.logger(dest, LoggerConfig::new("@[cyan]> ", HeaderFlags::empty()));
        a.println("@[bright:loud] \x1b[35mraw\x1b[0m").unwrap();
        assert_eq!(capture.contents(), b"> loud raw\n");
    }
}
