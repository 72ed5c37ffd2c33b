//! Logger: the per-stream emission pipeline.
//!
//! Text handed to a [`Logger`] is buffered until a newline shows up. Each
//! complete line is rendered with its header and committed to scrollback;
//! whatever is left over becomes the stream's partial line and is shown on
//! the destination's overlay row next to the partial lines of every other
//! stream writing there.
//!
//! # Example
//!
//! ```rust
//! use overlog::{Capture, Destination, HeaderFlags, LoggerConfig, Registry};
//!
//! let registry = Registry::new();
//! let capture = Capture::new();
//! let dest = Destination::new(capture.clone());
//! let log = registry.logger(dest, LoggerConfig::new("build: ", HeaderFlags::empty()));
//!
//! log.print("compiling...").unwrap();
//! log.println(" done").unwrap();
//! assert!(capture.contents_lossy().ends_with("build: compiling... done\n"));
//! ```

mod caller;
mod clock;
mod header;
mod settings;
mod stream;

pub use caller::{CallerLocation, LocationResolver, TrackCaller};
pub use clock::{wall_time, Clock, FixedClock, SystemClock};
pub use header::{short_file, Header, HeaderFlags};
pub use settings::{Defaults, LoggerConfig, Toggle};
pub(crate) use stream::StreamState;

use crate::error::Result;
use crate::registry::{Registry, RegistryState};
use crate::template::{CodeTable, ColorTemplate};
use crate::terminal::Destination;
use chrono::{DateTime, Utc};
use parking_lot::MutexGuard;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Input to one emission.
#[derive(Clone, Copy)]
enum Feed<'a> {
    Text(&'a [u8]),
    /// Terminate the pending partial line, if any.
    Close,
}

/// Handle to one log stream.
///
/// Cheap to clone; clones write to the same stream. Streams live as long
/// as their registry.
#[derive(Clone)]
pub struct Logger {
    registry: Arc<Registry>,
    index: usize,
}

impl Logger {
    pub(crate) const fn from_parts(registry: Arc<Registry>, index: usize) -> Self {
        Self { registry, index }
    }

    /// The registry this stream belongs to.
    pub const fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Write `text` to the stream.
    ///
    /// Complete lines are committed to scrollback, the remainder is shown
    /// on the overlay row. `call_depth` is passed to the registry's
    /// [`LocationResolver`] when a file header field is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Write`] when the destination rejects the
    /// output. The line that failed stays buffered and is retried by the
    /// next call.
    #[track_caller]
    pub fn output(&self, call_depth: usize, text: &str) -> Result<()> {
        self.emit(Location::caller(), call_depth, Feed::Text(text.as_bytes()))
    }

    /// Write `text` without a trailing newline.
    #[track_caller]
    pub fn print(&self, text: impl AsRef<str>) -> Result<()> {
        self.emit(Location::caller(), 0, Feed::Text(text.as_ref().as_bytes()))
    }

    /// Write `text` followed by a newline.
    #[track_caller]
    pub fn println(&self, text: impl AsRef<str>) -> Result<()> {
        let mut line = String::with_capacity(text.as_ref().len() + 1);
        line.push_str(text.as_ref());
        line.push('\n');
        self.emit(Location::caller(), 0, Feed::Text(line.as_bytes()))
    }

    /// Commit a pending partial line, if there is one.
    #[track_caller]
    pub fn close(&self) -> Result<()> {
        self.emit(Location::caller(), 0, Feed::Close)
    }

    /// Run one emission with this stream reserved.
    ///
    /// The reservation is held across the window where the registry lock
    /// is released for caller lookup, so emits on one stream (through any
    /// clone of the handle) commit their lines one after another.
    fn emit(
        &self,
        site: &'static Location<'static>,
        call_depth: usize,
        feed: Feed<'_>,
    ) -> Result<()> {
        let instant = self.registry.clock().now();
        let mut state = self.registry.lock();
        while state.streams[self.index].emitting {
            self.registry.emit_done().wait(&mut state);
        }
        state.streams[self.index].emitting = true;

        let result = self.emit_reserved(&mut state, site, call_depth, feed, instant);

        state.streams[self.index].emitting = false;
        drop(state);
        self.registry.emit_done().notify_all();
        result
    }

    fn emit_reserved(
        &self,
        state: &mut MutexGuard<'_, RegistryState>,
        site: &'static Location<'static>,
        call_depth: usize,
        feed: Feed<'_>,
        instant: DateTime<Utc>,
    ) -> Result<()> {
        {
            let state = &mut **state;
            let stream = &mut state.streams[self.index];
            match feed {
                Feed::Text(text) => stream.append(text, &state.defaults, &state.codes),
                Feed::Close if stream.pending.is_empty() => return Ok(()),
                Feed::Close => stream.pending.push(b'\n'),
            }
        }

        loop {
            let stream = &mut state.streams[self.index];
            let Some(line) = stream.take_line() else {
                break;
            };
            let mut now = wall_time(instant, stream.flags);

            if stream.flags.needs_caller() {
                let generation = stream.generation;
                let caller = MutexGuard::unlocked(state, || {
                    self.registry.resolver().resolve(site, call_depth)
                })
                .unwrap_or_default();

                let stream = &mut state.streams[self.index];
                if stream.generation != generation {
                    log::trace!("stream {} reconfigured during caller lookup", self.index);
                    now = wall_time(instant, stream.flags);
                }
                stream.caller = caller;
            }

            state.streams[self.index].now = now;
            if let Err(err) = state.commit_line(self.index, &line) {
                state.streams[self.index].restore_line(line);
                return Err(err);
            }
        }

        // Partial lines drawn later still need this call's timestamp.
        let stream = &mut state.streams[self.index];
        stream.now = wall_time(instant, stream.flags);
        let destination = stream.destination.clone();
        state.update_temp_output(&destination)
    }

    fn configure<T>(&self, f: impl FnOnce(&mut StreamState, &Defaults, &CodeTable) -> T) -> T {
        let mut state = self.registry.lock();
        let state = &mut *state;
        let stream = &mut state.streams[self.index];
        stream.touch();
        f(stream, &state.defaults, &state.codes)
    }

    /// Header fields.
    pub fn flags(&self) -> HeaderFlags {
        self.registry.lock().streams[self.index].flags
    }

    /// Change the header fields.
    pub fn set_flags(&self, flags: HeaderFlags) {
        self.configure(|stream, _, _| stream.flags = flags);
    }

    /// The raw (unexpanded) prefix.
    pub fn prefix(&self) -> String {
        String::from_utf8_lossy(self.registry.lock().streams[self.index].prefix()).into_owned()
    }

    /// Change the prefix.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        let prefix = prefix.into().into_bytes();
        self.configure(|stream, defaults, codes| stream.set_prefix(prefix, defaults, codes));
    }

    /// The destination this stream writes to.
    pub fn output_destination(&self) -> Destination {
        self.registry.lock().streams[self.index].destination.clone()
    }

    /// Redirect the stream.
    pub fn set_output(&self, destination: Destination) {
        self.configure(|stream, _, _| stream.destination = destination);
    }

    /// Override partial-line visibility.
    pub fn set_partial_lines_visible(&self, flag: impl Into<Toggle>) {
        let flag = flag.into();
        self.configure(|stream, _, _| stream.partial_lines_visible = flag);
    }

    /// Override color output.
    pub fn set_color_enabled(&self, flag: impl Into<Toggle>) {
        let flag = flag.into();
        self.configure(|stream, _, _| stream.color_enabled = flag);
    }

    /// Override template expansion. Re-expands the prefix.
    pub fn set_color_template_enabled(&self, flag: impl Into<Toggle>) {
        let flag = flag.into();
        self.configure(|stream, defaults, codes| {
            stream.color_template_enabled = flag;
            stream.reprocess_prefix(defaults, codes);
        });
    }

    /// Use a stream-specific template pattern (`None` for the default).
    pub fn set_template_pattern(&self, template: Option<ColorTemplate>) {
        self.configure(|stream, defaults, codes| {
            stream.template = template;
            stream.reprocess_prefix(defaults, codes);
        });
    }

    /// Pin the display width of this stream's destination.
    pub fn set_term_width(&self, width: u16) {
        let destination = self.output_destination();
        self.registry.set_term_width(&destination, width);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("index", &self.index).finish_non_exhaustive()
    }
}
