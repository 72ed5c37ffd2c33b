//! Caller location lookup for the file/line header fields.

use std::borrow::Cow;
use std::panic::Location;

/// A source file and line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerLocation {
    /// Source file path, as reported by the resolver.
    pub file: Cow<'static, str>,
    /// 1-based line, 0 when unknown.
    pub line: u32,
}

impl CallerLocation {
    /// Create a location.
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Sentinel used when resolution fails.
    pub const fn unknown() -> Self {
        Self {
            file: Cow::Borrowed("unknown"),
            line: 0,
        }
    }
}

impl Default for CallerLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

impl From<&'static Location<'static>> for CallerLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }
}

/// Turns a call site into the location shown in headers.
///
/// Resolution runs with the registry lock released, so an expensive
/// resolver (symbolizing a backtrace, say) never stalls other streams.
pub trait LocationResolver: Send + Sync {
    /// Resolve the location to report.
    ///
    /// `site` is the `#[track_caller]` location of the public logging call;
    /// `call_depth` is the number of extra frames the caller asked to skip
    /// above it. Returning `None` yields [`CallerLocation::unknown`].
    fn resolve(&self, site: &'static Location<'static>, call_depth: usize)
    -> Option<CallerLocation>;
}

/// Reports the tracked call site as-is.
///
/// Wrappers that want their own callers reported should carry
/// `#[track_caller]` themselves; `call_depth` is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackCaller;

impl LocationResolver for TrackCaller {
    fn resolve(
        &self,
        site: &'static Location<'static>,
        _call_depth: usize,
    ) -> Option<CallerLocation> {
        Some(CallerLocation::from(site))
    }
}
