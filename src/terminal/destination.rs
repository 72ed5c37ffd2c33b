//! Destinations: identity-carrying byte sinks shared by log streams.

use super::OutputBuffer;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

// One handle per process stream, so every logger on stderr shares one overlay.
static STDOUT: LazyLock<Destination> =
    LazyLock::new(|| Destination::with_kind(DestinationKind::Stdout, Box::new(io::stdout())));
static STDERR: LazyLock<Destination> =
    LazyLock::new(|| Destination::with_kind(DestinationKind::Stderr, Box::new(io::stderr())));

/// Stable identity of a destination. Overlay state is keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DestinationId(u64);

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What backs a destination, used to pick the terminal for width queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKind {
    /// Process standard output.
    Stdout,
    /// Process standard error.
    Stderr,
    /// Any other writer. Width queries use the stderr terminal.
    Custom,
}

struct Inner {
    id: DestinationId,
    kind: DestinationKind,
    writer: Mutex<Box<dyn Write + Send>>,
}

/// A shared handle to a writable sink.
///
/// Clones refer to the same sink and compare equal; two destinations
/// created separately are distinct even if they wrap the same file.
#[derive(Clone)]
pub struct Destination {
    inner: Arc<Inner>,
}

impl Destination {
    /// Wrap an arbitrary writer.
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self::with_kind(DestinationKind::Custom, Box::new(writer))
    }

    /// Standard output. Every call returns the same destination.
    pub fn stdout() -> Self {
        STDOUT.clone()
    }

    /// Standard error. Every call returns the same destination.
    pub fn stderr() -> Self {
        STDERR.clone()
    }

    fn with_kind(kind: DestinationKind, writer: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: DestinationId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
                kind,
                writer: Mutex::new(writer),
            }),
        }
    }

    /// Identity of this destination.
    #[inline]
    pub fn id(&self) -> DestinationId {
        self.inner.id
    }

    /// What backs this destination.
    #[inline]
    pub fn kind(&self) -> DestinationKind {
        self.inner.kind
    }

    /// Hand staged bytes to the sink in one write, then flush.
    ///
    /// On failure the error reports how many bytes the sink accepted before
    /// giving up.
    pub(crate) fn write_staged(&self, out: &OutputBuffer) -> Result<(), StagedWriteError> {
        if out.is_empty() {
            return Ok(());
        }
        let mut writer = self.inner.writer.lock();
        let mut counting = Counting {
            inner: &mut *writer,
            written: 0,
        };
        out.flush_to(&mut counting).map_err(|source| StagedWriteError {
            written: counting.written,
            source,
        })
    }

    /// Column count of the terminal behind this destination, if any.
    ///
    /// Custom writers report the width of the stderr terminal; that holds
    /// for the common case of a wrapper around stderr. Use an explicit
    /// width when it doesn't.
    pub fn query_width(&self) -> Option<u16> {
        let is_terminal = match self.inner.kind {
            DestinationKind::Stdout => io::stdout().is_terminal(),
            DestinationKind::Stderr | DestinationKind::Custom => io::stderr().is_terminal(),
        };
        if !is_terminal {
            return None;
        }
        crossterm::terminal::size()
            .ok()
            .map(|(cols, _rows)| cols)
            .filter(|&cols| cols > 0)
    }
}

/// A staged write that did not complete.
#[derive(Debug)]
pub(crate) struct StagedWriteError {
    /// Bytes the sink accepted before the failure.
    pub written: usize,
    pub source: io::Error,
}

/// Counts the bytes a writer accepts.
struct Counting<'a, W: ?Sized> {
    inner: &'a mut W,
    written: usize,
}

impl<W: Write + ?Sized> Write for Counting<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl PartialEq for Destination {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Destination {}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .finish_non_exhaustive()
    }
}

/// An in-memory writer whose bytes can be read back.
///
/// Cloning shares the same storage, so one clone can be handed to
/// [`Destination::new`] while another inspects what was written.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Drain and return everything written so far.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.bytes.lock())
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let a = Destination::new(Capture::new());
        let b = Destination::new(Capture::new());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.kind(), DestinationKind::Custom);
    }

    #[test]
    fn test_capture_shares_storage() {
        let capture = Capture::new();
        let dest = Destination::new(capture.clone());
        let mut out = OutputBuffer::new();
        out.write_raw(b"abc");
        dest.write_staged(&out).unwrap();
        out.clear();
        out.write_raw(b"def");
        dest.write_staged(&out).unwrap();
        assert_eq!(capture.contents(), b"abcdef");
        assert_eq!(capture.take(), b"abcdef");
        assert!(capture.is_empty());
    }

    #[test]
    fn test_std_streams_are_shared() {
        assert_eq!(Destination::stderr(), Destination::stderr());
        assert_eq!(Destination::stdout(), Destination::stdout());
        assert_ne!(Destination::stdout(), Destination::stderr());
        assert_eq!(Destination::stderr().kind(), DestinationKind::Stderr);
    }

    #[test]
    fn test_partial_write_is_counted() {
        struct Stingy(usize);
        impl Write for Stingy {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                if self.0 == 0 {
                    return Err(io::Error::other("full"));
                }
                let n = buf.len().min(self.0);
                self.0 -= n;
                Ok(n)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let dest = Destination::new(Stingy(3));
        let mut out = OutputBuffer::new();
        out.write_raw(b"first\n");
        let err = dest.write_staged(&out).unwrap_err();
        assert_eq!(err.written, 3);
    }

    #[test]
    fn test_display_id() {
        let dest = Destination::new(Capture::new());
        assert!(dest.id().to_string().starts_with('#'));
    }
}
