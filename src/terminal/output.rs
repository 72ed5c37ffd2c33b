//! `OutputBuffer`: Single-write staging buffer for overlay redraws.

use std::io::Write;

/// Pre-allocated buffer for staging terminal bytes.
///
/// A renderer operation accumulates everything here, then hands it to the
/// destination in a single `write_all` so a partial redraw is never
/// interleaved with unrelated output.
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer sized for a few terminal lines.
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Clear the buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Get the buffer contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the buffer length.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write raw bytes.
    #[inline]
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Return the cursor to column 0.
    #[inline]
    pub fn carriage_return(&mut self) {
        self.data.push(b'\r');
    }

    /// Terminate the current line.
    #[inline]
    pub fn newline(&mut self) {
        self.data.push(b'\n');
    }

    /// Write `count` spaces, erasing stale characters.
    #[inline]
    pub fn pad_spaces(&mut self, count: usize) {
        self.data.resize(self.data.len() + count, b' ');
    }

    /// Flush to a writer in a single call. Nothing is written when empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush_to<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        writer.write_all(&self.data)?;
        writer.flush()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls() {
        let mut out = OutputBuffer::new();
        out.write_raw(b"ab");
        out.carriage_return();
        out.pad_spaces(3);
        out.newline();
        assert_eq!(out.as_bytes(), b"ab\r   \n");
        assert_eq!(out.len(), 7);
        out.clear();
        assert!(out.is_empty());
    }

    #[test]
    fn test_flush_empty_writes_nothing() {
        struct Refuse;
        impl Write for Refuse {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("must not be called"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::Error::other("must not be called"))
            }
        }
        assert!(OutputBuffer::new().flush_to(&mut Refuse).is_ok());
    }

    #[test]
    fn test_flush_writes_everything() {
        let mut out = OutputBuffer::new();
        out.write_raw(b"hello");
        let mut sink = Vec::new();
        out.flush_to(&mut sink).unwrap();
        assert_eq!(sink, b"hello");
    }
}
