//! Typed errors for overlog.
//!
//! Only two things can actually fail inside the crate: handing bytes to a
//! destination, and installing a custom template pattern. Everything else
//! (caller lookup, width query, unknown template names) recovers locally.

use crate::terminal::DestinationId;
use thiserror::Error;

/// Errors returned by the logging pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Writing or flushing a destination failed.
    ///
    /// Pending text is kept when this is returned, so a later call retries
    /// the line that could not be written.
    #[error("write to destination {destination} failed: {source}")]
    Write {
        /// Destination that rejected the bytes.
        destination: DestinationId,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A custom template pattern did not compile.
    #[error("invalid color template pattern: {0}")]
    TemplatePattern(#[from] regex::Error),

    /// A custom template pattern compiled but lacks the capture groups the
    /// expander reads (names, optional colon part, literal).
    #[error("color template pattern needs at least 3 capture groups, found {found}")]
    TemplateGroups {
        /// Number of explicit capture groups in the pattern.
        found: usize,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
