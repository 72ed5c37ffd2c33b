//! Terminal module: destinations and output staging.
//!
//! - [`Destination`]: a shared, identity-carrying byte sink
//! - [`Capture`]: an in-memory writer for tests and tooling
//! - [`OutputBuffer`]: bytes staged for one write per redraw

mod destination;
mod output;

pub use destination::{Capture, Destination, DestinationId, DestinationKind};
pub(crate) use destination::StagedWriteError;
pub use output::OutputBuffer;
