//! # Overlog
//!
//! A shared console log multiplexer.
//!
//! Many concurrent log streams write to the same terminal. Finished lines
//! go to scrollback as usual; unfinished ones are merged onto a single
//! live overlay row per destination instead of flooding the screen.
//!
//! ## Core Concepts
//!
//! - **Registry**: one shared lock over every stream and overlay
//! - **Overlay row**: redrawn in place, appending only when it merely grew
//! - **Style continuity**: a color left open at a line break reopens on the
//!   next line, and every committed line is closed with the minimal reset
//! - **Color templates**: `@[red:text]` and `@[bright,green]` markup
//!
//! ## Example
//!
//! ```rust,no_run
//! use overlog::{Destination, HeaderFlags, LoggerConfig, Registry};
//!
//! let registry = Registry::new();
//! registry.set_default_color_template_enabled(true);
//!
//! let fetch = registry.logger(Destination::stderr(), LoggerConfig::new("@[cyan:fetch] ", HeaderFlags::TIME));
//! let build = registry.logger(Destination::stderr(), LoggerConfig::new("@[yellow:build] ", HeaderFlags::TIME));
//!
//! fetch.print("downloading").unwrap();   // overlay: "fetch ... downloading"
//! build.print("compiling").unwrap();     // overlay: "... downloading | ... compiling"
//! fetch.println(" done").unwrap();       // committed to scrollback
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod ansi;
pub mod error;
pub mod logger;
pub mod overlay;
pub mod registry;
pub mod template;
pub mod terminal;

// Re-exports for convenience
pub use ansi::ActiveStyle;
pub use error::{Error, Result};
pub use logger::{
    CallerLocation, Clock, Defaults, FixedClock, HeaderFlags, LocationResolver, Logger,
    LoggerConfig, SystemClock, Toggle, TrackCaller,
};
pub use overlay::WriterState;
pub use registry::{Registry, RegistryBuilder};
pub use template::{CodeTable, ColorTemplate};
pub use terminal::{Capture, Destination, DestinationId, DestinationKind};
