//! ANSI module: SGR escape tracking shared by the template engine, the
//! overlay renderer and the emission pipeline.
//!
//! - [`ActiveStyle`]: the intensity/forecolor state left after a byte span
//! - [`strip`]: remove SGR sequences (color disabling, visibility checks)

mod style;

pub use style::{
    has_visible_text, strip, write_escape, ActiveStyle, HIGHEST_INTENSITY, RESET_ALL,
    RESET_FORECOLOR,
};
