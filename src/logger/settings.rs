//! Stream configuration and the defaults streams fall back to.

use super::header::HeaderFlags;
use std::ffi::OsStr;
use crate::template::ColorTemplate;

/// A per-stream boolean that can defer to [`Defaults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Toggle {
    /// Use the registry default.
    #[default]
    Unset,
    /// Force on.
    On,
    /// Force off.
    Off,
}

impl Toggle {
    /// The effective value given the registry default.
    #[inline]
    pub const fn resolve(self, default: bool) -> bool {
        match self {
            Self::Unset => default,
            Self::On => true,
            Self::Off => false,
        }
    }

    /// Whether this toggle overrides the default.
    #[inline]
    pub const fn is_set(self) -> bool {
        !matches!(self, Self::Unset)
    }
}

impl From<bool> for Toggle {
    fn from(flag: bool) -> Self {
        if flag { Self::On } else { Self::Off }
    }
}

impl From<Option<bool>> for Toggle {
    fn from(flag: Option<bool>) -> Self {
        flag.map_or(Self::Unset, Self::from)
    }
}

/// Values used by every stream that leaves a setting [`Toggle::Unset`].
#[derive(Debug, Clone)]
pub struct Defaults {
    /// Show pending partial lines on the overlay row.
    pub partial_lines_visible: bool,
    /// Keep SGR escapes in output. When off, every escape is stripped.
    pub color_enabled: bool,
    /// Expand `@[...]` templates in prefixes and messages.
    pub color_template_enabled: bool,
    /// Template pattern for streams without their own.
    pub template: ColorTemplate,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            partial_lines_visible: true,
            color_enabled: true,
            color_template_enabled: false,
            template: ColorTemplate::default(),
        }
    }
}

impl Defaults {
    /// Defaults adjusted by the environment.
    ///
    /// A non-empty `NO_COLOR` turns color off.
    pub fn from_env() -> Self {
        Self::with_no_color(std::env::var_os("NO_COLOR").as_deref())
    }

    /// Defaults for a given `NO_COLOR` value.
    fn with_no_color(no_color: Option<&OsStr>) -> Self {
        Self {
            color_enabled: no_color.is_none_or(OsStr::is_empty),
            ..Self::default()
        }
    }
}

/// Initial configuration of a stream.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Text written at the start of every line (templates allowed).
    pub prefix: String,
    /// Header fields.
    pub flags: HeaderFlags,
    /// Overlay visibility of partial lines.
    pub partial_lines_visible: Toggle,
    /// Color output.
    pub color_enabled: Toggle,
    /// Template expansion.
    pub color_template_enabled: Toggle,
    /// Stream-specific template pattern.
    pub template: Option<ColorTemplate>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            flags: HeaderFlags::STD,
            partial_lines_visible: Toggle::Unset,
            color_enabled: Toggle::Unset,
            color_template_enabled: Toggle::Unset,
            template: None,
        }
    }
}

impl LoggerConfig {
    /// A config with the given prefix and header fields.
    pub fn new(prefix: impl Into<String>, flags: HeaderFlags) -> Self {
        Self {
            prefix: prefix.into(),
            flags,
            ..Self::default()
        }
    }

    /// Override partial-line visibility.
    #[must_use]
    pub const fn partial_lines_visible(mut self, flag: bool) -> Self {
        self.partial_lines_visible = if flag { Toggle::On } else { Toggle::Off };
        self
    }

    /// Override color output.
    #[must_use]
    pub const fn color_enabled(mut self, flag: bool) -> Self {
        self.color_enabled = if flag { Toggle::On } else { Toggle::Off };
        self
    }

    /// Override template expansion.
    #[must_use]
    pub const fn color_template_enabled(mut self, flag: bool) -> Self {
        self.color_template_enabled = if flag { Toggle::On } else { Toggle::Off };
        self
    }

    /// Use a stream-specific template pattern.
    #[must_use]
    pub fn template(mut self, template: ColorTemplate) -> Self {
        self.template = Some(template);
        self
    }
}
