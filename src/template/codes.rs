//! Name → SGR code table used by template expansion.

use std::collections::HashMap;

/// Mutable mapping from template names to SGR codes.
///
/// The default table covers resets, intensity and the eight basic
/// foreground colors. Entries can be added or replaced at runtime.
#[derive(Debug, Clone)]
pub struct CodeTable {
    codes: HashMap<String, u32>,
}

impl CodeTable {
    /// An empty table (every template token passes through untouched).
    pub fn empty() -> Self {
        Self {
            codes: HashMap::new(),
        }
    }

    /// Look up the code for `name`.
    #[inline]
    pub fn get(&self, name: &str) -> Option<u32> {
        self.codes.get(name).copied()
    }

    /// Add or replace a named code.
    pub fn insert(&mut self, name: impl Into<String>, code: u32) {
        self.codes.insert(name.into(), code);
    }

    /// Number of known names.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for CodeTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (name, code) in [
            ("r", 0),
            ("reset", 0),
            ("bright", 1),
            ("dim", 2),
            ("grey", 30),
            ("red", 31),
            ("green", 32),
            ("yellow", 33),
            ("blue", 34),
            ("magenta", 35),
            ("cyan", 36),
            ("white", 37),
        ] {
            table.insert(name, code);
        }
        table
    }
}
