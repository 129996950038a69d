//! Color themes.
//!
//! A theme maps keys of the form `<widget>[.focused][.selected].<bg|fg>` to a
//! raw style sequence. Views resolve keys through
//! [`View::resolve_color`](crate::view::View::resolve_color); a missing key
//! resolves to the empty string, meaning "no style".
//!
//! Themes are built once, handed to the
//! [`Application`](crate::app::Application), and never mutated afterwards.

use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

use crate::{
    ansi::Ansi,
    error::{Error, Result},
};

/// A style as written in a theme file: either a raw escape string, or a
/// structured description that is compiled to one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StyleSpec {
    /// A literal style sequence.
    Raw(String),
    /// Palette colors and attributes.
    Sgr {
        /// 256-color foreground index.
        #[serde(default)]
        fg: Option<u8>,
        /// 256-color background index.
        #[serde(default)]
        bg: Option<u8>,
        /// Bold text.
        #[serde(default)]
        bold: bool,
        /// Underlined text.
        #[serde(default)]
        underline: bool,
        /// Reverse video.
        #[serde(default)]
        reverse: bool,
    },
}

impl StyleSpec {
    /// Compile the spec into a style sequence.
    pub fn compile(&self) -> String {
        match self {
            Self::Raw(s) => s.clone(),
            Self::Sgr {
                fg,
                bg,
                bold,
                underline,
                reverse,
            } => {
                let mut a = Ansi::new();
                if let Some(c) = fg {
                    a.fg(*c);
                }
                if let Some(c) = bg {
                    a.bg(*c);
                }
                if *bold {
                    a.bold();
                }
                if *underline {
                    a.underline();
                }
                if *reverse {
                    a.reverse();
                }
                a.into()
            }
        }
    }
}

/// An immutable color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Style sequences by key.
    styles: HashMap<String, String>,
}

/// Shorthand for the stock palette definitions.
fn sgr(fg: Option<u8>, bg: Option<u8>, bold: bool) -> String {
    StyleSpec::Sgr {
        fg,
        bg,
        bold,
        underline: false,
        reverse: false,
    }
    .compile()
}

impl Default for Theme {
    /// The stock palette.
    fn default() -> Self {
        let mut t = Self::empty();
        for prefix in ["titledview", "tabbedview", "inputdialog", "questiondialog"] {
            t.insert(format!("{prefix}.bg"), sgr(None, Some(241), false));
            t.insert(format!("{prefix}.fg"), sgr(Some(0), None, false));
            t.insert(format!("{prefix}.focused.bg"), sgr(None, Some(244), false));
            t.insert(format!("{prefix}.focused.fg"), sgr(Some(255), None, false));
        }
        for prefix in ["tabbedview", "questiondialog"] {
            t.insert(format!("{prefix}.selected.bg"), sgr(None, Some(241), false));
            t.insert(format!("{prefix}.selected.fg"), sgr(Some(0), None, false));
            t.insert(
                format!("{prefix}.focused.selected.bg"),
                sgr(None, Some(244), false),
            );
            t.insert(
                format!("{prefix}.focused.selected.fg"),
                sgr(Some(255), None, true),
            );
        }
        t.insert("textview.bg".into(), sgr(None, Some(236), false));
        t.insert("textview.fg".into(), sgr(Some(255), None, false));
        t.insert("textview.focused.bg".into(), sgr(None, Some(236), false));
        t.insert("textview.focused.fg".into(), sgr(Some(255), None, false));
        for prefix in ["filechooser", "filechooser.focused"] {
            t.insert(format!("{prefix}.header.bg"), sgr(None, Some(241), false));
            t.insert(format!("{prefix}.header.fg"), sgr(Some(255), None, true));
            t.insert(format!("{prefix}.footer.bg"), sgr(None, Some(236), false));
            t.insert(format!("{prefix}.footer.fg"), sgr(Some(255), None, false));
            t.insert(format!("{prefix}.bg"), sgr(None, Some(0), false));
            t.insert(format!("{prefix}.fg"), sgr(Some(255), None, false));
        }
        t
    }
}

impl Theme {
    /// A theme with no entries. Every key resolves to "".
    pub fn empty() -> Self {
        Self {
            styles: HashMap::new(),
        }
    }

    /// Add or replace an entry while building a theme.
    pub fn with(mut self, key: impl Into<String>, style: impl Into<String>) -> Self {
        self.insert(key.into(), style.into());
        self
    }

    /// Insert an entry.
    fn insert(&mut self, key: String, style: String) {
        self.styles.insert(key, style);
    }

    /// Look up a key, returning "" if it is missing.
    pub fn get(&self, key: &str) -> &str {
        self.styles.get(key).map(String::as_str).unwrap_or("")
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Is the theme empty?
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Parse a JSON object of `key -> style` overrides and layer them on top
    /// of this theme.
    pub fn merge_json(mut self, json: &str) -> Result<Self> {
        let specs: HashMap<String, StyleSpec> = serde_json::from_str(json)?;
        for (k, v) in specs {
            tracing::debug!(key = %k, "theme override");
            self.insert(k, v.compile());
        }
        Ok(self)
    }

    /// Load overrides from a JSON file on top of the stock palette.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::default().merge_json(&json)
    }
}
