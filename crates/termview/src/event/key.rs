//! This module contains the core primitives to represent keyboard input.

/// A decoded keystroke.
///
/// Decoding raw terminal bytes into keys is the backend's job; everything
/// above the backend sees only these symbolic values.
#[derive(Debug, PartialOrd, PartialEq, Hash, Eq, Clone, Copy)]
pub enum Key {
    /// Escape key. Closes the active popup or quits the application.
    Esc,
    /// Tab key. Cycles focus forward.
    Tab,
    /// Shift-Tab. Cycles focus backward.
    BackTab,
    /// Enter/return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Page up key.
    PageUp,
    /// Page down key.
    PageDown,
    /// Function key.
    F(u8),
    /// A character.
    Char(char),
    /// A character typed with the control modifier.
    Ctrl(char),
}

impl Key {
    /// The character for keys that insert 7-bit text, if any.
    pub fn ascii(&self) -> Option<char> {
        match self {
            Self::Char(c) if u32::from(*c) < 127 => Some(*c),
            _ => None,
        }
    }

    /// A sequence of character keys spelling out `s`. Handy for scripting
    /// input.
    pub fn text(s: &str) -> Vec<Self> {
        s.chars().map(Self::Char).collect()
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}
