//! Input events.

/// Keyboard input.
pub mod key;

pub use key::Key;
