//! Terminal backends.
//!
//! The core never touches the terminal directly. Raw mode, input decoding,
//! size queries and the output surface all sit behind [`Backend`].

/// Crossterm backend implementation.
pub mod crossterm;
/// Scripted in-memory backend for tests.
pub mod test;

use std::{fmt::Debug, io::Write, time::Duration};

use crate::{error::Result, event::Key, geom::Dimension};

/// A handle for controlling the terminal. The application starts it when the
/// loop begins, stops it when the loop ends, and stops and restarts it around
/// [`Application::suspend`](crate::app::Application::suspend) so another
/// process can take over the terminal - for example, an external editor.
pub trait Backend: Debug {
    /// Enter raw, non-blocking mode and hide the cursor.
    fn start(&mut self) -> Result<()>;

    /// Restore the terminal mode captured by `start` and show the cursor.
    fn stop(&mut self) -> Result<()>;

    /// Wait up to `timeout` for a keystroke. Returns `None` if nothing
    /// arrived, or if what arrived was not a key.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>>;

    /// The terminal size.
    fn size(&self) -> Result<Dimension>;

    /// The output surface.
    fn writer(&mut self) -> &mut dyn Write;
}
