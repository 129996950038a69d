use std::{
    fmt,
    io::{self, Stdout, Write},
    panic::{self, PanicHookInfo},
    time::Duration,
};

use color_backtrace::{BacktracePrinter, default_output_stream};
use crossterm::{
    ExecutableCommand, cursor as ccursor,
    event::{self as cevent, KeyEventKind, KeyModifiers},
    terminal,
};

use super::Backend;
use crate::{error::Result, event::Key, geom::Dimension};

/// A panic hook, as stored by `std::panic`.
type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Crossterm-backed implementation of [`Backend`], drawing to stdout.
pub struct CrosstermBackend {
    /// Output handle.
    fp: Stdout,
    /// Install a panic hook that restores the terminal before printing a
    /// backtrace.
    panic_hook: bool,
    /// The hook we replaced, restored on `stop`.
    previous_hook: Option<PanicHook>,
}

impl fmt::Debug for CrosstermBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrosstermBackend")
            .field("panic_hook", &self.panic_hook)
            .finish()
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self {
            fp: io::stdout(),
            panic_hook: false,
            previous_hook: None,
        }
    }
}

impl CrosstermBackend {
    /// Construct a backend on stdout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a terminal-restoring panic hook while the backend is started.
    pub fn with_panic_hook(mut self, enabled: bool) -> Self {
        self.panic_hook = enabled;
        self
    }

    /// Enter alternate screen and raw mode.
    fn enter(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        self.fp.execute(terminal::EnterAlternateScreen)?;
        self.fp.execute(ccursor::Hide)?;
        Ok(())
    }

    /// Leave alternate screen and restore terminal state.
    fn exit(&mut self) -> io::Result<()> {
        self.fp.execute(terminal::LeaveAlternateScreen)?;
        self.fp.execute(ccursor::Show)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }
}

/// Put the terminal back into a usable state, then print the panic.
fn restoring_hook(pi: &PanicHookInfo<'_>) {
    let mut stdout = io::stdout();
    #[allow(unused_must_use)]
    {
        crossterm::execute!(stdout, terminal::LeaveAlternateScreen, ccursor::Show);
        terminal::disable_raw_mode();
        BacktracePrinter::new().print_panic_info(pi, &mut default_output_stream());
    }
}

impl Backend for CrosstermBackend {
    fn start(&mut self) -> Result<()> {
        if self.panic_hook && self.previous_hook.is_none() {
            self.previous_hook = Some(panic::take_hook());
            panic::set_hook(Box::new(restoring_hook));
        }
        Ok(self.enter()?)
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(hook) = self.previous_hook.take() {
            panic::set_hook(hook);
        }
        Ok(self.exit()?)
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>> {
        if !cevent::poll(timeout)? {
            return Ok(None);
        }
        match cevent::read()? {
            cevent::Event::Key(k) if k.kind == KeyEventKind::Press => Ok(translate_key(k)),
            _ => Ok(None),
        }
    }

    fn size(&self) -> Result<Dimension> {
        let (w, h) = terminal::size()?;
        Ok(Dimension::new(w.into(), h.into()))
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.fp
    }
}

/// Translate a crossterm key event into a termview key. Keys we have no
/// symbol for are dropped.
fn translate_key(k: cevent::KeyEvent) -> Option<Key> {
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    let shift = k.modifiers.contains(KeyModifiers::SHIFT);
    Some(match k.code {
        cevent::KeyCode::Backspace => Key::Backspace,
        cevent::KeyCode::Enter => Key::Enter,
        cevent::KeyCode::Left => Key::Left,
        cevent::KeyCode::Right => Key::Right,
        cevent::KeyCode::Up => Key::Up,
        cevent::KeyCode::Down => Key::Down,
        cevent::KeyCode::Home => Key::Home,
        cevent::KeyCode::End => Key::End,
        cevent::KeyCode::PageUp => Key::PageUp,
        cevent::KeyCode::PageDown => Key::PageDown,
        cevent::KeyCode::Tab if shift => Key::BackTab,
        cevent::KeyCode::Tab => Key::Tab,
        cevent::KeyCode::BackTab => Key::BackTab,
        cevent::KeyCode::Delete => Key::Delete,
        cevent::KeyCode::Esc => Key::Esc,
        cevent::KeyCode::F(x) => Key::F(x),
        cevent::KeyCode::Char(c) if ctrl => Key::Ctrl(c),
        cevent::KeyCode::Char(c) => Key::Char(c),
        _ => return None,
    })
}
