use std::{
    collections::VecDeque,
    io::{self, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use super::Backend;
use crate::{
    ansi::{Segment, Segments},
    error::{Error, Result},
    event::Key,
    geom::Dimension,
};

/// Everything a [`TestBackend`] has seen, shared with the test through a
/// mutex.
#[derive(Debug, Default)]
pub struct TestBuf {
    /// Raw bytes written to the output surface.
    pub output: Vec<u8>,
    /// Number of `start` calls.
    pub starts: usize,
    /// Number of `stop` calls.
    pub stops: usize,
    /// Terminal size, used to size the emulated screen.
    size: Dimension,
}

impl TestBuf {
    /// The output as text, escape sequences included.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Is the terminal currently in raw mode?
    pub fn raw(&self) -> bool {
        self.starts > self.stops
    }

    /// Forget all captured output.
    pub fn clear(&mut self) {
        self.output.clear();
    }

    /// Replay the captured output onto an emulated screen and return its
    /// rows. Cursor moves and clears are honored; styling is dropped.
    pub fn screen(&self) -> Vec<String> {
        let mut screen = Screen::new(self.size);
        screen.apply(&self.text());
        screen.rows()
    }

    /// Does any row of the emulated screen contain `s`?
    pub fn screen_contains(&self, s: &str) -> bool {
        self.screen().iter().any(|row| row.contains(s))
    }
}

/// A minimal terminal emulator: a grid of cells and a cursor.
#[derive(Debug)]
pub struct Screen {
    /// Cells by row. `None` marks the right half of a wide character.
    cells: Vec<Vec<Option<char>>>,
    /// Cursor column.
    x: usize,
    /// Cursor row.
    y: usize,
}

impl Screen {
    /// A blank screen.
    pub fn new(size: Dimension) -> Self {
        Self {
            cells: vec![vec![Some(' '); size.width as usize]; size.height as usize],
            x: 0,
            y: 0,
        }
    }

    /// Interpret escape-coded output.
    pub fn apply(&mut self, s: &str) {
        for seg in Segments::new(s) {
            match seg {
                Segment::Escape(e) => self.escape(e),
                Segment::Char(c, w) => self.put(c, w),
            }
        }
    }

    /// Handle the escape sequences that move the cursor or clear the screen.
    fn escape(&mut self, e: &str) {
        let Some(params) = e.strip_prefix("\x1b[") else {
            return;
        };
        if params == "2J" {
            for row in &mut self.cells {
                row.fill(Some(' '));
            }
        } else if let Some(pos) = params.strip_suffix('H') {
            let mut it = pos.split(';').map(|p| p.parse::<usize>().unwrap_or(1));
            self.y = it.next().unwrap_or(1).saturating_sub(1);
            self.x = it.next().unwrap_or(1).saturating_sub(1);
        }
    }

    /// Write a character at the cursor and advance it.
    fn put(&mut self, c: char, w: usize) {
        if let Some(row) = self.cells.get_mut(self.y) {
            if let Some(cell) = row.get_mut(self.x) {
                *cell = Some(c);
            }
            for i in 1..w {
                if let Some(cell) = row.get_mut(self.x + i) {
                    *cell = None;
                }
            }
        }
        self.x += w;
    }

    /// The screen contents, one string per row.
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| row.iter().flatten().collect())
            .collect()
    }
}

/// Writes into the shared [`TestBuf`].
#[derive(Debug)]
struct SharedWriter(Arc<Mutex<TestBuf>>);

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Lock the buffer, ignoring poisoning from a panicking test.
fn lock(buf: &Mutex<TestBuf>) -> MutexGuard<'_, TestBuf> {
    buf.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A backend for testing. Input comes from a script of keys; output is
/// captured in a [`TestBuf`].
///
/// When the script runs dry, `poll_key` fails. That ends
/// [`Application::run`](crate::app::Application::run) with an error, which
/// doubles as a way to exercise abnormal termination.
#[derive(Debug)]
pub struct TestBackend {
    /// Scripted input. `None` entries are idle polls.
    script: VecDeque<Option<Key>>,
    /// Terminal size.
    size: Dimension,
    /// Output surface.
    writer: SharedWriter,
}

impl TestBackend {
    /// Create returns the shared [`TestBuf`] and a backend that writes to it.
    pub fn create(size: Dimension) -> (Arc<Mutex<TestBuf>>, Self) {
        let buf = Arc::new(Mutex::new(TestBuf {
            size,
            ..TestBuf::default()
        }));
        let backend = Self {
            script: VecDeque::new(),
            size,
            writer: SharedWriter(buf.clone()),
        };
        (buf, backend)
    }

    /// Append keys to the input script.
    pub fn keys(mut self, keys: impl IntoIterator<Item = Key>) -> Self {
        self.script.extend(keys.into_iter().map(Some));
        self
    }

    /// Append an idle poll to the input script.
    pub fn idle(mut self) -> Self {
        self.script.push_back(None);
        self
    }
}

impl Backend for TestBackend {
    fn start(&mut self) -> Result<()> {
        lock(&self.writer.0).starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        lock(&self.writer.0).stops += 1;
        Ok(())
    }

    fn poll_key(&mut self, _timeout: Duration) -> Result<Option<Key>> {
        self.script
            .pop_front()
            .ok_or_else(|| Error::Backend("input script exhausted".into()))
    }

    fn size(&self) -> Result<Dimension> {
        Ok(self.size)
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.writer
    }
}

/// Lock a shared test buffer.
pub fn buf(b: &Arc<Mutex<TestBuf>>) -> MutexGuard<'_, TestBuf> {
    lock(b)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{ansi::Ansi, geom::Point};

    #[test]
    fn screen_emulation() {
        let mut s = Screen::new(Dimension::new(6, 3));
        let mut a = Ansi::new();
        a.goto(Point::new(1, 1))
            .bold()
            .write("ab")
            .goto(Point::new(0, 2))
            .write("界x")
            .goto(Point::new(4, 0))
            .write("overflow");
        s.apply(a.as_str());
        assert_eq!(s.rows(), vec!["    ov", " ab   ", "界x   "]);

        s.apply(Ansi::new().clear_screen().as_str());
        assert_eq!(s.rows(), vec!["      "; 3]);
    }

    #[test]
    fn script_and_capture() {
        let (tb, mut be) = TestBackend::create(Dimension::new(10, 2));
        let mut be2 = TestBackend::create(Dimension::new(1, 1)).1.idle();
        be = be.keys([Key::Up]).idle();

        be.start().unwrap();
        assert!(buf(&tb).raw());
        assert_eq!(be.poll_key(Duration::ZERO).unwrap(), Some(Key::Up));
        assert_eq!(be.poll_key(Duration::ZERO).unwrap(), None);
        assert!(be.poll_key(Duration::ZERO).is_err());
        assert_eq!(be2.poll_key(Duration::ZERO).unwrap(), None);

        be.writer().write_all(b"hi").unwrap();
        be.stop().unwrap();
        let b = buf(&tb);
        assert!(!b.raw());
        assert_eq!(b.text(), "hi");
        assert_eq!(b.screen(), vec!["hi        ", "          "]);
    }
}
