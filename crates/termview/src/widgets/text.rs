use crate::{
    ansi::{self, Ansi, RESET},
    error::Result,
    event::Key,
    geom::Point,
    view::{Frame, View, ViewState},
};

/// A read-only text pane with independent horizontal and vertical scrolling.
///
/// Text may carry its own styling. Every embedded reset is followed by the
/// pane's colors when painted, so styled spans never bleed the terminal
/// default into the pane background.
pub struct TextView {
    /// View state.
    state: ViewState,
    /// Sanitized lines.
    lines: Vec<String>,
    /// Leftmost visible column.
    scroll_x: usize,
    /// Topmost visible line.
    scroll_y: usize,
}

/// Split text into lines, dropping carriage returns.
fn sanitize(text: &str) -> Vec<String> {
    text.split('\n').map(|l| l.replace('\r', "")).collect()
}

impl TextView {
    /// A pane showing `text`.
    pub fn new(text: &str) -> Self {
        Self {
            state: ViewState::for_type::<Self>(),
            lines: sanitize(text),
            scroll_x: 0,
            scroll_y: 0,
        }
    }

    /// Replace the text, scroll back to the origin and request a redraw.
    pub fn set_text(&mut self, text: &str) {
        self.lines = sanitize(text);
        self.scroll_x = 0;
        self.scroll_y = 0;
        self.request_redraw();
    }

    /// The text, lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// The sanitized lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Current `(scroll_x, scroll_y)`.
    pub fn scroll(&self) -> (usize, usize) {
        (self.scroll_x, self.scroll_y)
    }

    /// Viewport height in rows.
    fn height(&self) -> usize {
        self.rect().height as usize
    }

    /// Width of the widest line in cells.
    fn max_width(&self) -> usize {
        self.lines
            .iter()
            .map(|l| ansi::visible_len(l))
            .max()
            .unwrap_or(0)
    }

    /// Scroll down a row, unless the last line is already at the bottom.
    fn scroll_down(&mut self) {
        if self.scroll_y + self.height() < self.lines.len() {
            self.scroll_y += 1;
            self.request_redraw();
        }
    }

    /// Scroll up a row.
    fn scroll_up(&mut self) {
        if self.scroll_y > 0 {
            self.scroll_y -= 1;
            self.request_redraw();
        }
    }

    /// Scroll right a column, while any line still extends past the right
    /// edge.
    fn scroll_right(&mut self) {
        if self.scroll_x + (self.rect().width as usize) < self.max_width() {
            self.scroll_x += 1;
            self.request_redraw();
        }
    }

    /// Scroll left a column.
    fn scroll_left(&mut self) {
        if self.scroll_x > 0 {
            self.scroll_x -= 1;
            self.request_redraw();
        }
    }

    /// Scroll down a viewport, stopping with the last line at the bottom.
    fn page_down(&mut self) {
        let h = self.height();
        self.scroll_y = (self.scroll_y + h).min(self.lines.len().saturating_sub(h));
        self.request_redraw();
    }

    /// Scroll up a viewport.
    fn page_up(&mut self) {
        self.scroll_y = self.scroll_y.saturating_sub(self.height());
        self.request_redraw();
    }

    /// Back to the origin.
    fn home(&mut self) {
        self.scroll_x = 0;
        self.scroll_y = 0;
        self.request_redraw();
    }
}

impl View for TextView {
    fn state(&self) -> &ViewState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    fn on_key_press(&mut self, key: Key) -> Result<()> {
        match key {
            Key::Down => self.scroll_down(),
            Key::Up => self.scroll_up(),
            Key::Left => self.scroll_left(),
            Key::Right => self.scroll_right(),
            Key::PageUp => self.page_up(),
            Key::PageDown => self.page_down(),
            Key::Home => self.home(),
            _ => {}
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let r = self.rect();
        let w = r.width as usize;
        let theme = frame.theme();
        let colors = format!(
            "{}{}",
            self.resolve_color(theme, "bg"),
            self.resolve_color(theme, "fg")
        );
        let recolor = format!("{RESET}{colors}");

        let mut buf = Ansi::new();
        for row in 0..r.height {
            buf.goto(Point::new(r.x, r.y + row)).write(&colors);
            match self.lines.get(self.scroll_y + row as usize) {
                Some(line) => {
                    let line = line.replace(RESET, &recolor);
                    buf.write_fill(&ansi::slice_visible(&line, self.scroll_x, w), w, ' ')
                }
                None => buf.write_fill("", w, ' '),
            };
            buf.reset();
        }
        frame.put(&buf);
        Ok(())
    }
}
