use crate::{
    ansi::{self, Ansi},
    error::Result,
    event::Key,
    listener::Listeners,
    view::{Frame, View, ViewState},
};

/// A single-line text entry field.
pub struct Input {
    /// View state.
    state: ViewState,
    /// The line being edited. The cursor always sits at its end.
    buffer: String,
    /// Characters that are never accepted.
    disallowed: String,
    /// Padding character for the unused part of the field.
    fill: char,
    /// Fired with the buffer when Enter is pressed.
    on_submit: Listeners<Self, str>,
}

impl Default for Input {
    fn default() -> Self {
        Self::new("")
    }
}

impl Input {
    /// An empty field rejecting the characters in `disallowed`.
    pub fn new(disallowed: &str) -> Self {
        Self {
            state: ViewState::for_type::<Self>(),
            buffer: String::new(),
            disallowed: disallowed.into(),
            fill: '_',
            on_submit: Listeners::new(),
        }
    }

    /// The current contents.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Replace the contents.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = text.into();
        self.request_redraw();
    }

    /// Empty the field.
    pub fn clear(&mut self) {
        self.set_text("");
    }

    /// The rejected characters.
    pub fn disallowed_chars(&self) -> &str {
        &self.disallowed
    }

    /// Replace the rejected characters.
    pub fn set_disallowed_chars(&mut self, chars: &str) {
        self.disallowed = chars.into();
    }

    /// Change the padding character.
    pub fn set_fill(&mut self, fill: char) {
        self.fill = fill;
        self.request_redraw();
    }

    /// Listeners fired with the contents when Enter is pressed.
    pub fn on_submit(&mut self) -> &mut Listeners<Self, str> {
        &mut self.on_submit
    }
}

impl View for Input {
    fn state(&self) -> &ViewState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    fn on_key_press(&mut self, key: Key) -> Result<()> {
        match key {
            Key::Backspace => {
                if self.buffer.pop().is_some() {
                    self.request_redraw();
                }
            }
            Key::Enter => self.on_submit.fire(&*self, &self.buffer),
            k => {
                if let Some(c) = k.ascii()
                    && !self.disallowed.contains(c)
                {
                    self.buffer.push(c);
                    self.request_redraw();
                }
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let r = self.rect();
        if r.is_empty() {
            return Ok(());
        }
        let w = r.width as usize;
        // Keep the end of an overlong line in view.
        let start = self.buffer.len().saturating_sub(w);
        let theme = frame.theme();
        let mut buf = Ansi::new();
        buf.goto(r.location())
            .write(self.resolve_color(theme, "bg"))
            .write(self.resolve_color(theme, "fg"))
            .write_fill(&ansi::slice_visible(&self.buffer, start, w), w, self.fill)
            .reset();
        frame.put(&buf);
        Ok(())
    }
}
