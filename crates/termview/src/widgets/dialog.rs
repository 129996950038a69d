//! Modal dialogs, meant to be shown with
//! [`Application::open_popup`](crate::app::Application::open_popup).
//!
//! Both dialogs dismiss themselves once answered. Dismissal goes through the
//! application's deferred-action queue, since the application is busy
//! dispatching the key that answered the dialog.

use std::{cell::RefCell, rc::Rc};

use crate::{
    ansi::{self, Ansi},
    app::AppLink,
    error::Result,
    event::Key,
    geom::{Point, Rect},
    listener::Listeners,
    view::{self, Frame, View, ViewId, ViewRef, ViewState},
};

use super::{Input, body, paint_header};

/// Close the popup this view belongs to, once the current dispatch returns.
/// Nothing happens if another popup has replaced it by then.
fn dismiss(view: &dyn View) {
    if let Some(app) = view.application() {
        let id = view.id();
        app.defer(move |app| {
            if !app.dismiss_popup_if(id)? {
                tracing::debug!("{id} no longer the popup, not dismissing");
            }
            Ok(())
        });
    }
}

/// A titled popup around a single [`Input`].
pub struct InputDialog {
    /// View state.
    state: ViewState,
    /// Title text.
    title: String,
    /// The entry field.
    input: Rc<RefCell<Input>>,
    /// Fired with the entered text on Enter.
    on_submit: Listeners<Self, str>,
}

impl InputDialog {
    /// A dialog `width` cells wide.
    pub fn new(title: impl Into<String>, width: u32) -> Self {
        let mut d = Self {
            state: ViewState::for_type::<Self>(),
            title: title.into(),
            input: view::shared(Input::default()),
            on_submit: Listeners::new(),
        };
        d.set_rect(Rect::new(0, 0, width, 2));
        d
    }

    /// The entry field.
    pub fn input(&self) -> &Rc<RefCell<Input>> {
        &self.input
    }

    /// Listeners fired with the entered text on Enter.
    pub fn on_submit(&mut self) -> &mut Listeners<Self, str> {
        &mut self.on_submit
    }

    /// Fit the input below the title bar.
    fn reflow(&self) {
        let r = body(self.rect());
        view::update(&self.input, |v| v.set_rect(r));
    }
}

impl View for InputDialog {
    fn state(&self) -> &ViewState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    fn set_rect(&mut self, rect: Rect) {
        self.state.set_rect(rect);
        self.reflow();
    }

    fn set_focused(&mut self, focused: bool) {
        if self.state.set_focused(focused) {
            self.request_redraw();
        }
        view::update(&self.input, |i| i.set_focused(focused));
    }

    fn set_application(&mut self, app: Option<AppLink>) {
        view::update(&self.input, |i| i.set_application(app.clone()));
        self.state.set_app(app);
    }

    fn contains(&self, id: ViewId) -> bool {
        self.input.try_borrow().is_ok_and(|i| i.id() == id)
    }

    fn children(&self) -> Vec<ViewRef> {
        let input: ViewRef = self.input.clone();
        vec![input]
    }

    fn on_key_press(&mut self, key: Key) -> Result<()> {
        if key == Key::Enter {
            let text = view::borrow(&self.input)?.text().to_owned();
            self.on_submit.fire(&*self, &text);
            dismiss(&*self);
            Ok(())
        } else {
            view::borrow_mut(&self.input)?.on_key_press(key)
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let rect = self.rect();
        paint_header(&*self, frame, rect, &self.title);
        self.reflow();
        view::render_child(&self.input, frame)
    }
}

/// A titled popup asking a question with a row of answer buttons.
pub struct QuestionDialog {
    /// View state.
    state: ViewState,
    /// Title text.
    title: String,
    /// The question.
    message: String,
    /// Answer labels.
    answers: Vec<String>,
    /// Index of the highlighted answer.
    selected: usize,
    /// Fired with the chosen answer's index on Enter.
    on_answer: Listeners<Self, usize>,
}

impl QuestionDialog {
    /// A dialog sized to fit its contents.
    pub fn new(title: impl Into<String>, message: impl Into<String>, answers: &[&str]) -> Self {
        let title = title.into();
        let message = message.into();
        let answers: Vec<String> = answers.iter().map(|a| a.to_string()).collect();
        let width = [
            ansi::visible_len(&title),
            ansi::visible_len(&message),
            button_row_len(&answers),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 2;
        let mut d = Self {
            state: ViewState::for_type::<Self>(),
            title,
            message,
            answers,
            selected: 0,
            on_answer: Listeners::new(),
        };
        d.set_rect(Rect::new(0, 0, u32::try_from(width).unwrap_or(u32::MAX), 3));
        d
    }

    /// Index of the highlighted answer.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// The answer labels.
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Listeners fired with the chosen answer's index on Enter.
    pub fn on_answer(&mut self) -> &mut Listeners<Self, usize> {
        &mut self.on_answer
    }
}

/// Width of the button row: each label is bracketed and followed by a space.
fn button_row_len(answers: &[String]) -> usize {
    answers.iter().map(|a| ansi::visible_len(a) + 3).sum()
}

impl View for QuestionDialog {
    fn state(&self) -> &ViewState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    fn on_key_press(&mut self, key: Key) -> Result<()> {
        match key {
            Key::Left if self.selected > 0 => {
                self.selected -= 1;
                self.request_redraw();
            }
            Key::Right if self.selected + 1 < self.answers.len() => {
                self.selected += 1;
                self.request_redraw();
            }
            Key::Enter if !self.answers.is_empty() => {
                self.on_answer.fire(&*self, &self.selected);
                dismiss(&*self);
            }
            _ => {}
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let r = self.rect();
        paint_header(&*self, frame, r, &self.title);
        let w = r.width as usize;
        let theme = frame.theme();
        let bg = self.resolve_color(theme, "bg");
        let fg = self.resolve_color(theme, "fg");

        let mut buttons = Ansi::new();
        buttons.write(bg).write(fg);
        for (i, a) in self.answers.iter().enumerate() {
            if i == self.selected {
                buttons
                    .write(self.resolve_color(theme, "selected.bg"))
                    .write(self.resolve_color(theme, "selected.fg"))
                    .reverse();
            }
            buttons.write(&format!("[{a}]")).reset().write(bg).write(fg).write(" ");
        }

        let mut buf = Ansi::new();
        for (row, line) in [(1, self.message.as_str()), (2, buttons.as_str())] {
            if row >= r.height {
                break;
            }
            buf.goto(Point::new(r.x, r.y + row))
                .write(bg)
                .write(fg)
                .write(" ")
                .write_fill(&ansi::truncate(line, w.saturating_sub(1)), w.saturating_sub(1), ' ')
                .reset();
        }
        frame.put(&buf);
        Ok(())
    }
}
