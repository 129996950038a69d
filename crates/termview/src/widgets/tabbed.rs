use crate::{
    ansi::{self, Ansi},
    app::AppLink,
    error::{Error, Result},
    event::Key,
    view::{self, Frame, View, ViewId, ViewRef, ViewState},
};

use super::body;

/// A titled child of a [`TabbedView`].
pub struct Tab {
    /// Header text.
    title: String,
    /// Content.
    view: ViewRef,
}

impl Tab {
    /// The header text.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The content view.
    pub fn view(&self) -> &ViewRef {
        &self.view
    }
}

/// A row of tab headers above the active tab's content.
///
/// Headers share a uniform column width. When they do not all fit, the strip
/// shows a window of whole columns that always includes the active tab.
pub struct TabbedView {
    /// View state.
    state: ViewState,
    /// Tabs, in header order.
    tabs: Vec<Tab>,
    /// Index of the active tab.
    active: usize,
}

impl Default for TabbedView {
    fn default() -> Self {
        Self::new()
    }
}

impl TabbedView {
    /// An empty tab strip.
    pub fn new() -> Self {
        Self {
            state: ViewState::for_type::<Self>(),
            tabs: vec![],
            active: 0,
        }
    }

    /// Append a tab. The first tab starts active; later ones start hidden.
    pub fn add_tab(&mut self, title: impl Into<String>, view: ViewRef) -> Result<()> {
        {
            let mut v = view::borrow_mut(&view)?;
            v.set_application(self.application().cloned());
            if self.tabs.is_empty() {
                v.set_visible(true);
                v.set_focused(self.focused());
            } else {
                v.set_visible(false);
            }
        }
        self.tabs.push(Tab {
            title: title.into(),
            view,
        });
        self.request_redraw();
        Ok(())
    }

    /// The tabs.
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// The active tab, if there are any tabs.
    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    /// Index of the active tab.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Make tab `index` active, hiding and unfocusing the previous one.
    pub fn set_active(&mut self, index: usize) -> Result<()> {
        if index >= self.tabs.len() {
            return Err(Error::Invalid(format!(
                "tab {index} out of range for {} tabs",
                self.tabs.len()
            )));
        }
        {
            let mut old = view::borrow_mut(&self.tabs[self.active].view)?;
            old.set_visible(false);
            old.set_focused(false);
        }
        self.active = index;
        {
            let mut new = view::borrow_mut(&self.tabs[index].view)?;
            new.set_visible(true);
            new.set_focused(self.focused());
        }
        self.request_redraw();
        Ok(())
    }

    /// Header column width and the range of tab indices currently shown.
    pub fn header_window(&self) -> (usize, usize, usize) {
        let col = self
            .tabs
            .iter()
            .map(|t| ansi::visible_len(&t.title) + 1)
            .max()
            .unwrap_or(1);
        let count = (self.rect().width as usize / col).max(1);
        let start = self.active / count * count;
        let end = (start + count).min(self.tabs.len());
        (col, start, end)
    }
}

impl View for TabbedView {
    fn state(&self) -> &ViewState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    fn set_focused(&mut self, focused: bool) {
        if self.state.set_focused(focused) {
            self.request_redraw();
        }
        if let Some(t) = self.tabs.get(self.active) {
            view::update(&t.view, |v| v.set_focused(focused));
        }
    }

    fn set_application(&mut self, app: Option<AppLink>) {
        for t in &self.tabs {
            view::update(&t.view, |v| v.set_application(app.clone()));
        }
        self.state.set_app(app);
    }

    fn contains(&self, id: ViewId) -> bool {
        self.tabs
            .iter()
            .any(|t| t.view.try_borrow().is_ok_and(|v| v.id() == id))
    }

    fn children(&self) -> Vec<ViewRef> {
        self.tabs.iter().map(|t| t.view.clone()).collect()
    }

    fn on_key_press(&mut self, key: Key) -> Result<()> {
        match key {
            Key::Right => {
                if self.active + 1 < self.tabs.len() {
                    self.set_active(self.active + 1)?;
                }
                Ok(())
            }
            Key::Left => {
                if self.active > 0 {
                    self.set_active(self.active - 1)?;
                }
                Ok(())
            }
            k => match self.tabs.get(self.active) {
                Some(t) => view::borrow_mut(&t.view)?.on_key_press(k),
                None => Ok(()),
            },
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let r = self.rect();
        if r.is_empty() {
            return Ok(());
        }
        let w = r.width as usize;
        let theme = frame.theme();
        let (col, start, end) = self.header_window();

        let mut header = Ansi::new();
        for (i, t) in self.tabs.iter().enumerate().take(end).skip(start) {
            let channel = if i == self.active { "selected." } else { "" };
            header
                .write(self.resolve_color(theme, &format!("{channel}bg")))
                .write(self.resolve_color(theme, &format!("{channel}fg")))
                .write_fill(&ansi::truncate(&t.title, col), col, ' ')
                .reset();
        }

        let mut buf = Ansi::new();
        buf.goto(r.location())
            .write(self.resolve_color(theme, "bg"))
            .write_fill("", w, ' ')
            .reset()
            .goto(r.location())
            .write(&ansi::truncate(header.as_str(), w))
            .reset();
        frame.put(&buf);

        if let Some(t) = self.tabs.get(self.active) {
            view::update(&t.view, |v| v.set_rect(body(r)));
            view::render_child(&t.view, frame)?;
        }
        Ok(())
    }
}
