use crate::{
    app::AppLink,
    error::Result,
    event::Key,
    geom::Rect,
    view::{self, Frame, View, ViewId, ViewRef, ViewState},
};

use super::{body, paint_header};

/// A single child under a one-row title bar. Keys, focus and application
/// binding pass straight through to the child.
pub struct TitledView {
    /// View state.
    state: ViewState,
    /// Title text.
    title: String,
    /// The decorated child.
    inner: ViewRef,
}

impl TitledView {
    /// Wrap `inner` under `title`.
    pub fn new(title: impl Into<String>, inner: ViewRef) -> Self {
        Self {
            state: ViewState::for_type::<Self>(),
            title: title.into(),
            inner,
        }
    }

    /// The title text.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replace the title and request a redraw.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.request_redraw();
    }

    /// The decorated child.
    pub fn inner(&self) -> &ViewRef {
        &self.inner
    }

    /// Fit the child into the area below the title bar.
    fn reflow(&self) {
        let r = body(self.rect());
        view::update(&self.inner, |v| v.set_rect(r));
    }
}

impl View for TitledView {
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
        view::update(&self.inner, |v| v.set_focused(focused));
    }

    fn set_application(&mut self, app: Option<AppLink>) {
        view::update(&self.inner, |v| v.set_application(app.clone()));
        self.state.set_app(app);
    }

    fn contains(&self, id: ViewId) -> bool {
        self.inner.try_borrow().is_ok_and(|v| v.id() == id)
    }

    fn children(&self) -> Vec<ViewRef> {
        vec![self.inner.clone()]
    }

    fn on_key_press(&mut self, key: Key) -> Result<()> {
        view::borrow_mut(&self.inner)?.on_key_press(key)
    }

    fn render(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let rect = self.rect();
        paint_header(&*self, frame, rect, &self.title);
        self.reflow();
        view::render_child(&self.inner, frame)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{ansi, theme::Theme, view::shared, widgets::TextView};

    #[test]
    fn reflows_child() {
        let text = shared(TextView::new("hello"));
        let mut t = TitledView::new("Title", text.clone());
        t.set_rect(Rect::new(2, 3, 10, 5));
        assert_eq!(text.borrow().rect(), Rect::new(2, 4, 10, 4));
        t.set_focused(true);
        assert!(text.borrow().focused());
    }

    #[test]
    fn contains_only_its_child() {
        let text = shared(TextView::new(""));
        let other = shared(TextView::new(""));
        let t = TitledView::new("T", text.clone());
        assert!(t.contains(text.borrow().id()));
        assert!(!t.contains(other.borrow().id()));
        assert!(!t.contains(t.id()));
    }

    #[test]
    fn renders_title_and_child() {
        let text = shared(TextView::new("body"));
        let mut t = TitledView::new("Files", text).with_rect(Rect::new(0, 0, 8, 2));
        let theme = Theme::empty();
        let mut out = Vec::new();
        t.render(&mut Frame::new(&theme, &mut out)).unwrap();
        let s = ansi::strip(&String::from_utf8(out).unwrap());
        assert_eq!(s, "Files   body    ");
    }
}
