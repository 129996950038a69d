//! The base widget contract.
//!
//! Every widget keeps a [`ViewState`] and offers it up through
//! [`View::state`] and [`View::state_mut`]. The provided methods on [`View`]
//! implement the shared behaviour on top of that state: geometry, visibility,
//! focus, color-key resolution and redraw requests. Composite widgets
//! override the methods whose effect must reach their children.

use std::{
    any,
    cell::{Ref, RefCell, RefMut},
    fmt,
    io::Write,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use convert_case::{Case, Casing};

use crate::{
    ansi::Ansi,
    app::AppLink,
    error::{Error, Result},
    event::Key,
    geom::Rect,
    theme::Theme,
};

/// Source of view ids.
static CURRENT_ID: AtomicU64 = AtomicU64::new(0);

/// A process-unique view identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    /// Allocate a fresh id.
    fn next() -> Self {
        Self(CURRENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// A shared handle to a view of any type.
pub type ViewRef = Rc<RefCell<dyn View>>;

/// Wrap a view for sharing. The typed handle coerces to a [`ViewRef`].
pub fn shared<V: View>(view: V) -> Rc<RefCell<V>> {
    Rc::new(RefCell::new(view))
}

/// Mutably borrow a shared view, failing with [`Error::Busy`] instead of
/// panicking if it is already borrowed.
pub fn borrow_mut<V: ?Sized>(view: &RefCell<V>) -> Result<RefMut<'_, V>> {
    view.try_borrow_mut()
        .map_err(|_| Error::Busy("view is already mutably borrowed".into()))
}

/// Immutably borrow a shared view, failing with [`Error::Busy`] if it is
/// mutably borrowed.
pub fn borrow<V: ?Sized>(view: &RefCell<V>) -> Result<Ref<'_, V>> {
    view.try_borrow()
        .map_err(|_| Error::Busy("view is mutably borrowed".into()))
}

/// Apply `f` to a child view from a context that cannot return an error, such
/// as a focus or binding change propagating down the tree. A busy child is
/// skipped with a warning.
pub fn update<V: View + ?Sized>(view: &RefCell<V>, f: impl FnOnce(&mut V)) {
    match view.try_borrow_mut() {
        Ok(mut v) => f(&mut v),
        Err(_) => tracing::warn!("skipping update of busy view"),
    }
}

/// The lower-cased bare type name of `T`, used as the default color-key
/// prefix: `ListView<String>` becomes `listview`.
pub fn type_prefix<T: ?Sized>() -> String {
    let name = any::type_name::<T>();
    let name = name.split('<').next().unwrap_or(name);
    let name = name.rsplit("::").next().unwrap_or(name);
    name.to_case(Case::Flat)
}

/// The per-view state every widget carries.
#[derive(Debug, Clone)]
pub struct ViewState {
    /// Unique id, used by the redraw queue and containment checks.
    id: ViewId,
    /// Screen region.
    rect: Rect,
    /// Does the view paint and request redraws?
    visible: bool,
    /// Can the view take focus in the application's cycle?
    focusable: bool,
    /// Does the view hold focus?
    focused: bool,
    /// Has the rect changed since the last paint?
    dirty: bool,
    /// Prefix for theme lookups.
    color_key_prefix: String,
    /// Back-reference to the owning application, if attached.
    app: Option<AppLink>,
}

impl ViewState {
    /// Fresh state with the given color-key prefix. Views start visible,
    /// focusable, unfocused and dirty.
    pub fn new(color_key_prefix: impl Into<String>) -> Self {
        Self {
            id: ViewId::next(),
            rect: Rect::default(),
            visible: true,
            focusable: true,
            focused: false,
            dirty: true,
            color_key_prefix: color_key_prefix.into(),
            app: None,
        }
    }

    /// Fresh state whose color-key prefix is derived from the type name.
    pub fn for_type<T: ?Sized>() -> Self {
        Self::new(type_prefix::<T>())
    }

    /// The screen region.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Set the screen region, marking the state dirty if it changed.
    /// Returns true if it changed.
    pub fn set_rect(&mut self, rect: Rect) -> bool {
        let changed = self.rect != rect;
        if changed {
            self.rect = rect;
            self.dirty = true;
        }
        changed
    }

    /// Replace the application link.
    pub fn set_app(&mut self, app: Option<AppLink>) {
        self.app = app;
    }

    /// Set the focused flag, returning true if it changed.
    pub fn set_focused(&mut self, focused: bool) -> bool {
        let changed = self.focused != focused;
        self.focused = focused;
        changed
    }

    /// Clear the dirty flag after a paint.
    pub fn clean(&mut self) {
        self.dirty = false;
    }
}

/// Everything a view needs to paint itself: the theme and the output
/// surface.
pub struct Frame<'a> {
    /// The application theme.
    theme: &'a Theme,
    /// The output surface.
    out: &'a mut dyn Write,
}

impl<'a> Frame<'a> {
    /// Construct a frame.
    pub fn new(theme: &'a Theme, out: &'a mut dyn Write) -> Self {
        Self { theme, out }
    }

    /// The theme to resolve colors against.
    pub fn theme(&self) -> &'a Theme {
        self.theme
    }

    /// Write a buffer to the output surface.
    pub fn put(&mut self, buf: &Ansi) {
        buf.put(self.out);
    }
}

impl fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame").finish_non_exhaustive()
    }
}

/// The interface implemented by all widgets.
pub trait View: 'static {
    /// Get a reference to the view's state.
    fn state(&self) -> &ViewState;

    /// Get a mutable reference to the view's state.
    fn state_mut(&mut self) -> &mut ViewState;

    /// The view's unique id.
    fn id(&self) -> ViewId {
        self.state().id
    }

    /// The screen region.
    fn rect(&self) -> Rect {
        self.state().rect
    }

    /// Move or resize the view. A different rect marks the view dirty.
    fn set_rect(&mut self, rect: Rect) {
        self.state_mut().set_rect(rect);
    }

    /// Builder form of [`set_rect`](Self::set_rect).
    fn with_rect(mut self, rect: Rect) -> Self
    where
        Self: Sized,
    {
        self.set_rect(rect);
        self
    }

    /// Has the rect changed since the last paint?
    fn is_dirty(&self) -> bool {
        self.state().dirty
    }

    /// Is the view visible?
    fn visible(&self) -> bool {
        self.state().visible
    }

    /// Show or hide the view. Hidden views neither paint nor request redraws.
    fn set_visible(&mut self, visible: bool) {
        self.state_mut().visible = visible;
    }

    /// Can the view take focus?
    fn focusable(&self) -> bool {
        self.state().focusable
    }

    /// Include or exclude the view from focus cycling.
    fn set_focusable(&mut self, focusable: bool) {
        self.state_mut().focusable = focusable;
    }

    /// Does the view hold focus?
    fn focused(&self) -> bool {
        self.state().focused
    }

    /// Focus or unfocus the view. Requests a redraw only if the flag actually
    /// changes.
    fn set_focused(&mut self, focused: bool) {
        if self.state_mut().set_focused(focused) {
            self.request_redraw();
        }
    }

    /// The theme key prefix.
    fn color_key_prefix(&self) -> &str {
        &self.state().color_key_prefix
    }

    /// Replace the theme key prefix.
    fn set_color_key_prefix(&mut self, prefix: &str) {
        self.state_mut().color_key_prefix = prefix.into();
    }

    /// The full theme key for `channel`: `prefix[.focused].channel`.
    fn color_key(&self, channel: &str) -> String {
        let prefix = self.color_key_prefix();
        if self.focused() {
            format!("{prefix}.focused.{channel}")
        } else {
            format!("{prefix}.{channel}")
        }
    }

    /// Look up the style for `channel`, or "" if the theme has none.
    fn resolve_color<'t>(&self, theme: &'t Theme, channel: &str) -> &'t str {
        theme.get(&self.color_key(channel))
    }

    /// Does this view own the view with the given id? Composites override
    /// this to scope popup redraws to their descendants.
    fn contains(&self, _id: ViewId) -> bool {
        false
    }

    /// Child views, for walking the tree.
    fn children(&self) -> Vec<ViewRef> {
        vec![]
    }

    /// The owning application, if attached.
    fn application(&self) -> Option<&AppLink> {
        self.state().app.as_ref()
    }

    /// Attach to or detach from an application.
    fn set_application(&mut self, app: Option<AppLink>) {
        self.state_mut().set_app(app);
    }

    /// Handle a keystroke.
    fn on_key_press(&mut self, _key: Key) -> Result<()> {
        Ok(())
    }

    /// Paint the view.
    fn render(&mut self, _frame: &mut Frame<'_>) -> Result<()> {
        Ok(())
    }

    /// Ask the application to repaint this view on its next tick. Does
    /// nothing if the view is detached or hidden.
    fn request_redraw(&self) {
        let s = self.state();
        if s.visible
            && let Some(app) = &s.app
        {
            app.request_redraw(s.id);
        }
    }
}

/// Paint a child view if it is visible.
pub fn render_child<V: View + ?Sized>(child: &RefCell<V>, frame: &mut Frame<'_>) -> Result<()> {
    let mut c = borrow_mut(child)?;
    if c.visible() {
        c.render(frame)?;
        c.state_mut().clean();
    }
    Ok(())
}
