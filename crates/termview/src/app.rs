//! The application: component stack, focus, popup modality, the redraw
//! queue and the main loop.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet, VecDeque},
    fmt, mem,
    rc::{Rc, Weak},
    time::Duration,
};

use scopeguard::guard;

use crate::{
    ansi::Ansi,
    backend::Backend,
    error::{Error, Result},
    event::Key,
    theme::Theme,
    view::{self, Frame, ViewId, ViewRef},
};

/// Work queued by a view for the application to run after the current
/// dispatch.
type Deferred = Box<dyn FnOnce(&mut Application) -> Result<()>>;

/// State shared between the application and the views attached to it.
#[derive(Default)]
struct Shared {
    /// Views waiting to be repainted.
    pending: HashSet<ViewId>,
    /// Deferred actions, in submission order.
    deferred: VecDeque<Deferred>,
    /// Set when the main loop should stop.
    exit: bool,
}

/// A weak handle from a view to the application it is attached to.
///
/// Views hold one of these rather than the application itself, so attaching
/// a view never creates a reference cycle, and a view that outlives its
/// application simply stops scheduling work.
#[derive(Clone)]
pub struct AppLink(Weak<RefCell<Shared>>);

impl AppLink {
    /// Run `f` against the shared state, if the application is still alive
    /// and not already borrowed.
    fn with(&self, f: impl FnOnce(&mut Shared)) {
        if let Some(shared) = self.0.upgrade() {
            match shared.try_borrow_mut() {
                Ok(mut s) => f(&mut s),
                Err(_) => tracing::warn!("application state busy, dropping request"),
            }
        }
    }

    /// Queue a repaint of the view with the given id.
    pub fn request_redraw(&self, id: ViewId) {
        self.with(|s| {
            s.pending.insert(id);
        });
    }

    /// Queue work to run against the application once the current key
    /// dispatch returns. This is how widget callbacks reach the application,
    /// which is borrowed while they run.
    pub fn defer(&self, f: impl FnOnce(&mut Application) -> Result<()> + 'static) {
        self.with(|s| s.deferred.push_back(Box::new(f)));
    }

    /// Ask the main loop to stop.
    pub fn request_exit(&self) {
        self.with(|s| s.exit = true);
    }

    /// Is the application still alive?
    pub fn is_attached(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Do two links point at the same application?
    pub fn same_app(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for AppLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppLink")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// A global key binding.
type Handler = Rc<RefCell<dyn FnMut(&mut Application) -> Result<()>>>;

/// A registered global key handler.
struct KeyHandler {
    /// The callback.
    handler: Handler,
    /// May the handler fire while a popup is active?
    valid_on_popup: bool,
}

/// The active popup.
struct Popup {
    /// The popup view.
    view: ViewRef,
    /// Cached id of the popup view.
    id: ViewId,
    /// Does Esc close it?
    closeable: bool,
}

/// Tuning for [`Application::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// How long each loop iteration waits for input.
    pub poll_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// Owns the top-level component stack and drives the event loop.
pub struct Application {
    /// Top-level components, in focus order.
    components: Vec<ViewRef>,
    /// Index of the component holding the focus slot.
    focused: usize,
    /// The modal popup, if any.
    popup: Option<Popup>,
    /// Global key handlers.
    handlers: HashMap<Key, KeyHandler>,
    /// Redraw queue, deferred actions and the exit flag.
    shared: Rc<RefCell<Shared>>,
    /// The color table, fixed for the application's lifetime.
    theme: Theme,
    /// The terminal.
    backend: Box<dyn Backend>,
    /// Loop tuning.
    options: RunOptions,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("components", &self.components.len())
            .field("focused", &self.focused)
            .field("popup", &self.popup.is_some())
            .field("handlers", &self.handlers.len())
            .field("backend", &self.backend)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Create an application drawing to `backend` with colors from `theme`.
    pub fn new(backend: impl Backend + 'static, theme: Theme) -> Self {
        Self {
            components: vec![],
            focused: 0,
            popup: None,
            handlers: HashMap::new(),
            shared: Rc::new(RefCell::new(Shared::default())),
            theme,
            backend: Box::new(backend),
            options: RunOptions::default(),
        }
    }

    /// Replace the loop options.
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// A link views can use to reach this application.
    pub fn link(&self) -> AppLink {
        AppLink(Rc::downgrade(&self.shared))
    }

    /// The theme.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// The top-level components.
    pub fn components(&self) -> &[ViewRef] {
        &self.components
    }

    /// Index of the component holding the focus slot.
    pub fn focused_index(&self) -> usize {
        self.focused
    }

    /// The component holding the focus slot.
    pub fn focused_view(&self) -> Option<ViewRef> {
        self.components.get(self.focused).cloned()
    }

    /// The active popup.
    pub fn popup(&self) -> Option<&ViewRef> {
        self.popup.as_ref().map(|p| &p.view)
    }

    /// Is the main loop running, or would it run?
    pub fn is_running(&self) -> bool {
        !self.shared.borrow().exit
    }

    /// Stop the main loop after the current iteration.
    pub fn quit(&mut self) {
        self.shared.borrow_mut().exit = true;
    }

    /// Ids of views with pending redraws. Mostly useful in tests.
    pub fn pending(&self) -> HashSet<ViewId> {
        self.shared.borrow().pending.clone()
    }

    /// Append a top-level component and bind it to this application.
    pub fn add_component(&mut self, view: ViewRef) -> Result<()> {
        view::borrow_mut(&view)?.set_application(Some(self.link()));
        self.components.push(view);
        Ok(())
    }

    /// Position of a component in the stack.
    fn index_of(&self, view: &ViewRef) -> Result<usize> {
        let id = view::borrow(view)?.id();
        for (i, c) in self.components.iter().enumerate() {
            if view::borrow(c)?.id() == id {
                return Ok(i);
            }
        }
        Err(Error::Invalid(format!("{id} is not a component")))
    }

    /// Remove a component and unbind it. If it held the focus slot, focus
    /// moves to the next focusable component.
    pub fn remove_component(&mut self, view: &ViewRef) -> Result<()> {
        let idx = self.index_of(view)?;
        let removed = self.components.remove(idx);
        {
            let mut r = view::borrow_mut(&removed)?;
            r.set_application(None);
            r.set_focused(false);
        }
        if self.components.is_empty() {
            self.focused = 0;
        } else if idx < self.focused {
            self.focused -= 1;
        } else if idx == self.focused {
            self.focused = idx % self.components.len();
            let next = self.scan(self.focused, 0..self.components.len(), true)?;
            if let Some(next) = next {
                self.focused = next;
                view::borrow_mut(&self.components[next])?.set_focused(true);
            }
        }
        Ok(())
    }

    /// Find the first focusable component reached from `start` by each step
    /// in `steps`, moving forward or backward and wrapping.
    fn scan(
        &self,
        start: usize,
        steps: impl Iterator<Item = usize>,
        forward: bool,
    ) -> Result<Option<usize>> {
        let n = self.components.len();
        for step in steps {
            let i = if forward {
                (start + step) % n
            } else {
                (start + n - step % n) % n
            };
            if view::borrow(&self.components[i])?.focusable() {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// Move focus to the next or previous focusable component.
    fn cycle(&mut self, forward: bool) -> Result<()> {
        if let Some(p) = &self.popup {
            view::borrow_mut(&p.view)?.set_focused(true);
        }
        let n = self.components.len();
        if n == 0 {
            return Ok(());
        }
        let start = self.focused.min(n - 1);
        let Some(next) = self.scan(start, 1..=n, forward)? else {
            tracing::debug!("no focusable components");
            return Ok(());
        };
        if next != start {
            view::borrow_mut(&self.components[start])?.set_focused(false);
        }
        self.focused = next;
        view::borrow_mut(&self.components[next])?.set_focused(true);
        Ok(())
    }

    /// Focus the next focusable component, wrapping around. Does nothing if
    /// no component is focusable.
    pub fn cycle_focus(&mut self) -> Result<()> {
        self.cycle(true)
    }

    /// Focus the previous focusable component, wrapping around.
    pub fn cycle_focus_back(&mut self) -> Result<()> {
        self.cycle(false)
    }

    /// Give the focus slot to a specific component.
    pub fn set_focused_view(&mut self, view: &ViewRef) -> Result<()> {
        let idx = self.index_of(view)?;
        if let Some(current) = self.components.get(self.focused)
            && self.focused != idx
        {
            view::borrow_mut(current)?.set_focused(false);
        }
        self.focused = idx;
        view::borrow_mut(view)?.set_focused(true);
        Ok(())
    }

    /// Bind a global key handler. Handlers with `valid_on_popup == false`
    /// are skipped while a popup is active, and the key goes to the popup
    /// instead.
    pub fn set_key_handler(
        &mut self,
        key: Key,
        handler: impl FnMut(&mut Self) -> Result<()> + 'static,
        valid_on_popup: bool,
    ) {
        self.handlers.insert(
            key,
            KeyHandler {
                handler: Rc::new(RefCell::new(handler)),
                valid_on_popup,
            },
        );
    }

    /// Remove a global key handler. Returns false if none was bound.
    pub fn unset_key_handler(&mut self, key: Key) -> bool {
        self.handlers.remove(&key).is_some()
    }

    /// Dispatch one keystroke, then run any actions deferred during the
    /// dispatch.
    pub fn handle_key(&mut self, key: Key) -> Result<()> {
        tracing::debug!(?key, "dispatch");
        let ret = self.dispatch(key);
        self.run_deferred();
        ret
    }

    /// Route a keystroke: Esc, Tab and BackTab are fixed; everything else
    /// tries the handler table, then the popup or the focused component.
    fn dispatch(&mut self, key: Key) -> Result<()> {
        match key {
            Key::Esc => {
                if self.popup.is_some() {
                    self.close_popup()?;
                } else {
                    self.quit();
                }
                Ok(())
            }
            Key::Tab => self.cycle_focus(),
            Key::BackTab => self.cycle_focus_back(),
            _ => {
                let popup_active = self.popup.is_some();
                let handler = self
                    .handlers
                    .get(&key)
                    .filter(|h| h.valid_on_popup || !popup_active)
                    .map(|h| h.handler.clone());
                if let Some(h) = handler {
                    let mut f = h
                        .try_borrow_mut()
                        .map_err(|_| Error::Busy(format!("handler for {key:?}")))?;
                    (&mut *f)(self)
                } else {
                    self.send_key(key)
                }
            }
        }
    }

    /// Deliver a key to the popup, or else the focused component.
    fn send_key(&mut self, key: Key) -> Result<()> {
        let target = match &self.popup {
            Some(p) => Some(p.view.clone()),
            None => self.focused_view(),
        };
        match target {
            Some(t) => view::borrow_mut(&t)?.on_key_press(key),
            None => Ok(()),
        }
    }

    /// Run deferred actions until the queue is empty. Errors are logged.
    pub fn run_deferred(&mut self) {
        loop {
            let next = self.shared.borrow_mut().deferred.pop_front();
            let Some(f) = next else {
                break;
            };
            if let Err(e) = f(self) {
                tracing::error!("deferred action failed: {e}");
            }
        }
    }

    /// Show a modal popup centered on the terminal. While it is up, it
    /// receives every key not claimed by a popup-valid handler, and only it
    /// and the views it contains are repainted.
    pub fn open_popup(&mut self, view: ViewRef, closeable: bool) -> Result<()> {
        if let Some(old) = self.popup.take() {
            tracing::warn!("replacing active popup {}", old.id);
            view::update(&old.view, |v| v.set_application(None));
        }
        let size = self.backend.size()?;
        let id = {
            let mut v = view::borrow_mut(&view)?;
            let rect = v.rect().centered_in(size);
            v.set_rect(rect);
            // Focus before binding, so the paint below is the only one.
            v.set_focused(true);
            v.set_application(Some(self.link()));
            v.id()
        };
        self.popup = Some(Popup {
            view: view.clone(),
            id,
            closeable,
        });
        self.render_view(&view)
    }

    /// Close the popup if it is closeable. Returns true if a popup was
    /// closed.
    pub fn close_popup(&mut self) -> Result<bool> {
        match &self.popup {
            Some(p) if p.closeable => {
                self.dismiss_popup()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Close the popup regardless of whether it is closeable, clear the
    /// screen and repaint the component stack.
    pub fn dismiss_popup(&mut self) -> Result<()> {
        let Some(p) = self.popup.take() else {
            return Ok(());
        };
        {
            let mut v = view::borrow_mut(&p.view)?;
            v.set_application(None);
            v.set_focused(false);
        }
        self.clear_screen();
        self.paint_all();
        Ok(())
    }

    /// Dismiss the popup only if it is the view with this id. A dialog
    /// closing itself uses this, so that a popup opened in its place by one
    /// of its listeners survives. Returns true if the popup was dismissed.
    pub fn dismiss_popup_if(&mut self, id: ViewId) -> Result<bool> {
        match &self.popup {
            Some(p) if p.id == id => {
                self.dismiss_popup()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Is the view with this id the popup, or contained in it?
    fn in_popup_scope(p: &Popup, id: ViewId) -> bool {
        id == p.id
            || p.view
                .try_borrow()
                .map(|v| v.contains(id))
                .unwrap_or(false)
    }

    /// Repaint every view with a pending redraw request. While a popup is
    /// active, requests from views outside its scope are dropped.
    pub fn drain_redraws(&mut self) {
        let pending = mem::take(&mut self.shared.borrow_mut().pending);
        if pending.is_empty() {
            return;
        }
        let mut targets = vec![];
        match &self.popup {
            Some(p) => {
                let scoped: HashSet<ViewId> = pending
                    .iter()
                    .copied()
                    .filter(|id| Self::in_popup_scope(p, *id))
                    .collect();
                collect(&p.view, &scoped, &mut targets);
            }
            None => {
                for c in &self.components {
                    collect(c, &pending, &mut targets);
                }
            }
        }
        for t in &targets {
            if let Err(e) = self.render_view(t) {
                tracing::error!("repaint failed: {e}");
            }
        }
    }

    /// Paint a single view if it is visible.
    fn render_view(&mut self, v: &ViewRef) -> Result<()> {
        let mut frame = Frame::new(&self.theme, self.backend.writer());
        view::render_child(v, &mut frame)
    }

    /// Paint the popup if there is one, else every component.
    fn paint_all(&mut self) {
        let targets = match &self.popup {
            Some(p) => vec![p.view.clone()],
            None => self.components.clone(),
        };
        for t in &targets {
            if let Err(e) = self.render_view(t) {
                tracing::error!("paint failed: {e}");
            }
        }
    }

    /// Write a buffer straight to the output surface.
    fn put(&mut self, buf: &Ansi) {
        buf.put(self.backend.writer());
    }

    /// Clear the terminal.
    fn clear_screen(&mut self) {
        self.put(Ansi::new().clear_screen());
    }

    /// Clear the screen, hide the cursor and repaint everything.
    pub fn refresh(&mut self) {
        self.put(Ansi::new().clear_screen().cursor_off());
        self.paint_all();
    }

    /// One loop iteration: drain the redraw queue, wait for a key and
    /// dispatch it. Widget errors are logged; backend errors are returned.
    pub fn tick(&mut self) -> Result<()> {
        self.drain_redraws();
        if let Some(key) = self.backend.poll_key(self.options.poll_interval)?
            && let Err(e) = self.handle_key(key)
        {
            tracing::error!("key {key:?}: {e}");
        }
        Ok(())
    }

    /// Restore the terminal to the state it was in before `run`.
    fn shutdown(&mut self) {
        self.put(Ansi::new().clear_screen().cursor_on());
        if let Err(e) = self.backend.stop() {
            tracing::error!("failed to restore terminal: {e}");
        }
    }

    /// Run the main loop until Esc is pressed with no popup active, or exit
    /// is requested. The terminal is restored however the loop ends,
    /// including on error or panic.
    pub fn run(&mut self) -> Result<()> {
        self.backend.start()?;
        let mut app = guard(self, |app| app.shutdown());
        app.shared.borrow_mut().exit = false;
        app.refresh();
        while app.is_running() {
            app.tick()?;
        }
        Ok(())
    }

    /// Release the terminal while `f` runs, for example to hand it to an
    /// external editor. Raw mode is re-entered when `f` returns, even if it
    /// panics, and the screen is repainted.
    pub fn suspend<R>(&mut self, f: impl FnOnce() -> R) -> Result<R> {
        self.put(Ansi::new().clear_screen().cursor_on());
        self.backend.stop()?;
        let ret = {
            let _restart = guard(&mut self.backend, |b| {
                if let Err(e) = b.start() {
                    tracing::error!("failed to re-enter raw mode: {e}");
                }
            });
            f()
        };
        self.refresh();
        Ok(ret)
    }
}

/// Collect, in tree order, the views under `root` whose ids are in `ids`.
fn collect(root: &ViewRef, ids: &HashSet<ViewId>, out: &mut Vec<ViewRef>) {
    let Ok(v) = root.try_borrow() else {
        tracing::warn!("skipping busy view during redraw");
        return;
    };
    if ids.contains(&v.id()) {
        out.push(root.clone());
    }
    for c in v.children() {
        collect(&c, ids, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::test::TestBackend,
        geom::Dimension,
        view::{View, ViewState, shared},
    };

    /// A view that counts its paints.
    struct Counter {
        /// State.
        state: ViewState,
        /// Number of paints.
        paints: usize,
    }

    impl View for Counter {
        fn state(&self) -> &ViewState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut ViewState {
            &mut self.state
        }
        fn render(&mut self, _: &mut Frame<'_>) -> Result<()> {
            self.paints += 1;
            Ok(())
        }
    }

    fn counter() -> Rc<RefCell<Counter>> {
        shared(Counter {
            state: ViewState::new("counter"),
            paints: 0,
        })
    }

    fn app() -> Application {
        Application::new(TestBackend::create(Dimension::new(20, 10)).1, Theme::empty())
    }

    #[test]
    fn redraws_are_deduplicated() {
        let mut a = app();
        let c = counter();
        a.add_component(c.clone()).unwrap();
        let link = a.link();
        let id = c.borrow().id();
        link.request_redraw(id);
        link.request_redraw(id);
        assert_eq!(a.pending().len(), 1);
        a.drain_redraws();
        assert_eq!(c.borrow().paints, 1);
        assert!(a.pending().is_empty());
        a.drain_redraws();
        assert_eq!(c.borrow().paints, 1);
    }

    #[test]
    fn hidden_views_do_not_queue() {
        let mut a = app();
        let c = counter();
        a.add_component(c.clone()).unwrap();
        c.borrow_mut().set_visible(false);
        c.borrow().request_redraw();
        assert!(a.pending().is_empty());
    }

    #[test]
    fn link_outlives_app() {
        let a = app();
        let link = a.link();
        assert!(link.is_attached());
        assert!(link.same_app(&a.link()));
        drop(a);
        assert!(!link.is_attached());
        link.request_exit();
    }

    #[test]
    fn deferred_actions_run_after_dispatch() {
        let mut a = app();
        let link = a.link();
        a.set_key_handler(
            Key::Char('q'),
            move |_| {
                link.defer(|app| {
                    app.quit();
                    Ok(())
                });
                Ok(())
            },
            true,
        );
        assert!(a.is_running());
        a.handle_key(Key::Char('q')).unwrap();
        assert!(!a.is_running());
    }
}
