use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use crate::{
    ansi::{self, Ansi},
    error::{Error, Result},
    event::Key,
    geom::Point,
    listener::{ListenerId, Listeners},
    view::{self, Frame, View, ViewState},
};

/// Payload of a list model change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListChange {
    /// Item count after the change.
    pub len: usize,
}

/// Listeners notified when a model's contents change.
pub type ModelListeners<T> = Listeners<dyn ListModel<T>, ListChange>;

/// An ordered, indexable source of list items.
pub trait ListModel<T> {
    /// The number of items.
    fn len(&self) -> usize;

    /// Is the model empty?
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `index`, if it exists.
    fn get(&self, index: usize) -> Option<&T>;

    /// Change listeners. Implementations fire these after every mutation.
    fn listeners(&mut self) -> &mut ModelListeners<T>;
}

/// A shared, dynamically typed list model.
pub type ModelRef<T> = Rc<RefCell<dyn ListModel<T>>>;

/// A [`ListModel`] backed by a `Vec`.
pub struct DefaultListModel<T> {
    /// The items.
    items: Vec<T>,
    /// Change listeners.
    listeners: ModelListeners<T>,
}

impl<T: 'static> DefaultListModel<T> {
    /// A model holding `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            listeners: Listeners::new(),
        }
    }

    /// Wrap the model for sharing with a [`ListView`].
    pub fn shared(items: Vec<T>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(items)))
    }

    /// The items.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Replace all items and notify listeners.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.notify();
    }

    /// Append an item and notify listeners.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.notify();
    }

    /// Fire the change listeners.
    fn notify(&self) {
        let change = ListChange {
            len: self.items.len(),
        };
        self.listeners.fire(self, &change);
    }
}

impl<T> fmt::Debug for DefaultListModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultListModel")
            .field("len", &self.items.len())
            .finish()
    }
}

impl<T: 'static> ListModel<T> for DefaultListModel<T> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    fn listeners(&mut self) -> &mut ModelListeners<T> {
        &mut self.listeners
    }
}

/// Turns an item into the text shown for it.
pub type ItemRenderer<T> = Box<dyn Fn(&T) -> String>;

/// The model a list is bound to, and its registration there.
struct Binding<T> {
    /// The model.
    model: ModelRef<T>,
    /// Our change listener on the model.
    listener: ListenerId,
}

/// Convert an optional index to the `-1`-for-none form.
fn signed(i: Option<usize>) -> i64 {
    i.and_then(|i| i64::try_from(i).ok()).unwrap_or(-1)
}

/// A scrolling list over a [`ListModel`], with a cursor and an optional
/// committed selection.
///
/// A list is always created inside an `Rc<RefCell<_>>` so that the model's
/// change listener can reach it. When the model changes, the cursor returns
/// to the top. If the list is busy at that moment, for instance because the
/// change came from one of its own selection listeners, the reset is applied
/// as soon as the list is free.
pub struct ListView<T: 'static> {
    /// View state.
    state: ViewState,
    /// Weak handle to ourselves, captured by model listeners.
    me: Weak<RefCell<Self>>,
    /// The bound model.
    binding: Option<Binding<T>>,
    /// Set by the model listener when a reset is owed.
    pending_reset: Rc<Cell<bool>>,
    /// Topmost visible item.
    scroll_y: usize,
    /// The cursor.
    current: Option<usize>,
    /// The committed selection.
    selected: Option<usize>,
    /// Does Enter commit a selection?
    selectable: bool,
    /// Item text.
    renderer: ItemRenderer<T>,
    /// Fired with the selected item, or `None`, on selection.
    on_select: Listeners<Self, Option<T>>,
}

impl<T: 'static> Drop for ListView<T> {
    fn drop(&mut self) {
        if let Some(b) = &self.binding
            && let Ok(mut m) = b.model.try_borrow_mut()
        {
            m.listeners().remove(b.listener);
        }
    }
}

impl<T: Clone + fmt::Display + 'static> ListView<T> {
    /// A list over `model` that renders items with `Display`.
    pub fn new(model: ModelRef<T>) -> Result<Rc<RefCell<Self>>> {
        Self::with_renderer(model, |item: &T| item.to_string())
    }
}

impl<T: Clone + 'static> ListView<T> {
    /// A list over `model` that renders items with `renderer`.
    pub fn with_renderer(
        model: ModelRef<T>,
        renderer: impl Fn(&T) -> String + 'static,
    ) -> Result<Rc<RefCell<Self>>> {
        let list = Rc::new_cyclic(|me| {
            RefCell::new(Self {
                state: ViewState::for_type::<Self>(),
                me: me.clone(),
                binding: None,
                pending_reset: Rc::new(Cell::new(false)),
                scroll_y: 0,
                current: None,
                selected: None,
                selectable: false,
                renderer: Box::new(renderer),
                on_select: Listeners::new(),
            })
        });
        view::borrow_mut(&list)?.set_model(model)?;
        Ok(list)
    }

    /// Bind to a new model, detaching from the previous one. The cursor
    /// returns to the top.
    pub fn set_model(&mut self, model: ModelRef<T>) -> Result<()> {
        if let Some(old) = self.binding.take() {
            view::borrow_mut(&old.model)?
                .listeners()
                .remove(old.listener);
        }
        let me = self.me.clone();
        let pending = self.pending_reset.clone();
        let listener = view::borrow_mut(&model)?
            .listeners()
            .add(move |_, change| {
                pending.set(true);
                if let Some(list) = me.upgrade()
                    && let Ok(mut l) = list.try_borrow_mut()
                {
                    l.reset(change.len);
                }
            });
        let len = view::borrow(&model)?.len();
        self.binding = Some(Binding { model, listener });
        self.reset(len);
        Ok(())
    }

    /// The bound model.
    pub fn model(&self) -> Option<&ModelRef<T>> {
        self.binding.as_ref().map(|b| &b.model)
    }

    /// Cursor to the top of a list of `len` items.
    fn reset(&mut self, len: usize) {
        self.pending_reset.set(false);
        self.current = (len > 0).then_some(0);
        self.scroll_y = 0;
        self.request_redraw();
    }

    /// Apply a reset owed from a change that arrived while we were busy.
    fn sync(&mut self) -> Result<()> {
        if self.pending_reset.get() {
            let len = self.len()?;
            self.reset(len);
        }
        Ok(())
    }

    /// The model's item count.
    fn len(&self) -> Result<usize> {
        match &self.binding {
            Some(b) => Ok(view::borrow(&b.model)?.len()),
            None => Ok(0),
        }
    }

    /// A copy of the item at `index`.
    fn item(&self, index: usize) -> Result<T> {
        let b = self
            .binding
            .as_ref()
            .ok_or_else(|| Error::Model("list has no model".into()))?;
        view::borrow(&b.model)?
            .get(index)
            .cloned()
            .ok_or_else(|| Error::Model(format!("index {index} out of range")))
    }

    /// Viewport height in rows.
    fn height(&self) -> usize {
        self.rect().height as usize
    }

    /// Topmost visible item.
    pub fn scroll_y(&self) -> usize {
        self.scroll_y
    }

    /// The cursor, or -1 if there is none.
    pub fn current_index(&self) -> i64 {
        signed(self.current)
    }

    /// The committed selection, or -1 if there is none.
    pub fn selected_index(&self) -> i64 {
        signed(self.selected)
    }

    /// The item under the cursor.
    pub fn current_item(&self) -> Result<Option<T>> {
        self.current.map(|i| self.item(i)).transpose()
    }

    /// The selected item.
    pub fn selected_item(&self) -> Result<Option<T>> {
        self.selected.map(|i| self.item(i)).transpose()
    }

    /// Set the selection directly. A non-negative index fires the selection
    /// listeners; -1 clears the selection silently.
    pub fn set_selected_index(&mut self, index: i64) -> Result<()> {
        match usize::try_from(index) {
            Ok(i) => self.select(Some(i)),
            Err(_) => {
                self.selected = None;
                self.request_redraw();
                Ok(())
            }
        }
    }

    /// Commit a selection and notify listeners.
    fn select(&mut self, index: Option<usize>) -> Result<()> {
        let item = index.map(|i| self.item(i)).transpose()?;
        self.selected = index;
        self.on_select.fire(&*self, &item);
        self.request_redraw();
        Ok(())
    }

    /// Does Enter commit a selection?
    pub fn selectable(&self) -> bool {
        self.selectable
    }

    /// Enable or disable selection with Enter.
    pub fn set_selectable(&mut self, selectable: bool) {
        self.selectable = selectable;
    }

    /// Replace the item renderer.
    pub fn set_item_renderer(&mut self, renderer: impl Fn(&T) -> String + 'static) {
        self.renderer = Box::new(renderer);
        self.request_redraw();
    }

    /// Listeners fired on selection with the selected item.
    pub fn on_select(&mut self) -> &mut Listeners<Self, Option<T>> {
        &mut self.on_select
    }

    /// Move the cursor up a row, scrolling if it leaves the window.
    fn up(&mut self) {
        match self.current {
            Some(c) if c > 0 => {
                self.current = Some(c - 1);
                if c - 1 < self.scroll_y {
                    self.scroll_y -= 1;
                }
                self.request_redraw();
            }
            _ if self.scroll_y > 0 => {
                self.scroll_y -= 1;
                self.request_redraw();
            }
            _ => {}
        }
    }

    /// Move the cursor down a row, scrolling if it leaves the window.
    fn down(&mut self, len: usize) {
        let next = self.current.map_or(0, |c| c + 1);
        if next < len {
            self.current = Some(next);
            if next >= self.scroll_y + self.height() {
                self.scroll_y += 1;
            }
            self.request_redraw();
        }
    }

    /// Scroll down a page, clamped so the last page is full, and put the
    /// cursor at the top of the window.
    fn page_down(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let h = self.height();
        self.scroll_y = (self.scroll_y + h).min(len.saturating_sub(h));
        self.current = Some(self.scroll_y);
        self.request_redraw();
    }

    /// Scroll up a page and put the cursor at the top of the window.
    fn page_up(&mut self, len: usize) {
        self.scroll_y = self.scroll_y.saturating_sub(self.height());
        if len > 0 {
            self.current = Some(self.scroll_y);
        }
        self.request_redraw();
    }

    /// Back to the first item.
    fn home(&mut self, len: usize) {
        self.scroll_y = 0;
        self.current = (len > 0).then_some(0);
        self.request_redraw();
    }
}

impl<T: Clone + 'static> View for ListView<T> {
    fn state(&self) -> &ViewState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    fn on_key_press(&mut self, key: Key) -> Result<()> {
        self.sync()?;
        let len = self.len()?;
        match key {
            Key::Up => self.up(),
            Key::Down => self.down(len),
            Key::PageDown => self.page_down(len),
            Key::PageUp => self.page_up(len),
            Key::Home => self.home(len),
            Key::Enter if self.selectable => self.select(self.current)?,
            _ => {}
        }
        // A selection listener may have changed the model.
        self.sync()
    }

    fn render(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        self.sync()?;
        let r = self.rect();
        let w = r.width as usize;
        let theme = frame.theme();
        let bg = self.resolve_color(theme, "bg");
        let fg = self.resolve_color(theme, "fg");
        let len = self.len()?;

        let mut buf = Ansi::new();
        for row in 0..r.height {
            let i = self.scroll_y + row as usize;
            buf.goto(Point::new(r.x, r.y + row)).write(bg).write(fg);
            if i < len {
                let text = ansi::truncate(&(self.renderer)(&self.item(i)?), w);
                let mut cell = Ansi::new();
                if self.current == Some(i) {
                    cell.underline().write(&text).reset().write(bg).write(fg);
                } else {
                    cell.write(&text);
                }
                buf.write_fill(cell.as_str(), w, ' ');
            } else {
                buf.write_fill("", w, ' ');
            }
            buf.reset();
        }
        frame.put(&buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::{geom::Rect, theme::Theme};

    fn list(
        items: &[&str],
        height: u32,
    ) -> (
        Rc<RefCell<DefaultListModel<String>>>,
        Rc<RefCell<ListView<String>>>,
    ) {
        let model = DefaultListModel::shared(items.iter().map(|s| s.to_string()).collect());
        let list = ListView::new(model.clone()).unwrap();
        list.borrow_mut().set_rect(Rect::new(0, 0, 5, height));
        (model, list)
    }

    fn press(list: &Rc<RefCell<ListView<String>>>, keys: &[Key]) {
        for k in keys {
            list.borrow_mut().on_key_press(*k).unwrap();
        }
    }

    fn pos(list: &Rc<RefCell<ListView<String>>>) -> (i64, usize) {
        let l = list.borrow();
        (l.current_index(), l.scroll_y())
    }

    #[test]
    fn starts_at_top() {
        let (_, l) = list(&["a", "b"], 2);
        assert_eq!(pos(&l), (0, 0));
        let (_, l) = list(&[], 2);
        assert_eq!(pos(&l), (-1, 0));
    }

    #[test]
    fn down_twice_then_page_up() {
        let (_, l) = list(&["a", "b", "c"], 2);
        press(&l, &[Key::Down, Key::Down]);
        assert_eq!(pos(&l), (2, 1));
        press(&l, &[Key::PageUp]);
        assert_eq!(pos(&l), (0, 0));
    }

    #[test]
    fn up_scrolls_back() {
        let (_, l) = list(&["a", "b", "c", "d"], 2);
        press(&l, &[Key::Down, Key::Down, Key::Down]);
        assert_eq!(pos(&l), (3, 2));
        press(&l, &[Key::Up]);
        assert_eq!(pos(&l), (2, 2));
        press(&l, &[Key::Up]);
        assert_eq!(pos(&l), (1, 1));
        press(&l, &[Key::Up, Key::Up, Key::Up]);
        assert_eq!(pos(&l), (0, 0));
    }

    #[test]
    fn page_down_clamps() {
        let (_, l) = list(&["a", "b", "c", "d", "e"], 2);
        press(&l, &[Key::PageDown]);
        assert_eq!(pos(&l), (2, 2));
        press(&l, &[Key::PageDown, Key::PageDown]);
        assert_eq!(pos(&l), (3, 3));

        let (_, l) = list(&["a"], 3);
        press(&l, &[Key::PageDown]);
        assert_eq!(pos(&l), (0, 0));

        let (_, l) = list(&[], 3);
        press(&l, &[Key::PageDown, Key::PageUp, Key::Down, Key::Home]);
        assert_eq!(pos(&l), (-1, 0));
    }

    #[test]
    fn model_change_resets() {
        let (m, l) = list(&["a", "b", "c", "d", "e"], 2);
        press(&l, &[Key::Down, Key::Down, Key::Down]);
        assert_eq!(pos(&l), (3, 2));
        m.borrow_mut().set_items(vec![]);
        assert_eq!(pos(&l), (-1, 0));
        m.borrow_mut().push("z".into());
        assert_eq!(pos(&l), (0, 0));
    }

    #[test]
    fn rebinding_detaches_old_model() {
        let (old, l) = list(&["a", "b", "c"], 2);
        press(&l, &[Key::Down]);
        let new = DefaultListModel::shared(vec!["x".to_string()]);
        l.borrow_mut().set_model(new.clone()).unwrap();
        assert_eq!(old.borrow_mut().listeners().len(), 0);
        assert_eq!(new.borrow_mut().listeners().len(), 1);
        assert_eq!(pos(&l), (0, 0));
        press(&l, &[Key::Down]);
        old.borrow_mut().set_items(vec![]);
        assert_eq!(pos(&l), (0, 0));
    }

    #[test]
    fn drop_detaches() {
        let (m, l) = list(&["a"], 1);
        drop(l);
        assert!(m.borrow_mut().listeners().is_empty());
        m.borrow_mut().push("b".into());
    }

    #[test]
    fn enter_selects_when_selectable() {
        let got = Rc::new(RefCell::new(Vec::new()));
        let (_, l) = list(&["a", "b"], 2);
        let g = got.clone();
        l.borrow_mut()
            .on_select()
            .add(move |_, item| g.borrow_mut().push(item.clone()));

        press(&l, &[Key::Down, Key::Enter]);
        assert_eq!(l.borrow().selected_index(), -1);

        l.borrow_mut().set_selectable(true);
        press(&l, &[Key::Enter]);
        assert_eq!(l.borrow().selected_index(), 1);
        assert_eq!(l.borrow().selected_item().unwrap(), Some("b".to_string()));
        assert_eq!(*got.borrow(), vec![Some("b".to_string())]);

        l.borrow_mut().set_selected_index(-1).unwrap();
        assert_eq!(got.borrow().len(), 1);
        l.borrow_mut().set_selected_index(0).unwrap();
        assert_eq!(got.borrow().last(), Some(&Some("a".to_string())));
        assert!(l.borrow_mut().set_selected_index(9).is_err());
    }

    #[test]
    fn enter_on_empty_fires_none() {
        let got = Rc::new(RefCell::new(Vec::new()));
        let (_, l) = list(&[], 2);
        let g = got.clone();
        l.borrow_mut().set_selectable(true);
        l.borrow_mut()
            .on_select()
            .add(move |_, item: &Option<String>| g.borrow_mut().push(item.clone()));
        press(&l, &[Key::Enter]);
        assert_eq!(*got.borrow(), vec![None]);
    }

    #[test]
    fn change_from_select_listener_is_deferred() {
        let (m, l) = list(&["a", "b", "c"], 2);
        l.borrow_mut().set_selectable(true);
        let model = m.clone();
        l.borrow_mut()
            .on_select()
            .add(move |_, _| model.borrow_mut().set_items(vec!["x".into(), "y".into()]));
        press(&l, &[Key::Down, Key::Down, Key::Enter]);
        assert_eq!(pos(&l), (0, 0));
        assert_eq!(l.borrow().current_item().unwrap(), Some("x".to_string()));
    }

    #[test]
    fn render_rows() {
        let (_, l) = list(&["one", "two", "three"], 4);
        l.borrow_mut()
            .set_item_renderer(|s: &String| s.to_uppercase());
        press(&l, &[Key::Down]);
        let mut out = Vec::new();
        l.borrow_mut()
            .render(&mut Frame::new(&Theme::empty(), &mut out))
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(ansi::strip(&out), "ONE  TWO  THREE     ");
        assert!(out.contains("\x1b[4mTWO\x1b[0m"));
    }

    proptest! {
        #[test]
        fn down_keeps_cursor_in_window(len in 1usize..40, height in 1u32..10, presses in 0usize..60) {
            let items: Vec<String> = (0..len).map(|i| i.to_string()).collect();
            let model = DefaultListModel::shared(items);
            let l = ListView::new(model).unwrap();
            l.borrow_mut().set_rect(Rect::new(0, 0, 5, height));
            for _ in 0..presses {
                l.borrow_mut().on_key_press(Key::Down).unwrap();
                let v = l.borrow();
                let cur = usize::try_from(v.current_index()).unwrap();
                prop_assert!(v.scroll_y() <= cur);
                prop_assert!(cur < v.scroll_y() + height as usize);
                prop_assert!(cur < len);
            }
            l.borrow_mut().on_key_press(Key::Home).unwrap();
            prop_assert_eq!(pos(&l), (0, 0));
        }
    }
}
