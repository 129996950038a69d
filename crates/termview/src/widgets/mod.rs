//! Built-in widgets.

/// Modal input and question dialogs.
pub mod dialog;
/// Directory browsing and file picking.
pub mod file;
/// Single-line text entry.
pub mod input;
/// Scrolling, selectable lists.
pub mod list;
/// Tab strip with one child per tab.
pub mod tabbed;
/// Scrolling text pane.
pub mod text;
/// Titled single-child frame.
pub mod titled;

pub use dialog::{InputDialog, QuestionDialog};
pub use file::FileChooser;
pub use input::Input;
pub use list::{DefaultListModel, ListChange, ListModel, ListView};
pub use tabbed::{Tab, TabbedView};
pub use text::TextView;
pub use titled::TitledView;

use crate::{
    ansi::{self, Ansi},
    geom::Rect,
    view::{Frame, View},
};

/// Paint a one-row header across the top of `rect` in the view's bg/fg
/// colors.
pub(crate) fn paint_header(view: &dyn View, frame: &mut Frame<'_>, rect: Rect, text: &str) {
    if rect.is_empty() {
        return;
    }
    let theme = frame.theme();
    let width = rect.width as usize;
    let mut buf = Ansi::new();
    buf.goto(rect.location())
        .write(view.resolve_color(theme, "bg"))
        .write(view.resolve_color(theme, "fg"))
        .write_fill(&ansi::truncate(text, width), width, ' ')
        .reset();
    frame.put(&buf);
}

/// The region below a one-row header.
pub(crate) fn body(rect: Rect) -> Rect {
    rect.carve_top(1).1
}
