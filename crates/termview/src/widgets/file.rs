//! A directory browser for picking files.
//!
//! The chooser lists one directory at a time under a header naming it, with
//! a status line at the bottom. Directories sort ahead of files, and every
//! directory except a filesystem root starts with a `..` link.

use std::{
    cell::RefCell,
    cmp::Ordering,
    fmt, fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    ansi::{self, Ansi},
    app::AppLink,
    error::{Error, Result},
    event::Key,
    geom::Rect,
    listener::Listeners,
    view::{self, Frame, View, ViewId, ViewRef, ViewState},
};

use super::{DefaultListModel, ListView};

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// File name, or `..` for the parent.
    pub name: String,
    /// Is this a directory?
    pub dir: bool,
}

impl Entry {
    /// The parent directory link.
    pub fn parent() -> Self {
        Self {
            name: "..".into(),
            dir: true,
        }
    }

    /// Is this the parent directory link?
    pub fn is_parent(&self) -> bool {
        self.name == ".."
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dir {
            write!(f, "{}/", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Directories first, then by name.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dir
            .cmp(&self.dir)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// The sorted contents of `dir`, led by a parent link unless `dir` is a
/// filesystem root.
pub fn listing(dir: &Path) -> Result<Vec<Entry>> {
    let failed = |e: io::Error| Error::Invalid(format!("reading {}: {e}", dir.display()));
    let mut entries = vec![];
    for e in fs::read_dir(dir).map_err(failed)? {
        let e = e.map_err(failed)?;
        entries.push(Entry {
            name: e.file_name().to_string_lossy().into_owned(),
            dir: e.file_type().map_err(failed)?.is_dir(),
        });
    }
    entries.sort();
    if dir.parent().is_some() {
        entries.insert(0, Entry::parent());
    }
    Ok(entries)
}

/// Status line text for a fresh listing.
fn summary(entries: &[Entry]) -> String {
    let n = entries.iter().filter(|e| !e.is_parent()).count();
    match n {
        1 => "1 entry".into(),
        n => format!("{n} entries"),
    }
}

/// Walks the filesystem one directory at a time.
///
/// Enter on a directory descends into it and Enter on a file fires
/// [`FileChooser::on_choose`] with its path. Backspace goes up a level. The
/// listing is an ordinary [`ListView`] sharing the chooser's color prefix, so
/// `filechooser.bg` and `filechooser.fg` color the body, and the header and
/// footer bars use `filechooser.header.*` and `filechooser.footer.*`.
pub struct FileChooser {
    /// View state.
    state: ViewState,
    /// The directory being listed, always canonical.
    cwd: PathBuf,
    /// Listing contents.
    model: Rc<RefCell<DefaultListModel<Entry>>>,
    /// The listing.
    list: Rc<RefCell<ListView<Entry>>>,
    /// An entry selected in the listing, acted on once the listing returns.
    picked: Rc<RefCell<Option<Entry>>>,
    /// Footer text.
    status: String,
    /// Fired with the chosen file's path.
    on_choose: Listeners<Self, Path>,
}

impl fmt::Debug for FileChooser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileChooser")
            .field("cwd", &self.cwd)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Canonicalize a user-supplied directory.
fn resolve(dir: &Path) -> Result<PathBuf> {
    dir.canonicalize()
        .map_err(|e| Error::Invalid(format!("{}: {e}", dir.display())))
}

impl FileChooser {
    /// A chooser listing `dir`.
    pub fn new(dir: &Path) -> Result<Self> {
        let cwd = resolve(dir)?;
        let entries = listing(&cwd)?;
        let status = summary(&entries);
        let model = DefaultListModel::shared(entries);
        let list = ListView::new(model.clone())?;
        let picked = Rc::new(RefCell::new(None));
        {
            let mut l = view::borrow_mut(&list)?;
            l.set_selectable(true);
            l.set_color_key_prefix("filechooser");
            let p = picked.clone();
            l.on_select().add(move |_, entry| {
                *p.borrow_mut() = entry.clone();
            });
        }
        Ok(Self {
            state: ViewState::for_type::<Self>(),
            cwd,
            model,
            list,
            picked,
            status,
            on_choose: Listeners::new(),
        })
    }

    /// The directory being listed.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The listing.
    pub fn list(&self) -> &Rc<RefCell<ListView<Entry>>> {
        &self.list
    }

    /// The footer text.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Listeners fired with the path of a chosen file.
    pub fn on_choose(&mut self) -> &mut Listeners<Self, Path> {
        &mut self.on_choose
    }

    /// List a different directory. On failure the listing is left alone and
    /// the error is shown in the footer as well as returned.
    pub fn navigate(&mut self, dir: &Path) -> Result<()> {
        let found = resolve(dir).and_then(|d| Ok((listing(&d)?, d)));
        self.request_redraw();
        match found {
            Ok((entries, dir)) => {
                tracing::debug!("listing {}", dir.display());
                self.status = summary(&entries);
                self.cwd = dir;
                view::borrow_mut(&self.model)?.set_items(entries);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("{e}");
                self.status = e.to_string();
                Err(e)
            }
        }
    }

    /// Go up a level. Does nothing at a filesystem root.
    pub fn up(&mut self) -> Result<()> {
        match self.cwd.parent() {
            Some(p) => {
                let p = p.to_path_buf();
                self.navigate(&p)
            }
            None => Ok(()),
        }
    }

    /// Act on an entry selected in the listing.
    fn pick(&mut self, entry: &Entry) -> Result<()> {
        if entry.is_parent() {
            return self.up();
        }
        let path = self.cwd.join(&entry.name);
        if entry.dir {
            self.navigate(&path)
        } else {
            self.status = entry.name.clone();
            self.request_redraw();
            self.on_choose.fire(&*self, &path);
            Ok(())
        }
    }

    /// Split into header, listing and footer rows.
    fn layout(&self) -> (Rect, Rect, Rect) {
        let (header, rest) = self.rect().carve_top(1);
        let (body, footer) = rest.carve_bottom(1);
        (header, body, footer)
    }

    /// Fit the listing between the bars.
    fn reflow(&self) {
        let (_, body, _) = self.layout();
        view::update(&self.list, |l| l.set_rect(body));
    }

    /// Paint a one-row bar with the colors under `part`.
    fn paint_bar(&self, frame: &mut Frame<'_>, rect: Rect, part: &str, text: &str) {
        if rect.is_empty() {
            return;
        }
        let theme = frame.theme();
        let width = rect.width as usize;
        let mut buf = Ansi::new();
        buf.goto(rect.location())
            .write(self.resolve_color(theme, &format!("{part}.bg")))
            .write(self.resolve_color(theme, &format!("{part}.fg")))
            .write_fill(&ansi::truncate(text, width), width, ' ')
            .reset();
        frame.put(&buf);
    }
}

impl View for FileChooser {
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
        view::update(&self.list, |l| l.set_focused(focused));
    }

    fn set_application(&mut self, app: Option<AppLink>) {
        view::update(&self.list, |l| l.set_application(app.clone()));
        self.state.set_app(app);
    }

    fn contains(&self, id: ViewId) -> bool {
        self.list.try_borrow().is_ok_and(|l| l.id() == id)
    }

    fn children(&self) -> Vec<ViewRef> {
        let list: ViewRef = self.list.clone();
        vec![list]
    }

    fn on_key_press(&mut self, key: Key) -> Result<()> {
        if key == Key::Backspace {
            return self.up();
        }
        view::borrow_mut(&self.list)?.on_key_press(key)?;
        let picked = self.picked.borrow_mut().take();
        match picked {
            Some(entry) => self.pick(&entry),
            None => Ok(()),
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let (header, _, footer) = self.layout();
        self.paint_bar(frame, header, "header", &self.cwd.display().to_string());
        self.paint_bar(frame, footer, "footer", &self.status);
        self.reflow();
        view::render_child(&self.list, frame)
    }
}
