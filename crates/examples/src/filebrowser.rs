//! A two-pane file browser: a directory listing beside a preview of the
//! chosen file.
//!
//! The listing is a [`FileChooser`]: Enter on a directory descends into it,
//! and Enter on a file loads it into the preview pane. `g` asks for a path
//! to jump to, `e` hands the chosen file to `$EDITOR`, and `q` asks before
//! quitting.

use std::{
    cell::RefCell,
    env, fmt,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    process::Command,
    rc::Rc,
};

use termview::{
    Application, Key,
    geom::{Dimension, Rect},
    view::{self, View, ViewRef, shared},
    widgets::{FileChooser, InputDialog, QuestionDialog, TextView, TitledView},
};

/// Bytes of a file shown in the preview pane.
const PREVIEW_LIMIT: u64 = 64 * 1024;

/// The head of a file as text, or a note saying why it can't be shown.
pub fn preview(path: &Path) -> String {
    let mut buf = vec![];
    match File::open(path).and_then(|f| f.take(PREVIEW_LIMIT).read_to_end(&mut buf)) {
        Ok(_) => String::from_utf8_lossy(&buf).into_owned(),
        Err(e) => format!("<{}: {e}>", path.display()),
    }
}

/// The right-hand pane and the file it shows.
#[derive(Clone)]
struct Preview {
    /// File contents.
    text: Rc<RefCell<TextView>>,
    /// Title bar around the contents.
    pane: Rc<RefCell<TitledView>>,
    /// The file last loaded.
    opened: Rc<RefCell<Option<PathBuf>>>,
}

impl Preview {
    /// Load a file into the pane.
    fn open(&self, path: &Path) {
        tracing::debug!("previewing {}", path.display());
        view::update(&*self.text, |t| t.set_text(&preview(path)));
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        view::update(&*self.pane, |p| p.set_title(name));
        *self.opened.borrow_mut() = Some(path.to_path_buf());
    }
}

/// The browser's views. Cloning shares them.
#[derive(Clone)]
pub struct Browser {
    /// The directory listing.
    chooser: Rc<RefCell<FileChooser>>,
    /// The preview pane.
    preview: Preview,
}

impl fmt::Debug for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser")
            .field("chooser", &self.chooser.borrow())
            .finish_non_exhaustive()
    }
}

impl Browser {
    /// A browser listing `root`.
    pub fn new(root: &Path) -> anyhow::Result<Self> {
        let chooser = shared(FileChooser::new(root)?);
        let text = shared(TextView::new(""));
        let preview = Preview {
            pane: shared(TitledView::new("preview", text.clone())),
            text,
            opened: Rc::new(RefCell::new(None)),
        };
        let p = preview.clone();
        chooser
            .borrow_mut()
            .on_choose()
            .add(move |_, path| p.open(path));
        Ok(Self { chooser, preview })
    }

    /// The directory being listed.
    pub fn cwd(&self) -> PathBuf {
        self.chooser.borrow().cwd().to_path_buf()
    }

    /// The directory listing.
    pub fn chooser(&self) -> &Rc<RefCell<FileChooser>> {
        &self.chooser
    }

    /// The preview text.
    pub fn text(&self) -> &Rc<RefCell<TextView>> {
        &self.preview.text
    }

    /// List a different directory. Failures show in the listing's footer.
    pub fn navigate(&self, dir: &Path) -> termview::Result<()> {
        view::borrow_mut(&*self.chooser)?.navigate(dir)
    }

    /// Lay the panes out side by side, add them to `app` and bind the
    /// browser's keys.
    pub fn install(&self, app: &mut Application, size: Dimension) -> anyhow::Result<()> {
        let left = size.width / 2;
        view::borrow_mut(&*self.chooser)?.set_rect(Rect::new(0, 0, left, size.height));
        view::borrow_mut(&*self.preview.pane)?.set_rect(Rect::new(
            left,
            0,
            size.width - left,
            size.height,
        ));
        let files: ViewRef = self.chooser.clone();
        app.add_component(files.clone())?;
        app.add_component(self.preview.pane.clone())?;
        app.set_focused_view(&files)?;

        let this = self.clone();
        app.set_key_handler(
            Key::Char('g'),
            move |app| {
                let d = shared(InputDialog::new("Go to", 40));
                let target = this.clone();
                let link = app.link();
                d.borrow_mut().on_submit().add(move |_, path| {
                    let target = target.clone();
                    let path = PathBuf::from(path);
                    link.defer(move |_| target.navigate(&path));
                });
                app.open_popup(d, true)
            },
            false,
        );

        app.set_key_handler(
            Key::Char('q'),
            |app| {
                let q = shared(QuestionDialog::new(
                    "Quit",
                    "Leave the browser?",
                    &["Yes", "No"],
                ));
                let link = app.link();
                q.borrow_mut().on_answer().add(move |_, answer| {
                    if *answer == 0 {
                        link.request_exit();
                    }
                });
                app.open_popup(q, true)
            },
            false,
        );

        let opened = self.preview.opened.clone();
        app.set_key_handler(
            Key::Char('e'),
            move |app| {
                let Some(path) = opened.borrow().clone() else {
                    return Ok(());
                };
                let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".into());
                match app.suspend(|| Command::new(&editor).arg(&path).status())? {
                    Ok(status) if !status.success() => {
                        tracing::warn!("{editor} exited with {status}");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("running {editor}: {e}"),
                }
                Ok(())
            },
            false,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use termview::{
        Theme,
        backend::test::{TestBackend, buf},
        widgets::file::listing,
    };

    use super::*;

    /// This crate's own directory.
    fn here() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .canonicalize()
            .unwrap()
    }

    /// Index of `name` in the listing of `dir`.
    fn position(dir: &Path, name: &str) -> usize {
        listing(dir)
            .unwrap()
            .iter()
            .position(|e| e.name == name)
            .unwrap()
    }

    #[test]
    fn preview_reports_errors() {
        let p = preview(&here().join("Cargo.toml"));
        assert!(p.contains("termview-examples"));
        assert!(preview(&here().join("missing")).starts_with('<'));
    }

    #[test]
    fn browse_into_a_directory_and_open_a_file() {
        let (tb, backend) = TestBackend::create(Dimension::new(60, 12));
        let mut app = Application::new(backend, Theme::default());
        let b = Browser::new(&here()).unwrap();
        b.install(&mut app, Dimension::new(60, 12)).unwrap();
        let list = b.chooser().borrow().list().clone();
        assert_eq!(list.borrow().rect(), Rect::new(0, 1, 30, 10));

        for _ in 0..position(&here(), "src") {
            app.handle_key(Key::Down).unwrap();
        }
        app.handle_key(Key::Enter).unwrap();
        assert_eq!(b.cwd(), here().join("src"));
        assert_eq!(list.borrow().current_index(), 0);

        for _ in 0..position(&b.cwd(), "lib.rs") {
            app.handle_key(Key::Down).unwrap();
        }
        app.handle_key(Key::Enter).unwrap();
        assert!(b.text().borrow().text().contains("pub mod filebrowser"));

        app.drain_redraws();
        assert!(buf(&tb).screen_contains("lib.rs"));

        app.handle_key(Key::Home).unwrap();
        app.handle_key(Key::Enter).unwrap();
        assert_eq!(b.cwd(), here());
    }

    #[test]
    fn go_to_and_quit_dialogs() {
        let (_, backend) = TestBackend::create(Dimension::new(60, 12));
        let mut app = Application::new(backend, Theme::default());
        let b = Browser::new(&here()).unwrap();
        b.install(&mut app, Dimension::new(60, 12)).unwrap();

        app.handle_key(Key::Char('g')).unwrap();
        assert!(app.popup().is_some());
        let target = here().join("src");
        for k in Key::text(&target.display().to_string()) {
            app.handle_key(k).unwrap();
        }
        app.handle_key(Key::Enter).unwrap();
        assert!(app.popup().is_none());
        assert_eq!(b.cwd(), target);

        app.handle_key(Key::Char('q')).unwrap();
        app.handle_key(Key::Right).unwrap();
        app.handle_key(Key::Enter).unwrap();
        assert!(app.is_running());
        app.handle_key(Key::Char('q')).unwrap();
        app.handle_key(Key::Enter).unwrap();
        assert!(!app.is_running());
    }

    #[test]
    fn failed_go_to_keeps_the_listing() {
        let b = Browser::new(&here()).unwrap();
        assert!(b.navigate(&here().join("no-such-dir")).is_err());
        assert_eq!(b.cwd(), here());
        assert!(b.chooser().borrow().status().contains("no-such-dir"));
    }
}
