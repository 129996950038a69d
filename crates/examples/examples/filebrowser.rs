//! Launch the file browser example.

use std::path::PathBuf;

use clap::Parser;
use termview::{
    Application, Theme,
    backend::{Backend, crossterm::CrosstermBackend},
};
use termview_examples::{filebrowser::Browser, init_tracing};

/// CLI flags for the file browser example.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Directory to start in.
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Write debug logs to this file.
    #[clap(short, long)]
    log: Option<PathBuf>,

    /// JSON file of color overrides.
    #[clap(short, long)]
    theme: Option<PathBuf>,
}

/// Run the file browser example.
pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let theme = match &args.theme {
        Some(p) => Theme::load(p)?,
        None => Theme::default(),
    };
    let backend = CrosstermBackend::new().with_panic_hook(true);
    let size = backend.size()?;
    let browser = Browser::new(&args.path)?;

    let mut app = Application::new(backend, theme);
    browser.install(&mut app, size)?;
    app.run()?;
    Ok(())
}
