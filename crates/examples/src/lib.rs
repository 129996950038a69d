//! Example applications built on termview.

use std::{fs::File, path::Path, sync::Arc};

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::fmt;

/// The file browser demo.
pub mod filebrowser;

/// Send tracing output to `path`. Logs can't go to the terminal while an
/// application owns it, so without a path nothing is recorded.
pub fn init_tracing(path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let format = fmt::format()
        .with_level(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact();
    fmt()
        .with_writer(Arc::new(file))
        .event_format(format)
        .with_max_level(Level::DEBUG)
        .init();
    Ok(())
}
