//! Termview: a small terminal widget toolkit.
//!
//! An application composes rectangular views (lists, tabs, text panes,
//! input fields, modal dialogs) that share one keyboard stream and one
//! escape-coded output surface.
//!
//! # Quick Start
//!
//! The main entry points are:
//! - [`Application`] - The component stack, focus, popups and event loop
//! - [`View`] - The trait implemented by all widgets
//! - [`backend::crossterm::CrosstermBackend`] - The terminal backend
//!
//! # Module Organization
//!
//! - [`ansi`] - The escape-sequence text compositor
//! - [`geom`] - Geometry primitives (Point, Dimension, Rect)
//! - [`widgets`] - Built-in widget implementations

#![warn(missing_docs)]

pub use termview_geom as geom;

pub mod ansi;
pub mod app;
pub mod backend;
pub mod error;
pub mod event;
pub mod listener;
pub mod theme;
pub mod view;
pub mod widgets;

pub use app::{AppLink, Application, RunOptions};
pub use error::{Error, Result};
pub use event::Key;
pub use theme::Theme;
pub use view::{View, ViewId, ViewRef, ViewState};
