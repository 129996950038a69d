//! Geometry primitives used across termview.
//!
//! All coordinates are 0-based terminal cells. Conversion to the 1-based
//! `row;col` pairs of the terminal protocol happens in the compositor.

/// Width/height size type.
mod dimension;
/// Point helpers.
mod point;
/// Rectangle operations.
mod rect;

pub use dimension::Dimension;
pub use point::Point;
pub use rect::Rect;
