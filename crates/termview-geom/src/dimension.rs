use std::fmt;

use super::Rect;

/// A `Dimension` is a size with no location: the width and height of a
/// widget or of the terminal itself.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct Dimension {
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl Dimension {
    /// Construct a dimension.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<Rect> for Dimension {
    fn from(r: Rect) -> Self {
        r.dimension()
    }
}

impl From<(u32, u32)> for Dimension {
    fn from(v: (u32, u32)) -> Self {
        Self {
            width: v.0,
            height: v.1,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dimension:{},{}", self.width, self.height)
    }
}
