use std::fmt;

use super::{Dimension, Point};

/// The screen region owned by a widget.
///
/// Location and dimension are derived views over the four fields; changing
/// one of them means building a new `Rect`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl Rect {
    /// Construct a rectangle.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Construct a rectangle from a location and a dimension.
    pub fn at(location: Point, dimension: Dimension) -> Self {
        Self::new(location.x, location.y, dimension.width, dimension.height)
    }

    /// The top-left corner.
    pub fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The size of the rectangle.
    pub fn dimension(&self) -> Dimension {
        Dimension::new(self.width, self.height)
    }

    /// Is the rectangle empty?
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Does this rectangle contain the point?
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x
            && p.y >= self.y
            && p.x - self.x < self.width
            && p.y - self.y < self.height
    }

    /// Split off `n` rows from the top, returning `(top, rest)`. Both halves
    /// are clamped, so carving more rows than exist yields an empty remainder.
    pub fn carve_top(&self, n: u32) -> (Self, Self) {
        let n = n.min(self.height);
        (
            Self::new(self.x, self.y, self.width, n),
            Self::new(self.x, self.y + n, self.width, self.height - n),
        )
    }

    /// Split off `n` rows from the bottom, returning `(rest, bottom)`.
    pub fn carve_bottom(&self, n: u32) -> (Self, Self) {
        let n = n.min(self.height);
        let rest = self.height - n;
        (
            Self::new(self.x, self.y, self.width, rest),
            Self::new(self.x, self.y + rest, self.width, n),
        )
    }

    /// A rectangle of the same size, positioned at the center of `outer`.
    /// Rectangles larger than `outer` are pinned to the origin.
    pub fn centered_in(&self, outer: Dimension) -> Self {
        Self::at(
            Point::new(
                outer.width.saturating_sub(self.width) / 2,
                outer.height.saturating_sub(self.height) / 2,
            ),
            self.dimension(),
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect:{},{},{},{}",
            self.x, self.y, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn derived_views() {
        let r = Rect::new(3, 4, 10, 5);
        assert_eq!(r.location(), Point::new(3, 4));
        assert_eq!(r.dimension(), Dimension::new(10, 5));
        assert_eq!(r.to_string(), "Rect:3,4,10,5");
    }

    #[test]
    fn contains_point() {
        let r = Rect::new(2, 2, 3, 3);
        assert!(r.contains_point(Point::new(2, 2)));
        assert!(r.contains_point(Point::new(4, 4)));
        assert!(!r.contains_point(Point::new(5, 4)));
        assert!(!r.contains_point(Point::new(1, 3)));
        assert!(!Rect::new(0, 0, 0, 0).contains_point(Point::zero()));
    }

    #[test]
    fn carve_top() {
        let r = Rect::new(1, 1, 20, 10);
        let (head, body) = r.carve_top(1);
        assert_eq!(head, Rect::new(1, 1, 20, 1));
        assert_eq!(body, Rect::new(1, 2, 20, 9));

        let (head, body) = Rect::new(0, 0, 5, 0).carve_top(1);
        assert!(head.is_empty());
        assert!(body.is_empty());
    }

    #[test]
    fn carve_bottom() {
        let (body, foot) = Rect::new(1, 1, 20, 10).carve_bottom(1);
        assert_eq!(body, Rect::new(1, 1, 20, 9));
        assert_eq!(foot, Rect::new(1, 10, 20, 1));
        assert_eq!(
            Rect::at(Point::new(2, 2), Dimension::new(4, 1)).carve_bottom(3),
            (Rect::new(2, 2, 4, 0), Rect::new(2, 2, 4, 1))
        );
    }

    #[test]
    fn centered() {
        let r = Rect::new(0, 0, 20, 6).centered_in(Dimension::new(80, 24));
        assert_eq!(r, Rect::new(30, 9, 20, 6));

        let r = Rect::new(5, 5, 100, 6).centered_in(Dimension::new(80, 24));
        assert_eq!(r.location(), Point::new(0, 9));
    }

    proptest! {
        #[test]
        fn carve_top_partitions(x in 0u32..100, y in 0u32..100, w in 0u32..100, h in 0u32..100, n in 0u32..120) {
            let r = Rect::new(x, y, w, h);
            let (head, body) = r.carve_top(n);
            prop_assert_eq!(head.height + body.height, h);
            prop_assert_eq!(body.y, y + head.height);
        }
    }
}
