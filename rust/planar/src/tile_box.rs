// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned rectangles with integer corners, the cheapest tile kind.

use crate::line::Line;
use crate::octagon::Octagon;
use crate::point::{IntPoint, IntVector};
use crate::simplex::Simplex;
use crate::tile::ShapeDim;
use crate::CRIT_COORD;

/// Axis-aligned box given by its lower-left and upper-right corners.
/// Empty when a lower bound exceeds the corresponding upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileBox {
    pub ll: IntPoint,
    pub ur: IntPoint,
}

impl TileBox {
    pub const EMPTY: Self = Self {
        ll: IntPoint {
            x: CRIT_COORD,
            y: CRIT_COORD,
        },
        ur: IntPoint {
            x: -CRIT_COORD,
            y: -CRIT_COORD,
        },
    };

    pub fn new(ll: IntPoint, ur: IntPoint) -> Self {
        Self { ll, ur }
    }

    pub fn from_point(p: IntPoint) -> Self {
        Self { ll: p, ur: p }
    }

    pub fn is_empty(&self) -> bool {
        self.ll.x > self.ur.x || self.ll.y > self.ur.y
    }

    pub fn width(&self) -> i64 {
        i64::from(self.ur.x) - i64::from(self.ll.x)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.ur.y) - i64::from(self.ll.y)
    }

    pub fn min_width(&self) -> f64 {
        self.width().min(self.height()) as f64
    }

    pub fn max_width(&self) -> f64 {
        self.width().max(self.height()) as f64
    }

    pub fn dimension(&self) -> ShapeDim {
        if self.is_empty() {
            ShapeDim::Empty
        } else if self.ll == self.ur {
            ShapeDim::Point
        } else if self.ll.x == self.ur.x || self.ll.y == self.ur.y {
            ShapeDim::Line
        } else {
            ShapeDim::Area
        }
    }

    pub fn contains(&self, p: IntPoint) -> bool {
        p.x >= self.ll.x && p.x <= self.ur.x && p.y >= self.ll.y && p.y <= self.ur.y
    }

    pub fn contains_inside(&self, p: IntPoint) -> bool {
        p.x > self.ll.x && p.x < self.ur.x && p.y > self.ll.y && p.y < self.ur.y
    }

    pub fn intersection(&self, other: &TileBox) -> TileBox {
        let result = TileBox {
            ll: IntPoint::new(self.ll.x.max(other.ll.x), self.ll.y.max(other.ll.y)),
            ur: IntPoint::new(self.ur.x.min(other.ur.x), self.ur.y.min(other.ur.y)),
        };
        if result.is_empty() {
            TileBox::EMPTY
        } else {
            result
        }
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &TileBox) -> TileBox {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        TileBox {
            ll: IntPoint::new(self.ll.x.min(other.ll.x), self.ll.y.min(other.ll.y)),
            ur: IntPoint::new(self.ur.x.max(other.ur.x), self.ur.y.max(other.ur.y)),
        }
    }

    pub fn intersects(&self, other: &TileBox) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Grows (positive) or shrinks (negative) the box on all four sides.
    pub fn offset(&self, distance: f64) -> TileBox {
        let d = distance.round() as i32;
        let result = TileBox {
            ll: IntPoint::new(self.ll.x - d, self.ll.y - d),
            ur: IntPoint::new(self.ur.x + d, self.ur.y + d),
        };
        if result.is_empty() {
            TileBox::EMPTY
        } else {
            result
        }
    }

    pub fn enlarge(&self, offset: f64) -> TileBox {
        self.offset(offset)
    }

    pub fn translate_by(&self, v: IntVector) -> TileBox {
        TileBox {
            ll: self.ll.translate_by(v),
            ur: self.ur.translate_by(v),
        }
    }

    /// Corners in counterclockwise order starting at the lower left.
    pub fn corner(&self, no: usize) -> IntPoint {
        match no & 3 {
            0 => self.ll,
            1 => IntPoint::new(self.ur.x, self.ll.y),
            2 => self.ur,
            _ => IntPoint::new(self.ll.x, self.ur.y),
        }
    }

    /// Border lines in counterclockwise order with the interior on their
    /// left: bottom, right, top, left.
    pub fn border_line(&self, no: usize) -> Line {
        match no & 3 {
            0 => Line::new(
                IntPoint::new(0, self.ll.y),
                IntPoint::new(1, self.ll.y),
            ),
            1 => Line::new(
                IntPoint::new(self.ur.x, 0),
                IntPoint::new(self.ur.x, 1),
            ),
            2 => Line::new(
                IntPoint::new(0, self.ur.y),
                IntPoint::new(-1, self.ur.y),
            ),
            _ => Line::new(
                IntPoint::new(self.ll.x, 0),
                IntPoint::new(self.ll.x, -1),
            ),
        }
    }

    pub fn to_octagon(&self) -> Octagon {
        if self.is_empty() {
            return Octagon::EMPTY;
        }
        Octagon::new(
            self.ll.x,
            self.ll.y,
            self.ur.x,
            self.ur.y,
            self.ll.x - self.ur.y,
            self.ur.x - self.ll.y,
            self.ll.x + self.ll.y,
            self.ur.x + self.ur.y,
        )
    }

    pub fn to_simplex(&self) -> Simplex {
        if self.is_empty() {
            return Simplex::EMPTY;
        }
        Simplex::new(vec![
            self.border_line(0),
            self.border_line(1),
            self.border_line(2),
            self.border_line(3),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_and_union() {
        let a = TileBox::new(IntPoint::new(0, 0), IntPoint::new(10, 10));
        let b = TileBox::new(IntPoint::new(5, 5), IntPoint::new(20, 20));
        let isect = a.intersection(&b);
        assert_eq!(isect.ll, IntPoint::new(5, 5));
        assert_eq!(isect.ur, IntPoint::new(10, 10));
        let un = a.union(&b);
        assert_eq!(un.ll, IntPoint::new(0, 0));
        assert_eq!(un.ur, IntPoint::new(20, 20));

        let c = TileBox::new(IntPoint::new(50, 50), IntPoint::new(60, 60));
        assert!(a.intersection(&c).is_empty());
    }

    #[test]
    fn test_dimension() {
        assert_eq!(TileBox::EMPTY.dimension(), ShapeDim::Empty);
        let p = TileBox::from_point(IntPoint::new(3, 4));
        assert_eq!(p.dimension(), ShapeDim::Point);
        let seg = TileBox::new(IntPoint::new(0, 0), IntPoint::new(10, 0));
        assert_eq!(seg.dimension(), ShapeDim::Line);
        let area = TileBox::new(IntPoint::new(0, 0), IntPoint::new(1, 1));
        assert_eq!(area.dimension(), ShapeDim::Area);
    }

    #[test]
    fn test_offset_shrink_to_empty() {
        let a = TileBox::new(IntPoint::new(0, 0), IntPoint::new(4, 4));
        assert!(a.offset(-3.0).is_empty());
        let grown = a.offset(2.0);
        assert_eq!(grown.ll, IntPoint::new(-2, -2));
        assert_eq!(grown.ur, IntPoint::new(6, 6));
    }

    #[test]
    fn test_border_lines_interior_left() {
        let a = TileBox::new(IntPoint::new(0, 0), IntPoint::new(10, 10));
        let inside = IntPoint::new(5, 5);
        for i in 0..4 {
            assert_eq!(
                a.border_line(i).side_of(inside),
                crate::point::Side::Left
            );
        }
    }
}
