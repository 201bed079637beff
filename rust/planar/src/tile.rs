// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The closed family of convex tile shapes.
//!
//! Every tile is an intersection of half-planes; the three variants only
//! differ in how much structure the border directions carry. Boxes and
//! octagons answer queries with plain coordinate comparisons, the general
//! simplex falls back to exact line algebra. Operations pick the cheapest
//! representation that can hold their result.

use crate::line::Line;
use crate::octagon::Octagon;
use crate::point::{FloatPoint, IntPoint, IntVector};
use crate::simplex::Simplex;
use crate::tile_box::TileBox;

/// Dimension of a (possibly degenerate) convex shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShapeDim {
    Empty,
    Point,
    Line,
    Area,
}

impl ShapeDim {
    pub fn is_empty(self) -> bool {
        self == ShapeDim::Empty
    }

    pub fn is_area(self) -> bool {
        self == ShapeDim::Area
    }
}

/// A convex tile in one of three representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tile {
    Box(TileBox),
    Octagon(Octagon),
    Simplex(Simplex),
}

impl From<TileBox> for Tile {
    fn from(b: TileBox) -> Self {
        Tile::Box(b)
    }
}

impl From<Octagon> for Tile {
    fn from(o: Octagon) -> Self {
        Tile::Octagon(o)
    }
}

impl From<Simplex> for Tile {
    fn from(s: Simplex) -> Self {
        Tile::Simplex(s)
    }
}

impl Tile {
    /// Builds a tile bounded by the given lines, in the cheapest
    /// representation that fits.
    pub fn from_border_lines(lines: &[Line]) -> Tile {
        Tile::Simplex(Simplex::new(lines.to_vec())).simplify()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Tile::Box(b) => b.is_empty(),
            Tile::Octagon(o) => o.is_empty(),
            Tile::Simplex(s) => s.is_empty(),
        }
    }

    pub fn dimension(&self) -> ShapeDim {
        match self {
            Tile::Box(b) => b.dimension(),
            Tile::Octagon(o) => o.dimension(),
            Tile::Simplex(s) => s.dimension(),
        }
    }

    pub fn contains(&self, p: IntPoint) -> bool {
        match self {
            Tile::Box(b) => b.contains(p),
            Tile::Octagon(o) => o.contains(p),
            Tile::Simplex(s) => s.contains(p),
        }
    }

    pub fn contains_inside(&self, p: IntPoint) -> bool {
        match self {
            Tile::Box(b) => b.contains_inside(p),
            Tile::Octagon(o) => o.contains_inside(p),
            Tile::Simplex(s) => s.contains_inside(p),
        }
    }

    pub fn border_line_count(&self) -> usize {
        match self {
            Tile::Box(b) => {
                if b.is_empty() {
                    0
                } else {
                    4
                }
            }
            Tile::Octagon(o) => {
                if o.is_empty() {
                    0
                } else {
                    8
                }
            }
            Tile::Simplex(s) => s.border_line_count(),
        }
    }

    pub fn border_line(&self, no: usize) -> Line {
        match self {
            Tile::Box(b) => b.border_line(no),
            Tile::Octagon(o) => o.border_line(no),
            Tile::Simplex(s) => s.border_line(no),
        }
    }

    pub fn corner(&self, no: usize) -> IntPoint {
        match self {
            Tile::Box(b) => b.corner(no),
            Tile::Octagon(o) => o.corner(no),
            Tile::Simplex(s) => s.corner(no),
        }
    }

    pub fn corners_approx(&self) -> Vec<FloatPoint> {
        match self {
            Tile::Box(b) => (0..4).map(|no| b.corner(no).to_float()).collect(),
            Tile::Octagon(o) => (0..8).map(|no| o.corner(no).to_float()).collect(),
            Tile::Simplex(s) => s.corners_approx(),
        }
    }

    pub fn bounding_box(&self) -> TileBox {
        match self {
            Tile::Box(b) => *b,
            Tile::Octagon(o) => o.bounding_box(),
            Tile::Simplex(s) => s.bounding_box(),
        }
    }

    pub fn bounding_octagon(&self) -> Octagon {
        match self {
            Tile::Box(b) => b.to_octagon(),
            Tile::Octagon(o) => *o,
            Tile::Simplex(s) => s.bounding_octagon(),
        }
    }

    pub fn to_simplex(&self) -> Simplex {
        match self {
            Tile::Box(b) => b.to_simplex(),
            Tile::Octagon(o) => o.to_simplex(),
            Tile::Simplex(s) => s.clone(),
        }
    }

    pub fn is_box(&self) -> bool {
        match self {
            Tile::Box(_) => true,
            Tile::Octagon(o) => o.bounding_box().to_octagon() == *o,
            Tile::Simplex(s) => s.is_box(),
        }
    }

    pub fn is_octagon(&self) -> bool {
        match self {
            Tile::Box(_) | Tile::Octagon(_) => true,
            Tile::Simplex(s) => s.is_octagon(),
        }
    }

    /// Downgrades to the cheapest representation that holds the same shape.
    pub fn simplify(self) -> Tile {
        match self {
            Tile::Simplex(ref s) => {
                if s.is_empty() {
                    Tile::Box(TileBox::EMPTY)
                } else if s.is_box() {
                    Tile::Box(s.bounding_box())
                } else if let Some(oct) = s.to_octagon() {
                    Tile::Octagon(oct)
                } else {
                    self
                }
            }
            Tile::Octagon(o) => {
                if o.bounding_box().to_octagon() == o {
                    Tile::Box(o.bounding_box())
                } else {
                    Tile::Octagon(o)
                }
            }
            other => other,
        }
    }

    /// Intersection, staying in the cheapest representation that is closed
    /// under the pair of operands.
    pub fn intersection(&self, other: &Tile) -> Tile {
        match (self, other) {
            (Tile::Box(a), Tile::Box(b)) => Tile::Box(a.intersection(b)),
            (Tile::Box(a), Tile::Octagon(b)) => Tile::Octagon(a.to_octagon().intersection(b)),
            (Tile::Octagon(a), Tile::Box(b)) => Tile::Octagon(a.intersection(&b.to_octagon())),
            (Tile::Octagon(a), Tile::Octagon(b)) => Tile::Octagon(a.intersection(b)),
            _ => Tile::Simplex(self.to_simplex().intersection(&other.to_simplex())),
        }
    }

    pub fn intersects(&self, other: &Tile) -> bool {
        !self.intersection(other).is_empty()
    }

    pub fn translate_by(&self, v: IntVector) -> Tile {
        match self {
            Tile::Box(b) => Tile::Box(b.translate_by(v)),
            Tile::Octagon(o) => Tile::Octagon(o.translate_by(v)),
            Tile::Simplex(s) => Tile::Simplex(s.translate_by(v)),
        }
    }

    pub fn offset(&self, distance: f64) -> Tile {
        match self {
            Tile::Box(b) => Tile::Box(b.offset(distance)),
            Tile::Octagon(o) => Tile::Octagon(o.offset(distance)),
            Tile::Simplex(s) => Tile::Simplex(s.offset(distance)),
        }
    }

    pub fn enlarge(&self, offset: f64) -> Tile {
        match self {
            Tile::Box(b) => Tile::Box(b.enlarge(offset)),
            Tile::Octagon(o) => Tile::Octagon(o.enlarge(offset)),
            Tile::Simplex(s) => Tile::Simplex(s.enlarge(offset)),
        }
    }

    /// Subtracts the convex `hole` from this tile; the remainder is returned
    /// as disjoint convex pieces in their cheapest representation.
    pub fn cutout(&self, hole: &Tile) -> Vec<Tile> {
        hole.to_simplex()
            .cutout_from(&self.to_simplex())
            .into_iter()
            .map(|piece| Tile::Simplex(piece).simplify())
            .collect()
    }

    /// Displacements that move `other` just outside this tile, one candidate
    /// per violated border line, shortest first. Used to find new via
    /// centers when an obstacle shape is not octagon shaped.
    pub fn nearest_relative_outside_locations(
        &self,
        other: &Tile,
        count: usize,
    ) -> Vec<FloatPoint> {
        if self.is_empty() || other.is_empty() || count == 0 {
            return Vec::new();
        }
        let corners = other.corners_approx();
        let mut candidates: Vec<(f64, FloatPoint)> = Vec::new();
        for no in 0..self.border_line_count() {
            let line = self.border_line(no);
            let mut needed = f64::MIN;
            for c in &corners {
                needed = needed.max(line.distance_signed(*c));
            }
            if needed <= 0.0 || !needed.is_finite() {
                continue;
            }
            let (nx, ny) = line.direction().left_normal_approx();
            candidates.push((needed, FloatPoint::new(-nx * needed, -ny * needed)));
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        candidates.truncate(count);
        candidates.into_iter().map(|(_, delta)| delta).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify_picks_cheapest() {
        let b = TileBox::new(IntPoint::new(0, 0), IntPoint::new(10, 10));
        let simplified = Tile::Simplex(b.to_simplex()).simplify();
        assert_eq!(simplified, Tile::Box(b));

        let oct = Octagon::new(-10, -10, 10, 10, -15, 15, -15, 15);
        let simplified = Tile::Simplex(oct.to_simplex()).simplify();
        assert_eq!(simplified, Tile::Octagon(oct));
    }

    #[test]
    fn test_mixed_intersection() {
        let b = Tile::Box(TileBox::new(IntPoint::new(0, 0), IntPoint::new(10, 10)));
        let o = Tile::Octagon(Octagon::new(5, 5, 30, 30, -100, 100, -100, 100));
        let isect = b.intersection(&o);
        assert!(matches!(isect, Tile::Octagon(_)));
        assert!(isect.contains(IntPoint::new(7, 7)));
        assert!(!isect.contains(IntPoint::new(4, 7)));
    }

    #[test]
    fn test_nearest_relative_outside_locations() {
        let obstacle = Tile::Box(TileBox::new(IntPoint::new(0, 0), IntPoint::new(100, 100)));
        let via = Tile::Box(TileBox::new(IntPoint::new(80, 40), IntPoint::new(100, 60)));
        let deltas = obstacle.nearest_relative_outside_locations(&via, 4);
        assert!(!deltas.is_empty());
        // cheapest push is through the right border
        let first = deltas[0];
        assert!(first.x > 0.0 && first.x <= 21.0);
        approx::assert_abs_diff_eq!(first.y, 0.0, epsilon = 1e-9);
    }
}
