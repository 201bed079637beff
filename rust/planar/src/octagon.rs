// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Convex shapes bounded by up to eight lines in 45-degree directions.
//!
//! An octagon is stored as eight scalar bounds. Orthogonal bounds constrain
//! x and y directly, diagonal bounds constrain x - y and x + y. Octagons are
//! kept normalized: every stored bound is the tightest bound implied by the
//! others, so corner formulas and dimension checks can read the fields
//! directly.

use smallvec::SmallVec;

use crate::line::Line;
use crate::point::{FloatPoint, IntPoint, IntVector};
use crate::simplex::Simplex;
use crate::tile::ShapeDim;
use crate::tile_box::TileBox;
use crate::CRIT_COORD;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Octagon {
    /// Left bound: x >= lx.
    pub lx: i32,
    /// Lower bound: y >= ly.
    pub ly: i32,
    /// Right bound: x <= rx.
    pub rx: i32,
    /// Upper bound: y <= uy.
    pub uy: i32,
    /// Upper-left diagonal bound: x - y >= ulx.
    pub ulx: i32,
    /// Lower-right diagonal bound: x - y <= lrx.
    pub lrx: i32,
    /// Lower-left diagonal bound: x + y >= llx.
    pub llx: i32,
    /// Upper-right diagonal bound: x + y <= urx.
    pub urx: i32,
}

impl Octagon {
    pub const EMPTY: Self = Self {
        lx: CRIT_COORD,
        ly: CRIT_COORD,
        rx: -CRIT_COORD,
        uy: -CRIT_COORD,
        ulx: CRIT_COORD,
        lrx: -CRIT_COORD,
        llx: CRIT_COORD,
        urx: -CRIT_COORD,
    };

    /// Builds a normalized octagon from raw bounds.
    #[allow(clippy::too_many_arguments)]
    pub fn new(lx: i32, ly: i32, rx: i32, uy: i32, ulx: i32, lrx: i32, llx: i32, urx: i32) -> Self {
        Self {
            lx,
            ly,
            rx,
            uy,
            ulx,
            lrx,
            llx,
            urx,
        }
        .normalize()
    }

    pub fn from_point(p: IntPoint) -> Self {
        Self {
            lx: p.x,
            ly: p.y,
            rx: p.x,
            uy: p.y,
            ulx: p.x - p.y,
            lrx: p.x - p.y,
            llx: p.x + p.y,
            urx: p.x + p.y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lx > self.rx || self.ly > self.uy || self.ulx > self.lrx || self.llx > self.urx
    }

    /// Tightens every bound to the strongest bound implied by the others and
    /// collapses to the canonical EMPTY when the constraints are infeasible.
    /// Bounds only ever move inward, so the fixed point is reached quickly.
    pub fn normalize(self) -> Self {
        // work in i64 so sentinel-sized bounds cannot overflow
        let clamp = |v: i64| v.clamp(i64::from(-CRIT_COORD), i64::from(CRIT_COORD)) as i32;
        let mut o = self;
        for _ in 0..3 {
            if o.is_empty() {
                return Octagon::EMPTY;
            }
            let prev = o;
            let (lx, ly, rx, uy) = (
                i64::from(o.lx),
                i64::from(o.ly),
                i64::from(o.rx),
                i64::from(o.uy),
            );
            let (ulx, lrx, llx, urx) = (
                i64::from(o.ulx),
                i64::from(o.lrx),
                i64::from(o.llx),
                i64::from(o.urx),
            );
            o.lx = clamp(lx.max(llx - uy).max(ulx + ly));
            o.rx = clamp(rx.min(urx - ly).min(lrx + uy));
            let (lx, rx) = (i64::from(o.lx), i64::from(o.rx));
            o.ly = clamp(ly.max(llx - rx).max(lx - lrx));
            o.uy = clamp(uy.min(urx - lx).min(rx - ulx));
            let (ly, uy) = (i64::from(o.ly), i64::from(o.uy));
            o.ulx = clamp(ulx.max(lx - uy).max(2 * lx - urx).max(llx - 2 * uy));
            o.lrx = clamp(lrx.min(rx - ly).min(2 * rx - llx).min(urx - 2 * ly));
            let (ulx, lrx) = (i64::from(o.ulx), i64::from(o.lrx));
            o.llx = clamp(llx.max(lx + ly).max(2 * lx - lrx).max(2 * ly + ulx));
            o.urx = clamp(urx.min(rx + uy).min(2 * rx - ulx).min(2 * uy + lrx));
            if o == prev {
                break;
            }
        }
        if o.is_empty() {
            Octagon::EMPTY
        } else {
            o
        }
    }

    pub fn dimension(&self) -> ShapeDim {
        if self.is_empty() {
            ShapeDim::Empty
        } else if self.lx == self.rx && self.ly == self.uy {
            ShapeDim::Point
        } else if self.lx == self.rx || self.ly == self.uy || self.ulx == self.lrx || self.llx == self.urx
        {
            ShapeDim::Line
        } else {
            ShapeDim::Area
        }
    }

    pub fn contains(&self, p: IntPoint) -> bool {
        let diff = i64::from(p.x) - i64::from(p.y);
        let sum = i64::from(p.x) + i64::from(p.y);
        p.x >= self.lx
            && p.x <= self.rx
            && p.y >= self.ly
            && p.y <= self.uy
            && diff >= i64::from(self.ulx)
            && diff <= i64::from(self.lrx)
            && sum >= i64::from(self.llx)
            && sum <= i64::from(self.urx)
    }

    pub fn contains_inside(&self, p: IntPoint) -> bool {
        let diff = i64::from(p.x) - i64::from(p.y);
        let sum = i64::from(p.x) + i64::from(p.y);
        p.x > self.lx
            && p.x < self.rx
            && p.y > self.ly
            && p.y < self.uy
            && diff > i64::from(self.ulx)
            && diff < i64::from(self.lrx)
            && sum > i64::from(self.llx)
            && sum < i64::from(self.urx)
    }

    pub fn intersection(&self, other: &Octagon) -> Octagon {
        if self.is_empty() || other.is_empty() {
            return Octagon::EMPTY;
        }
        Octagon::new(
            self.lx.max(other.lx),
            self.ly.max(other.ly),
            self.rx.min(other.rx),
            self.uy.min(other.uy),
            self.ulx.max(other.ulx),
            self.lrx.min(other.lrx),
            self.llx.max(other.llx),
            self.urx.min(other.urx),
        )
    }

    pub fn intersects(&self, other: &Octagon) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Smallest octagon containing both.
    pub fn union(&self, other: &Octagon) -> Octagon {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Octagon {
            lx: self.lx.min(other.lx),
            ly: self.ly.min(other.ly),
            rx: self.rx.max(other.rx),
            uy: self.uy.max(other.uy),
            ulx: self.ulx.min(other.ulx),
            lrx: self.lrx.max(other.lrx),
            llx: self.llx.min(other.llx),
            urx: self.urx.max(other.urx),
        }
    }

    /// Grows (positive) or shrinks (negative) the octagon. Diagonal bounds
    /// move by sqrt(2) times the distance so all eight edges shift by the
    /// same geometric amount.
    pub fn offset(&self, distance: f64) -> Octagon {
        if self.is_empty() {
            return Octagon::EMPTY;
        }
        let d = distance.round() as i32;
        let diag = (distance * std::f64::consts::SQRT_2).round() as i32;
        Octagon::new(
            self.lx - d,
            self.ly - d,
            self.rx + d,
            self.uy + d,
            self.ulx - diag,
            self.lrx + diag,
            self.llx - diag,
            self.urx + diag,
        )
    }

    pub fn enlarge(&self, offset: f64) -> Octagon {
        self.offset(offset)
    }

    pub fn translate_by(&self, v: IntVector) -> Octagon {
        if self.is_empty() {
            return *self;
        }
        Octagon {
            lx: self.lx + v.x,
            ly: self.ly + v.y,
            rx: self.rx + v.x,
            uy: self.uy + v.y,
            ulx: self.ulx + v.x - v.y,
            lrx: self.lrx + v.x - v.y,
            llx: self.llx + v.x + v.y,
            urx: self.urx + v.x + v.y,
        }
    }

    /// Corners in counterclockwise order starting at the right end of the
    /// lower edge. Adjacent corners coincide where an edge is degenerate.
    pub fn corner(&self, no: usize) -> IntPoint {
        match no & 7 {
            0 => IntPoint::new(self.lrx + self.ly, self.ly),
            1 => IntPoint::new(self.rx, self.rx - self.lrx),
            2 => IntPoint::new(self.rx, self.urx - self.rx),
            3 => IntPoint::new(self.urx - self.uy, self.uy),
            4 => IntPoint::new(self.ulx + self.uy, self.uy),
            5 => IntPoint::new(self.lx, self.lx - self.ulx),
            6 => IntPoint::new(self.lx, self.llx - self.lx),
            _ => IntPoint::new(self.llx - self.ly, self.ly),
        }
    }

    /// Border lines in counterclockwise order with the interior on their
    /// left. Line `i` carries the edge ending at `corner(i)`.
    pub fn border_line(&self, no: usize) -> Line {
        match no & 7 {
            // lower edge
            0 => Line::new(IntPoint::new(0, self.ly), IntPoint::new(1, self.ly)),
            // lower right diagonal
            1 => Line::new(IntPoint::new(self.lrx, 0), IntPoint::new(self.lrx + 1, 1)),
            // right edge
            2 => Line::new(IntPoint::new(self.rx, 0), IntPoint::new(self.rx, 1)),
            // upper right diagonal
            3 => Line::new(IntPoint::new(self.urx, 0), IntPoint::new(self.urx - 1, 1)),
            // upper edge
            4 => Line::new(IntPoint::new(0, self.uy), IntPoint::new(-1, self.uy)),
            // upper left diagonal
            5 => Line::new(IntPoint::new(self.ulx, 0), IntPoint::new(self.ulx - 1, -1)),
            // left edge
            6 => Line::new(IntPoint::new(self.lx, 0), IntPoint::new(self.lx, -1)),
            // lower left diagonal
            _ => Line::new(IntPoint::new(self.llx, 0), IntPoint::new(self.llx + 1, -1)),
        }
    }

    pub fn bounding_box(&self) -> TileBox {
        if self.is_empty() {
            return TileBox::EMPTY;
        }
        TileBox::new(
            IntPoint::new(self.lx, self.ly),
            IntPoint::new(self.rx, self.uy),
        )
    }

    pub fn to_simplex(&self) -> Simplex {
        if self.is_empty() {
            return Simplex::EMPTY;
        }
        Simplex::new((0..8).map(|i| self.border_line(i)).collect())
    }

    /// Projections of `from` onto the octagon border, nearest first. Used to
    /// find candidate locations just outside an enlarged obstacle octagon.
    pub fn nearest_border_projections(&self, from: IntPoint, count: usize) -> Vec<IntPoint> {
        if self.is_empty() || count == 0 {
            return Vec::new();
        }
        let from_f = from.to_float();
        let mut candidates: SmallVec<[(f64, IntPoint); 8]> = SmallVec::new();
        for no in 0..8 {
            let start = self.corner(if no == 0 { 7 } else { no - 1 });
            let end = self.corner(no);
            let projection = clamped_projection(from_f, start, end);
            let rounded = projection.round();
            let dist = from_f.distance_square(projection);
            if !candidates.iter().any(|(_, p)| *p == rounded) {
                candidates.push((dist, rounded));
            }
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        candidates.truncate(count);
        candidates.into_iter().map(|(_, p)| p).collect()
    }
}

/// Projection of `p` onto the segment from `a` to `b`, clamped to the
/// segment. Falls back to `a` when the segment is degenerate.
fn clamped_projection(p: FloatPoint, a: IntPoint, b: IntPoint) -> FloatPoint {
    let af = a.to_float();
    let bf = b.to_float();
    let dx = bf.x - af.x;
    let dy = bf.y - af.y;
    let len_square = dx * dx + dy * dy;
    if len_square <= 0.0 {
        return af;
    }
    let t = ((p.x - af.x) * dx + (p.y - af.y) * dy) / len_square;
    let t = t.clamp(0.0, 1.0);
    FloatPoint::new(af.x + t * dx, af.y + t * dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Side;

    fn square(half: i32) -> Octagon {
        Octagon::new(
            -half,
            -half,
            half,
            half,
            -2 * half,
            2 * half,
            -2 * half,
            2 * half,
        )
    }

    #[test]
    fn test_normalize_tightens_diagonals() {
        // loose diagonal bounds collapse onto the square
        let o = square(10);
        assert_eq!(o.ulx, -20);
        assert_eq!(o.lrx, 20);
        // a diagonal bound can tighten the box
        let o = Octagon::new(0, 0, 100, 100, -CRIT_COORD, 50, -CRIT_COORD, CRIT_COORD);
        assert_eq!(o.rx, 100);
        assert!(o.contains(IntPoint::new(100, 50)));
        assert!(!o.contains(IntPoint::new(100, 40)));
    }

    #[test]
    fn test_normalize_empty() {
        let o = Octagon::new(10, 0, 0, 10, -100, 100, -100, 100);
        assert!(o.is_empty());
        assert_eq!(o, Octagon::EMPTY);
        // feasible box but contradictory diagonal
        let o = Octagon::new(0, 0, 10, 10, 50, 100, -100, 100);
        assert!(o.is_empty());
    }

    #[test]
    fn test_corners_on_border() {
        let o = Octagon::new(-10, -10, 10, 10, -15, 15, -15, 15);
        for i in 0..8 {
            let c = o.corner(i);
            assert!(o.contains(c), "corner {i} = {c:?} outside");
            assert!(!o.contains_inside(c));
        }
    }

    #[test]
    fn test_border_lines_interior_left() {
        let o = Octagon::new(-10, -10, 10, 10, -15, 15, -15, 15);
        for i in 0..8 {
            assert_eq!(o.border_line(i).side_of(IntPoint::ZERO), Side::Left);
        }
    }

    #[test]
    fn test_intersection() {
        let a = square(10);
        let b = a.translate_by(IntVector::new(15, 0));
        let isect = a.intersection(&b);
        assert!(!isect.is_empty());
        assert_eq!(isect.lx, 5);
        assert_eq!(isect.rx, 10);
        let c = a.translate_by(IntVector::new(100, 0));
        assert!(a.intersection(&c).is_empty());
    }

    #[test]
    fn test_offset_roundtrip_grows() {
        let a = square(10);
        let grown = a.offset(5.0);
        assert!(grown.contains(IntPoint::new(15, 0)));
        assert!(!grown.contains(IntPoint::new(16, 0)));
        let shrunk = a.offset(-20.0);
        assert!(shrunk.is_empty());
    }

    #[test]
    fn test_nearest_border_projections() {
        let o = square(10);
        let projections = o.nearest_border_projections(IntPoint::new(8, 0), 4);
        assert!(!projections.is_empty());
        // nearest candidate is the right edge projection
        assert_eq!(projections[0], IntPoint::new(10, 0));
    }
}
