// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Directed infinite lines through two exact integer points.

use num_bigint::BigInt;

use crate::direction::Direction;
use crate::point::{FloatPoint, IntPoint, IntVector, RationalPoint, Side};

/// A directed infinite line through two distinct integer points.
///
/// The interior of a tile lies on the LEFT of each of its border lines.
/// Side-of is the fundamental predicate and is always an exact determinant
/// sign, never a float comparison with tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Line {
    pub a: IntPoint,
    pub b: IntPoint,
}

impl Line {
    pub fn new(a: IntPoint, b: IntPoint) -> Self {
        debug_assert!(a != b, "a directed line needs two distinct points");
        Self { a, b }
    }

    /// Line through `p` with the given direction.
    pub fn with_direction(p: IntPoint, dir: Direction) -> Self {
        let b = IntPoint::new(
            p.x.wrapping_add(dir.dx() as i32),
            p.y.wrapping_add(dir.dy() as i32),
        );
        Self { a: p, b }
    }

    pub fn direction(&self) -> Direction {
        // a != b is a construction invariant
        Direction::between(self.a, self.b).unwrap_or(Direction::RIGHT)
    }

    pub fn opposite(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }

    /// Exact side of `p` relative to this directed line.
    pub fn side_of(&self, p: IntPoint) -> Side {
        p.side_of(self.a, self.b)
    }

    /// Approximate side of a float point; for the float-only paths.
    pub fn side_of_approx(&self, p: FloatPoint) -> Side {
        p.side_of_approx(self.a.to_float(), self.b.to_float())
    }

    pub fn is_parallel(&self, other: &Line) -> bool {
        self.direction().determinant(other.direction()) == 0
    }

    /// True when the two lines describe the same point set with the same
    /// orientation.
    pub fn overlaps(&self, other: &Line) -> bool {
        self.direction() == other.direction() && self.side_of(other.a) == Side::Collinear
    }

    /// True when the two lines describe the same point set, regardless of
    /// orientation.
    pub fn is_collinear(&self, other: &Line) -> bool {
        self.is_parallel(other) && self.side_of(other.a) == Side::Collinear
    }

    /// Exact intersection with `other` as a rational projective point.
    /// The result is NaN when the lines are parallel; callers must check.
    pub fn intersection(&self, other: &Line) -> RationalPoint {
        // each line as a*x + b*y = c with 64-bit-safe coefficients
        let (a1, b1, c1) = self.coefficients();
        let (a2, b2, c2) = other.coefficients();
        let det = a1 * b2 - a2 * b1;
        if det == 0 {
            return RationalPoint::nan();
        }
        let x = BigInt::from(c1) * BigInt::from(b2) - BigInt::from(c2) * BigInt::from(b1);
        let y = BigInt::from(a1) * BigInt::from(c2) - BigInt::from(a2) * BigInt::from(c1);
        let z = BigInt::from(det);
        if det < 0 {
            RationalPoint::new(-x, -y, -z)
        } else {
            RationalPoint::new(x, y, z)
        }
    }

    /// Approximate intersection; NaN coordinates when parallel.
    pub fn intersection_approx(&self, other: &Line) -> FloatPoint {
        let (a1, b1, c1) = self.coefficients();
        let (a2, b2, c2) = other.coefficients();
        let det = (a1 * b2 - a2 * b1) as f64;
        if det == 0.0 {
            return FloatPoint::new(f64::NAN, f64::NAN);
        }
        let x = (c1 as f64) * (b2 as f64) - (c2 as f64) * (b1 as f64);
        let y = (a1 as f64) * (c2 as f64) - (a2 as f64) * (c1 as f64);
        FloatPoint::new(x / det, y / det)
    }

    /// Exact side of the intersection of `first` and `second` relative to
    /// this line. Collinear when `first` and `second` are parallel.
    pub fn side_of_intersection(&self, first: &Line, second: &Line) -> Side {
        let corner = first.intersection(second);
        if corner.is_nan() {
            return Side::Collinear;
        }
        corner.side_of(self.a, self.b)
    }

    /// Translates the line perpendicularly: positive `amount` moves it
    /// towards its left side. Both endpoints are moved by the same rounded
    /// integer vector, so the direction is preserved exactly.
    pub fn translate(&self, amount: f64) -> Line {
        if amount == 0.0 {
            return *self;
        }
        let delta = self.direction().left_normal_vector(amount);
        self.translate_by(delta)
    }

    pub fn translate_by(&self, v: IntVector) -> Line {
        Line {
            a: self.a.translate_by(v),
            b: self.b.translate_by(v),
        }
    }

    /// Signed perpendicular distance of `p` from this line; positive on the
    /// left side. Approximate.
    pub fn distance_signed(&self, p: FloatPoint) -> f64 {
        let a = self.a.to_float();
        let b = self.b.to_float();
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len = (dx * dx + dy * dy).sqrt();
        (dx * (p.y - a.y) - dy * (p.x - a.x)) / len
    }

    /// Direction from `p` perpendicularly towards this line, or `None` when
    /// `p` lies on the line.
    pub fn perpendicular_direction(&self, p: IntPoint) -> Option<Direction> {
        let dir = self.direction();
        match self.side_of(p) {
            Side::Collinear => None,
            // point on the interior side: towards the line is the right normal
            Side::Left => Direction::try_new(dir.dy(), -dir.dx()),
            Side::Right => Direction::try_new(-dir.dy(), dir.dx()),
        }
    }

    pub fn is_orthogonal(&self) -> bool {
        self.direction().is_orthogonal()
    }

    pub fn is_multiple_of_45_degree(&self) -> bool {
        self.direction().is_multiple_of_45_degree()
    }

    /// Coefficients (a, b, c) of this line as `a*x + b*y = c`, computed in
    /// 128-bit arithmetic so 32-bit coordinates can never overflow.
    fn coefficients(&self) -> (i128, i128, i128) {
        let x1 = i128::from(self.a.x);
        let y1 = i128::from(self.a.y);
        let x2 = i128::from(self.b.x);
        let y2 = i128::from(self.b.y);
        let a = y2 - y1;
        let b = x1 - x2;
        let c = a * x1 + b * y1;
        (a, b, c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ax: i32, ay: i32, bx: i32, by: i32) -> Line {
        Line::new(IntPoint::new(ax, ay), IntPoint::new(bx, by))
    }

    #[test]
    fn test_intersection_exact() {
        let h = line(0, 5, 10, 5);
        let v = line(3, 0, 3, 10);
        let p = h.intersection(&v);
        assert!(!p.is_nan());
        assert_eq!(p.round(), IntPoint::new(3, 5));
    }

    #[test]
    fn test_intersection_parallel_is_nan() {
        let l1 = line(0, 0, 10, 0);
        let l2 = line(0, 5, 10, 5);
        assert!(l1.intersection(&l2).is_nan());
        assert!(l1.intersection_approx(&l2).is_nan());
    }

    #[test]
    fn test_intersection_rational() {
        // y = x and y = -x + 1 meet at (1/2, 1/2)
        let l1 = line(0, 0, 2, 2);
        let l2 = line(0, 1, 2, -1);
        let p = l1.intersection(&l2);
        assert!(!p.is_nan());
        let f = p.to_float();
        approx::assert_abs_diff_eq!(f.x, 0.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(f.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_translate_preserves_direction() {
        let l = line(0, 0, 100, 0);
        let t = l.translate(5.0);
        assert_eq!(t.direction(), l.direction());
        // left of +x is +y
        assert_eq!(t.a, IntPoint::new(0, 5));
        let t2 = l.translate(-5.0);
        assert_eq!(t2.a, IntPoint::new(0, -5));
    }

    #[test]
    fn test_side_of_intersection() {
        let base = line(0, 0, 10, 0);
        let l1 = line(0, 5, 10, 5);
        let l2 = line(3, 0, 3, 10);
        // l1 and l2 meet at (3, 5), left of base
        assert_eq!(base.side_of_intersection(&l1, &l2), Side::Left);
    }

    #[test]
    fn test_perpendicular_direction() {
        let l = line(0, 0, 10, 0);
        // point above (left of) the line looks down towards it
        let down = l.perpendicular_direction(IntPoint::new(5, 3)).unwrap();
        assert_eq!(down, Direction::try_new(0, -1).unwrap());
        let up = l.perpendicular_direction(IntPoint::new(5, -3)).unwrap();
        assert_eq!(up, Direction::try_new(0, 1).unwrap());
        assert!(l.perpendicular_direction(IntPoint::new(5, 0)).is_none());
    }

    #[test]
    fn test_overlaps() {
        let l1 = line(0, 0, 10, 0);
        let l2 = line(5, 0, 7, 0);
        let l3 = line(7, 0, 5, 0);
        assert!(l1.overlaps(&l2));
        assert!(!l1.overlaps(&l3)); // opposite orientation
    }
}
