// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exact and approximate points of the routing plane.
//!
//! Topological predicates (side-of, collinearity) are always decided on the
//! exact types by determinant sign. `FloatPoint` is the explicitly-approximate
//! type; distance and projection queries live there and only there, so exact
//! and approximate code paths cannot be confused.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::line::Line;

/// Which side of a directed line a point lies on.
///
/// `Left` is the interior side of tile border lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Collinear,
}

impl Side {
    /// Classifies a determinant sign.
    pub fn from_det(det: i64) -> Self {
        if det > 0 {
            Self::Left
        } else if det < 0 {
            Self::Right
        } else {
            Self::Collinear
        }
    }

    pub fn from_det_big(det: &BigInt) -> Self {
        if det.is_positive() {
            Self::Left
        } else if det.is_negative() {
            Self::Right
        } else {
            Self::Collinear
        }
    }

    /// Classifies a float determinant; only for the approximate paths.
    pub fn from_det_approx(det: f64) -> Self {
        if det > 0.0 {
            Self::Left
        } else if det < 0.0 {
            Self::Right
        } else {
            Self::Collinear
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Collinear => Self::Collinear,
        }
    }
}

/// Exact point with integer coordinates. Immutable value type, exact equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

impl IntPoint {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Side of this point relative to the directed line from `a` to `b`.
    ///
    /// Computed as the sign of a 2x2 determinant in 64-bit arithmetic, which
    /// cannot overflow for 32-bit coordinates. No epsilon is involved.
    pub fn side_of(&self, a: IntPoint, b: IntPoint) -> Side {
        let d1x = i64::from(b.x) - i64::from(a.x);
        let d1y = i64::from(b.y) - i64::from(a.y);
        let d2x = i64::from(self.x) - i64::from(a.x);
        let d2y = i64::from(self.y) - i64::from(a.y);
        Side::from_det(d1x * d2y - d1y * d2x)
    }

    pub fn translate_by(&self, v: IntVector) -> Self {
        Self::new(self.x.wrapping_add(v.x), self.y.wrapping_add(v.y))
    }

    pub fn difference_by(&self, other: IntPoint) -> IntVector {
        IntVector::new(self.x - other.x, self.y - other.y)
    }

    /// Squared euclidean distance, exact in 64-bit arithmetic.
    pub fn distance_square(&self, other: IntPoint) -> f64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        (dx * dx + dy * dy) as f64
    }

    pub fn to_float(self) -> FloatPoint {
        FloatPoint::new(f64::from(self.x), f64::from(self.y))
    }
}

/// Exact translation vector with integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntVector {
    pub x: i32,
    pub y: i32,
}

impl IntVector {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn opposite(self) -> Self {
        Self::new(-self.x, -self.y)
    }

    pub fn length_approx(self) -> f64 {
        let dx = f64::from(self.x);
        let dy = f64::from(self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Approximate point. All distance, projection and rounding helpers live
/// here; none of them may be used for topological decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatPoint {
    pub x: f64,
    pub y: f64,
}

impl FloatPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }

    pub fn distance(&self, other: FloatPoint) -> f64 {
        self.distance_square(other).sqrt()
    }

    pub fn distance_square(&self, other: FloatPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Rounds to the nearest integer point.
    pub fn round(&self) -> IntPoint {
        IntPoint::new(self.x.round() as i32, self.y.round() as i32)
    }

    /// Projects this point perpendicularly onto `line` (approximate).
    pub fn projection_approx(&self, line: &Line) -> FloatPoint {
        let a = line.a.to_float();
        let b = line.b.to_float();
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_square = dx * dx + dy * dy;
        if len_square == 0.0 {
            return a;
        }
        let t = ((self.x - a.x) * dx + (self.y - a.y) * dy) / len_square;
        FloatPoint::new(a.x + t * dx, a.y + t * dy)
    }

    /// Scalar product (to - self) * (other - self).
    pub fn scalar_product(&self, to: FloatPoint, other: FloatPoint) -> f64 {
        (to.x - self.x) * (other.x - self.x) + (to.y - self.y) * (other.y - self.y)
    }

    /// Returns the point at distance `length` from `self` in the direction
    /// of `towards`.
    pub fn change_length(&self, towards: FloatPoint, length: f64) -> FloatPoint {
        let dist = self.distance(towards);
        if dist == 0.0 {
            return *self;
        }
        let f = length / dist;
        FloatPoint::new(
            self.x + (towards.x - self.x) * f,
            self.y + (towards.y - self.y) * f,
        )
    }

    /// Side of this point relative to the directed line from `a` to `b`,
    /// decided by float determinant. Approximate variant; never used for
    /// exact topology.
    pub fn side_of_approx(&self, a: FloatPoint, b: FloatPoint) -> Side {
        let det = (b.x - a.x) * (self.y - a.y) - (b.y - a.y) * (self.x - a.x);
        Side::from_det_approx(det)
    }
}

/// Exact point of the projective plane with arbitrary-precision integer
/// coordinates (x, y, z), representing the affine rational point (x/z, y/z).
///
/// The intersection of two non-parallel integer lines is such a point. A
/// denominator z <= 0 encodes the NaN state (z == 0 for a parallel-line
/// "intersection"); callers must check `is_nan()` before use.
#[derive(Debug, Clone)]
pub struct RationalPoint {
    x: BigInt,
    y: BigInt,
    z: BigInt,
}

impl RationalPoint {
    pub fn new(x: BigInt, y: BigInt, z: BigInt) -> Self {
        Self { x, y, z }
    }

    /// The canonical NaN point.
    pub fn nan() -> Self {
        Self {
            x: BigInt::zero(),
            y: BigInt::zero(),
            z: BigInt::zero(),
        }
    }

    pub fn is_nan(&self) -> bool {
        !self.z.is_positive()
    }

    pub fn to_float(&self) -> FloatPoint {
        if self.is_nan() {
            return FloatPoint::new(f64::NAN, f64::NAN);
        }
        let xd = self.x.to_f64().unwrap_or(f64::MAX);
        let yd = self.y.to_f64().unwrap_or(f64::MAX);
        let zd = self.z.to_f64().unwrap_or(f64::MAX);
        FloatPoint::new(xd / zd, yd / zd)
    }

    pub fn round(&self) -> IntPoint {
        self.to_float().round()
    }

    /// True when the rational coordinates reduce to integers in 32-bit range.
    pub fn is_integer(&self) -> bool {
        if self.is_nan() {
            return false;
        }
        (&self.x % &self.z).is_zero() && (&self.y % &self.z).is_zero()
    }

    /// Exact side of this point relative to the directed line from `a` to
    /// `b`, by BigInt determinant sign.
    pub fn side_of(&self, a: IntPoint, b: IntPoint) -> Side {
        // (self/z - a) x (b - a), scaled by the positive z
        let dx = BigInt::from(i64::from(b.x) - i64::from(a.x));
        let dy = BigInt::from(i64::from(b.y) - i64::from(a.y));
        let px = &self.x - BigInt::from(a.x) * &self.z;
        let py = &self.y - BigInt::from(a.y) * &self.z;
        let det = dx * py - dy * px;
        Side::from_det_big(&det)
    }

    fn eq_rational(&self, other: &RationalPoint) -> bool {
        let det_x = &self.x * &other.z - &other.x * &self.z;
        if !det_x.is_zero() {
            return false;
        }
        let det_y = &self.y * &other.z - &other.y * &self.z;
        det_y.is_zero()
    }

    fn eq_int(&self, other: IntPoint) -> bool {
        if self.is_nan() {
            return false;
        }
        if &self.x != &(BigInt::from(other.x) * &self.z) {
            return false;
        }
        self.y == BigInt::from(other.y) * &self.z
    }
}

impl PartialEq for RationalPoint {
    fn eq(&self, other: &Self) -> bool {
        if self.is_nan() || other.is_nan() {
            return false;
        }
        self.eq_rational(other)
    }
}

/// A corner of a polyline or tile: either an exact integer point or the
/// exact rational intersection of two integer lines.
#[derive(Debug, Clone)]
pub enum Point {
    Int(IntPoint),
    Rational(RationalPoint),
}

impl Point {
    pub fn is_rational(&self) -> bool {
        matches!(self, Self::Rational(_))
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Self::Int(_) => false,
            Self::Rational(r) => r.is_nan(),
        }
    }

    pub fn to_float(&self) -> FloatPoint {
        match self {
            Self::Int(p) => p.to_float(),
            Self::Rational(r) => r.to_float(),
        }
    }

    pub fn round(&self) -> IntPoint {
        match self {
            Self::Int(p) => *p,
            Self::Rational(r) => r.round(),
        }
    }

    /// Exact side-of predicate, dispatching on the representation.
    pub fn side_of(&self, a: IntPoint, b: IntPoint) -> Side {
        match self {
            Self::Int(p) => p.side_of(a, b),
            Self::Rational(r) => r.side_of(a, b),
        }
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Rational(a), Self::Rational(b)) => a == b,
            (Self::Int(a), Self::Rational(b)) | (Self::Rational(b), Self::Int(a)) => b.eq_int(*a),
        }
    }
}

impl From<IntPoint> for Point {
    fn from(p: IntPoint) -> Self {
        Self::Int(p)
    }
}

impl From<RationalPoint> for Point {
    fn from(p: RationalPoint) -> Self {
        Self::Rational(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_of_exact() {
        let a = IntPoint::new(0, 0);
        let b = IntPoint::new(10, 0);
        assert_eq!(IntPoint::new(5, 1).side_of(a, b), Side::Left);
        assert_eq!(IntPoint::new(5, -1).side_of(a, b), Side::Right);
        assert_eq!(IntPoint::new(20, 0).side_of(a, b), Side::Collinear);
    }

    #[test]
    fn test_side_of_no_overflow() {
        // Coordinates near the 32-bit range must not overflow the predicate
        let a = IntPoint::new(-2_000_000_000, -2_000_000_000);
        let b = IntPoint::new(2_000_000_000, 2_000_000_000);
        assert_eq!(IntPoint::new(0, 1).side_of(a, b), Side::Left);
        assert_eq!(IntPoint::new(0, -1).side_of(a, b), Side::Right);
        assert_eq!(IntPoint::new(1, 1).side_of(a, b), Side::Collinear);
    }

    #[test]
    fn test_rational_nan_is_explicit() {
        let nan = RationalPoint::nan();
        assert!(nan.is_nan());
        assert!(nan.to_float().is_nan());
        // NaN never compares equal, not even to itself
        assert_ne!(nan, RationalPoint::nan());
    }

    #[test]
    fn test_rational_equality_cross_scale() {
        // (2/4, 6/4) == (1/2, 3/2)
        let a = RationalPoint::new(BigInt::from(2), BigInt::from(6), BigInt::from(4));
        let b = RationalPoint::new(BigInt::from(1), BigInt::from(3), BigInt::from(2));
        assert_eq!(a, b);
    }

    #[test]
    fn test_point_cross_representation_equality() {
        let int_pt = Point::from(IntPoint::new(3, -7));
        let rat_pt = Point::from(RationalPoint::new(
            BigInt::from(6),
            BigInt::from(-14),
            BigInt::from(2),
        ));
        assert_eq!(int_pt, rat_pt);
        assert_eq!(rat_pt, int_pt);
    }

    #[test]
    fn test_change_length() {
        let from = FloatPoint::new(0.0, 0.0);
        let to = FloatPoint::new(10.0, 0.0);
        let p = from.change_length(to, 4.0);
        approx::assert_abs_diff_eq!(p.x, 4.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-12);
    }
}
