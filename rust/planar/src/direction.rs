// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalized orientations with exact angular comparison.

use std::cmp::Ordering;

use crate::point::{IntPoint, IntVector, Side};

/// A normalized orientation of the plane, stored as a direction vector
/// reduced by its gcd. Not a literal vector: only the orientation matters.
///
/// Angular order over [0, 2pi) is decided exactly by determinant sign, which
/// drives the sorting of tile border lines. Rotation by multiples of 45
/// degrees is exact integer arithmetic, never floating trigonometry, so the
/// orthogonal / 45-degree classification stays exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Direction {
    dx: i64,
    dy: i64,
}

impl Direction {
    pub const RIGHT: Self = Self { dx: 1, dy: 0 };
    pub const UP: Self = Self { dx: 0, dy: 1 };

    /// Creates a direction from a non-zero delta, reduced by the gcd.
    /// Returns `None` for the zero delta.
    pub fn try_new(dx: i64, dy: i64) -> Option<Self> {
        if dx == 0 && dy == 0 {
            return None;
        }
        let g = gcd(dx.unsigned_abs(), dy.unsigned_abs()) as i64;
        Some(Self {
            dx: dx / g,
            dy: dy / g,
        })
    }

    /// Direction from `from` towards `to`. `None` when the points coincide.
    pub fn between(from: IntPoint, to: IntPoint) -> Option<Self> {
        Self::try_new(
            i64::from(to.x) - i64::from(from.x),
            i64::from(to.y) - i64::from(from.y),
        )
    }

    pub fn dx(&self) -> i64 {
        self.dx
    }

    pub fn dy(&self) -> i64 {
        self.dy
    }

    /// Determinant with `other`; positive means `other` is counterclockwise
    /// from `self` by less than half a turn.
    pub fn determinant(&self, other: Direction) -> i64 {
        self.dx * other.dy - self.dy * other.dx
    }

    /// Scalar product sign carrier with `other`.
    pub fn projection_value(&self, other: Direction) -> i64 {
        self.dx * other.dx + self.dy * other.dy
    }

    /// Side of `other` relative to this direction.
    pub fn side_of(&self, other: Direction) -> Side {
        Side::from_det(other.determinant(*self))
    }

    pub fn opposite(&self) -> Self {
        Self {
            dx: -self.dx,
            dy: -self.dy,
        }
    }

    /// Rotates counterclockwise by `factor` times 45 degrees, exactly.
    ///
    /// An odd step maps (dx, dy) to (dx - dy, dx + dy), a scaled 45-degree
    /// rotation; the scale is irrelevant for an orientation and is removed by
    /// renormalizing.
    pub fn rotate_45(&self, factor: u8) -> Self {
        let mut dx = self.dx;
        let mut dy = self.dy;
        let quarter_turns = (factor / 2) % 4;
        for _ in 0..quarter_turns {
            let tmp = dx;
            dx = -dy;
            dy = tmp;
        }
        if factor % 2 == 1 {
            let tmp = dx - dy;
            dy += dx;
            dx = tmp;
        }
        // renormalize; the odd step scales by sqrt(2) in length
        let g = gcd(dx.unsigned_abs(), dy.unsigned_abs()) as i64;
        Self {
            dx: dx / g,
            dy: dy / g,
        }
    }

    pub fn is_orthogonal(&self) -> bool {
        self.dx == 0 || self.dy == 0
    }

    pub fn is_diagonal(&self) -> bool {
        self.dx.abs() == self.dy.abs()
    }

    pub fn is_multiple_of_45_degree(&self) -> bool {
        self.is_orthogonal() || self.is_diagonal()
    }

    pub fn to_vector_approx(&self) -> (f64, f64) {
        let len = ((self.dx * self.dx + self.dy * self.dy) as f64).sqrt();
        (self.dx as f64 / len, self.dy as f64 / len)
    }

    /// The unit normal pointing to the left of this direction (approximate).
    pub fn left_normal_approx(&self) -> (f64, f64) {
        let (ux, uy) = self.to_vector_approx();
        (-uy, ux)
    }

    /// Rounded integer displacement of length `amount` along the left normal.
    pub fn left_normal_vector(&self, amount: f64) -> IntVector {
        let (nx, ny) = self.left_normal_approx();
        IntVector::new((nx * amount).round() as i32, (ny * amount).round() as i32)
    }

    /// Which angular half-plane this direction lies in; directions in
    /// [0, pi) sort before those in [pi, 2pi).
    fn half(&self) -> u8 {
        if self.dy > 0 || (self.dy == 0 && self.dx > 0) {
            0
        } else {
            1
        }
    }
}

impl PartialOrd for Direction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Direction {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.half().cmp(&other.half()) {
            Ordering::Equal => {
                // same half-plane: the determinant decides the angular order
                let det = self.determinant(*other);
                if det > 0 {
                    Ordering::Less
                } else if det < 0 {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            }
            unequal => unequal,
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}
