// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! General convex tiles as intersections of half-planes.
//!
//! A simplex is a sorted list of directed border lines; the interior is the
//! intersection of the left half-planes. The list is kept canonical: sorted
//! by ascending line direction, at most one line per direction, and no line
//! that is implied by the others. The empty tile is the canonical simplex
//! with zero lines.

use std::sync::OnceLock;

use smallvec::SmallVec;
use tracing::warn;

use crate::direction::Direction;
use crate::line::Line;
use crate::octagon::Octagon;
use crate::point::{FloatPoint, IntPoint, IntVector, Side};
use crate::tile::ShapeDim;
use crate::tile_box::TileBox;
use crate::CRIT_COORD;

#[derive(Debug)]
pub struct Simplex {
    lines: Vec<Line>,
    float_corners: OnceLock<Vec<FloatPoint>>,
    bbox: OnceLock<TileBox>,
    bounding_oct: OnceLock<Octagon>,
}

impl Clone for Simplex {
    fn clone(&self) -> Self {
        Self::from_sorted_lines(self.lines.clone())
    }
}

impl PartialEq for Simplex {
    fn eq(&self, other: &Self) -> bool {
        self.lines == other.lines
    }
}

impl Eq for Simplex {}

/// Division lines emitted for one corner of an inner simplex during cutout.
/// No lines means the corner lies on the outer border and needs no division.
struct Division {
    lines: SmallVec<[Line; 2]>,
}

impl Simplex {
    pub const EMPTY: Self = Self {
        lines: Vec::new(),
        float_corners: OnceLock::new(),
        bbox: OnceLock::new(),
        bounding_oct: OnceLock::new(),
    };

    fn from_sorted_lines(lines: Vec<Line>) -> Simplex {
        Simplex {
            lines,
            float_corners: OnceLock::new(),
            bbox: OnceLock::new(),
            bounding_oct: OnceLock::new(),
        }
    }

    /// Builds the canonical simplex bounded by the given half-planes.
    pub fn new(lines: Vec<Line>) -> Simplex {
        if lines.is_empty() {
            return Simplex::EMPTY;
        }
        let mut lines = lines;
        lines.sort_by(|l, m| {
            l.direction()
                .cmp(&m.direction())
                .then_with(|| (l.a, l.b).cmp(&(m.a, m.b)))
        });
        // one line per direction, keeping the most restrictive half-plane
        let mut deduped: Vec<Line> = Vec::with_capacity(lines.len());
        for line in lines {
            if let Some(last) = deduped.last_mut() {
                if last.direction() == line.direction() {
                    if last.side_of(line.a) == Side::Left {
                        *last = line;
                    }
                    continue;
                }
            }
            deduped.push(line);
        }
        Simplex::from_sorted_lines(remove_redundant_lines(deduped))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn border_line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn border_line(&self, no: usize) -> Line {
        self.lines[no]
    }

    pub fn border_lines(&self) -> &[Line] {
        &self.lines
    }

    fn prev_index(&self, no: usize) -> usize {
        if no == 0 {
            self.lines.len() - 1
        } else {
            no - 1
        }
    }

    /// True when the corner between line `no - 1` and line `no` is a real
    /// vertex, which needs the directions to turn left there.
    pub fn corner_is_bounded(&self, no: usize) -> bool {
        if self.lines.len() < 2 {
            return false;
        }
        let prev_dir = self.lines[self.prev_index(no)].direction();
        let curr_dir = self.lines[no].direction();
        prev_dir.determinant(curr_dir) > 0
    }

    pub fn is_bounded(&self) -> bool {
        if self.lines.is_empty() {
            return true;
        }
        if self.lines.len() < 3 {
            return false;
        }
        (0..self.lines.len()).all(|no| self.corner_is_bounded(no))
    }

    fn clamped_corner_index(&self, no: usize) -> usize {
        if no >= self.lines.len() {
            warn!("corner index {} out of range, clamping", no);
            return self.lines.len().saturating_sub(1);
        }
        no
    }

    /// The corner between line `no - 1` and line `no`, rounded to integer
    /// coordinates. Only meaningful where `corner_is_bounded(no)` holds.
    /// Out of range indices are clamped to the last corner.
    pub fn corner(&self, no: usize) -> IntPoint {
        let no = self.clamped_corner_index(no);
        let prev = self.lines[self.prev_index(no)];
        self.lines[no].intersection(&prev).round()
    }

    pub fn corner_approx(&self, no: usize) -> FloatPoint {
        let no = self.clamped_corner_index(no);
        self.float_corners()[no]
    }

    pub fn corners_approx(&self) -> Vec<FloatPoint> {
        self.float_corners().clone()
    }

    // corners are immutable once the line list is canonical
    fn float_corners(&self) -> &Vec<FloatPoint> {
        self.float_corners.get_or_init(|| {
            (0..self.lines.len())
                .map(|no| {
                    let prev = self.lines[self.prev_index(no)];
                    self.lines[no].intersection_approx(&prev)
                })
                .collect()
        })
    }

    pub fn dimension(&self) -> ShapeDim {
        match self.lines.len() {
            0 => ShapeDim::Empty,
            1 => ShapeDim::Area,
            2 => {
                if self.lines[0].is_collinear(&self.lines[1]) {
                    ShapeDim::Line
                } else {
                    ShapeDim::Area
                }
            }
            3 => {
                if self.lines[0].is_collinear(&self.lines[1])
                    || self.lines[0].is_collinear(&self.lines[2])
                    || self.lines[1].is_collinear(&self.lines[2])
                {
                    // one dimensional and unbounded at one end
                    return ShapeDim::Line;
                }
                let corner = self.lines[1].intersection(&self.lines[2]);
                match corner.side_of(self.lines[0].a, self.lines[0].b) {
                    Side::Left => ShapeDim::Area,
                    Side::Right => {
                        warn!("non-canonical empty simplex");
                        ShapeDim::Empty
                    }
                    Side::Collinear => ShapeDim::Point,
                }
            }
            4 => {
                let collinear_0_2 = self.lines[0].is_collinear(&self.lines[2]);
                let collinear_1_3 = self.lines[1].is_collinear(&self.lines[3]);
                if collinear_0_2 && collinear_1_3 {
                    ShapeDim::Point
                } else if collinear_0_2 || collinear_1_3 {
                    ShapeDim::Line
                } else {
                    ShapeDim::Area
                }
            }
            _ => ShapeDim::Area,
        }
    }

    pub fn contains(&self, p: IntPoint) -> bool {
        !self.is_empty() && self.lines.iter().all(|l| l.side_of(p) != Side::Right)
    }

    pub fn contains_inside(&self, p: IntPoint) -> bool {
        !self.is_empty() && self.lines.iter().all(|l| l.side_of(p) == Side::Left)
    }

    pub fn intersection(&self, other: &Simplex) -> Simplex {
        if self.is_empty() || other.is_empty() {
            return Simplex::EMPTY;
        }
        let mut lines = Vec::with_capacity(self.lines.len() + other.lines.len());
        lines.extend_from_slice(&self.lines);
        lines.extend_from_slice(&other.lines);
        Simplex::new(lines)
    }

    pub fn intersects(&self, other: &Simplex) -> bool {
        !self.intersection(other).is_empty()
    }

    pub fn translate_by(&self, v: IntVector) -> Simplex {
        if v == IntVector::ZERO {
            return self.clone();
        }
        Simplex::from_sorted_lines(self.lines.iter().map(|l| l.translate_by(v)).collect())
    }

    /// Moves every border line outward (positive) or inward (negative) by
    /// `distance`. Shrinking can make lines redundant or collapse the tile,
    /// so the result is rebuilt canonically.
    pub fn offset(&self, distance: f64) -> Simplex {
        if self.is_empty() || distance == 0.0 {
            return self.clone();
        }
        Simplex::new(self.lines.iter().map(|l| l.translate(-distance)).collect())
    }

    /// Offset with a dog-ear guard: growing a tile with sharp corners pushes
    /// those corners out much further than `offset`, so the result is capped
    /// by the equally enlarged bounding octagon.
    pub fn enlarge(&self, offset: f64) -> Simplex {
        if offset <= 0.0 {
            return self.offset(offset);
        }
        let grown = self.offset(offset);
        let cap = self.bounding_octagon().enlarge(offset);
        grown.intersection(&cap.to_simplex())
    }

    pub fn is_box(&self) -> bool {
        (0..self.lines.len())
            .all(|no| self.lines[no].is_orthogonal() && self.corner_is_bounded(no))
    }

    pub fn is_octagon(&self) -> bool {
        (0..self.lines.len())
            .all(|no| self.lines[no].is_multiple_of_45_degree() && self.corner_is_bounded(no))
    }

    /// Converts to an octagon; `None` unless all lines are multiples of 45
    /// degrees and every corner is bounded.
    pub fn to_octagon(&self) -> Option<Octagon> {
        if !self.is_octagon() {
            return None;
        }
        if self.is_empty() {
            return Some(Octagon::EMPTY);
        }
        let mut lx = -CRIT_COORD;
        let mut ly = -CRIT_COORD;
        let mut llx = -CRIT_COORD;
        let mut ulx = -CRIT_COORD;
        let mut rx = CRIT_COORD;
        let mut uy = CRIT_COORD;
        let mut lrx = CRIT_COORD;
        let mut urx = CRIT_COORD;
        for line in &self.lines {
            let a = line.a;
            let b = line.b;
            if a.y == b.y {
                if b.x > a.x {
                    ly = a.y;
                } else {
                    uy = a.y;
                }
            } else if a.x == b.x {
                if b.y > a.y {
                    rx = a.x;
                } else {
                    lx = a.x;
                }
            } else if a.y < b.y {
                if a.x < b.x {
                    lrx = a.x - a.y;
                } else {
                    urx = a.x + a.y;
                }
            } else if a.x < b.x {
                llx = a.x + a.y;
            } else {
                ulx = a.x - a.y;
            }
        }
        Some(Octagon::new(lx, ly, rx, uy, ulx, lrx, llx, urx))
    }

    pub fn bounding_box(&self) -> TileBox {
        *self.bbox.get_or_init(|| self.calc_bounding_box())
    }

    fn calc_bounding_box(&self) -> TileBox {
        if self.is_empty() {
            return TileBox::EMPTY;
        }
        if !self.is_bounded() {
            return TileBox::new(
                IntPoint::new(-CRIT_COORD, -CRIT_COORD),
                IntPoint::new(CRIT_COORD, CRIT_COORD),
            );
        }
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for no in 0..self.lines.len() {
            let c = self.corner_approx(no);
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }
        TileBox::new(
            IntPoint::new(min_x.floor() as i32, min_y.floor() as i32),
            IntPoint::new(max_x.ceil() as i32, max_y.ceil() as i32),
        )
    }

    pub fn bounding_octagon(&self) -> Octagon {
        *self.bounding_oct.get_or_init(|| self.calc_bounding_octagon())
    }

    fn calc_bounding_octagon(&self) -> Octagon {
        if self.is_empty() {
            return Octagon::EMPTY;
        }
        if !self.is_bounded() {
            return Octagon::new(
                -CRIT_COORD,
                -CRIT_COORD,
                CRIT_COORD,
                CRIT_COORD,
                -CRIT_COORD,
                CRIT_COORD,
                -CRIT_COORD,
                CRIT_COORD,
            );
        }
        let mut lx = f64::MAX;
        let mut ly = f64::MAX;
        let mut ulx = f64::MAX;
        let mut llx = f64::MAX;
        let mut rx = f64::MIN;
        let mut uy = f64::MIN;
        let mut lrx = f64::MIN;
        let mut urx = f64::MIN;
        for no in 0..self.lines.len() {
            let c = self.corner_approx(no);
            lx = lx.min(c.x);
            rx = rx.max(c.x);
            ly = ly.min(c.y);
            uy = uy.max(c.y);
            ulx = ulx.min(c.x - c.y);
            lrx = lrx.max(c.x - c.y);
            llx = llx.min(c.x + c.y);
            urx = urx.max(c.x + c.y);
        }
        Octagon::new(
            lx.floor() as i32,
            ly.floor() as i32,
            rx.ceil() as i32,
            uy.ceil() as i32,
            ulx.floor() as i32,
            lrx.ceil() as i32,
            llx.floor() as i32,
            urx.ceil() as i32,
        )
    }

    /// Cuts this simplex out of `outer` and partitions the remainder into
    /// convex pieces. The cuts are made along perpendicular projection lines
    /// from the corners of the inner overlap towards the outer border, so
    /// the pieces are disjoint and cover `outer` minus the interior of
    /// `self`.
    pub fn cutout_from(&self, outer: &Simplex) -> Vec<Simplex> {
        if !self.dimension().is_area() {
            warn!("cutout_from needs a two dimensional hole");
            return vec![outer.clone()];
        }
        let inner = self.intersection(outer);
        if !inner.dimension().is_area() {
            // nothing to cut out
            return vec![outer.clone()];
        }
        let corner_count = inner.border_line_count();
        let mut divisions: Vec<Division> = Vec::with_capacity(corner_count);
        for corner_no in 0..corner_count {
            match inner.calc_division_lines(corner_no, outer) {
                Some(div) => divisions.push(div),
                None => {
                    warn!("cutout_from: no division line found");
                    return vec![outer.clone()];
                }
            }
        }

        let first_line: Option<Line> = divisions[0].lines.first().copied();
        let first_direction = first_line.map(|l| l.direction());
        let mut check_cross_first_line = false;
        let mut prev_division: Option<Line> = None;
        let mut result = Vec::new();

        for corner_no in 0..corner_count {
            let next_division: Option<Line> = divisions[(corner_no + 1) % corner_count]
                .lines
                .first()
                .copied();
            let curr_division = &divisions[corner_no].lines;

            if curr_division.len() == 2 {
                // sharp corner: an extra piece between the two division lines
                let curr_dir = curr_division[0].direction();
                let mut piece_lines: Vec<Line> =
                    vec![curr_division[1].opposite(), curr_division[0]];
                if let Some(prev) = prev_division {
                    if curr_dir.determinant(prev.direction()) > 0 {
                        // the previous division line may reach into this piece
                        piece_lines.push(prev);
                    }
                }
                if !check_cross_first_line {
                    if let Some(first_dir) = first_direction {
                        check_cross_first_line =
                            corner_no > 0 && curr_dir.determinant(first_dir) > 0;
                    }
                }
                if check_cross_first_line {
                    if let (Some(first), Some(first_dir)) = (first_line, first_direction) {
                        if curr_division[1].direction().determinant(first_dir) < 0 {
                            // would overlap the first piece, cut it off
                            piece_lines.push(first.opposite());
                        }
                    }
                }
                result.push(Simplex::new(piece_lines).intersection(outer));
            }

            // the piece along inner border line corner_no
            let last_curr_division = curr_division.last().copied();
            let last_curr_dir = last_curr_division.map(|l| l.direction());
            let mut piece_lines: Vec<Line> = vec![inner.border_line(corner_no).opposite()];
            if let Some(next) = next_division {
                piece_lines.push(next.opposite());
            }
            if let Some(last) = last_curr_division {
                piece_lines.push(last);
            }
            if let (Some(prev), Some(last_dir)) = (prev_division, last_curr_dir) {
                if last_dir.determinant(prev.direction()) > 0 {
                    piece_lines.push(prev);
                }
            }
            if !check_cross_first_line {
                if let (Some(last_dir), Some(first_dir)) = (last_curr_dir, first_direction) {
                    // the projection check ignores backcrossing right after the start
                    check_cross_first_line = corner_no > 0
                        && last_dir.determinant(first_dir) > 0
                        && last_dir.projection_value(first_dir) < 0;
                }
            }
            if check_cross_first_line {
                if let (Some(next), Some(first), Some(first_dir)) =
                    (next_division, first_line, first_direction)
                {
                    if next.direction().determinant(first_dir) < 0 {
                        piece_lines.push(first.opposite());
                    }
                }
            }
            result.push(Simplex::new(piece_lines).intersection(outer));
            prev_division = last_curr_division;
        }
        result.retain(|piece| !piece.is_empty());
        result
    }

    /// One or two perpendicular projection lines from corner `corner_no`
    /// towards the border of `outer`, choosing the outer line(s) with the
    /// smallest projection distance. Sharp corners need two lines so the
    /// adjacent cutout pieces stay convex.
    fn calc_division_lines(&self, corner_no: usize, outer: &Simplex) -> Option<Division> {
        let curr_inner_line = self.lines[corner_no];
        let prev_inner_line = self.lines[self.prev_index(corner_no)];
        let intersection = curr_inner_line.intersection_approx(&prev_inner_line);
        if intersection.is_nan() {
            warn!("calc_division_lines: corner expected");
            return None;
        }
        let inner_corner = intersection.round();
        let tolerance = 1e-4;
        let is_exact = (f64::from(inner_corner.x) - intersection.x).abs() < tolerance
            && (f64::from(inner_corner.y) - intersection.y).abs() < tolerance;
        if !is_exact {
            // A non-integer corner comes from intersecting the hole with the
            // outer simplex, so it lies on the outer border already and the
            // previous inner line itself separates the pieces.
            return Some(Division {
                lines: SmallVec::from_slice(&[prev_inner_line]),
            });
        }
        let prev_inner_dir = prev_inner_line.direction().opposite();
        let next_inner_dir = curr_inner_line.direction();

        let outer_count = outer.border_line_count();
        let mut min_distance = f64::MAX;
        let mut first_projection_dir: Option<Direction> = None;
        let mut second_projection_dir: Option<Direction> = None;

        for outer_line_no in 0..outer_count {
            let outer_line = outer.border_line(outer_line_no);
            let Some(projection_dir) = outer_line.perpendicular_direction(inner_corner) else {
                // the corner lies on the outer border, no division needed
                return Some(Division {
                    lines: SmallVec::new(),
                });
            };
            // the projection must be visible to the left of prev_inner_line
            if prev_inner_dir.determinant(projection_dir) < 0 {
                continue;
            }
            let mut curr_distance = outer_line.distance_signed(inner_corner.to_float()).abs();
            let mut curr_second_dir = projection_dir;
            if projection_dir.determinant(next_inner_dir) < 0 {
                // sharp corner: search the first projection between
                // projection_dir and next_inner_dir visible from the next
                // inner line
                let mut tmp_no = outer_line_no;
                loop {
                    tmp_no = (tmp_no + 1) % outer_count;
                    let Some(candidate) =
                        outer.border_line(tmp_no).perpendicular_direction(inner_corner)
                    else {
                        return Some(Division {
                            lines: SmallVec::new(),
                        });
                    };
                    if projection_dir.determinant(candidate) < 0 {
                        // swept past 180 degrees without finding one
                        curr_distance = f64::MAX;
                        break;
                    }
                    curr_second_dir = candidate;
                    if candidate.determinant(next_inner_dir) >= 0 {
                        curr_distance += outer
                            .border_line(tmp_no)
                            .distance_signed(inner_corner.to_float())
                            .abs();
                        break;
                    }
                }
            }
            if curr_distance < min_distance {
                min_distance = curr_distance;
                first_projection_dir = Some(projection_dir);
                second_projection_dir = Some(curr_second_dir);
            }
        }

        let (first, second) = match (first_projection_dir, second_projection_dir) {
            (Some(f), Some(s)) => (f, s),
            _ => {
                warn!("calc_division_lines: no visible projection");
                return None;
            }
        };
        let mut lines: SmallVec<[Line; 2]> =
            SmallVec::from_slice(&[Line::with_direction(inner_corner, first)]);
        if second != first {
            lines.push(Line::with_direction(inner_corner, second));
        }
        Some(Division { lines })
    }
}

/// Drops every line whose half-plane is implied by its neighbours, iterating
/// to a fixed point, and collapses to no lines at all when the half-planes
/// cannot intersect. Expects the input sorted by direction with at most one
/// line per direction.
fn remove_redundant_lines(mut lines: Vec<Line>) -> Vec<Line> {
    let mut try_again = lines.len() > 2;
    while try_again && lines.len() > 2 {
        try_again = false;
        let mut no = 0;
        while no < lines.len() && lines.len() > 2 {
            let n = lines.len();
            let prev = lines[(no + n - 1) % n];
            let curr = lines[no];
            let next = lines[(no + 1) % n];
            let det = prev.direction().determinant(next.direction());
            if det != 0 {
                let side = curr.side_of_intersection(&prev, &next);
                if det > 0 {
                    // the corner of the neighbours decides whether curr binds
                    if side != Side::Right {
                        lines.remove(no);
                        try_again = true;
                        continue;
                    }
                } else if side == Side::Right
                    && prev.direction().determinant(curr.direction()) > 0
                {
                    // curr cannot reach the region of prev and next
                    return Vec::new();
                }
            } else if prev.side_of(next.a) == Side::Right {
                // parallel half-planes facing away from each other
                return Vec::new();
            }
            no += 1;
        }
    }
    if lines.len() == 2 && lines[0].is_parallel(&lines[1]) {
        if lines[0].direction() == lines[1].direction() {
            if lines[0].side_of(lines[1].a) == Side::Left {
                lines.remove(0);
            } else {
                lines.remove(1);
            }
        } else if lines[1].side_of(lines[0].a) == Side::Right {
            return Vec::new();
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: i32) -> Simplex {
        TileBox::new(IntPoint::new(-half, -half), IntPoint::new(half, half)).to_simplex()
    }

    #[test]
    fn test_canonical_square() {
        let s = square(10);
        assert_eq!(s.border_line_count(), 4);
        assert!(s.is_bounded());
        assert!(s.is_box());
        assert_eq!(s.dimension(), ShapeDim::Area);
        assert!(s.contains(IntPoint::new(10, 10)));
        assert!(!s.contains_inside(IntPoint::new(10, 10)));
        assert!(s.contains_inside(IntPoint::ZERO));
    }

    #[test]
    fn test_corner_index_clamped() {
        let s = square(10);
        assert_eq!(s.corner(9), s.corner(3));
        let clamped = s.corner_approx(9);
        let last = s.corner_approx(3);
        approx::assert_abs_diff_eq!(clamped.x, last.x);
        approx::assert_abs_diff_eq!(clamped.y, last.y);
    }

    #[test]
    fn test_bounding_shapes_stable_across_calls() {
        let s = square(10);
        let oct = s.bounding_octagon();
        assert_eq!(s.bounding_octagon(), oct);
        assert_eq!(s.bounding_box(), s.bounding_box());
        // equality and clones ignore the lazily filled caches
        let copy = s.clone();
        assert_eq!(copy, s);
        assert_eq!(copy.bounding_box(), s.bounding_box());
    }

    #[test]
    fn test_redundant_lines_removed() {
        // a square plus far away half-planes that change nothing
        let mut lines: Vec<Line> = (0..4).map(|i| square(10).border_line(i)).collect();
        lines.push(Line::new(IntPoint::new(0, -100), IntPoint::new(1, -100)));
        lines.push(Line::new(IntPoint::new(100, 0), IntPoint::new(100, 1)));
        let s = Simplex::new(lines);
        assert_eq!(s.border_line_count(), 4);
        assert_eq!(s, square(10));
    }

    #[test]
    fn test_facing_away_parallels_collapse() {
        // y >= 5 and y <= -5 cannot intersect
        let lines = vec![
            Line::new(IntPoint::new(0, 5), IntPoint::new(1, 5)),
            Line::new(IntPoint::new(0, -5), IntPoint::new(-1, -5)),
        ];
        assert!(Simplex::new(lines).is_empty());
    }

    #[test]
    fn test_infeasible_triangle_collapses() {
        // three half-planes whose pairwise regions never meet
        let lines = vec![
            Line::new(IntPoint::new(0, 1), IntPoint::new(1, 1)), // y >= 1
            Line::new(IntPoint::new(-10, 0), IntPoint::new(-11, 1)), // x + y <= -10
            Line::new(IntPoint::new(-5, 0), IntPoint::new(-5, -1)), // x >= -5
        ];
        assert!(Simplex::new(lines).is_empty());
    }

    #[test]
    fn test_dimension_degenerate() {
        // zero width strip
        let lines = vec![
            Line::new(IntPoint::new(0, 0), IntPoint::new(1, 0)),
            Line::new(IntPoint::new(0, 0), IntPoint::new(-1, 0)),
        ];
        assert_eq!(Simplex::new(lines).dimension(), ShapeDim::Line);
        // four half-planes meeting in a single point
        let lines = vec![
            Line::new(IntPoint::new(0, 0), IntPoint::new(1, 0)),
            Line::new(IntPoint::new(0, 0), IntPoint::new(-1, 0)),
            Line::new(IntPoint::new(0, 0), IntPoint::new(0, 1)),
            Line::new(IntPoint::new(0, 0), IntPoint::new(0, -1)),
        ];
        assert_eq!(Simplex::new(lines).dimension(), ShapeDim::Point);
    }

    #[test]
    fn test_offset_shrink_collapses() {
        let s = square(4);
        assert!(s.offset(-5.0).is_empty());
        let grown = s.offset(6.0);
        assert!(grown.contains(IntPoint::new(10, 10)));
        assert!(!grown.contains(IntPoint::new(11, 10)));
    }

    #[test]
    fn test_enlarge_caps_dog_ears() {
        // a thin wedge with its apex at (100, 0); plain offset would push
        // the apex corner out by offset / sin(half angle), about 200 units
        let lines = vec![
            Line::new(IntPoint::new(0, -1), IntPoint::new(100, 0)),
            Line::new(IntPoint::new(100, 0), IntPoint::new(0, 1)),
            Line::new(IntPoint::new(0, 0), IntPoint::new(0, -1)),
        ];
        let wedge = Simplex::new(lines);
        assert!(wedge.is_bounded());
        let enlarged = wedge.enlarge(2.0);
        // rounding slack of a couple of units on top of the cap
        let bound = wedge.bounding_octagon().enlarge(2.0).offset(2.0);
        for no in 0..enlarged.border_line_count() {
            let c = enlarged.corner(no);
            assert!(bound.contains(c), "corner {c:?} escapes the cap");
        }
    }

    #[test]
    fn test_octagon_roundtrip() {
        let oct = Octagon::new(-10, -10, 10, 10, -15, 15, -15, 15);
        let s = oct.to_simplex();
        assert!(s.is_octagon());
        assert_eq!(s.to_octagon(), Some(oct));
    }

    #[test]
    fn test_intersection_of_disjoint_is_empty() {
        let a = square(10);
        let b = a.translate_by(IntVector::new(100, 0));
        assert!(a.intersection(&b).is_empty());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_cutout_ring() {
        let outer = square(20);
        let hole = square(5);
        let pieces = hole.cutout_from(&outer);
        assert!(!pieces.is_empty());
        // every piece is convex, inside the outer square and misses the
        // open hole
        for piece in &pieces {
            assert!(piece.dimension().is_area());
            for no in 0..piece.border_line_count() {
                let c = piece.corner(no);
                assert!(outer.contains(c));
                assert!(!hole.contains_inside(c));
            }
        }
        // sample grid: ring points are covered exactly once, hole interior
        // not at all
        for x in (-20..=20).step_by(5) {
            for y in (-20..=20).step_by(5) {
                let p = IntPoint::new(x, y);
                let covering = pieces.iter().filter(|s| s.contains_inside(p)).count();
                if hole.contains(p) {
                    assert_eq!(covering, 0, "hole point {p:?} covered");
                } else if !hole.contains(p) && outer.contains_inside(p) {
                    assert!(covering <= 1, "point {p:?} covered {covering} times");
                    if !pieces.iter().any(|s| {
                        (0..s.border_line_count()).any(|no| s.border_line(no).side_of(p) == Side::Collinear)
                    }) {
                        assert_eq!(covering, 1, "ring point {p:?} uncovered");
                    }
                }
            }
        }
    }

    #[test]
    fn test_cutout_disjoint_returns_outer() {
        let outer = square(10);
        let hole = square(5).translate_by(IntVector::new(100, 0));
        let pieces = hole.cutout_from(&outer);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0], outer);
    }
}
