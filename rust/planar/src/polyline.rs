// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Open polygonal curves represented as sequences of directed lines.
//!
//! A polyline with n lines has n - 1 corners; corner i is the intersection
//! of lines i and i + 1. The first and last line are synthetic perpendicular
//! end caps, so every corner of the underlying point sequence is represented
//! exactly even when intermediate corners are rational. Consecutive lines are
//! never parallel. Instances are immutable; corner positions are computed
//! lazily and memoized.

use std::sync::OnceLock;

use tracing::warn;

use crate::error::{Error, Result};
use crate::line::Line;
use crate::octagon::Octagon;
use crate::point::{FloatPoint, IntPoint, IntVector, Point, Side};
use crate::tile::Tile;
use crate::tile_box::TileBox;

#[derive(Debug)]
pub struct Polyline {
    lines: Vec<Line>,
    corners: OnceLock<Vec<Point>>,
    float_corners: OnceLock<Vec<FloatPoint>>,
    bbox: OnceLock<TileBox>,
}

/// One line segment of a polyline together with its two delimiting
/// neighbour lines. The segment is the part of `middle` between the
/// intersections with `start` and `end`.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: Line,
    pub middle: Line,
    pub end: Line,
}

impl Clone for Polyline {
    fn clone(&self) -> Self {
        Self::from_line_vec(self.lines.clone())
    }
}

impl PartialEq for Polyline {
    fn eq(&self, other: &Self) -> bool {
        self.lines == other.lines
    }
}

impl Eq for Polyline {}

impl Polyline {
    /// Builds a polyline whose corners are the given points, after removing
    /// duplicates and collinear points. When a new point is collinear with an
    /// existing segment, the surviving pair of points is the one spanning the
    /// longest segment. Fails when fewer than two distinct corners remain.
    pub fn from_points(points: &[IntPoint]) -> Result<Polyline> {
        if points.len() < 2 {
            return Err(Error::InvalidPolyline(
                "need at least 2 points".to_string(),
            ));
        }
        let mut corners: Vec<IntPoint> = Vec::with_capacity(points.len());
        for &p in points {
            if corners.contains(&p) {
                continue;
            }
            if absorb_collinear(&mut corners, p) {
                continue;
            }
            corners.push(p);
        }
        if corners.len() < 2 {
            return Err(Error::InvalidPolyline(
                "need at least 2 distinct points".to_string(),
            ));
        }

        let n = corners.len();
        let mut lines = Vec::with_capacity(n + 1);
        // perpendicular end caps keep the end corners exact
        let first_dir = Line::new(corners[0], corners[1]).direction();
        lines.push(Line::with_direction(corners[0], first_dir.rotate_45(2)));
        for i in 1..n {
            lines.push(Line::new(corners[i - 1], corners[i]));
        }
        let last_dir = Line::new(corners[n - 1], corners[n - 2]).direction();
        lines.push(Line::with_direction(corners[n - 1], last_dir.rotate_45(2)));

        let result = Self::from_line_vec(lines);
        let _ = result
            .corners
            .set(corners.iter().map(|&c| Point::from(c)).collect());
        Ok(result)
    }

    /// A three-line polyline for a single segment.
    pub fn two_point(from: IntPoint, to: IntPoint) -> Result<Polyline> {
        if from == to {
            return Err(Error::InvalidPolyline(
                "need 2 distinct points".to_string(),
            ));
        }
        let middle = Line::new(from, to);
        let cap_dir = middle.direction().rotate_45(2);
        let lines = vec![
            Line::with_direction(from, cap_dir),
            middle,
            Line::with_direction(to, cap_dir),
        ];
        let result = Self::from_line_vec(lines);
        let _ = result
            .corners
            .set(vec![Point::from(from), Point::from(to)]);
        Ok(result)
    }

    /// Builds a polyline from a line sequence. Lines parallel to their
    /// predecessor are skipped, and each remaining line is oriented so that
    /// it points from its previous corner toward its next corner.
    pub fn from_lines(input: &[Line]) -> Result<Polyline> {
        let mut lines: Vec<Line> = Vec::with_capacity(input.len());
        for &line in input {
            if let Some(last) = lines.last() {
                if last.is_parallel(&line) {
                    continue;
                }
            }
            lines.push(line);
        }
        if lines.len() < 3 {
            return Err(Error::InvalidPolyline(format!(
                "{} non-parallel lines, need at least 3",
                lines.len()
            )));
        }

        let float_corners: Vec<FloatPoint> = (0..lines.len() - 1)
            .map(|i| lines[i].intersection_approx(&lines[i + 1]))
            .collect();
        // orient each inner line from its previous corner toward the next
        for index in 1..lines.len() - 1 {
            let pre = lines[index - 1];
            let side_pre = pre.side_of_approx(float_corners[index]);
            if side_pre == Side::Collinear {
                continue;
            }
            let turn = lines[index].direction().side_of(pre.direction());
            if turn != side_pre {
                lines[index] = lines[index].opposite();
            }
        }

        let result = Self::from_line_vec(lines);
        let _ = result.float_corners.set(float_corners);
        Ok(result)
    }

    fn from_line_vec(lines: Vec<Line>) -> Polyline {
        Polyline {
            lines,
            corners: OnceLock::new(),
            float_corners: OnceLock::new(),
            bbox: OnceLock::new(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn corner_count(&self) -> usize {
        self.lines.len() - 1
    }

    pub fn line(&self, no: usize) -> Line {
        self.lines[no]
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    fn corners(&self) -> &[Point] {
        self.corners.get_or_init(|| {
            (0..self.corner_count())
                .map(|i| {
                    let r = self.lines[i].intersection(&self.lines[i + 1]);
                    if r.is_integer() {
                        Point::from(r.round())
                    } else {
                        Point::from(r)
                    }
                })
                .collect()
        })
    }

    /// The exact i-th corner. An out of range index is clamped.
    pub fn corner(&self, no: usize) -> Point {
        let corners = self.corners();
        let mut idx = no;
        if idx >= corners.len() {
            warn!("corner index {} out of range, clamping", no);
            idx = corners.len() - 1;
        }
        corners[idx].clone()
    }

    /// Float approximation of the i-th corner. An out of range index is
    /// clamped.
    pub fn corner_approx(&self, no: usize) -> FloatPoint {
        let corners = self.float_corners.get_or_init(|| {
            (0..self.corner_count())
                .map(|i| self.lines[i].intersection_approx(&self.lines[i + 1]))
                .collect()
        });
        let mut idx = no;
        if idx >= corners.len() {
            warn!("corner_approx index {} out of range, clamping", no);
            idx = corners.len() - 1;
        }
        corners[idx]
    }

    pub fn first_corner(&self) -> Point {
        self.corner(0)
    }

    pub fn last_corner(&self) -> Point {
        self.corner(self.corner_count() - 1)
    }

    /// The polyline traversed in the opposite direction.
    pub fn reverse(&self) -> Polyline {
        let lines = self.lines.iter().rev().map(Line::opposite).collect();
        Self::from_line_vec(lines)
    }

    pub fn translate_by(&self, v: IntVector) -> Polyline {
        if v == IntVector::new(0, 0) {
            return self.clone();
        }
        Self::from_line_vec(self.lines.iter().map(|l| l.translate_by(v)).collect())
    }

    pub fn is_orthogonal(&self) -> bool {
        self.lines.iter().all(Line::is_orthogonal)
    }

    pub fn is_multiple_of_45_degree(&self) -> bool {
        self.lines.iter().all(Line::is_multiple_of_45_degree)
    }

    /// Length of the corner polygon between the two corner indices.
    pub fn length_approx_between(&self, from_corner: usize, to_corner: usize) -> f64 {
        let to_corner = to_corner.min(self.corner_count() - 1);
        let mut result = 0.0;
        for i in from_corner..to_corner {
            result += self.corner_approx(i + 1).distance(self.corner_approx(i));
        }
        result
    }

    pub fn length_approx(&self) -> f64 {
        self.length_approx_between(0, self.corner_count() - 1)
    }

    /// Smallest box containing the corners between the two corner indices.
    pub fn bounding_box_between(&self, from_corner: usize, to_corner: usize) -> TileBox {
        let to_corner = to_corner.min(self.corner_count() - 1);
        let mut llx = f64::MAX;
        let mut lly = f64::MAX;
        let mut urx = f64::MIN;
        let mut ury = f64::MIN;
        for i in from_corner..=to_corner {
            let c = self.corner_approx(i);
            llx = llx.min(c.x);
            lly = lly.min(c.y);
            urx = urx.max(c.x);
            ury = ury.max(c.y);
        }
        TileBox::new(
            IntPoint::new(llx.floor() as i32, lly.floor() as i32),
            IntPoint::new(urx.ceil() as i32, ury.ceil() as i32),
        )
    }

    pub fn bounding_box(&self) -> TileBox {
        *self
            .bbox
            .get_or_init(|| self.bounding_box_between(0, self.corner_count() - 1))
    }

    /// Smallest octagon containing the corners between the two corner
    /// indices.
    pub fn bounding_octagon(&self, from_corner: usize, to_corner: usize) -> Octagon {
        let to_corner = to_corner.min(self.corner_count() - 1);
        let mut lx = f64::MAX;
        let mut ly = f64::MAX;
        let mut rx = f64::MIN;
        let mut uy = f64::MIN;
        let mut ulx = f64::MAX;
        let mut lrx = f64::MIN;
        let mut llx = f64::MAX;
        let mut urx = f64::MIN;
        for i in from_corner..=to_corner {
            let c = self.corner_approx(i);
            lx = lx.min(c.x);
            ly = ly.min(c.y);
            rx = rx.max(c.x);
            uy = uy.max(c.y);
            let diff = c.x - c.y;
            ulx = ulx.min(diff);
            lrx = lrx.max(diff);
            let sum = c.x + c.y;
            llx = llx.min(sum);
            urx = urx.max(sum);
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

    /// The i-th line segment with its delimiting neighbour lines,
    /// for 1 <= no <= line_count - 2.
    pub fn segment(&self, no: usize) -> Segment {
        debug_assert!(no >= 1 && no + 1 < self.line_count());
        Segment {
            start: self.lines[no - 1],
            middle: self.lines[no],
            end: self.lines[no + 1],
        }
    }

    /// True if the point lies on one of the line segments.
    pub fn contains(&self, p: IntPoint) -> bool {
        (1..self.line_count() - 1).any(|i| self.segment(i).contains(p))
    }

    /// Nearest point on the polyline, approximately.
    pub fn nearest_point_approx(&self, from: FloatPoint) -> FloatPoint {
        let mut min_distance = f64::MAX;
        let mut nearest = self.corner_approx(0);
        for i in 0..self.corner_count() {
            let c = self.corner_approx(i);
            let d = c.distance(from);
            if d < min_distance {
                min_distance = d;
                nearest = c;
            }
        }
        let tolerance = 1.0;
        for i in 1..self.line_count() - 1 {
            let projection = from.projection_approx(&self.lines[i]);
            let d = projection.distance(from);
            if d < min_distance {
                let prev = self.corner_approx(i - 1);
                let next = self.corner_approx(i);
                // accept the projection only inside the segment bounds
                let segment_length = next.distance(prev);
                if projection.distance(next) + projection.distance(prev)
                    < segment_length + tolerance
                {
                    min_distance = d;
                    nearest = projection;
                }
            }
        }
        nearest
    }

    pub fn distance(&self, from: FloatPoint) -> f64 {
        from.distance(self.nearest_point_approx(from))
    }

    /// Perpendicular connection from the point onto the nearest line
    /// segment. None if the perpendicular foot falls outside every segment
    /// or the point lies on the polyline.
    pub fn projection_line(&self, from: IntPoint) -> Option<Segment> {
        let from_float = from.to_float();
        let mut min_distance = f64::MAX;
        let mut result: Option<(Line, Line)> = None;
        for i in 1..self.line_count() - 1 {
            let projection = from_float.projection_approx(&self.lines[i]);
            let d = projection.distance(from_float);
            if d >= min_distance {
                continue;
            }
            let Some(towards) = self.lines[i].perpendicular_direction(from) else {
                continue;
            };
            let perpendicular = Line::with_direction(from, towards);
            let prev_side = self.corner(i - 1).side_of(perpendicular.a, perpendicular.b);
            let next_side = self.corner(i).side_of(perpendicular.a, perpendicular.b);
            if prev_side != Side::Collinear && next_side != Side::Collinear && prev_side == next_side
            {
                // the foot of the perpendicular is outside the segment
                continue;
            }
            min_distance = d;
            result = Some((perpendicular, self.lines[i]));
        }
        let (perpendicular, nearest_line) = result?;
        let start = Line::with_direction(from, nearest_line.direction());
        Some(Segment {
            start,
            middle: perpendicular,
            end: nearest_line,
        })
    }

    /// Offset shapes of all line segments.
    pub fn offset_shapes(&self, half_width: i32) -> Vec<Tile> {
        self.offset_shapes_between(half_width, 0, self.line_count() - 1)
    }

    /// Calculates for each line between `from_no` and `to_no` the convex
    /// shape of all points within `half_width` of the corresponding line
    /// segment, with outstanding corners at acute bends cut off against the
    /// neighbouring shapes.
    pub fn offset_shapes_between(
        &self,
        half_width: i32,
        from_no: usize,
        to_no: usize,
    ) -> Vec<Tile> {
        let to_no = to_no.min(self.line_count() - 1);
        if to_no <= from_no + 1 {
            return Vec::new();
        }
        let mut shapes = Vec::with_capacity(to_no - from_no - 1);

        let hw = f64::from(half_width);
        let mut prev_dir = self.lines[from_no].direction();
        let mut curr_dir = self.lines[from_no + 1].direction();

        for index in from_no + 1..to_no {
            let next_dir = self.lines[index + 1].direction();

            // right edge, front cap, left edge, back cap; interior on the left
            let right_line = self.lines[index].translate(-hw);
            let next_from_curr = next_dir.side_of(curr_dir);
            let front_line = if next_from_curr == Side::Left {
                // left turn towards the next line
                self.lines[index + 1].translate(-hw)
            } else {
                self.lines[index + 1].opposite().translate(-hw)
            };
            let left_line = self.lines[index].opposite().translate(-hw);
            let curr_from_prev = curr_dir.side_of(prev_dir);
            let back_line = if curr_from_prev == Side::Left {
                self.lines[index - 1].translate(-hw)
            } else {
                self.lines[index - 1].opposite().translate(-hw)
            };
            let borders = [right_line, front_line, left_line, back_line];

            let corner_here = self.corner(index);
            let corner_prev = self.corner(index - 1);
            let check_dist_square = 2.0 * hw * hw;
            let mut cut_dog_ear_lines: Vec<Line> = Vec::new();

            // cut off outstanding corners against the following shapes
            let mut curr_line = front_line;
            let mut check_line = if next_from_curr == Side::Left {
                left_line
            } else {
                right_line
            };
            let mut check_distance_corner = self.corner_approx(index);
            let mut corner_to_check = FloatPoint::new(f64::NAN, f64::NAN);
            let mut tmp_curr_dir = next_dir;
            let mut direction_changed = false;
            for jndex in index + 2..self.line_count() - 1 {
                if self.corner_approx(jndex - 1).distance_square(check_distance_corner)
                    > check_dist_square
                {
                    break;
                }
                if !direction_changed {
                    corner_to_check = curr_line.intersection_approx(&check_line);
                }
                let tmp_next_dir = self.lines[jndex].direction();
                let tmp_turn = tmp_next_dir.side_of(tmp_curr_dir);
                direction_changed = tmp_turn != next_from_curr;
                if !direction_changed {
                    let border = if tmp_turn == Side::Left {
                        self.lines[jndex].translate(-hw)
                    } else {
                        self.lines[jndex].opposite().translate(-hw)
                    };
                    if border.side_of_approx(corner_to_check) == Side::Right
                        && corner_here.side_of(border.a, border.b) == Side::Left
                        && corner_prev.side_of(border.a, border.b) == Side::Left
                    {
                        // an outstanding corner
                        cut_dog_ear_lines.push(border);
                    }
                    tmp_curr_dir = tmp_next_dir;
                    curr_line = border;
                }
            }

            // cut off outstanding corners against the previous shapes
            check_distance_corner = self.corner_approx(index - 1);
            check_line = if curr_from_prev == Side::Left {
                left_line
            } else {
                right_line
            };
            curr_line = back_line;
            tmp_curr_dir = prev_dir;
            direction_changed = false;
            for jndex in (1..index.saturating_sub(1)).rev() {
                if self.corner_approx(jndex).distance_square(check_distance_corner)
                    > check_dist_square
                {
                    break;
                }
                if !direction_changed {
                    corner_to_check = curr_line.intersection_approx(&check_line);
                }
                let tmp_prev_dir = self.lines[jndex].direction();
                let tmp_turn = tmp_curr_dir.side_of(tmp_prev_dir);
                direction_changed = tmp_turn != curr_from_prev;
                if !direction_changed {
                    let border = if tmp_turn == Side::Left {
                        self.lines[jndex].translate(-hw)
                    } else {
                        self.lines[jndex].opposite().translate(-hw)
                    };
                    if border.side_of_approx(corner_to_check) == Side::Right
                        && corner_here.side_of(border.a, border.b) == Side::Left
                        && corner_prev.side_of(border.a, border.b) == Side::Left
                    {
                        cut_dog_ear_lines.push(border);
                    }
                    tmp_curr_dir = tmp_prev_dir;
                    curr_line = border;
                }
            }

            let mut shape = Tile::from_border_lines(&borders);
            if !cut_dog_ear_lines.is_empty() {
                shape = shape.intersection(&Tile::from_border_lines(&cut_dog_ear_lines));
            }

            // cap the shape at the enlarged octagon around the segment
            let surround = self.bounding_octagon(index - 1, index).offset(hw);
            let result = Tile::from(surround).intersection(&shape).simplify();
            if result.is_empty() {
                warn!("offset shape {} collapsed to empty", index - 1);
            } else {
                shapes.push(result);
            }

            prev_dir = curr_dir;
            curr_dir = next_dir;
        }
        shapes
    }

    /// Offset shape of the single line segment with index `no`,
    /// for 0 <= no <= line_count - 3.
    pub fn offset_shape(&self, half_width: i32, no: usize) -> Tile {
        debug_assert!(no + 2 < self.line_count());
        let mut shapes = self.offset_shapes_between(half_width, no, no + 2);
        shapes.remove(0)
    }

    /// Bounding box of the segment with index `no` grown by `half_width`.
    pub fn offset_box(&self, half_width: i32, no: usize) -> TileBox {
        self.segment(no + 1)
            .bounding_box()
            .offset(f64::from(half_width))
    }

    /// Combines two polylines sharing an end corner, preserving the line
    /// order of `self`. Returns a clone of `self` when there is no shared
    /// end corner.
    pub fn combine(&self, other: &Polyline) -> Polyline {
        let (at_start, other_at_start) = if self.first_corner() == other.first_corner() {
            (true, true)
        } else if self.first_corner() == other.last_corner() {
            (true, false)
        } else if self.last_corner() == other.first_corner() {
            (false, true)
        } else if self.last_corner() == other.last_corner() {
            (false, false)
        } else {
            return self.clone();
        };

        let mut lines: Vec<Line> = Vec::with_capacity(self.line_count() + other.line_count());
        if at_start {
            if other_at_start {
                // other reversed in front, skipping its cap at the shared corner
                for i in (1..other.line_count()).rev() {
                    lines.push(other.lines[i].opposite());
                }
            } else {
                for i in 0..other.line_count() - 1 {
                    lines.push(other.lines[i]);
                }
            }
            lines.extend_from_slice(&self.lines[1..]);
        } else {
            lines.extend_from_slice(&self.lines[..self.line_count() - 1]);
            if other_at_start {
                for i in 1..other.line_count() {
                    lines.push(other.lines[i]);
                }
            } else {
                for i in (0..other.line_count() - 1).rev() {
                    lines.push(other.lines[i].opposite());
                }
            }
        }
        match Polyline::from_lines(&lines) {
            Ok(combined) => combined,
            Err(_) => {
                warn!("combine produced a degenerate polyline");
                self.clone()
            }
        }
    }

    /// Splits this polyline at the line with index `line_no` by inserting
    /// `end_line` as the closing line of the first piece and the opening
    /// line of the second. None when the end line is parallel to the split
    /// line, only touches an end corner, or a piece degenerates.
    pub fn split(&self, line_no: usize, end_line: Line) -> Option<[Polyline; 2]> {
        if line_no < 1 || line_no + 1 >= self.line_count() {
            warn!("split: line index {} out of range", line_no);
            return None;
        }
        let split_line = self.lines[line_no];
        if split_line.is_parallel(&end_line) {
            return None;
        }
        let intersection = split_line.intersection_approx(&end_line);
        // almost parallel lines may fail to produce a finite corner
        if intersection.is_nan() {
            return None;
        }
        let new_end_corner = intersection.round();
        if line_no == 1 && Point::from(new_end_corner) == self.first_corner() {
            return None;
        }
        if line_no + 2 == self.line_count() && Point::from(new_end_corner) == self.last_corner() {
            return None;
        }

        let mut first_piece: Vec<Line> = self.lines[..=line_no].to_vec();
        if self.corner(line_no - 1) != Point::from(new_end_corner) {
            first_piece.push(end_line);
        }
        let mut second_piece: Vec<Line> = Vec::with_capacity(self.line_count() - line_no + 1);
        if self.corner(line_no) != Point::from(new_end_corner) {
            second_piece.push(end_line);
        }
        second_piece.extend_from_slice(&self.lines[line_no..]);

        let first = Polyline::from_lines(&first_piece).ok()?;
        if first.has_corner_loop() {
            return None;
        }
        let second = Polyline::from_lines(&second_piece).ok()?;
        if second.has_corner_loop() {
            return None;
        }
        Some([first, second])
    }

    /// Splits at an interior point of the line with index `line_no`, using a
    /// perpendicular line through the point as the shared delimiter.
    pub fn split_at_point(&self, line_no: usize, p: IntPoint) -> Option<[Polyline; 2]> {
        if line_no < 1 || line_no + 1 >= self.line_count() {
            warn!("split_at_point: line index {} out of range", line_no);
            return None;
        }
        let split_point = Point::from(p);
        if self.first_corner() == split_point || self.last_corner() == split_point {
            return None;
        }
        if self.corner(line_no - 1) == split_point || self.corner(line_no) == split_point {
            return None;
        }

        let split_dir = self.lines[line_no].direction().rotate_45(2);
        let split_line = Line::with_direction(p, split_dir);

        let mut first_piece: Vec<Line> = self.lines[..=line_no].to_vec();
        first_piece.push(split_line);
        let first = Polyline::from_lines(&first_piece).ok()?;
        if first.has_corner_loop() {
            return None;
        }

        let mut second_piece: Vec<Line> = Vec::with_capacity(self.line_count() - line_no + 1);
        second_piece.push(split_line);
        second_piece.extend_from_slice(&self.lines[line_no..]);
        let second = Polyline::from_lines(&second_piece).ok()?;
        if second.has_corner_loop() {
            return None;
        }
        Some([first, second])
    }

    /// Shortens this polyline to `new_line_count` lines with the last
    /// segment cut to approximately `last_segment_length`. The new last
    /// corner is an integer point.
    pub fn shorten(&self, new_line_count: usize, last_segment_length: f64) -> Option<Polyline> {
        let last_corner = self.corner_approx(new_line_count - 2);
        let prev_last_corner = self.corner_approx(new_line_count - 3);
        let new_last_corner = prev_last_corner
            .change_length(last_corner, last_segment_length)
            .round();

        if Point::from(new_last_corner) == self.corner(self.corner_count() - 2) {
            // the shortened corner already exists, drop one line
            let mut lines = self.lines.clone();
            lines.remove(new_line_count - 1);
            return Polyline::from_lines(&lines).ok();
        }

        let mut lines: Vec<Line> = self.lines[..new_line_count - 2].to_vec();
        let old_line = self.lines[new_line_count - 2];
        let anchor = if old_line.a == new_last_corner {
            old_line.b
        } else {
            old_line.a
        };
        let new_prev_last = Line::new(anchor, new_last_corner);
        let cap_dir = new_prev_last.direction().rotate_45(6);
        lines.push(new_prev_last);
        lines.push(Line::with_direction(new_last_corner, cap_dir));
        Polyline::from_lines(&lines).ok()
    }

    /// True if every corner coincides with the first corner. Such a
    /// polyline would self-intersect after a degenerate split.
    fn has_corner_loop(&self) -> bool {
        let first = self.first_corner();
        (1..self.corner_count()).all(|i| self.corner(i) == first)
    }
}

impl Segment {
    pub fn to_polyline(&self) -> Result<Polyline> {
        Polyline::from_lines(&[self.start, self.middle, self.end])
    }

    pub fn start_corner_approx(&self) -> FloatPoint {
        self.middle.intersection_approx(&self.start)
    }

    pub fn end_corner_approx(&self) -> FloatPoint {
        self.middle.intersection_approx(&self.end)
    }

    pub fn bounding_box(&self) -> TileBox {
        let a = self.start_corner_approx();
        let b = self.end_corner_approx();
        TileBox::new(
            IntPoint::new(
                a.x.min(b.x).floor() as i32,
                a.y.min(b.y).floor() as i32,
            ),
            IntPoint::new(a.x.max(b.x).ceil() as i32, a.y.max(b.y).ceil() as i32),
        )
    }

    pub fn contains(&self, p: IntPoint) -> bool {
        self.middle.side_of(p) == Side::Collinear && self.bounding_box().contains(p)
    }
}

/// Tries to merge `p` into an existing collinear segment of `corners`,
/// keeping the two points spanning the longest segment. True when `p` was
/// absorbed and must not be appended.
fn absorb_collinear(corners: &mut [IntPoint], p: IntPoint) -> bool {
    if corners.len() < 2 {
        return false;
    }
    for i in 0..corners.len() - 1 {
        let start = corners[i];
        let end = corners[i + 1];
        if p.side_of(start, end) != Side::Collinear {
            continue;
        }
        let d_start_p = start.distance_square(p);
        let d_p_end = p.distance_square(end);
        let d_start_end = start.distance_square(end);
        if d_start_end >= d_start_p {
            if d_start_end >= d_p_end {
                // p lies between start and end
            } else {
                // p extends the segment beyond start
                corners[i] = p;
            }
        } else if d_start_end >= d_p_end {
            // p extends the segment beyond end
            corners[i + 1] = p;
        } else {
            corners[i] = p;
        }
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::ShapeDim;

    fn p(x: i32, y: i32) -> IntPoint {
        IntPoint::new(x, y)
    }

    #[test]
    fn test_from_points_corner_roundtrip() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0), p(100, 80)]).unwrap();
        assert_eq!(poly.line_count(), 4);
        assert_eq!(poly.corner_count(), 3);
        assert_eq!(poly.corner(0), Point::from(p(0, 0)));
        assert_eq!(poly.corner(1), Point::from(p(100, 0)));
        assert_eq!(poly.corner(2), Point::from(p(100, 80)));
    }

    #[test]
    fn test_from_points_filters_duplicates_and_collinear() {
        let poly = Polyline::from_points(&[
            p(0, 0),
            p(50, 0),
            p(50, 0),
            p(100, 0),
            p(100, 80),
        ])
        .unwrap();
        // the middle point on the straight run is dropped
        assert_eq!(poly.corner_count(), 3);
        assert_eq!(poly.corner(1), Point::from(p(100, 0)));
    }

    #[test]
    fn test_from_points_rejects_single_point() {
        assert!(Polyline::from_points(&[p(3, 4), p(3, 4)]).is_err());
    }

    #[test]
    fn test_two_point_end_caps_perpendicular() {
        let poly = Polyline::two_point(p(0, 0), p(10, 0)).unwrap();
        assert_eq!(poly.line_count(), 3);
        assert!(poly.line(0).is_parallel(&poly.line(2)));
        assert_eq!(poly.line(0).direction(), crate::direction::Direction::UP);
    }

    #[test]
    fn test_from_lines_orients_toward_next_corner() {
        let source = Polyline::from_points(&[p(0, 0), p(100, 0), p(100, 80)]).unwrap();
        // flip an inner line; reconstruction must restore a consistent walk
        let mut lines: Vec<Line> = source.lines().to_vec();
        lines[1] = lines[1].opposite();
        let rebuilt = Polyline::from_lines(&lines).unwrap();
        assert_eq!(rebuilt.corner(0), Point::from(p(0, 0)));
        assert_eq!(
            rebuilt.line(1).direction(),
            Line::new(p(0, 0), p(100, 0)).direction()
        );
    }

    #[test]
    fn test_reverse_swaps_ends() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0), p(100, 80)]).unwrap();
        let rev = poly.reverse();
        assert_eq!(rev.first_corner(), Point::from(p(100, 80)));
        assert_eq!(rev.last_corner(), Point::from(p(0, 0)));
        assert_eq!(rev.corner_count(), poly.corner_count());
    }

    #[test]
    fn test_length_and_bounding_box() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0), p(100, 80)]).unwrap();
        approx::assert_abs_diff_eq!(poly.length_approx(), 180.0, epsilon = 1e-9);
        let bbox = poly.bounding_box();
        assert_eq!(bbox, TileBox::new(p(0, 0), p(100, 80)));
    }

    #[test]
    fn test_offset_shapes_cover_segments() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0), p(100, 80)]).unwrap();
        let shapes = poly.offset_shapes(10);
        assert_eq!(shapes.len(), 2);
        for shape in &shapes {
            assert!(shape.dimension().is_area());
        }
        // first shape covers its segment plus the half width on all sides
        assert!(shapes[0].contains(p(0, 0)));
        assert!(shapes[0].contains(p(100, 0)));
        assert!(shapes[0].contains(p(50, 9)));
        assert!(!shapes[0].contains(p(50, 20)));
        assert!(shapes[1].contains(p(100, 80)));
        // both shapes cover the shared corner
        assert!(shapes[0].contains(p(100, 0)));
        assert!(shapes[1].contains(p(100, 0)));
    }

    #[test]
    fn test_offset_shape_single_segment() {
        let poly = Polyline::two_point(p(0, 0), p(40, 0)).unwrap();
        let shape = poly.offset_shape(5, 0);
        assert_eq!(shape.dimension(), ShapeDim::Area);
        assert!(shape.contains(p(-5, 0)));
        assert!(shape.contains(p(45, 0)));
        assert!(shape.contains(p(20, 5)));
        assert!(!shape.contains(p(20, 6)));
    }

    #[test]
    fn test_offset_box() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0), p(100, 80)]).unwrap();
        assert_eq!(
            poly.offset_box(10, 0),
            TileBox::new(p(-10, -10), p(110, 10))
        );
    }

    #[test]
    fn test_combine_at_shared_end() {
        let a = Polyline::from_points(&[p(0, 0), p(100, 0)]).unwrap();
        let b = Polyline::from_points(&[p(100, 0), p(100, 80)]).unwrap();
        let combined = a.combine(&b);
        assert_eq!(combined.corner_count(), 3);
        assert_eq!(combined.first_corner(), Point::from(p(0, 0)));
        assert_eq!(combined.last_corner(), Point::from(p(100, 80)));
    }

    #[test]
    fn test_combine_without_shared_end_is_identity() {
        let a = Polyline::from_points(&[p(0, 0), p(100, 0)]).unwrap();
        let b = Polyline::from_points(&[p(500, 500), p(600, 500)]).unwrap();
        assert_eq!(a.combine(&b), a);
    }

    #[test]
    fn test_combine_reversed_other() {
        let a = Polyline::from_points(&[p(0, 0), p(100, 0)]).unwrap();
        let b = Polyline::from_points(&[p(100, 80), p(100, 0)]).unwrap();
        let combined = a.combine(&b);
        assert_eq!(combined.corner_count(), 3);
        assert_eq!(combined.last_corner(), Point::from(p(100, 80)));
    }

    #[test]
    fn test_split_in_the_middle() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0)]).unwrap();
        let end_line = Line::new(p(40, -10), p(40, 10));
        let [first, second] = poly.split(1, end_line).unwrap();
        assert_eq!(first.first_corner(), Point::from(p(0, 0)));
        assert_eq!(first.last_corner(), Point::from(p(40, 0)));
        assert_eq!(second.first_corner(), Point::from(p(40, 0)));
        assert_eq!(second.last_corner(), Point::from(p(100, 0)));
    }

    #[test]
    fn test_split_rejects_parallel_end_line() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0)]).unwrap();
        let end_line = Line::new(p(0, 5), p(100, 5));
        assert!(poly.split(1, end_line).is_none());
    }

    #[test]
    fn test_split_rejects_end_point_touch() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0)]).unwrap();
        let end_line = Line::new(p(0, -10), p(0, 10));
        assert!(poly.split(1, end_line).is_none());
    }

    #[test]
    fn test_split_at_point() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0), p(100, 80)]).unwrap();
        let [first, second] = poly.split_at_point(1, p(30, 0)).unwrap();
        assert_eq!(first.last_corner(), Point::from(p(30, 0)));
        assert_eq!(second.first_corner(), Point::from(p(30, 0)));
        assert_eq!(second.last_corner(), Point::from(p(100, 80)));
    }

    #[test]
    fn test_split_at_existing_corner_fails() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0), p(100, 80)]).unwrap();
        assert!(poly.split_at_point(1, p(100, 0)).is_none());
        assert!(poly.split_at_point(1, p(0, 0)).is_none());
    }

    #[test]
    fn test_shorten_last_segment() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0), p(100, 80)]).unwrap();
        let shortened = poly.shorten(poly.line_count(), 30.0).unwrap();
        assert_eq!(shortened.last_corner(), Point::from(p(100, 30)));
        assert_eq!(shortened.corner(1), Point::from(p(100, 0)));
    }

    #[test]
    fn test_contains_on_segment() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0), p(100, 80)]).unwrap();
        assert!(poly.contains(p(50, 0)));
        assert!(poly.contains(p(100, 40)));
        assert!(!poly.contains(p(50, 1)));
        assert!(!poly.contains(p(120, 0)));
    }

    #[test]
    fn test_nearest_point_and_distance() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0)]).unwrap();
        let nearest = poly.nearest_point_approx(FloatPoint::new(50.0, 30.0));
        approx::assert_abs_diff_eq!(nearest.x, 50.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(nearest.y, 0.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(poly.distance(FloatPoint::new(120.0, 0.0)), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_projection_line_perpendicular() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0)]).unwrap();
        let segment = poly.projection_line(p(50, 30)).unwrap();
        assert!(segment.middle.is_parallel(&Line::new(p(0, 0), p(0, 1))));
        assert!(segment.contains(p(50, 0)) || segment.contains(p(50, 30)));
    }

    #[test]
    fn test_projection_line_outside_segment() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0)]).unwrap();
        assert!(poly.projection_line(p(200, 30)).is_none());
    }

    #[test]
    fn test_is_orthogonal_and_45_degree() {
        let ortho = Polyline::from_points(&[p(0, 0), p(100, 0), p(100, 80)]).unwrap();
        assert!(ortho.is_orthogonal());
        let diag = Polyline::from_points(&[p(0, 0), p(50, 50)]).unwrap();
        assert!(!diag.is_orthogonal());
        assert!(diag.is_multiple_of_45_degree());
    }

    #[test]
    fn test_translate_by() {
        let poly = Polyline::from_points(&[p(0, 0), p(100, 0)]).unwrap();
        let moved = poly.translate_by(IntVector::new(5, 7));
        assert_eq!(moved.first_corner(), Point::from(p(5, 7)));
        assert_eq!(moved.last_corner(), Point::from(p(105, 7)));
    }

    #[test]
    fn test_dog_ear_cut_at_acute_bend() {
        // a hairpin: the offset shapes at the sharp bend must stay close
        // to their segments instead of poking far past the turn
        let poly =
            Polyline::from_points(&[p(0, 0), p(100, 0), p(0, 20)]).unwrap();
        let shapes = poly.offset_shapes(4);
        assert_eq!(shapes.len(), 2);
        for shape in &shapes {
            assert!(shape.dimension().is_area());
            // capped by the enlarged bounding octagon of the segment
            assert!(!shape.contains(p(150, 10)));
        }
    }
}
