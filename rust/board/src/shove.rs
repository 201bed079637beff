// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recursive trace shoving.
//!
//! A shove attempt runs in two phases over the same obstacle
//! classification. The check phase never mutates the board; the insert
//! phase commits displacements as it goes, so a failure there leaves the
//! board partially changed and is reported as fatal to the caller.
//!
//! Obstacles found by one query are all processed before the attempt
//! counts as cleared. Shovable traces are rerouted around the inserted
//! shape and recursively checked with a decremented trace budget; shovable
//! vias go through the drill item machinery in [`crate::move_drill`] with
//! the via budget. A budget of zero fails that branch immediately.

use shoveroute_planar::{FloatPoint, IntPoint, Polyline, Simplex, Tile};
use tracing::debug;

use crate::board::RoutingBoard;
use crate::item::{FixedState, Item, ItemId, ItemKind, LayerId, NetSet};
use crate::rules::ShoveDepths;
use crate::search_tree::SpatialIndex;
use crate::stoppable::TimeLimit;

/// The item and layer that stopped the most recent shove attempt.
/// Diagnostics only; control flow never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShoveFailure {
    pub item: ItemId,
    pub layer: LayerId,
}

/// Result of one shove phase, threaded through the recursion instead of
/// living in shared state, so nested attempts cannot overwrite each
/// other's diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShoveOutcome {
    Cleared,
    Blocked(Option<ShoveFailure>),
}

impl ShoveOutcome {
    pub fn is_cleared(&self) -> bool {
        matches!(self, ShoveOutcome::Cleared)
    }

    pub fn failure(&self) -> Option<ShoveFailure> {
        match self {
            ShoveOutcome::Cleared => None,
            ShoveOutcome::Blocked(failure) => *failure,
        }
    }
}

/// Which obstacle rules apply to the shape being inserted.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ObstacleMode {
    Trace,
    Drill { attach_allowed: bool },
}

impl ObstacleMode {
    fn is_obstacle(self, item: &Item, nets: &NetSet) -> bool {
        match self {
            ObstacleMode::Trace => item.is_trace_obstacle(nets),
            ObstacleMode::Drill { attach_allowed } => item.is_drill_obstacle(nets, attach_allowed),
        }
    }
}

impl RoutingBoard {
    /// Check phase: true when `shape` can be inserted on `layer` after
    /// displacing shovable obstacles within the given budgets. Does not
    /// mutate the board.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn shove_shape_check(
        &self,
        shape: &Tile,
        from_side: Option<FloatPoint>,
        layer: LayerId,
        nets: &NetSet,
        clearance_class: usize,
        mode: ObstacleMode,
        depths: &ShoveDepths,
        trace_depth: u32,
        via_depth: u32,
        ignore: &[ItemId],
        time_limit: &TimeLimit,
    ) -> ShoveOutcome {
        if time_limit.is_stop_requested() {
            return ShoveOutcome::Blocked(None);
        }
        if !self.contains_shape(shape) {
            return ShoveOutcome::Blocked(None);
        }
        let entries =
            self.tree
                .find_overlapping_with_clearance(shape, layer, &NetSet::empty(), clearance_class);
        let mut seen: Vec<ItemId> = Vec::new();
        for entry in entries {
            if ignore.contains(&entry.item) || seen.contains(&entry.item) {
                continue;
            }
            seen.push(entry.item);
            let Some(item) = self.items.get(&entry.item) else {
                continue;
            };
            if !mode.is_obstacle(item, nets) {
                continue;
            }
            let failure = Some(ShoveFailure {
                item: item.id,
                layer,
            });
            if !item.is_shovable() {
                return ShoveOutcome::Blocked(failure);
            }
            match &item.kind {
                ItemKind::Trace {
                    half_width,
                    ..
                } => {
                    if trace_depth == 0 {
                        return ShoveOutcome::Blocked(failure);
                    }
                    let Some(new_polyline) =
                        self.shoved_trace_polyline(item, shape, from_side, layer, clearance_class)
                    else {
                        return ShoveOutcome::Blocked(failure);
                    };
                    let compensated = half_width
                        + self.tree.clearance_compensation(item.clearance_class, layer);
                    let mut child_ignore = ignore.to_vec();
                    child_ignore.push(item.id);
                    for moved_shape in new_polyline.offset_shapes(compensated) {
                        let outcome = self.shove_shape_check(
                            &moved_shape,
                            from_side,
                            layer,
                            &item.nets,
                            item.clearance_class,
                            ObstacleMode::Trace,
                            depths,
                            trace_depth - 1,
                            via_depth,
                            &child_ignore,
                            time_limit,
                        );
                        if !outcome.is_cleared() {
                            return outcome;
                        }
                    }
                }
                ItemKind::Via { .. } => {
                    if via_depth == 0 {
                        return ShoveOutcome::Blocked(failure);
                    }
                    let mut child_ignore = ignore.to_vec();
                    child_ignore.push(item.id);
                    if !self.shove_via_check(
                        item,
                        shape,
                        layer,
                        clearance_class,
                        depths,
                        via_depth,
                        &child_ignore,
                        time_limit,
                    ) {
                        return ShoveOutcome::Blocked(failure);
                    }
                }
                _ => return ShoveOutcome::Blocked(failure),
            }
        }
        ShoveOutcome::Cleared
    }

    /// Commit phase: displaces shovable obstacles and updates the search
    /// tree. A blocked outcome here means the board was already partially
    /// mutated and the caller must undo.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn shove_shape_insert(
        &mut self,
        shape: &Tile,
        from_side: Option<FloatPoint>,
        layer: LayerId,
        nets: &NetSet,
        clearance_class: usize,
        mode: ObstacleMode,
        depths: &ShoveDepths,
        trace_depth: u32,
        via_depth: u32,
        ignore: &[ItemId],
    ) -> ShoveOutcome {
        let entries =
            self.tree
                .find_overlapping_with_clearance(shape, layer, &NetSet::empty(), clearance_class);
        let mut seen: Vec<ItemId> = Vec::new();
        for entry in entries {
            if ignore.contains(&entry.item) || seen.contains(&entry.item) {
                continue;
            }
            seen.push(entry.item);
            let Some(item) = self.items.get(&entry.item).cloned() else {
                continue;
            };
            if !mode.is_obstacle(&item, nets) {
                continue;
            }
            let failure = Some(ShoveFailure {
                item: item.id,
                layer,
            });
            if !item.is_shovable() {
                return ShoveOutcome::Blocked(failure);
            }
            match &item.kind {
                ItemKind::Trace { half_width, .. } => {
                    if trace_depth == 0 {
                        return ShoveOutcome::Blocked(failure);
                    }
                    let Some(new_polyline) =
                        self.shoved_trace_polyline(&item, shape, from_side, layer, clearance_class)
                    else {
                        return ShoveOutcome::Blocked(failure);
                    };
                    let compensated = half_width
                        + self.tree.clearance_compensation(item.clearance_class, layer);
                    let mut child_ignore = ignore.to_vec();
                    child_ignore.push(item.id);
                    for moved_shape in new_polyline.offset_shapes(compensated) {
                        let outcome = self.shove_shape_insert(
                            &moved_shape,
                            from_side,
                            layer,
                            &item.nets,
                            item.clearance_class,
                            ObstacleMode::Trace,
                            depths,
                            trace_depth - 1,
                            via_depth,
                            &child_ignore,
                        );
                        if !outcome.is_cleared() {
                            return outcome;
                        }
                    }
                    debug!(item = item.id.0, "shoving trace aside");
                    let mut moved = item.clone();
                    if let ItemKind::Trace { polyline, .. } = &mut moved.kind {
                        *polyline = new_polyline;
                    }
                    self.reinsert_item(moved);
                }
                ItemKind::Via { .. } => {
                    if via_depth == 0 {
                        return ShoveOutcome::Blocked(failure);
                    }
                    let mut child_ignore = ignore.to_vec();
                    child_ignore.push(item.id);
                    if !self.shove_via_insert(
                        &item,
                        shape,
                        layer,
                        clearance_class,
                        depths,
                        via_depth,
                        &child_ignore,
                    ) {
                        return ShoveOutcome::Blocked(failure);
                    }
                }
                _ => return ShoveOutcome::Blocked(failure),
            }
        }
        ShoveOutcome::Cleared
    }

    /// New centerline for an obstacle trace pushed out of `shape`, or
    /// `None` when the trace is trapped.
    fn shoved_trace_polyline(
        &self,
        obstacle: &Item,
        shape: &Tile,
        from_side: Option<FloatPoint>,
        layer: LayerId,
        clearance_class: usize,
    ) -> Option<Polyline> {
        let ItemKind::Trace {
            polyline,
            half_width,
            ..
        } = &obstacle.kind
        else {
            return None;
        };
        let clearance = self
            .rules
            .value(clearance_class, obstacle.clearance_class, layer);
        let avoid = shape
            .enlarge(f64::from(half_width + clearance + 1))
            .to_simplex();
        reroute_around(polyline, &avoid, from_side)
    }

    /// Reroutes the candidate polyline itself around short immovable
    /// obstacles instead of shoving them. Returns the (possibly unchanged)
    /// polyline, or `None` when an obstacle cannot be sprung over within
    /// the budget.
    pub(crate) fn spring_over_obstacles(
        &self,
        polyline: &Polyline,
        compensated_half_width: i32,
        layer: LayerId,
        nets: &NetSet,
        clearance_class: usize,
        depths: &ShoveDepths,
    ) -> Option<Polyline> {
        let mut current = polyline.clone();
        for _ in 0..depths.max_spring_over {
            let mut blocking: Option<(ItemId, Tile, usize)> = None;
            'shapes: for shape in current.offset_shapes(compensated_half_width) {
                let entries = self.tree.find_overlapping_with_clearance(
                    &shape,
                    layer,
                    &NetSet::empty(),
                    clearance_class,
                );
                for entry in entries {
                    let Some(item) = self.items.get(&entry.item) else {
                        continue;
                    };
                    if !item.is_trace_obstacle(nets) || item.is_shovable() {
                        continue;
                    }
                    // only shove fixed connection items are sprung over;
                    // harder obstacles are left for the check to report
                    if item.fixed_state != FixedState::ShoveFixed {
                        continue;
                    }
                    blocking = Some((
                        item.id,
                        item.shape(entry.shape_index),
                        item.clearance_class,
                    ));
                    break 'shapes;
                }
            }
            let Some((id, obstacle_shape, obstacle_class)) = blocking else {
                return Some(current);
            };
            let clearance = self.rules.value(clearance_class, obstacle_class, layer);
            let avoid = obstacle_shape
                .enlarge(f64::from(compensated_half_width + clearance + 1))
                .to_simplex();
            match reroute_around(&current, &avoid, None) {
                Some(rerouted) => {
                    debug!(obstacle = id.0, "springing over fixed obstacle");
                    current = rerouted;
                }
                None => return None,
            }
        }
        None
    }
}

#[derive(Clone, Copy)]
struct SegmentClip {
    t_enter: f64,
    enter_line: usize,
    t_exit: f64,
    exit_line: usize,
}

/// Clips the segment `a..b` against the interior of `avoid`. Returns the
/// overlapping parameter range with the border lines crossed at each end,
/// or `None` when the segment stays outside.
fn clip_segment(avoid: &Simplex, a: FloatPoint, b: FloatPoint) -> Option<SegmentClip> {
    let mut clip = SegmentClip {
        t_enter: 0.0,
        enter_line: usize::MAX,
        t_exit: 1.0,
        exit_line: usize::MAX,
    };
    for no in 0..avoid.border_line_count() {
        let line = avoid.border_line(no);
        let da = line.distance_signed(a);
        let db = line.distance_signed(b);
        if !da.is_finite() || !db.is_finite() {
            return None;
        }
        if da < 0.0 && db < 0.0 {
            return None;
        }
        if da >= 0.0 && db >= 0.0 {
            continue;
        }
        let t = da / (da - db);
        if da < 0.0 {
            if t > clip.t_enter {
                clip.t_enter = t;
                clip.enter_line = no;
            }
        } else if t < clip.t_exit {
            clip.t_exit = t;
            clip.exit_line = no;
        }
    }
    if clip.t_enter > clip.t_exit {
        return None;
    }
    Some(clip)
}

fn lerp(a: FloatPoint, b: FloatPoint, t: f64) -> FloatPoint {
    FloatPoint::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

fn chain_score(chain: &[IntPoint], from_side: Option<FloatPoint>) -> f64 {
    match from_side {
        Some(p) => chain
            .iter()
            .map(|c| p.distance(c.to_float()))
            .fold(f64::INFINITY, f64::min),
        None => f64::INFINITY,
    }
}

/// Detours `polyline` around the bounded convex region `avoid`. The part
/// of the polyline inside the region is replaced by a walk along the
/// region border; of the two possible walks the one farther away from
/// `from_side` is preferred, without a side preference the shorter one.
/// Returns `None` when an endpoint lies inside the region.
pub(crate) fn reroute_around(
    polyline: &Polyline,
    avoid: &Simplex,
    from_side: Option<FloatPoint>,
) -> Option<Polyline> {
    if !avoid.is_bounded() {
        return None;
    }
    let corner_count = polyline.corner_count();
    if avoid.contains(polyline.first_corner().round())
        || avoid.contains(polyline.last_corner().round())
    {
        return None;
    }

    let mut first: Option<(usize, SegmentClip)> = None;
    let mut last: Option<(usize, SegmentClip)> = None;
    for no in 0..corner_count - 1 {
        let a = polyline.corner_approx(no);
        let b = polyline.corner_approx(no + 1);
        if let Some(clip) = clip_segment(avoid, a, b) {
            if first.is_none() {
                first = Some((no, clip));
            }
            last = Some((no, clip));
        }
    }
    let (first_no, first_clip) = first?;
    let (last_no, last_clip) = last?;
    if first_clip.enter_line == usize::MAX || last_clip.exit_line == usize::MAX {
        return None;
    }

    let entry = lerp(
        polyline.corner_approx(first_no),
        polyline.corner_approx(first_no + 1),
        first_clip.t_enter,
    )
    .round();
    let exit = lerp(
        polyline.corner_approx(last_no),
        polyline.corner_approx(last_no + 1),
        last_clip.t_exit,
    )
    .round();

    let line_count = avoid.border_line_count();
    let enter_line = first_clip.enter_line;
    let exit_line = last_clip.exit_line;

    // border corners passed when walking with the border orientation
    let mut forward: Vec<IntPoint> = Vec::new();
    let mut no = (enter_line + 1) % line_count;
    while no != (exit_line + 1) % line_count {
        forward.push(avoid.corner(no));
        no = (no + 1) % line_count;
    }
    // and against it
    let mut backward: Vec<IntPoint> = Vec::new();
    let mut no = enter_line;
    while no != exit_line {
        backward.push(avoid.corner(no));
        no = (no + line_count - 1) % line_count;
    }

    let take_forward = match chain_score(&forward, from_side)
        .partial_cmp(&chain_score(&backward, from_side))
    {
        Some(std::cmp::Ordering::Greater) => true,
        Some(std::cmp::Ordering::Less) => false,
        _ => forward.len() <= backward.len(),
    };
    let chain = if take_forward { forward } else { backward };

    let mut points: Vec<IntPoint> = Vec::new();
    for no in 0..=first_no {
        points.push(polyline.corner(no).round());
    }
    points.push(entry);
    points.extend(chain);
    points.push(exit);
    for no in last_no + 1..corner_count {
        points.push(polyline.corner(no).round());
    }
    Polyline::from_points(&points).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoveroute_planar::{IntPoint, TileBox};

    fn avoid_box(ll: (i32, i32), ur: (i32, i32)) -> Simplex {
        TileBox::new(IntPoint::new(ll.0, ll.1), IntPoint::new(ur.0, ur.1)).to_simplex()
    }

    #[test]
    fn test_clip_crossing_segment() {
        let avoid = avoid_box((0, -10), (100, 10));
        let clip = clip_segment(
            &avoid,
            FloatPoint::new(-50.0, 0.0),
            FloatPoint::new(150.0, 0.0),
        )
        .unwrap();
        approx::assert_abs_diff_eq!(clip.t_enter, 0.25, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(clip.t_exit, 0.75, epsilon = 1e-9);
        assert_ne!(clip.enter_line, usize::MAX);
        assert_ne!(clip.exit_line, usize::MAX);
    }

    #[test]
    fn test_clip_outside_segment() {
        let avoid = avoid_box((0, -10), (100, 10));
        assert!(clip_segment(
            &avoid,
            FloatPoint::new(-50.0, 50.0),
            FloatPoint::new(150.0, 50.0),
        )
        .is_none());
    }

    #[test]
    fn test_reroute_straight_line_around_box() {
        let avoid = avoid_box((40, -20), (60, 20));
        let trace =
            Polyline::two_point(IntPoint::new(0, 0), IntPoint::new(100, 0)).unwrap();
        let rerouted =
            reroute_around(&trace, &avoid, Some(FloatPoint::new(50.0, -100.0))).unwrap();

        // detour goes over the top, away from the from side
        assert!(rerouted.corner_count() > 2);
        assert_eq!(rerouted.first_corner().round(), IntPoint::new(0, 0));
        assert_eq!(rerouted.last_corner().round(), IntPoint::new(100, 0));
        let top = (0..rerouted.corner_count())
            .map(|no| rerouted.corner_approx(no).y)
            .fold(f64::MIN, f64::max);
        assert!(top >= 20.0);
        let bottom = (0..rerouted.corner_count())
            .map(|no| rerouted.corner_approx(no).y)
            .fold(f64::MAX, f64::min);
        assert!(bottom >= -1.0);
    }

    #[test]
    fn test_reroute_prefers_other_side() {
        let avoid = avoid_box((40, -20), (60, 20));
        let trace =
            Polyline::two_point(IntPoint::new(0, 0), IntPoint::new(100, 0)).unwrap();
        let rerouted =
            reroute_around(&trace, &avoid, Some(FloatPoint::new(50.0, 100.0))).unwrap();
        let bottom = (0..rerouted.corner_count())
            .map(|no| rerouted.corner_approx(no).y)
            .fold(f64::MAX, f64::min);
        assert!(bottom <= -20.0);
    }

    #[test]
    fn test_reroute_trapped_endpoint() {
        let avoid = avoid_box((40, -20), (60, 20));
        let trace =
            Polyline::two_point(IntPoint::new(50, 0), IntPoint::new(200, 0)).unwrap();
        assert!(reroute_around(&trace, &avoid, None).is_none());
    }

    #[test]
    fn test_reroute_untouched_polyline() {
        let avoid = avoid_box((40, 50), (60, 90));
        let trace =
            Polyline::two_point(IntPoint::new(0, 0), IntPoint::new(100, 0)).unwrap();
        assert!(reroute_around(&trace, &avoid, None).is_none());
    }
}
