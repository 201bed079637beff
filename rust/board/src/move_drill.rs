// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shoving drill items (vias and pads).
//!
//! A via in the way of an insertion is pushed to a new center computed by
//! projecting the current center onto the border of the enlarged obstacle
//! shape. `try_shove_via_points` computes one candidate, or four under the
//! extended check used by the shove flow, sorted nearest first, but the
//! calling loop only ever tries candidate 0; the remaining candidates are
//! reserved for a future exhaustive mode and skipping them must not be
//! "fixed" silently, since trying all of them changes shove outcomes on
//! existing boards.

use shoveroute_planar::{IntPoint, IntVector, Tile};
use tracing::debug;

use crate::board::RoutingBoard;
use crate::item::{FixedState, Item, ItemId, ItemKind, LayerId};
use crate::rules::ShoveDepths;
use crate::search_tree::SpatialIndex;
use crate::shove::ObstacleMode;
use crate::stoppable::TimeLimit;

fn drill_center(item: &Item) -> Option<IntPoint> {
    match &item.kind {
        ItemKind::Via { center, .. } | ItemKind::Pad { center, .. } => Some(*center),
        _ => None,
    }
}

fn attach_allowed(item: &Item) -> bool {
    match &item.kind {
        ItemKind::Via { attach_allowed, .. } => *attach_allowed,
        _ => false,
    }
}

impl RoutingBoard {
    /// Candidate new centers that move `via` out of `obstacle_shape`.
    /// Octagon representable obstacles use the cheap border projection;
    /// the general case pushes the enlarged via shape out through the
    /// nearest border lines.
    pub(crate) fn try_shove_via_points(
        &self,
        obstacle_shape: &Tile,
        layer: LayerId,
        via: &Item,
        shape_clearance_class: usize,
        extended_check: bool,
    ) -> Vec<IntPoint> {
        let Some(center) = drill_center(via) else {
            return Vec::new();
        };
        let Some(via_shape) = via.shape_on_layer(layer) else {
            return Vec::new();
        };
        let compensated = self.tree.is_clearance_compensation_used();
        let clearance = self
            .rules
            .value(via.clearance_class, shape_clearance_class, layer);
        let count = if extended_check { 4 } else { 1 };

        if obstacle_shape.is_box() || obstacle_shape.is_octagon() {
            let mut shove_distance = 0.5 * via_shape.bounding_box().max_width();
            if !compensated {
                shove_distance += f64::from(clearance);
            }
            shove_distance += 2.0;
            return obstacle_shape
                .bounding_octagon()
                .enlarge(shove_distance)
                .nearest_border_projections(center, count);
        }

        let border_tolerance = if compensated {
            2.0
        } else {
            0.5 * f64::from(clearance) + 2.0
        };
        let check_shape = if compensated {
            via_shape
        } else {
            via_shape.enlarge(0.5 * f64::from(clearance))
        };
        self.tree_obstacle_deltas(obstacle_shape, border_tolerance, &check_shape, count)
            .into_iter()
            .map(|delta| center.translate_by(delta))
            .collect()
    }

    fn tree_obstacle_deltas(
        &self,
        obstacle_shape: &Tile,
        border_tolerance: f64,
        check_shape: &Tile,
        count: usize,
    ) -> Vec<IntVector> {
        obstacle_shape
            .enlarge(border_tolerance)
            .nearest_relative_outside_locations(check_shape, count)
            .into_iter()
            .map(|delta| {
                let rounded = delta.round();
                IntVector::new(rounded.x, rounded.y)
            })
            .collect()
    }

    /// Check phase of pushing `via` out of `obstacle_shape`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn shove_via_check(
        &self,
        via: &Item,
        obstacle_shape: &Tile,
        layer: LayerId,
        shape_clearance_class: usize,
        depths: &ShoveDepths,
        via_depth: u32,
        ignore: &[ItemId],
        time_limit: &TimeLimit,
    ) -> bool {
        let Some(center) = drill_center(via) else {
            return false;
        };
        let Some(via_shape) = via.shape_on_layer(layer) else {
            return false;
        };
        let candidates =
            self.try_shove_via_points(obstacle_shape, layer, via, shape_clearance_class, true);
        let shape_radius = 0.5 * obstacle_shape.bounding_box().min_width();
        let max_dist = 0.5 * via_shape.bounding_box().max_width() + shape_radius;
        for (index, candidate) in candidates.iter().enumerate() {
            if index != 0 {
                // see the module doc; only the nearest candidate is tried
                continue;
            }
            if center.to_float().distance(candidate.to_float()) > max_dist {
                continue;
            }
            let delta = candidate.difference_by(center);
            if self.check_move_drill(via.id, delta, depths, via_depth - 1, ignore, time_limit) {
                return true;
            }
        }
        false
    }

    /// Commit phase of pushing `via` out of `obstacle_shape`. False means
    /// the board may already be partially mutated.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn shove_via_insert(
        &mut self,
        via: &Item,
        obstacle_shape: &Tile,
        layer: LayerId,
        shape_clearance_class: usize,
        depths: &ShoveDepths,
        via_depth: u32,
        ignore: &[ItemId],
    ) -> bool {
        let Some(center) = drill_center(via) else {
            return false;
        };
        let Some(via_shape) = via.shape_on_layer(layer) else {
            return false;
        };
        let candidates =
            self.try_shove_via_points(obstacle_shape, layer, via, shape_clearance_class, true);
        let shape_radius = 0.5 * obstacle_shape.bounding_box().min_width();
        let max_dist = 0.5 * via_shape.bounding_box().max_width() + shape_radius;
        for (index, candidate) in candidates.iter().enumerate() {
            if index != 0 {
                continue;
            }
            if center.to_float().distance(candidate.to_float()) > max_dist {
                continue;
            }
            let delta = candidate.difference_by(center);
            debug!(via = via.id.0, dx = delta.x, dy = delta.y, "shoving via");
            if self.insert_move_drill(via.id, delta, depths, via_depth - 1, ignore) {
                return true;
            }
            return false;
        }
        false
    }

    /// True when the drill item can be moved by `vector` after shoving
    /// obstacles aside within the budgets. No board mutation.
    pub(crate) fn check_move_drill(
        &self,
        id: ItemId,
        vector: IntVector,
        depths: &ShoveDepths,
        via_depth: u32,
        ignore: &[ItemId],
        time_limit: &TimeLimit,
    ) -> bool {
        if time_limit.is_stop_requested() {
            return false;
        }
        let Some(item) = self.items.get(&id) else {
            return false;
        };
        if !item.is_drill_item() || item.fixed_state >= FixedState::ShoveFixed {
            return false;
        }
        let from_side = drill_center(item).map(|c| c.to_float());
        let mode = ObstacleMode::Drill {
            attach_allowed: attach_allowed(item),
        };
        let mut child_ignore = ignore.to_vec();
        child_ignore.push(id);
        for no in 0..item.shape_count() {
            let layer = item.shape_layer(no);
            let translated = item.shape(no).translate_by(vector);
            if !self.contains_shape(&translated) {
                return false;
            }
            let outcome = self.shove_shape_check(
                &translated,
                from_side,
                layer,
                &item.nets,
                item.clearance_class,
                mode,
                depths,
                depths.max_trace,
                via_depth,
                &child_ignore,
                time_limit,
            );
            if !outcome.is_cleared() {
                return false;
            }
        }
        true
    }

    /// Moves the drill item by `vector`, shoving obstacles out of the
    /// target position first. False is fatal; the board may be partially
    /// mutated.
    pub(crate) fn insert_move_drill(
        &mut self,
        id: ItemId,
        vector: IntVector,
        depths: &ShoveDepths,
        via_depth: u32,
        ignore: &[ItemId],
    ) -> bool {
        let Some(item) = self.items.get(&id).cloned() else {
            return false;
        };
        let from_side = drill_center(&item).map(|c| c.to_float());
        let mode = ObstacleMode::Drill {
            attach_allowed: attach_allowed(&item),
        };
        let mut child_ignore = ignore.to_vec();
        child_ignore.push(id);
        for no in 0..item.shape_count() {
            let layer = item.shape_layer(no);
            let translated = item.shape(no).translate_by(vector);
            let outcome = self.shove_shape_insert(
                &translated,
                from_side,
                layer,
                &item.nets,
                item.clearance_class,
                mode,
                depths,
                depths.max_trace,
                via_depth,
                &child_ignore,
            );
            if !outcome.is_cleared() {
                return false;
            }
        }
        let mut moved = item;
        moved.translate_by(vector);
        self.reinsert_item(moved);
        true
    }
}

#[cfg(test)]
mod tests {
    use shoveroute_planar::TileBox;

    use super::*;
    use crate::item::NetSet;
    use crate::rules::ClearanceMatrix;

    #[test]
    fn test_extended_check_keeps_nearest_candidate_first() {
        let mut board = RoutingBoard::new(
            TileBox::new(IntPoint::new(-10_000, -10_000), IntPoint::new(10_000, 10_000)),
            2,
            ClearanceMatrix::uniform(2, 10),
        );
        let id = board.insert_item(
            ItemKind::Via {
                center: IntPoint::new(500, 30),
                radius_on_layer: vec![20, 20],
                first_layer: 0,
                last_layer: 1,
                attach_allowed: false,
            },
            NetSet::single(2),
            0,
            FixedState::Unfixed,
        );
        let via = board.item(id).unwrap().clone();
        let obstacle = Tile::Box(TileBox::new(IntPoint::new(0, -5), IntPoint::new(1000, 5)));
        let single = board.try_shove_via_points(&obstacle, 0, &via, 0, false);
        let extended = board.try_shove_via_points(&obstacle, 0, &via, 0, true);
        assert_eq!(single.len(), 1);
        assert!(extended.len() >= 2);
        // the extra candidates only extend the list, the nearest stays first
        assert_eq!(extended[0], single[0]);
    }
}
