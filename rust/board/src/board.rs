// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The routing board: item store, search tree and the public insert,
//! check and move operations of the shove engine.
//!
//! Every public operation first clears the stored diagnostic failure,
//! then runs check and commit phases over the same obstacle
//! classification. Blocked checks are ordinary results; only a commit
//! failure after partial mutation surfaces as [`BoardError::NeedsUndo`],
//! and recovering from that is the caller's undo log's job.

use rustc_hash::FxHashMap;
use shoveroute_planar::{FloatPoint, IntPoint, IntVector, Point, Polyline, Tile, TileBox};
use tracing::{debug, warn};

use crate::error::{BoardError, Result};
use crate::item::{FixedState, Item, ItemId, ItemKind, LayerId, NetSet};
use crate::rules::{ClearanceMatrix, ShoveDepths};
use crate::search_tree::{ShapeSearchTree, SpatialIndex, TreeEntry};
use crate::shove::{ObstacleMode, ShoveFailure, ShoveOutcome};
use crate::stoppable::TimeLimit;

pub struct RoutingBoard {
    pub(crate) items: FxHashMap<ItemId, Item>,
    pub(crate) tree: ShapeSearchTree,
    pub(crate) rules: ClearanceMatrix,
    pub bounding_box: TileBox,
    pub layer_count: usize,
    next_id: u32,
    pub(crate) last_failure: Option<ShoveFailure>,
    min_trace_half_width: i32,
    max_trace_half_width: i32,
}

impl RoutingBoard {
    pub fn new(bounding_box: TileBox, layer_count: usize, rules: ClearanceMatrix) -> Self {
        RoutingBoard {
            items: FxHashMap::default(),
            tree: ShapeSearchTree::new(layer_count, rules.clone()),
            rules,
            bounding_box,
            layer_count,
            next_id: 1,
            last_failure: None,
            min_trace_half_width: 0,
            max_trace_half_width: 0,
        }
    }

    /// A board whose search tree stores clearance compensated shapes.
    pub fn new_compensated(
        bounding_box: TileBox,
        layer_count: usize,
        rules: ClearanceMatrix,
        compensation_class: usize,
    ) -> Self {
        let tree = ShapeSearchTree::new_compensated(layer_count, rules.clone(), compensation_class);
        RoutingBoard {
            items: FxHashMap::default(),
            tree,
            rules,
            bounding_box,
            layer_count,
            next_id: 1,
            last_failure: None,
            min_trace_half_width: 0,
            max_trace_half_width: 0,
        }
    }

    // ------------------------------------------------------------------
    // item store

    pub fn insert_item(
        &mut self,
        kind: ItemKind,
        nets: NetSet,
        clearance_class: usize,
        fixed_state: FixedState,
    ) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        if let ItemKind::Trace { half_width, .. } = &kind {
            if self.min_trace_half_width == 0 || *half_width < self.min_trace_half_width {
                self.min_trace_half_width = *half_width;
            }
            self.max_trace_half_width = self.max_trace_half_width.max(*half_width);
        }
        let item = Item {
            id,
            kind,
            nets,
            clearance_class,
            fixed_state,
        };
        self.tree.insert(&item);
        self.items.insert(id, item);
        id
    }

    pub fn remove_item(&mut self, id: ItemId) -> Option<Item> {
        self.tree.remove(id);
        self.items.remove(&id)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn last_failure(&self) -> Option<ShoveFailure> {
        self.last_failure
    }

    pub fn min_trace_half_width(&self) -> i32 {
        self.min_trace_half_width.max(1)
    }

    pub fn max_trace_half_width(&self) -> i32 {
        self.max_trace_half_width.max(1)
    }

    pub(crate) fn reinsert_item(&mut self, item: Item) {
        self.tree.reinsert_after_geometry_change(&item);
        self.items.insert(item.id, item);
    }

    pub(crate) fn contains_shape(&self, shape: &Tile) -> bool {
        let bb = shape.bounding_box();
        bb.ll.x >= self.bounding_box.ll.x
            && bb.ll.y >= self.bounding_box.ll.y
            && bb.ur.x <= self.bounding_box.ur.x
            && bb.ur.y <= self.bounding_box.ur.y
    }

    fn record_outcome(&mut self, outcome: &ShoveOutcome) {
        if let Some(failure) = outcome.failure() {
            self.last_failure = Some(failure);
        }
    }

    // ------------------------------------------------------------------
    // queries

    pub fn overlapping_items(&self, shape: &Tile, layer: LayerId) -> Vec<ItemId> {
        dedup_items(self.tree.find_overlapping(shape, layer, &NetSet::empty()))
    }

    pub fn overlapping_items_with_clearance(
        &self,
        shape: &Tile,
        layer: LayerId,
        clearance_class: usize,
        exclude_nets: &NetSet,
    ) -> Vec<ItemId> {
        dedup_items(self.tree.find_overlapping_with_clearance(
            shape,
            layer,
            exclude_nets,
            clearance_class,
        ))
    }

    /// Items whose shapes contain `location` on `layer`.
    pub fn pick_items(&self, location: IntPoint, layer: LayerId) -> Vec<ItemId> {
        let probe = Tile::Box(TileBox::from_point(location));
        self.overlapping_items(&probe, layer)
    }

    /// The routing item (trace or via) nearest to `location` on `layer`.
    pub fn pick_nearest_routing_item(
        &self,
        location: FloatPoint,
        layer: LayerId,
    ) -> Option<ItemId> {
        let mut best: Option<(f64, ItemId)> = None;
        let mut ids: Vec<ItemId> = self.items.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let item = &self.items[&id];
            if !item.is_route() {
                continue;
            }
            let distance = match &item.kind {
                ItemKind::Trace {
                    polyline,
                    layer: trace_layer,
                    ..
                } => {
                    if *trace_layer != layer {
                        continue;
                    }
                    polyline.distance(location)
                }
                ItemKind::Via {
                    center,
                    first_layer,
                    last_layer,
                    ..
                } => {
                    if layer < *first_layer || layer > *last_layer {
                        continue;
                    }
                    center.to_float().distance(location)
                }
                _ => continue,
            };
            if best.map_or(true, |(best_distance, _)| distance < best_distance) {
                best = Some((distance, id));
            }
        }
        best.map(|(_, id)| id)
    }

    fn pick_one_trace(
        &self,
        from_corner: IntPoint,
        layer: LayerId,
        nets: &NetSet,
        half_width: i32,
        clearance_class: usize,
    ) -> Option<ItemId> {
        for id in self.pick_items(from_corner, layer) {
            let item = &self.items[&id];
            let ItemKind::Trace {
                half_width: item_half_width,
                ..
            } = &item.kind
            else {
                continue;
            };
            if item.nets != *nets
                || *item_half_width != half_width
                || item.clearance_class != clearance_class
            {
                continue;
            }
            return Some(id);
        }
        None
    }

    /// Number of items of a shared net whose shapes contain `corner` on
    /// `layer`, not counting the items in `exclude`.
    fn contact_count_at(
        &self,
        exclude: &[ItemId],
        nets: &NetSet,
        corner: IntPoint,
        layer: LayerId,
    ) -> usize {
        let probe = Tile::Box(TileBox::from_point(corner));
        self.overlapping_items(&probe, layer)
            .into_iter()
            .filter(|id| !exclude.contains(id) && self.items[id].nets.shares_any(nets))
            .count()
    }

    /// An end corner of the trace with no contact, when the trace is a
    /// stub that connects nothing at that end.
    pub fn get_trace_tail(&self, id: ItemId) -> Option<Point> {
        let item = self.items.get(&id)?;
        let ItemKind::Trace {
            polyline, layer, ..
        } = &item.kind
        else {
            return None;
        };
        for corner in [polyline.first_corner(), polyline.last_corner()] {
            if self.contact_count_at(&[id], &item.nets, corner.round(), *layer) == 0 {
                return Some(corner);
            }
        }
        None
    }

    /// Removes unfixed stub traces of the given nets ending at `location`,
    /// following chains of stubs outward.
    pub fn remove_trace_tails_at(
        &mut self,
        location: IntPoint,
        layer: LayerId,
        nets: &NetSet,
        exclude: &[ItemId],
    ) {
        loop {
            let mut target: Option<(ItemId, IntPoint)> = None;
            for id in self.pick_items(location, layer) {
                if exclude.contains(&id) {
                    continue;
                }
                let item = &self.items[&id];
                if item.fixed_state != FixedState::Unfixed || !item.nets.shares_any(nets) {
                    continue;
                }
                let ItemKind::Trace {
                    polyline,
                    layer: trace_layer,
                    ..
                } = &item.kind
                else {
                    continue;
                };
                if *trace_layer != layer {
                    continue;
                }
                let first = polyline.first_corner().round();
                let last = polyline.last_corner().round();
                let other_end = if first == location {
                    last
                } else if last == location {
                    first
                } else {
                    continue;
                };
                // still connected at this end to something not excluded
                let mut contact_exclude = exclude.to_vec();
                contact_exclude.push(id);
                if self.contact_count_at(&contact_exclude, &item.nets, location, layer) > 0 {
                    continue;
                }
                target = Some((id, other_end));
                break;
            }
            let Some((id, other_end)) = target else {
                return;
            };
            let nets = self.items[&id].nets.clone();
            debug!(item = id.0, "removing trace tail");
            self.remove_item(id);
            self.remove_trace_tails_at(other_end, layer, &nets, exclude);
        }
    }

    /// Joins pairs of unfixed traces of `net` that meet alone at a shared
    /// end corner into single traces.
    pub fn combine_traces(&mut self, net: i32) {
        loop {
            let mut ids: Vec<ItemId> = self
                .items
                .values()
                .filter(|item| {
                    item.is_trace()
                        && item.fixed_state == FixedState::Unfixed
                        && item.nets.contains(net)
                })
                .map(|item| item.id)
                .collect();
            ids.sort_unstable();
            let Some(pair) = self.find_combinable_pair(&ids) else {
                return;
            };
            let (keep, absorb) = pair;
            let (Some(keep_item), Some(absorb_item)) =
                (self.items.get(&keep), self.items.get(&absorb))
            else {
                return;
            };
            let (ItemKind::Trace { polyline: keep_polyline, .. },
                ItemKind::Trace { polyline: absorb_polyline, .. }) =
                (&keep_item.kind, &absorb_item.kind)
            else {
                return;
            };
            let combined = keep_polyline.combine(absorb_polyline);
            if combined.line_count() <= keep_polyline.line_count() {
                return;
            }
            debug!(keep = keep.0, absorb = absorb.0, "combining traces");
            let mut updated = keep_item.clone();
            if let ItemKind::Trace { polyline, .. } = &mut updated.kind {
                *polyline = combined;
            }
            self.remove_item(absorb);
            self.reinsert_item(updated);
        }
    }

    fn find_combinable_pair(&self, ids: &[ItemId]) -> Option<(ItemId, ItemId)> {
        for (no, first) in ids.iter().enumerate() {
            let first_item = &self.items[first];
            let ItemKind::Trace {
                polyline: first_polyline,
                half_width,
                layer,
            } = &first_item.kind
            else {
                continue;
            };
            for second in &ids[no + 1..] {
                let second_item = &self.items[second];
                let ItemKind::Trace {
                    polyline: second_polyline,
                    half_width: second_half_width,
                    layer: second_layer,
                } = &second_item.kind
                else {
                    continue;
                };
                if layer != second_layer
                    || half_width != second_half_width
                    || first_item.clearance_class != second_item.clearance_class
                {
                    continue;
                }
                let shared = shared_end_corner(first_polyline, second_polyline);
                let Some(corner) = shared else {
                    continue;
                };
                // only join where nothing else ends at the corner
                if self.contact_count_at(&[*first], &first_item.nets, corner, *layer) != 1 {
                    continue;
                }
                return Some((*first, *second));
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // checks

    /// True when all tiles can be placed on `layer` without a clearance
    /// violation against a trace obstacle of foreign nets.
    pub fn check_shape(
        &self,
        tiles: &[Tile],
        layer: LayerId,
        nets: &NetSet,
        clearance_class: usize,
    ) -> bool {
        for tile in tiles {
            if !self.contains_shape(tile) {
                return false;
            }
            let entries = self.tree.find_overlapping_with_clearance(
                tile,
                layer,
                &NetSet::empty(),
                clearance_class,
            );
            for entry in entries {
                let Some(item) = self.items.get(&entry.item) else {
                    continue;
                };
                if item.is_trace_obstacle(nets) {
                    return false;
                }
            }
        }
        true
    }

    /// Pure check whether a polyline trace fits; same classification as
    /// the insert path, so a cleared check guarantees a clean insert on an
    /// unchanged board.
    pub fn check_trace_polyline(
        &self,
        polyline: &Polyline,
        half_width: i32,
        layer: LayerId,
        nets: &NetSet,
        clearance_class: usize,
    ) -> bool {
        let compensated = half_width + self.tree.clearance_compensation(clearance_class, layer);
        let shapes = polyline.offset_shapes(compensated);
        self.check_shape(&shapes, layer, nets, clearance_class)
    }

    /// Maximal unobstructed length along the segment from `from` towards
    /// `to`, the "ok length": the projection of the nearest obstacle
    /// intersection point minus half width, clearance and one unit of
    /// tolerance. Infinity when nothing is in the way.
    #[allow(clippy::too_many_arguments)]
    pub fn check_trace_segment(
        &self,
        from: FloatPoint,
        to: FloatPoint,
        layer: LayerId,
        nets: &NetSet,
        half_width: i32,
        clearance_class: usize,
        ignore: &[ItemId],
    ) -> f64 {
        let from_corner = from.round();
        let to_corner = to.round();
        if from_corner == to_corner {
            return 0.0;
        }
        let Ok(polyline) = Polyline::two_point(from_corner, to_corner) else {
            return 0.0;
        };
        let compensated = half_width + self.tree.clearance_compensation(clearance_class, layer);
        let shape = polyline.offset_shape(compensated, 0);
        let entries = self.tree.find_overlapping_with_clearance(
            &shape,
            layer,
            &NetSet::empty(),
            clearance_class,
        );
        let segment_length = from.distance(to);
        let mut ok_length = f64::INFINITY;
        for entry in entries {
            if ignore.contains(&entry.item) {
                continue;
            }
            let Some(item) = self.items.get(&entry.item) else {
                continue;
            };
            if !item.is_trace_obstacle(nets) {
                continue;
            }
            let base = item.shape(entry.shape_index);
            let (obstacle_shape, shorten_value) = if self.tree.is_clearance_compensation_used() {
                let compensation = self
                    .tree
                    .clearance_compensation(item.clearance_class, layer);
                (
                    base.enlarge(f64::from(compensation)),
                    f64::from(half_width + self.tree.clearance_compensation(clearance_class, layer)),
                )
            } else {
                let clearance = self.rules.value(clearance_class, item.clearance_class, layer);
                (
                    base.offset(f64::from(clearance)),
                    f64::from(half_width + clearance),
                )
            };
            let intersection = shape.intersection(&obstacle_shape);
            if intersection.is_empty() {
                continue;
            }
            let nearest = nearest_point_on_tile(&intersection, from);
            let mut projection = from.scalar_product(to, nearest) / segment_length;
            projection = (projection - shorten_value - 1.0).max(0.0);
            ok_length = ok_length.min(projection);
            if ok_length <= 0.0 {
                return 0.0;
            }
        }
        ok_length
    }

    /// Whether the drill item could be moved by `vector` without any
    /// shoving at all.
    pub fn check_item_move(&self, id: ItemId, vector: IntVector, ignore: &[ItemId]) -> bool {
        let Some(item) = self.items.get(&id) else {
            return false;
        };
        if !item.is_drill_item() || item.fixed_state >= FixedState::ShoveFixed {
            return false;
        }
        if item.nets.as_slice().len() > 1 {
            return false;
        }
        let attach = matches!(&item.kind, ItemKind::Via { attach_allowed: true, .. });
        for no in 0..item.shape_count() {
            let layer = item.shape_layer(no);
            let translated = item.shape(no).translate_by(vector);
            if !self.contains_shape(&translated) {
                return false;
            }
            let entries = self.tree.find_overlapping_with_clearance(
                &translated,
                layer,
                &item.nets,
                item.clearance_class,
            );
            for entry in entries {
                if entry.item == id || ignore.contains(&entry.item) {
                    continue;
                }
                let Some(other) = self.items.get(&entry.item) else {
                    continue;
                };
                if other.is_drill_obstacle(&item.nets, attach) {
                    return false;
                }
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // shove operations

    /// Inserts a trace, shoving obstacle traces and vias aside. Returns
    /// the last corner up to which routing succeeded; the start corner
    /// when nothing could be inserted. `Err` means the board was left
    /// partially mutated and must be undone.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_trace(
        &mut self,
        polyline: &Polyline,
        half_width: i32,
        layer: LayerId,
        nets: &NetSet,
        clearance_class: usize,
        depths: ShoveDepths,
        with_check: bool,
        time_limit: &TimeLimit,
    ) -> Result<Point> {
        self.last_failure = None;

        let from_corner_point = polyline.first_corner();
        if from_corner_point.is_rational() {
            warn!("insert_trace: rational start corner");
            return Err(BoardError::InvalidItem("rational trace start corner".into()));
        }
        let from_corner = from_corner_point.round();
        let to_corner_point = polyline.last_corner();
        if to_corner_point.is_rational() {
            warn!("insert_trace: rational end corner");
            return Ok(from_corner_point);
        }
        if from_corner_point == to_corner_point {
            return Ok(to_corner_point);
        }

        let picked = self.pick_one_trace(from_corner, layer, nets, half_width, clearance_class);
        let compensated = half_width + self.tree.clearance_compensation(clearance_class, layer);

        let Some(mut new_polyline) = self.spring_over_obstacles(
            polyline,
            compensated,
            layer,
            nets,
            clearance_class,
            &depths,
        ) else {
            return Ok(from_corner_point);
        };

        let picked_polyline = picked.and_then(|id| match &self.items[&id].kind {
            ItemKind::Trace { polyline, .. } => Some(polyline.clone()),
            _ => None,
        });
        let mut combined = match &picked_polyline {
            // the picked trace cuts dog ears off the first check shapes
            Some(other) => new_polyline.combine(other),
            None => new_polyline.clone(),
        };
        let start_shape_no = combined.line_count() - new_polyline.line_count();
        let mut trace_shapes = combined.offset_shapes(compensated);
        let trace_shapes: Vec<Tile> = trace_shapes.split_off(start_shape_no.min(trace_shapes.len()));

        let trace_shapes_count = trace_shapes.len();
        let mut last_shape_no = trace_shapes_count;
        for (index, shape) in trace_shapes.iter().enumerate() {
            let from_side = combined.corner_approx(start_shape_no + index);
            if with_check {
                let outcome = self.shove_shape_check(
                    shape,
                    Some(from_side),
                    layer,
                    nets,
                    clearance_class,
                    ObstacleMode::Trace,
                    &depths,
                    depths.max_trace,
                    depths.max_via,
                    &[],
                    time_limit,
                );
                if !outcome.is_cleared() {
                    self.record_outcome(&outcome);
                    last_shape_no = index;
                    break;
                }
            }
            let outcome = self.shove_shape_insert(
                shape,
                Some(from_side),
                layer,
                nets,
                clearance_class,
                ObstacleMode::Trace,
                &depths,
                depths.max_trace,
                depths.max_via,
                &[],
            );
            if !outcome.is_cleared() {
                self.record_outcome(&outcome);
                return Err(BoardError::NeedsUndo(outcome.failure()));
            }
        }

        let mut new_corner = to_corner_point.round();
        if last_shape_no < trace_shapes_count {
            // the shove at last_shape_no failed; sample the failing
            // segment down to a shorter shove distance and try once more
            let sample_width = 2 * self.min_trace_half_width();
            let last_corner = new_polyline.corner_approx(last_shape_no + 1);
            let prev_last_corner = new_polyline.corner_approx(last_shape_no);
            let last_segment_length = last_corner.distance(prev_last_corner);
            if last_segment_length > f64::from(100 * sample_width) {
                // too many cycles to sample
                return Ok(from_corner_point);
            }
            let mut last_trace_shape = trace_shapes[last_shape_no].clone();
            let mut from_side = combined.corner_approx(start_shape_no + last_shape_no);
            if last_segment_length > f64::from(sample_width) {
                let target_line_count =
                    new_polyline.line_count() - (trace_shapes_count - last_shape_no - 1);
                let Some(shortened) =
                    new_polyline.shorten(target_line_count, f64::from(sample_width))
                else {
                    return Ok(from_corner_point);
                };
                new_polyline = shortened;
                let last_point = new_polyline.last_corner();
                if last_point.is_rational() {
                    warn!("insert_trace: rational corner after shortening");
                    return Ok(from_corner_point);
                }
                new_corner = last_point.round();
                combined = match &picked_polyline {
                    Some(other) => new_polyline.combine(other),
                    None => new_polyline.clone(),
                };
                let shape_index = combined.line_count() - 3;
                last_trace_shape = combined.offset_shape(compensated, shape_index);
                from_side = combined.corner_approx(shape_index);
            }
            let outcome = self.shove_shape_check(
                &last_trace_shape,
                Some(from_side),
                layer,
                nets,
                clearance_class,
                ObstacleMode::Trace,
                &depths,
                depths.max_trace,
                depths.max_via,
                &[],
                time_limit,
            );
            if !outcome.is_cleared() {
                self.record_outcome(&outcome);
                return Ok(from_corner_point);
            }
            let outcome = self.shove_shape_insert(
                &last_trace_shape,
                Some(from_side),
                layer,
                nets,
                clearance_class,
                ObstacleMode::Trace,
                &depths,
                depths.max_trace,
                depths.max_via,
                &[],
            );
            if !outcome.is_cleared() {
                self.record_outcome(&outcome);
                return Err(BoardError::NeedsUndo(outcome.failure()));
            }
        }

        self.insert_item(
            ItemKind::Trace {
                polyline: new_polyline,
                half_width,
                layer,
            },
            nets.clone(),
            clearance_class,
            FixedState::Unfixed,
        );
        for net in nets.as_slice() {
            self.combine_traces(*net);
        }
        Ok(Point::from(new_corner))
    }

    /// Inserts a via spanning the given layer range, shoving obstacles
    /// aside. `Ok(false)` means blocked without mutation beyond shoves
    /// already committed by the caller's earlier operations.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_via(
        &mut self,
        center: IntPoint,
        radius_on_layer: Vec<i32>,
        first_layer: LayerId,
        last_layer: LayerId,
        attach_allowed: bool,
        nets: &NetSet,
        clearance_class: usize,
        depths: ShoveDepths,
        time_limit: &TimeLimit,
    ) -> Result<bool> {
        self.last_failure = None;
        let candidate = Item {
            id: ItemId(0),
            kind: ItemKind::Via {
                center,
                radius_on_layer,
                first_layer,
                last_layer,
                attach_allowed,
            },
            nets: nets.clone(),
            clearance_class,
            fixed_state: FixedState::Unfixed,
        };
        let mode = ObstacleMode::Drill { attach_allowed };
        for no in 0..candidate.shape_count() {
            let layer = candidate.shape_layer(no);
            let shape = candidate.shape(no);
            if !self.contains_shape(&shape) {
                return Ok(false);
            }
            let outcome = self.shove_shape_check(
                &shape,
                Some(center.to_float()),
                layer,
                nets,
                clearance_class,
                mode,
                &depths,
                depths.max_trace,
                depths.max_via,
                &[],
                time_limit,
            );
            if !outcome.is_cleared() {
                self.record_outcome(&outcome);
                return Ok(false);
            }
        }
        for no in 0..candidate.shape_count() {
            let layer = candidate.shape_layer(no);
            let shape = candidate.shape(no);
            let outcome = self.shove_shape_insert(
                &shape,
                Some(center.to_float()),
                layer,
                nets,
                clearance_class,
                mode,
                &depths,
                depths.max_trace,
                depths.max_via,
                &[],
            );
            if !outcome.is_cleared() {
                self.record_outcome(&outcome);
                return Err(BoardError::NeedsUndo(outcome.failure()));
            }
        }
        self.insert_item(candidate.kind, nets.clone(), clearance_class, FixedState::Unfixed);
        self.unfix_shove_fixed_contacts(center, nets);
        Ok(true)
    }

    /// Moves a via or pad by `vector`, shoving obstacles out of the
    /// target position.
    pub fn move_drill_item(
        &mut self,
        id: ItemId,
        vector: IntVector,
        depths: ShoveDepths,
        time_limit: &TimeLimit,
    ) -> Result<bool> {
        self.last_failure = None;
        let Some(item) = self.items.get(&id) else {
            return Ok(false);
        };
        if !item.is_drill_item() {
            return Ok(false);
        }
        let center = match &item.kind {
            ItemKind::Via { center, .. } | ItemKind::Pad { center, .. } => *center,
            _ => return Ok(false),
        };
        let nets = item.nets.clone();
        // free shove fixed contact traces so they can follow the move
        self.unfix_shove_fixed_contacts(center, &nets);
        if !self.check_move_drill(id, vector, &depths, depths.max_via, &[], time_limit) {
            return Ok(false);
        }
        if !self.insert_move_drill(id, vector, &depths, depths.max_via, &[]) {
            return Err(BoardError::NeedsUndo(self.last_failure));
        }
        Ok(true)
    }

    fn unfix_shove_fixed_contacts(&mut self, location: IntPoint, nets: &NetSet) {
        let mut to_unfix: Vec<ItemId> = Vec::new();
        for item in self.items.values() {
            if item.fixed_state != FixedState::ShoveFixed || !item.nets.shares_any(nets) {
                continue;
            }
            let ItemKind::Trace { polyline, .. } = &item.kind else {
                continue;
            };
            if polyline.first_corner().round() == location
                || polyline.last_corner().round() == location
            {
                to_unfix.push(item.id);
            }
        }
        for id in to_unfix {
            if let Some(item) = self.items.get_mut(&id) {
                item.fixed_state = FixedState::Unfixed;
            }
        }
    }

    /// Connects `location` to the given trace with a perpendicular
    /// connection trace, then drops stub ends the connection made
    /// redundant.
    pub fn connect_to_trace(
        &mut self,
        location: IntPoint,
        trace_id: ItemId,
        half_width: i32,
        clearance_class: usize,
    ) -> bool {
        let Some(item) = self.items.get(&trace_id) else {
            return false;
        };
        let ItemKind::Trace {
            polyline, layer, ..
        } = &item.kind
        else {
            return false;
        };
        let layer = *layer;
        let nets = item.nets.clone();
        let trace_first = polyline.first_corner().round();
        let trace_last = polyline.last_corner().round();
        if polyline.contains(location) {
            return true;
        }
        let Some(projection) = polyline.projection_line(location) else {
            return false;
        };
        let Ok(connection) = projection.to_polyline() else {
            return false;
        };
        if !self.check_trace_polyline(&connection, half_width, layer, &nets, clearance_class) {
            return false;
        }
        let connection_id = self.insert_item(
            ItemKind::Trace {
                polyline: connection,
                half_width,
                layer,
            },
            nets.clone(),
            clearance_class,
            FixedState::Unfixed,
        );
        // ends of the connected trace may have become redundant stubs
        let exclude = [trace_id, connection_id];
        for end in [trace_first, trace_last] {
            if end != location {
                self.remove_trace_tails_at(end, layer, &nets, &exclude);
            }
        }
        true
    }
}

fn dedup_items(entries: Vec<TreeEntry>) -> Vec<ItemId> {
    let mut result: Vec<ItemId> = Vec::new();
    for entry in entries {
        if !result.contains(&entry.item) {
            result.push(entry.item);
        }
    }
    result
}

fn shared_end_corner(first: &Polyline, second: &Polyline) -> Option<IntPoint> {
    let ends = [first.first_corner(), first.last_corner()];
    for end in ends {
        if end == second.first_corner() || end == second.last_corner() {
            return Some(end.round());
        }
    }
    None
}

/// Nearest point of a convex tile to `from`, approximated over border
/// corners and the clamped projections onto the border segments.
fn nearest_point_on_tile(tile: &Tile, from: FloatPoint) -> FloatPoint {
    let corners = tile.corners_approx();
    if corners.is_empty() {
        return from;
    }
    let mut best = corners[0];
    let mut best_distance = from.distance(best);
    let mut consider = |candidate: FloatPoint| {
        let distance = from.distance(candidate);
        if distance < best_distance {
            best_distance = distance;
            best = candidate;
        }
    };
    for no in 0..corners.len() {
        let a = corners[no];
        let b = corners[(no + 1) % corners.len()];
        consider(a);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_square = dx * dx + dy * dy;
        if len_square > 0.0 {
            let t = (((from.x - a.x) * dx + (from.y - a.y) * dy) / len_square).clamp(0.0, 1.0);
            consider(FloatPoint::new(a.x + t * dx, a.y + t * dy));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ClearanceMatrix;

    fn empty_board() -> RoutingBoard {
        RoutingBoard::new(
            TileBox::new(IntPoint::new(-10_000, -10_000), IntPoint::new(10_000, 10_000)),
            2,
            ClearanceMatrix::uniform(2, 10),
        )
    }

    fn trace_kind(from: IntPoint, to: IntPoint, half_width: i32) -> ItemKind {
        ItemKind::Trace {
            polyline: Polyline::two_point(from, to).unwrap(),
            half_width,
            layer: 0,
        }
    }

    #[test]
    fn test_insert_and_pick() {
        let mut board = empty_board();
        let id = board.insert_item(
            trace_kind(IntPoint::new(0, 0), IntPoint::new(100, 0), 5),
            NetSet::single(1),
            0,
            FixedState::Unfixed,
        );
        assert_eq!(board.item_count(), 1);
        assert_eq!(board.pick_items(IntPoint::new(50, 0), 0), vec![id]);
        assert!(board.pick_items(IntPoint::new(50, 50), 0).is_empty());
        board.remove_item(id);
        assert_eq!(board.item_count(), 0);
        assert!(board.pick_items(IntPoint::new(50, 0), 0).is_empty());
    }

    #[test]
    fn test_pick_nearest_routing_item() {
        let mut board = empty_board();
        let near = board.insert_item(
            trace_kind(IntPoint::new(0, 0), IntPoint::new(100, 0), 5),
            NetSet::single(1),
            0,
            FixedState::Unfixed,
        );
        board.insert_item(
            trace_kind(IntPoint::new(0, 100), IntPoint::new(100, 100), 5),
            NetSet::single(2),
            0,
            FixedState::Unfixed,
        );
        assert_eq!(
            board.pick_nearest_routing_item(FloatPoint::new(50.0, 20.0), 0),
            Some(near)
        );
    }

    #[test]
    fn test_check_shape_against_keepout() {
        let mut board = empty_board();
        board.insert_item(
            ItemKind::Keepout {
                shape: Tile::Box(TileBox::new(IntPoint::new(40, -20), IntPoint::new(60, 20))),
                layer: 0,
            },
            NetSet::empty(),
            0,
            FixedState::SystemFixed,
        );
        let clear = Tile::Box(TileBox::new(IntPoint::new(0, 40), IntPoint::new(100, 50)));
        assert!(board.check_shape(&[clear], 0, &NetSet::single(1), 0));
        let blocked = Tile::Box(TileBox::new(IntPoint::new(0, -5), IntPoint::new(100, 5)));
        assert!(!board.check_shape(&[blocked], 0, &NetSet::single(1), 0));
        // outside the board outline
        let outside = Tile::Box(TileBox::new(
            IntPoint::new(9_000, 0),
            IntPoint::new(11_000, 10),
        ));
        assert!(!board.check_shape(&[outside], 0, &NetSet::single(1), 0));
    }

    #[test]
    fn test_check_trace_segment_ok_length() {
        let mut board = empty_board();
        board.insert_item(
            ItemKind::Keepout {
                shape: Tile::Box(TileBox::new(
                    IntPoint::new(500, -100),
                    IntPoint::new(600, 100),
                )),
                layer: 0,
            },
            NetSet::empty(),
            0,
            FixedState::SystemFixed,
        );
        let ok_length = board.check_trace_segment(
            FloatPoint::new(0.0, 0.0),
            FloatPoint::new(1000.0, 0.0),
            0,
            &NetSet::single(1),
            5,
            0,
            &[],
        );
        // obstacle border enlarged by the clearance starts at x = 490;
        // subtract half width, clearance and the unit tolerance
        assert!(ok_length <= 474.0 + 1e-6);
        assert!(ok_length > 400.0);

        let free = board.check_trace_segment(
            FloatPoint::new(0.0, 300.0),
            FloatPoint::new(1000.0, 300.0),
            0,
            &NetSet::single(1),
            5,
            0,
            &[],
        );
        assert!(free.is_infinite());
    }

    #[test]
    fn test_combine_traces() {
        let mut board = empty_board();
        board.insert_item(
            trace_kind(IntPoint::new(0, 0), IntPoint::new(100, 0), 5),
            NetSet::single(1),
            0,
            FixedState::Unfixed,
        );
        board.insert_item(
            trace_kind(IntPoint::new(100, 0), IntPoint::new(100, 100), 5),
            NetSet::single(1),
            0,
            FixedState::Unfixed,
        );
        board.combine_traces(1);
        assert_eq!(board.item_count(), 1);
        let item = board.items().next().unwrap();
        let ItemKind::Trace { polyline, .. } = &item.kind else {
            panic!("expected a trace");
        };
        assert_eq!(polyline.corner_count(), 3);
    }

    #[test]
    fn test_get_trace_tail() {
        let mut board = empty_board();
        let stub = board.insert_item(
            trace_kind(IntPoint::new(0, 0), IntPoint::new(100, 0), 5),
            NetSet::single(1),
            0,
            FixedState::Unfixed,
        );
        // both ends are unconnected
        assert!(board.get_trace_tail(stub).is_some());

        board.insert_item(
            ItemKind::Via {
                center: IntPoint::new(0, 0),
                radius_on_layer: vec![10, 10],
                first_layer: 0,
                last_layer: 1,
                attach_allowed: false,
            },
            NetSet::single(1),
            0,
            FixedState::Unfixed,
        );
        board.insert_item(
            ItemKind::Via {
                center: IntPoint::new(100, 0),
                radius_on_layer: vec![10, 10],
                first_layer: 0,
                last_layer: 1,
                attach_allowed: false,
            },
            NetSet::single(1),
            0,
            FixedState::Unfixed,
        );
        assert!(board.get_trace_tail(stub).is_none());
    }

    #[test]
    fn test_connect_to_trace() {
        let mut board = empty_board();
        let trace = board.insert_item(
            trace_kind(IntPoint::new(0, 0), IntPoint::new(1000, 0), 5),
            NetSet::single(1),
            0,
            FixedState::Unfixed,
        );
        assert!(board.connect_to_trace(IntPoint::new(500, 200), trace, 5, 0));
        // one new connection trace from (500, 200) down to the trace
        assert_eq!(board.item_count(), 2);
        let hit = board.pick_items(IntPoint::new(500, 100), 0);
        assert_eq!(hit.len(), 1);
        assert_ne!(hit[0], trace);

        // a point already on the trace needs no connection
        assert!(board.connect_to_trace(IntPoint::new(250, 0), trace, 5, 0));
        assert_eq!(board.item_count(), 2);
    }

    #[test]
    fn test_check_item_move() {
        let mut board = empty_board();
        let via = board.insert_item(
            ItemKind::Via {
                center: IntPoint::new(0, 0),
                radius_on_layer: vec![20, 20],
                first_layer: 0,
                last_layer: 1,
                attach_allowed: false,
            },
            NetSet::single(1),
            0,
            FixedState::Unfixed,
        );
        assert!(board.check_item_move(via, IntVector::new(100, 0), &[]));

        board.insert_item(
            ItemKind::Keepout {
                shape: Tile::Box(TileBox::new(IntPoint::new(80, -30), IntPoint::new(140, 30))),
                layer: 0,
            },
            NetSet::empty(),
            0,
            FixedState::SystemFixed,
        );
        assert!(!board.check_item_move(via, IntVector::new(100, 0), &[]));
        // moving away from the keepout is still fine
        assert!(board.check_item_move(via, IntVector::new(-100, 0), &[]));
    }
}
