// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial lookup of item shapes.
//!
//! The engine only needs the query contracts of [`SpatialIndex`]; the
//! shipped [`ShapeSearchTree`] keeps one flat shape list per layer with a
//! bounding octagon prefilter and exact tile confirmation. Iteration order
//! is insertion order, so query results are deterministic for a given
//! sequence of board changes.
//!
//! Clearance handling has two modes. With compensation on, every stored
//! shape is enlarged by half the clearance between the item's class and
//! the compensation class, and a clearance query enlarges the query shape
//! by the other half. With compensation off, shapes are stored as built
//! and a clearance query enlarges the query shape per entry by the full
//! clearance. Mixing the two modes inside one computation double counts or
//! under counts clearance, so callers branch on
//! [`SpatialIndex::is_clearance_compensation_used`] consistently.

use shoveroute_planar::{Octagon, Tile};
use tracing::trace;

use crate::item::{Item, ItemId, LayerId, NetSet};
use crate::rules::ClearanceMatrix;

/// One matched shape of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEntry {
    pub item: ItemId,
    pub shape_index: usize,
}

pub trait SpatialIndex {
    fn insert(&mut self, item: &Item);

    fn remove(&mut self, id: ItemId);

    fn reinsert_after_geometry_change(&mut self, item: &Item) {
        self.remove(item.id);
        self.insert(item);
    }

    /// All stored shapes on `layer` overlapping `shape`, except those of
    /// items sharing a net with `exclude_nets`.
    fn find_overlapping(&self, shape: &Tile, layer: LayerId, exclude_nets: &NetSet)
        -> Vec<TreeEntry>;

    /// Clearance aware variant; overlap means closer than the clearance
    /// between `clearance_class` and the stored item's class.
    fn find_overlapping_with_clearance(
        &self,
        shape: &Tile,
        layer: LayerId,
        exclude_nets: &NetSet,
        clearance_class: usize,
    ) -> Vec<TreeEntry>;

    fn is_clearance_compensation_used(&self) -> bool;
}

#[derive(Debug, Clone)]
struct StoredShape {
    item: ItemId,
    shape_index: usize,
    bound: Octagon,
    tile: Tile,
    nets: NetSet,
    clearance_class: usize,
}

#[derive(Debug, Clone)]
pub struct ShapeSearchTree {
    layers: Vec<Vec<StoredShape>>,
    matrix: ClearanceMatrix,
    compensation_class: Option<usize>,
}

impl ShapeSearchTree {
    pub fn new(layer_count: usize, matrix: ClearanceMatrix) -> Self {
        ShapeSearchTree {
            layers: vec![Vec::new(); layer_count],
            matrix,
            compensation_class: None,
        }
    }

    /// A tree that stores shapes pre enlarged against `compensation_class`.
    pub fn new_compensated(
        layer_count: usize,
        matrix: ClearanceMatrix,
        compensation_class: usize,
    ) -> Self {
        ShapeSearchTree {
            layers: vec![Vec::new(); layer_count],
            matrix,
            compensation_class: Some(compensation_class),
        }
    }

    /// Half the clearance between `clearance_class` and the compensation
    /// class, zero when compensation is off.
    pub fn clearance_compensation(&self, clearance_class: usize, layer: LayerId) -> i32 {
        match self.compensation_class {
            Some(comp) => self.matrix.value(clearance_class, comp, layer) / 2,
            None => 0,
        }
    }

    fn stored_tile(&self, item: &Item, no: usize) -> Tile {
        let tile = item.shape(no);
        let compensation =
            self.clearance_compensation(item.clearance_class, item.shape_layer(no));
        if compensation > 0 {
            tile.enlarge(f64::from(compensation))
        } else {
            tile
        }
    }

    fn collect<F>(&self, layer: LayerId, exclude_nets: &NetSet, mut overlaps: F) -> Vec<TreeEntry>
    where
        F: FnMut(&StoredShape) -> bool,
    {
        let Some(stored) = self.layers.get(layer) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        for entry in stored {
            if !exclude_nets.is_empty() && entry.nets.shares_any(exclude_nets) {
                continue;
            }
            if overlaps(entry) {
                result.push(TreeEntry {
                    item: entry.item,
                    shape_index: entry.shape_index,
                });
            }
        }
        result
    }
}

impl SpatialIndex for ShapeSearchTree {
    fn insert(&mut self, item: &Item) {
        for no in 0..item.shape_count() {
            let layer = item.shape_layer(no);
            if layer >= self.layers.len() {
                trace!(item = item.id.0, layer, "shape outside layer range, skipped");
                continue;
            }
            let tile = self.stored_tile(item, no);
            self.layers[layer].push(StoredShape {
                item: item.id,
                shape_index: no,
                bound: tile.bounding_octagon(),
                tile,
                nets: item.nets.clone(),
                clearance_class: item.clearance_class,
            });
        }
    }

    fn remove(&mut self, id: ItemId) {
        for stored in &mut self.layers {
            stored.retain(|entry| entry.item != id);
        }
    }

    fn find_overlapping(
        &self,
        shape: &Tile,
        layer: LayerId,
        exclude_nets: &NetSet,
    ) -> Vec<TreeEntry> {
        let bound = shape.bounding_octagon();
        self.collect(layer, exclude_nets, |entry| {
            entry.bound.intersects(&bound) && entry.tile.intersects(shape)
        })
    }

    fn find_overlapping_with_clearance(
        &self,
        shape: &Tile,
        layer: LayerId,
        exclude_nets: &NetSet,
        clearance_class: usize,
    ) -> Vec<TreeEntry> {
        if self.compensation_class.is_some() {
            let compensation = self.clearance_compensation(clearance_class, layer);
            let enlarged = if compensation > 0 {
                shape.enlarge(f64::from(compensation))
            } else {
                shape.clone()
            };
            return self.find_overlapping(&enlarged, layer, exclude_nets);
        }
        let bound = shape.bounding_octagon().enlarge(f64::from(self.matrix.max_value()));
        self.collect(layer, exclude_nets, |entry| {
            if !entry.bound.intersects(&bound) {
                return false;
            }
            let clearance = self.matrix.value(clearance_class, entry.clearance_class, layer);
            let enlarged = if clearance > 0 {
                shape.enlarge(f64::from(clearance))
            } else {
                shape.clone()
            };
            entry.tile.intersects(&enlarged)
        })
    }

    fn is_clearance_compensation_used(&self) -> bool {
        self.compensation_class.is_some()
    }
}
