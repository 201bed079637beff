// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Board items and their obstacle classification.
//!
//! An item owns one convex tile shape per layer it touches; traces own one
//! shape per polyline segment. Identity and lifetime belong to the board,
//! the shove engine only sees items through the search tree and the board
//! item store.

use shoveroute_planar::{IntPoint, IntVector, Octagon, Polyline, Tile};
use smallvec::SmallVec;

pub type LayerId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

/// Fixation grade, ordered from freely movable to untouchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FixedState {
    Unfixed,
    ShoveFixed,
    UserFixed,
    SystemFixed,
}

/// Sorted set of net numbers an item belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetSet(SmallVec<[i32; 2]>);

impl NetSet {
    pub fn new(nets: &[i32]) -> Self {
        let mut sorted: SmallVec<[i32; 2]> = nets.into();
        sorted.sort_unstable();
        sorted.dedup();
        NetSet(sorted)
    }

    pub fn single(net: i32) -> Self {
        NetSet(SmallVec::from_slice(&[net]))
    }

    pub fn empty() -> Self {
        NetSet::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, net: i32) -> bool {
        self.0.binary_search(&net).is_ok()
    }

    /// True when the two sets have at least one net in common.
    pub fn shares_any(&self, other: &NetSet) -> bool {
        self.0.iter().any(|net| other.contains(*net))
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub enum ItemKind {
    /// A polyline trace of constant half width on a single layer.
    Trace {
        polyline: Polyline,
        half_width: i32,
        layer: LayerId,
    },
    /// A drill item spanning a layer range, one octagonal footprint per
    /// layer.
    Via {
        center: IntPoint,
        radius_on_layer: Vec<i32>,
        first_layer: LayerId,
        last_layer: LayerId,
        attach_allowed: bool,
    },
    /// A fixed pad footprint on a single layer.
    Pad {
        center: IntPoint,
        shape: Tile,
        layer: LayerId,
        drillable: bool,
    },
    /// An absolute obstacle area.
    Keepout { shape: Tile, layer: LayerId },
    /// An area forbidden for drill items only.
    ViaKeepout { shape: Tile, layer: LayerId },
    /// A conduction plane; an obstacle only when flagged so.
    Conduction {
        shape: Tile,
        layer: LayerId,
        is_obstacle: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub nets: NetSet,
    pub clearance_class: usize,
    pub fixed_state: FixedState,
}

impl Item {
    pub fn shape_count(&self) -> usize {
        match &self.kind {
            ItemKind::Trace { polyline, .. } => polyline.line_count().saturating_sub(2),
            ItemKind::Via {
                first_layer,
                last_layer,
                ..
            } => last_layer - first_layer + 1,
            _ => 1,
        }
    }

    pub fn shape(&self, no: usize) -> Tile {
        match &self.kind {
            ItemKind::Trace {
                polyline,
                half_width,
                ..
            } => polyline.offset_shape(*half_width, no),
            ItemKind::Via {
                center,
                radius_on_layer,
                ..
            } => {
                let radius = radius_on_layer[no.min(radius_on_layer.len() - 1)];
                Tile::Octagon(octagon_disc(*center, radius))
            }
            ItemKind::Pad { shape, .. }
            | ItemKind::Keepout { shape, .. }
            | ItemKind::ViaKeepout { shape, .. }
            | ItemKind::Conduction { shape, .. } => shape.clone(),
        }
    }

    pub fn shape_layer(&self, no: usize) -> LayerId {
        match &self.kind {
            ItemKind::Trace { layer, .. } => *layer,
            ItemKind::Via { first_layer, .. } => first_layer + no,
            ItemKind::Pad { layer, .. }
            | ItemKind::Keepout { layer, .. }
            | ItemKind::ViaKeepout { layer, .. }
            | ItemKind::Conduction { layer, .. } => *layer,
        }
    }

    /// The via footprint on an absolute layer, if the via reaches it.
    pub fn shape_on_layer(&self, layer: LayerId) -> Option<Tile> {
        match &self.kind {
            ItemKind::Via {
                first_layer,
                last_layer,
                ..
            } => {
                if layer < *first_layer || layer > *last_layer {
                    None
                } else {
                    Some(self.shape(layer - first_layer))
                }
            }
            _ => {
                if self.shape_layer(0) == layer {
                    Some(self.shape(0))
                } else {
                    None
                }
            }
        }
    }

    pub fn is_trace(&self) -> bool {
        matches!(self.kind, ItemKind::Trace { .. })
    }

    pub fn is_drill_item(&self) -> bool {
        matches!(self.kind, ItemKind::Via { .. } | ItemKind::Pad { .. })
    }

    /// True for connection items the router may still change.
    pub fn is_route(&self) -> bool {
        matches!(self.kind, ItemKind::Trace { .. } | ItemKind::Via { .. })
            && self.fixed_state < FixedState::UserFixed
            && !self.nets.is_empty()
    }

    /// True when a shove attempt may displace this item.
    pub fn is_shovable(&self) -> bool {
        matches!(self.kind, ItemKind::Trace { .. } | ItemKind::Via { .. })
            && self.fixed_state < FixedState::ShoveFixed
    }

    /// Whether this item blocks a trace of the given nets.
    pub fn is_trace_obstacle(&self, nets: &NetSet) -> bool {
        if self.nets.shares_any(nets) {
            return false;
        }
        match &self.kind {
            ItemKind::ViaKeepout { .. } => false,
            ItemKind::Conduction { is_obstacle, .. } => *is_obstacle,
            _ => true,
        }
    }

    /// Whether this item blocks a drill item of the given nets.
    pub fn is_drill_obstacle(&self, nets: &NetSet, attach_allowed: bool) -> bool {
        if self.nets.shares_any(nets) {
            return false;
        }
        match &self.kind {
            ItemKind::Conduction { is_obstacle, .. } => *is_obstacle && !attach_allowed,
            _ => true,
        }
    }

    pub fn translate_by(&mut self, v: IntVector) {
        match &mut self.kind {
            ItemKind::Trace { polyline, .. } => *polyline = polyline.translate_by(v),
            ItemKind::Via { center, .. } => *center = center.translate_by(v),
            ItemKind::Pad { center, shape, .. } => {
                *center = center.translate_by(v);
                *shape = shape.translate_by(v);
            }
            ItemKind::Keepout { shape, .. }
            | ItemKind::ViaKeepout { shape, .. }
            | ItemKind::Conduction { shape, .. } => *shape = shape.translate_by(v),
        }
    }
}

/// Octagon approximating a disc, with both the orthogonal and the diagonal
/// borders at distance `radius` from the center.
pub fn octagon_disc(center: IntPoint, radius: i32) -> Octagon {
    let diag = (f64::from(radius) * std::f64::consts::SQRT_2).round() as i32;
    Octagon::new(
        center.x - radius,
        center.y - radius,
        center.x + radius,
        center.y + radius,
        center.x - center.y - diag,
        center.x - center.y + diag,
        center.x + center.y - diag,
        center.x + center.y + diag,
    )
    .normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace_item(id: u32, from: IntPoint, to: IntPoint, net: i32) -> Item {
        Item {
            id: ItemId(id),
            kind: ItemKind::Trace {
                polyline: Polyline::two_point(from, to).unwrap(),
                half_width: 5,
                layer: 0,
            },
            nets: NetSet::single(net),
            clearance_class: 0,
            fixed_state: FixedState::Unfixed,
        }
    }

    #[test]
    fn test_net_set_shares_any() {
        let a = NetSet::new(&[3, 1, 3]);
        let b = NetSet::new(&[2, 3]);
        assert_eq!(a.as_slice(), &[1, 3]);
        assert!(a.shares_any(&b));
        assert!(!a.shares_any(&NetSet::single(7)));
        assert!(!a.shares_any(&NetSet::empty()));
    }

    #[test]
    fn test_trace_shapes() {
        let item = trace_item(1, IntPoint::new(0, 0), IntPoint::new(100, 0), 1);
        assert_eq!(item.shape_count(), 1);
        let shape = item.shape(0);
        assert!(shape.contains(IntPoint::new(50, 5)));
        assert!(!shape.contains(IntPoint::new(50, 6)));
        assert_eq!(item.shape_layer(0), 0);
    }

    #[test]
    fn test_via_shapes_per_layer() {
        let item = Item {
            id: ItemId(2),
            kind: ItemKind::Via {
                center: IntPoint::new(10, 10),
                radius_on_layer: vec![20, 30],
                first_layer: 1,
                last_layer: 2,
                attach_allowed: false,
            },
            nets: NetSet::single(1),
            clearance_class: 0,
            fixed_state: FixedState::Unfixed,
        };
        assert_eq!(item.shape_count(), 2);
        assert_eq!(item.shape_layer(0), 1);
        assert_eq!(item.shape_layer(1), 2);
        assert!(item.shape(1).contains(IntPoint::new(40, 10)));
        assert!(!item.shape(0).contains(IntPoint::new(40, 10)));
        assert!(item.shape_on_layer(0).is_none());
        assert!(item.shape_on_layer(2).is_some());
    }

    #[test]
    fn test_obstacle_classification() {
        let trace = trace_item(1, IntPoint::new(0, 0), IntPoint::new(100, 0), 1);
        assert!(!trace.is_trace_obstacle(&NetSet::single(1)));
        assert!(trace.is_trace_obstacle(&NetSet::single(2)));
        assert!(trace.is_shovable());

        let keepout = Item {
            id: ItemId(3),
            kind: ItemKind::Keepout {
                shape: trace.shape(0),
                layer: 0,
            },
            nets: NetSet::empty(),
            clearance_class: 0,
            fixed_state: FixedState::SystemFixed,
        };
        assert!(keepout.is_trace_obstacle(&NetSet::single(1)));
        assert!(!keepout.is_shovable());

        let via_keepout = Item {
            id: ItemId(4),
            kind: ItemKind::ViaKeepout {
                shape: trace.shape(0),
                layer: 0,
            },
            nets: NetSet::empty(),
            clearance_class: 0,
            fixed_state: FixedState::SystemFixed,
        };
        assert!(!via_keepout.is_trace_obstacle(&NetSet::single(2)));
        assert!(via_keepout.is_drill_obstacle(&NetSet::single(2), false));
    }

    #[test]
    fn test_fixed_state_order() {
        assert!(FixedState::Unfixed < FixedState::ShoveFixed);
        assert!(FixedState::ShoveFixed < FixedState::UserFixed);
        assert!(FixedState::UserFixed < FixedState::SystemFixed);
    }

    #[test]
    fn test_translate_via() {
        let mut item = Item {
            id: ItemId(5),
            kind: ItemKind::Via {
                center: IntPoint::new(0, 0),
                radius_on_layer: vec![10],
                first_layer: 0,
                last_layer: 0,
                attach_allowed: false,
            },
            nets: NetSet::single(1),
            clearance_class: 0,
            fixed_state: FixedState::Unfixed,
        };
        item.translate_by(IntVector::new(30, -20));
        match item.kind {
            ItemKind::Via { center, .. } => assert_eq!(center, IntPoint::new(30, -20)),
            _ => unreachable!(),
        }
    }
}
