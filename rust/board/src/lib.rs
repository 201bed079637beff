// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Routing board data model and shove engine.
//!
//! A [`RoutingBoard`] holds traces, vias, pads and keepouts in a
//! layered spatial search tree and offers the interactive routing
//! operations on top of it: clearance checks, trace insertion with
//! recursive shoving of obstacle traces and vias, via insertion and
//! drill item moves. Geometry comes from the `shoveroute-planar`
//! kernel; all board coordinates are exact integers.
//!
//! Check operations never mutate the board. Insert operations shove in
//! commit order and report an unrecoverable mid-commit failure as
//! [`BoardError::NeedsUndo`], leaving the undo to the caller.

pub mod board;
pub mod error;
pub mod item;
mod move_drill;
pub mod rules;
pub mod search_tree;
pub mod shove;
pub mod stoppable;

pub use board::RoutingBoard;
pub use error::{BoardError, Result};
pub use item::{FixedState, Item, ItemId, ItemKind, LayerId, NetSet};
pub use rules::{ClearanceMatrix, PullTightParams, ShoveDepths};
pub use search_tree::{ShapeSearchTree, SpatialIndex, TreeEntry};
pub use shove::{ShoveFailure, ShoveOutcome};
pub use stoppable::TimeLimit;
