// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exact planar geometry kernel for PCB routing.
//!
//! Everything is built on integer coordinates and exact determinant signs;
//! floats only appear as approximations that never feed back into a
//! predicate. The central abstractions are directed [`Line`]s whose left
//! half-plane is the inside, convex [`Tile`]s as intersections of such
//! half-planes, and [`Polyline`]s as open curves of directed lines.
//!
//! Degenerate inputs are never fatal at runtime: out of range indices are
//! clamped, collapsing shapes become the canonical empty tile, and both are
//! reported through `tracing`.

pub mod direction;
pub mod error;
pub mod line;
pub mod octagon;
pub mod point;
pub mod polyline;
pub mod simplex;
pub mod tile;
pub mod tile_box;

pub use direction::Direction;
pub use error::{Error, Result};
pub use line::Line;
pub use octagon::Octagon;
pub use point::{FloatPoint, IntPoint, IntVector, Point, RationalPoint, Side};
pub use polyline::{Polyline, Segment};
pub use simplex::Simplex;
pub use tile::{ShapeDim, Tile};
pub use tile_box::TileBox;

/// Largest admissible absolute coordinate. Coordinates beyond this bound
/// are clamped so that intermediate i64 products cannot overflow.
pub const CRIT_COORD: i32 = 1 << 30;
