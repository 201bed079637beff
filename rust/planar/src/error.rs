// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for planar geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing planar objects
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid polyline: {0}")]
    InvalidPolyline(String),

    #[error("Invalid tile: {0}")]
    InvalidTile(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
}
