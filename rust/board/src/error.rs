// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Board level errors.
//!
//! Almost everything on the board is lenient: a blocked check is a normal
//! outcome and comes back as a boolean or a [`ShoveOutcome`], never as an
//! error. The one hard case is a commit that fails after part of the board
//! was already mutated; the board performs no in-place rollback, so the
//! caller must run its undo mechanism.
//!
//! [`ShoveOutcome`]: crate::shove::ShoveOutcome

use thiserror::Error;

use crate::shove::ShoveFailure;

#[derive(Debug, Error)]
pub enum BoardError {
    /// A commit-time failure after partial mutation. The board may be
    /// inconsistent and the caller must undo to the last snapshot.
    #[error("insertion failed after partial mutation, undo required")]
    NeedsUndo(Option<ShoveFailure>),

    /// An item was handed in with geometry the board cannot store.
    #[error("invalid item: {0}")]
    InvalidItem(String),
}

pub type Result<T> = std::result::Result<T, BoardError>;
