// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cooperative cancellation.
//!
//! A [`TimeLimit`] is polled at the start of every top level operation and
//! every recursive shove attempt. Expiry surfaces exactly like an ordinary
//! blocked check; callers who care about the reason inspect the limit
//! themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TimeLimit {
    deadline: Option<Instant>,
    stop: Arc<AtomicBool>,
}

impl TimeLimit {
    pub fn new(limit: Duration) -> Self {
        TimeLimit {
            deadline: Some(Instant::now() + limit),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A limit that never expires on its own.
    pub fn unlimited() -> Self {
        TimeLimit {
            deadline: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle another thread may use to request a stop.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stop_requested(&self) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

impl Default for TimeLimit {
    fn default() -> Self {
        TimeLimit::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_never_stops() {
        let limit = TimeLimit::unlimited();
        assert!(!limit.is_stop_requested());
    }

    #[test]
    fn test_request_stop() {
        let limit = TimeLimit::unlimited();
        limit.request_stop();
        assert!(limit.is_stop_requested());
    }

    #[test]
    fn test_expired_deadline() {
        let limit = TimeLimit::new(Duration::from_secs(0));
        assert!(limit.is_stop_requested());
    }
}
