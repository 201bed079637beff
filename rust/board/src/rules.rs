// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Routing rules consumed by the shove engine.
//!
//! Plain value structs; all behaviour lives in the engine.

/// Minimum required spacing between clearance classes, per layer.
///
/// The table is symmetric in the two class arguments; `set` writes both
/// triangle entries.
#[derive(Debug, Clone)]
pub struct ClearanceMatrix {
    class_count: usize,
    layer_count: usize,
    values: Vec<i32>,
}

impl ClearanceMatrix {
    pub fn new(class_count: usize, layer_count: usize) -> Self {
        ClearanceMatrix {
            class_count,
            layer_count,
            values: vec![0; class_count * class_count * layer_count],
        }
    }

    /// A one-class matrix with the same clearance everywhere, enough for
    /// boards that do not distinguish item categories.
    pub fn uniform(layer_count: usize, clearance: i32) -> Self {
        let mut result = ClearanceMatrix::new(1, layer_count);
        for layer in 0..layer_count {
            result.set(0, 0, layer, clearance);
        }
        result
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }

    fn index(&self, c1: usize, c2: usize, layer: usize) -> usize {
        let c1 = c1.min(self.class_count - 1);
        let c2 = c2.min(self.class_count - 1);
        let layer = layer.min(self.layer_count - 1);
        (layer * self.class_count + c1) * self.class_count + c2
    }

    pub fn value(&self, c1: usize, c2: usize, layer: usize) -> i32 {
        self.values[self.index(c1, c2, layer)]
    }

    pub fn set(&mut self, c1: usize, c2: usize, layer: usize, clearance: i32) {
        let i = self.index(c1, c2, layer);
        self.values[i] = clearance.max(0);
        let j = self.index(c2, c1, layer);
        self.values[j] = clearance.max(0);
    }

    pub fn max_value(&self) -> i32 {
        self.values.iter().copied().max().unwrap_or(0)
    }
}

/// Recursion budgets for the shove engine. The defaults are the
/// empirically safe depths used interactively.
#[derive(Debug, Clone, Copy)]
pub struct ShoveDepths {
    pub max_trace: u32,
    pub max_via: u32,
    pub max_spring_over: u32,
}

impl Default for ShoveDepths {
    fn default() -> Self {
        ShoveDepths {
            max_trace: 20,
            max_via: 5,
            max_spring_over: 5,
        }
    }
}

/// Pull tight accuracy settings, passed through to the caller's
/// optimization passes.
#[derive(Debug, Clone)]
pub struct PullTightParams {
    /// Minimum corner movement worth optimizing.
    pub min_move: i32,
    /// Layers open for changes.
    pub layer_active: Vec<bool>,
}

impl PullTightParams {
    pub fn new(layer_count: usize) -> Self {
        PullTightParams {
            min_move: 10,
            layer_active: vec![true; layer_count],
        }
    }
}
