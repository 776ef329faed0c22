// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::{INVALID, LayerId};
use super::store::LayerStore;

/// An iterator over the direct children of a layer, back to front.
///
/// Created by [`LayerStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a LayerStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a LayerStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(self.store.id_at(idx))
    }
}

impl LayerStore {
    /// Returns the subtree rooted at `id` in depth-first pre-order, each
    /// layer paired with its depth below `id`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn subtree(&self, id: LayerId) -> Vec<(LayerId, u32)> {
        self.validate(id);
        let mut out = Vec::new();
        let mut stack = alloc::vec![(id.idx, 0_u32)];
        while let Some((idx, depth)) = stack.pop() {
            out.push((self.id_at(idx), depth));
            // Push in reverse so the first child is visited first.
            let mut kids = Vec::new();
            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                kids.push(child);
                child = self.next_sibling[child as usize];
            }
            stack.extend(kids.into_iter().rev().map(|c| (c, depth + 1)));
        }
        out
    }

    /// Returns the number of ancestors of `id`.
    #[must_use]
    pub fn depth(&self, id: LayerId) -> u32 {
        self.validate(id);
        self.depth_at(id.idx)
    }

    pub(crate) fn depth_at(&self, idx: u32) -> u32 {
        let mut depth = 0;
        let mut p = self.parent[idx as usize];
        while p != INVALID {
            depth += 1;
            p = self.parent[p as usize];
        }
        depth
    }
}
