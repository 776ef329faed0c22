// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change collection between render passes.
//!
//! Evaluation drains every dirty channel and reports what changed since the
//! previous call:
//!
//! 1. **TOPOLOGY**: the traversal order is rebuilt if the tree changed.
//! 2. **GEOMETRY**: layers whose position in root space moved, including all
//!    descendants of a moved layer.
//! 3. **LAYOUT**: layers whose sublayers need new frames (unless
//!    [`layout_if_needed`](LayerStore::layout_if_needed) already ran).
//! 4. **DISPLAY**: layers whose rendered output is stale.
//!
//! A host uses the result the way a windowing toolkit uses "needs display":
//! an empty [`FrameChanges`] means the last render is still valid.

use alloc::vec::Vec;

use super::store::LayerStore;
use crate::dirty;

/// The set of changes produced by a single [`LayerStore::evaluate`] call.
///
/// Each field contains the raw slot indices of layers that changed in the
/// corresponding category.
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Layers that moved (directly or through an ancestor).
    pub geometry: Vec<u32>,
    /// Layers still waiting for sublayer layout.
    pub layout: Vec<u32>,
    /// Layers that need to be redrawn.
    pub display: Vec<u32>,
    /// Layers added since the last evaluate.
    pub added: Vec<u32>,
    /// Layers removed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether the tree topology changed (traversal order was rebuilt).
    pub topology_changed: bool,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.geometry.clear();
        self.layout.clear();
        self.display.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if anything visible may have changed.
    #[must_use]
    pub fn needs_display(&self) -> bool {
        self.topology_changed
            || !self.geometry.is_empty()
            || !self.layout.is_empty()
            || !self.display.is_empty()
            || !self.added.is_empty()
            || !self.removed.is_empty()
    }
}

impl LayerStore {
    /// Drains all dirty channels and returns the set of changes.
    pub fn evaluate(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer
    /// to avoid allocation.
    pub fn evaluate_into(&mut self, changes: &mut FrameChanges) {
        changes.clear();

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        changes.geometry = self
            .dirty
            .drain(dirty::GEOMETRY)
            .affected()
            .deterministic()
            .run()
            .collect();

        changes.layout = self
            .dirty
            .drain(dirty::LAYOUT)
            .deterministic()
            .run()
            .collect();

        changes.display = self
            .dirty
            .drain(dirty::DISPLAY)
            .deterministic()
            .run()
            .collect();

        // Structural changes were already folded into the traversal rebuild.
        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        // Slots destroyed since the last call may still sit in the lists.
        changes.geometry.retain(|&idx| self.is_live_slot(idx));
        changes.layout.retain(|&idx| self.is_live_slot(idx));
        changes.display.retain(|&idx| self.is_live_slot(idx));

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the current traversal order (depth-first pre-order).
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called at least
    /// once.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    /// Rebuilds the depth-first pre-order traversal of all live layers.
    fn rebuild_traversal_order(&mut self) {
        let mut order = Vec::with_capacity(self.len as usize);
        for idx in 0..self.len {
            if self.parent[idx as usize] == super::id::INVALID && !self.free_list.contains(&idx) {
                self.collect_pre_order(idx, &mut order);
            }
        }
        self.traversal_order = order;
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Rect};

    use super::*;
    use crate::geometry::Padding;

    #[test]
    fn no_change_evaluate_returns_empty() {
        let mut store = LayerStore::new();
        let _root = store.create_layer();

        // First evaluate processes initial creation.
        let first = store.evaluate();
        assert!(first.needs_display());

        let changes = store.evaluate();
        assert!(changes.geometry.is_empty());
        assert!(changes.layout.is_empty());
        assert!(changes.display.is_empty());
        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());
        assert!(!changes.topology_changed);
        assert!(!changes.needs_display());
    }

    #[test]
    fn traversal_order_is_depth_first() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();
        let d = store.create_layer();

        // Tree: a -> [b -> [d], c]
        store.add_child(a, b);
        store.add_child(a, c);
        store.add_child(b, d);

        let _ = store.evaluate();

        let order = store.traversal_order();
        assert_eq!(order, &[a.idx, b.idx, d.idx, c.idx]);
    }

    #[test]
    fn moving_a_parent_reports_descendants() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        let other = store.create_layer();
        store.add_child(parent, child);
        let _ = store.evaluate();

        store.set_position(parent, Point::new(3.0, 4.0));
        let changes = store.evaluate();
        assert!(changes.geometry.contains(&parent.idx));
        assert!(
            changes.geometry.contains(&child.idx),
            "geometry propagates to descendants"
        );
        assert!(!changes.geometry.contains(&other.idx));
    }

    #[test]
    fn padding_marks_layout_and_display() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        let _ = store.evaluate();

        store.set_padding(id, Padding::uniform(2.0));
        let changes = store.evaluate();
        assert!(changes.layout.contains(&id.idx));
        assert!(changes.display.contains(&id.idx));
        assert!(changes.geometry.is_empty());
    }

    #[test]
    fn layout_if_needed_consumes_layout_channel() {
        let mut store = LayerStore::new();
        let id = store.create_layer_with_frame(Rect::new(0.0, 0.0, 10.0, 10.0));
        let _ = store.evaluate();

        store.set_padding(id, Padding::uniform(1.0));
        store.layout_if_needed();
        let changes = store.evaluate();
        assert!(changes.layout.is_empty());
        assert!(changes.display.contains(&id.idx));
    }

    #[test]
    fn evaluate_reports_lifecycle() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let changes = store.evaluate();
        assert_eq!(changes.added, &[a.idx]);

        store.destroy_layer(a);
        let changes = store.evaluate();
        assert_eq!(changes.removed, &[a.idx]);
        assert!(changes.display.is_empty(), "destroyed slots are filtered");
    }
}
