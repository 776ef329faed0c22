// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synchronous bounds-change notification.

use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::Rect;

use super::id::LayerId;
use super::store::{BoundsCallback, LayerStore};

/// Payload delivered when a layer's bounds change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundsChanged {
    /// The layer whose bounds changed.
    pub layer: LayerId,
    /// Bounds before the change.
    pub old_bounds: Rect,
    /// Bounds after the change.
    pub new_bounds: Rect,
}

impl LayerStore {
    /// Delivers a bounds change to annotation observers, then subscribers.
    ///
    /// Runs inside the mutation that caused it. Subscribers may change other
    /// bounds in turn; a layer that is already dispatching keeps the new
    /// bounds but is not announced again, which ends notification cycles.
    pub(crate) fn notify_bounds_changed(&mut self, idx: u32, old_bounds: Rect, new_bounds: Rect) {
        if self.dispatching.contains(&idx) {
            return;
        }
        self.dispatching.push(idx);

        self.reposition_observers(idx);

        let event = BoundsChanged {
            layer: self.id_at(idx),
            old_bounds,
            new_bounds,
        };
        let callbacks: Vec<BoundsCallback> =
            self.subscribers.iter().map(|(_, callback)| Rc::clone(callback)).collect();
        for callback in callbacks {
            // Already running further up the stack.
            let Ok(mut run) = callback.try_borrow_mut() else {
                continue;
            };
            (&mut *run)(self, &event);
        }

        self.dispatching.retain(|&i| i != idx);
    }
}
