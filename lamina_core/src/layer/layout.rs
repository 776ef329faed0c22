// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sublayer layout and device-pixel alignment.
//!
//! A layer lays out those of its children that are neither in its excluded
//! set nor flagged [`manual_layout`](super::LayerFlags::manual_layout): the
//! layout policy receives the bounds inset by the
//! [sublayer margin](LayerStore::sublayer_margin) and returns a frame for
//! each. Manual layout always wins over the excluded set and the policy.

use alloc::vec::Vec;

use kurbo::Rect;

use super::id::LayerId;
use super::store::LayerStore;
use crate::dirty;
use crate::geometry::{align_point, shrink_rect};

/// Computes sublayer frames.
pub trait LayoutPolicy {
    /// Returns one frame per entry of `sublayers`, in `layer`'s local space.
    ///
    /// `layout_bounds` is the layer's bounds inset by its sublayer margin.
    /// Missing trailing frames leave those sublayers untouched.
    fn layout(
        &self,
        store: &LayerStore,
        layer: LayerId,
        layout_bounds: Rect,
        sublayers: &[LayerId],
    ) -> Vec<Rect>;
}

/// Gives every laid-out sublayer the full layout bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct FillLayout;

impl LayoutPolicy for FillLayout {
    fn layout(
        &self,
        _store: &LayerStore,
        _layer: LayerId,
        layout_bounds: Rect,
        sublayers: &[LayerId],
    ) -> Vec<Rect> {
        alloc::vec![layout_bounds; sublayers.len()]
    }
}

impl LayerStore {
    /// Returns the children of `id` that take part in automatic layout.
    #[must_use]
    pub fn laid_out_sublayers(&self, id: LayerId) -> Vec<LayerId> {
        self.validate(id);
        let excluded = &self.excluded[id.idx as usize];
        self.children(id)
            .filter(|c| !excluded.contains(c) && !self.flags[c.idx as usize].manual_layout)
            .collect()
    }

    /// Lays out the direct sublayers of `id` with its layout policy (or
    /// [`FillLayout`]).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn layout_sublayers(&mut self, id: LayerId) {
        self.validate(id);
        let layout_bounds = shrink_rect(self.bounds[id.idx as usize], self.sublayer_margin(id));
        let sublayers = self.laid_out_sublayers(id);
        if sublayers.is_empty() {
            return;
        }
        let frames = match self.layout_policy[id.idx as usize].clone() {
            Some(policy) => policy.layout(self, id, layout_bounds, &sublayers),
            None => FillLayout.layout(self, id, layout_bounds, &sublayers),
        };
        for (child, frame) in sublayers.into_iter().zip(frames) {
            self.set_frame(child, frame);
        }
    }

    /// Snaps the position of `id` to device pixels at its contents scale.
    ///
    /// Idempotent: aligning an aligned layer changes nothing.
    pub fn pixel_align(&mut self, id: LayerId) {
        self.validate(id);
        let i = id.idx as usize;
        let aligned = align_point(self.position[i], self.contents_scale[i]);
        if aligned != self.position[i] {
            self.set_position(id, aligned);
        }
    }

    /// Lays out `id` and its whole subtree, parents before children,
    /// optionally pixel-aligning every layer visited.
    pub fn layout_subtree(&mut self, id: LayerId, align: bool) {
        self.validate(id);
        if align {
            self.pixel_align(id);
        }
        self.layout_sublayers(id);
        let children: Vec<LayerId> = self.children(id).collect();
        for child in children {
            self.layout_subtree(child, align);
        }
    }

    /// Lays out every layer marked for layout, parents before children.
    ///
    /// Layout may resize sublayers, which marks them in turn; the loop runs
    /// until no layer is left marked.
    pub fn layout_if_needed(&mut self) {
        loop {
            let mut pending: Vec<u32> = self
                .dirty
                .drain(dirty::LAYOUT)
                .deterministic()
                .run()
                .collect();
            pending.retain(|&idx| self.is_live_slot(idx));
            if pending.is_empty() {
                break;
            }
            pending.sort_by_key(|&idx| (self.depth_at(idx), idx));
            for idx in pending {
                let id = self.id_at(idx);
                self.layout_sublayers(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use super::*;
    use crate::geometry::Padding;
    use crate::layer::LayerFlags;
    use crate::shadow::Shadow;

    struct Rows;

    impl LayoutPolicy for Rows {
        fn layout(
            &self,
            _store: &LayerStore,
            _layer: LayerId,
            bounds: Rect,
            sublayers: &[LayerId],
        ) -> Vec<Rect> {
            let h = bounds.height() / sublayers.len() as f64;
            (0..sublayers.len())
                .map(|i| {
                    let y0 = bounds.y0 + h * i as f64;
                    Rect::new(bounds.x0, y0, bounds.x1, y0 + h)
                })
                .collect()
        }
    }

    #[test]
    fn fill_layout_respects_padding_and_shadow() {
        let mut store = LayerStore::new();
        let parent = store.create_layer_with_frame(Rect::new(0.0, 0.0, 100.0, 100.0));
        let child = store.create_layer();
        store.add_child(parent, child);
        store.set_padding(parent, Padding::uniform(10.0));
        store.set_shadow(
            parent,
            Some(Shadow::new(kurbo::Vec2::ZERO, 2.0, crate::color::Rgba::BLACK)),
        );

        store.layout_sublayers(parent);
        assert_eq!(store.frame(child), Rect::new(12.0, 12.0, 88.0, 88.0));
    }

    #[test]
    fn excluded_and_manual_sublayers_keep_their_frames() {
        let mut store = LayerStore::new();
        let parent = store.create_layer_with_frame(Rect::new(0.0, 0.0, 100.0, 100.0));
        let auto = store.create_layer();
        let excluded = store.create_layer_with_frame(Rect::new(1.0, 1.0, 2.0, 2.0));
        let manual = store.create_layer_with_frame(Rect::new(3.0, 3.0, 4.0, 4.0));
        store.add_child(parent, auto);
        store.add_child(parent, excluded);
        store.add_child(parent, manual);
        store.exclude_from_layout(parent, excluded);
        store.set_flags(manual, LayerFlags {
            manual_layout: true,
            ..LayerFlags::default()
        });

        store.layout_sublayers(parent);
        assert_eq!(store.frame(auto), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(store.frame(excluded), Rect::new(1.0, 1.0, 2.0, 2.0));
        assert_eq!(store.frame(manual), Rect::new(3.0, 3.0, 4.0, 4.0));
    }

    #[test]
    fn custom_policy_receives_layout_bounds() {
        let mut store = LayerStore::new();
        let parent = store.create_layer_with_frame(Rect::new(0.0, 0.0, 100.0, 100.0));
        let a = store.create_layer();
        let b = store.create_layer();
        store.add_child(parent, a);
        store.add_child(parent, b);
        store.set_layout_policy(parent, Some(Rc::new(Rows)));

        store.layout_sublayers(parent);
        assert_eq!(store.frame(a), Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(store.frame(b), Rect::new(0.0, 50.0, 100.0, 100.0));
    }

    #[test]
    fn layout_if_needed_reaches_grandchildren() {
        let mut store = LayerStore::new();
        let root = store.create_layer_with_frame(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mid = store.create_layer();
        let leaf = store.create_layer();
        store.add_child(root, mid);
        store.add_child(mid, leaf);
        store.set_padding(mid, Padding::uniform(5.0));

        store.layout_if_needed();
        assert_eq!(store.frame(mid), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(store.frame(leaf), Rect::new(5.0, 5.0, 95.0, 95.0));

        // Nothing marked: a second call changes nothing.
        store.set_position(leaf, kurbo::Point::new(7.0, 7.0));
        store.layout_if_needed();
        assert_eq!(store.position(leaf), kurbo::Point::new(7.0, 7.0));
    }

    #[test]
    fn pixel_align_is_idempotent() {
        let mut store = LayerStore::new();
        let id = store.create_layer_with_frame(Rect::new(10.3, 4.75, 20.0, 20.0));
        store.set_contents_scale(id, 2.0);
        store.pixel_align(id);
        let once = store.position(id);
        assert_eq!(once, kurbo::Point::new(10.5, 4.5));
        store.pixel_align(id);
        assert_eq!(store.position(id), once);
    }
}
