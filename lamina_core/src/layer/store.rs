// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays layer storage with allocation, topology, and property management.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use std::collections::HashSet;

use kurbo::{Affine, Insets, Point, Rect};
use serde::{Deserialize, Serialize};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::content::LayerContent;
use super::graph::GraphSlot;
use super::id::{GraphId, INVALID, Identifier, LayerId, SubscriptionId};
use super::layout::LayoutPolicy;
use super::notify::BoundsChanged;
use super::traverse::Children;
use crate::annotation::{AnnotationSlot, PlotSpace};
use crate::border::{BorderPath, masking_path, sublayer_masking_path};
use crate::dirty;
use crate::geometry::{Padding, add_insets, content_bounds, sanitize_scale};
use crate::shadow::Shadow;

/// Per-layer boolean flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerFlags {
    /// Whether the layer (and its subtree) is skipped when rendering.
    pub hidden: bool,
    /// Whether the layer keeps the frame it was given, ignoring its parent's
    /// automatic layout.
    pub manual_layout: bool,
}

pub(crate) type BoundsCallback = Rc<RefCell<dyn FnMut(&mut LayerStore, &BoundsChanged)>>;

/// Struct-of-arrays storage for all layers.
///
/// Layers are addressed by [`LayerId`] handles. Internally, each layer occupies
/// a slot in parallel arrays. Destroyed layers are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// The store also owns the registries that refer *to* layers without owning
/// them: graphs, annotations, and bounds-change subscribers.
pub struct LayerStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Geometry --
    pub(crate) position: Vec<Point>,
    pub(crate) bounds: Vec<Rect>,
    pub(crate) transform: Vec<Affine>,
    pub(crate) padding: Vec<Padding>,
    pub(crate) contents_scale: Vec<f64>,

    // -- Masking and shadow --
    pub(crate) masks_to_border: Vec<bool>,
    pub(crate) outer_border: Vec<Option<BorderPath>>,
    pub(crate) inner_border: Vec<Option<BorderPath>>,
    pub(crate) masking_path: Vec<Option<BorderPath>>,
    pub(crate) sublayer_masking_path: Vec<Option<BorderPath>>,
    pub(crate) shadow: Vec<Option<Shadow>>,

    // -- Identity and behavior --
    pub(crate) identifier: Vec<Option<Identifier>>,
    pub(crate) flags: Vec<LayerFlags>,
    pub(crate) excluded: Vec<HashSet<LayerId>>,
    pub(crate) content: Vec<Option<Rc<dyn LayerContent>>>,
    pub(crate) layout_policy: Vec<Option<Rc<dyn LayoutPolicy>>>,
    pub(crate) plot_space: Vec<Option<Rc<dyn PlotSpace>>>,
    pub(crate) graph: Vec<Option<GraphId>>,
    /// Annotations to reposition when this layer's bounds change.
    pub(crate) observers: Vec<Vec<u32>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Registries --
    pub(crate) graphs: Vec<GraphSlot>,
    pub(crate) graph_free: Vec<u32>,
    pub(crate) annotations: Vec<AnnotationSlot>,
    pub(crate) annotation_free: Vec<u32>,
    pub(crate) subscribers: Vec<(SubscriptionId, BoundsCallback)>,
    pub(crate) next_subscription: u64,
    pub(crate) dispatching: Vec<u32>,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl fmt::Debug for LayerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerStore")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("annotations", &self.annotations.len())
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStore {
    /// Creates an empty layer store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            position: Vec::new(),
            bounds: Vec::new(),
            transform: Vec::new(),
            padding: Vec::new(),
            contents_scale: Vec::new(),
            masks_to_border: Vec::new(),
            outer_border: Vec::new(),
            inner_border: Vec::new(),
            masking_path: Vec::new(),
            sublayer_masking_path: Vec::new(),
            shadow: Vec::new(),
            identifier: Vec::new(),
            flags: Vec::new(),
            excluded: Vec::new(),
            content: Vec::new(),
            layout_policy: Vec::new(),
            plot_space: Vec::new(),
            graph: Vec::new(),
            observers: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            graphs: Vec::new(),
            graph_free: Vec::new(),
            annotations: Vec::new(),
            annotation_free: Vec::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
            dispatching: Vec::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new layer occupying `frame` in its (future) parent's space.
    ///
    /// The layer's position is the frame origin and its bounds are
    /// `(0, 0, width, height)`. It starts with an identity transform, no
    /// padding, no masks, no shadow, and no parent.
    pub fn create_layer_with_frame(&mut self, frame: Rect) -> LayerId {
        let frame = frame.abs();
        let id = self.allocate();
        self.position[id.idx as usize] = frame.origin();
        self.bounds[id.idx as usize] = Rect::from_origin_size(Point::ORIGIN, frame.size());
        id
    }

    /// Creates a new zero-size layer at the origin.
    pub fn create_layer(&mut self) -> LayerId {
        self.create_layer_with_frame(Rect::ZERO)
    }

    /// Creates a new parentless layer with the same geometry and properties as
    /// `source`.
    ///
    /// Sublayers, annotations, and the graph reference are not copied.
    /// Delegates (content, layout policy, plot space) are shared.
    ///
    /// # Panics
    ///
    /// Panics if `source` is stale.
    pub fn create_layer_copying(&mut self, source: LayerId) -> LayerId {
        self.validate(source);
        let s = source.idx as usize;
        let frame = Rect::from_origin_size(self.position[s], self.bounds[s].size());
        let id = self.create_layer_with_frame(frame);
        let d = id.idx as usize;
        self.bounds[d] = self.bounds[s];
        self.transform[d] = self.transform[s];
        self.padding[d] = self.padding[s];
        self.contents_scale[d] = self.contents_scale[s];
        self.masks_to_border[d] = self.masks_to_border[s];
        self.outer_border[d] = self.outer_border[s].clone();
        self.inner_border[d] = self.inner_border[s].clone();
        self.shadow[d] = self.shadow[s];
        self.identifier[d] = self.identifier[s].clone();
        self.flags[d] = self.flags[s];
        self.content[d] = self.content[s].clone();
        self.layout_policy[d] = self.layout_policy[s].clone();
        self.plot_space[d] = self.plot_space[s].clone();
        self.refresh_masks(id.idx);
        id
    }

    /// Destroys a layer, freeing its slot for reuse.
    ///
    /// Annotations hosted by the layer are detached, annotations whose content
    /// layer it was lose their content, and the layer is dropped from its
    /// parent's excluded set. The layer's graph is not affected.
    ///
    /// # Panics
    ///
    /// Panics if the layer has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_layer(&mut self, id: LayerId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy layer with children"
        );

        // Remove from parent's child list if attached.
        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.excluded[p as usize].remove(&id);
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::LAYOUT);
            self.dirty.mark(p, dirty::DISPLAY);
        }

        self.release_annotation_references(idx);

        // Remove dirty tracking dependencies.
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;

        let i = idx as usize;
        self.content[i] = None;
        self.layout_policy[i] = None;
        self.plot_space[i] = None;
        self.outer_border[i] = None;
        self.inner_border[i] = None;
        self.masking_path[i] = None;
        self.sublayer_masking_path[i] = None;
        self.excluded[i].clear();
        self.graph[i] = None;

        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Destroys `id` and all of its descendants, children before parents.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_subtree(&mut self, id: LayerId) {
        self.validate(id);
        let mut post_order = Vec::new();
        self.collect_post_order(id.idx, &mut post_order);
        for idx in post_order {
            let layer = self.id_at(idx);
            self.destroy_layer(layer);
        }
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last child (frontmost sublayer) of `parent`.
    ///
    /// The child's subtree joins the parent's graph, if any.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        self.link_last(p, c);
        self.attached(p, c);
    }

    /// Removes `child` from its current parent.
    ///
    /// The child leaves the parent's excluded set and, unless it is the root
    /// of its own graph, drops its graph reference.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer has no parent.
    pub fn remove_from_parent(&mut self, child: LayerId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "layer has no parent");
        self.detach(c);
    }

    /// Moves `child` to be the last child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn reparent(&mut self, child: LayerId, new_parent: LayerId) {
        self.validate(child);
        self.validate(new_parent);
        if self.parent[child.idx as usize] != INVALID {
            self.detach(child.idx);
        }
        self.link_last(new_parent.idx, child.idx);
        self.attached(new_parent.idx, child.idx);
    }

    /// Inserts `child` before `sibling` in the sibling list (behind it).
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, child: LayerId, sibling: LayerId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.attached(p, c);
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(self.id_at(p))
        }
    }

    /// Returns an iterator over the direct children of a layer, back to front.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the handles of root layers (those with no parent).
    #[must_use]
    pub fn roots(&self) -> Vec<LayerId> {
        let mut roots = Vec::new();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                roots.push(self.id_at(idx));
            }
        }
        roots
    }

    // -- Geometry getters --

    /// Returns the layer's position in its parent's coordinate space.
    #[must_use]
    pub fn position(&self, id: LayerId) -> Point {
        self.validate(id);
        self.position[id.idx as usize]
    }

    /// Returns the layer's bounds in its own coordinate space.
    #[must_use]
    pub fn bounds(&self, id: LayerId) -> Rect {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Returns the layer's local transform, applied about its position.
    #[must_use]
    pub fn transform(&self, id: LayerId) -> Affine {
        self.validate(id);
        self.transform[id.idx as usize]
    }

    /// Returns the bounding box of the layer in its parent's space.
    #[must_use]
    pub fn frame(&self, id: LayerId) -> Rect {
        self.validate(id);
        self.layer_to_parent_at(id.idx)
            .transform_rect_bbox(self.bounds[id.idx as usize])
    }

    /// Returns the layer's padding.
    #[must_use]
    pub fn padding(&self, id: LayerId) -> Padding {
        self.validate(id);
        self.padding[id.idx as usize]
    }

    /// Returns the device-pixel scale of the layer.
    #[must_use]
    pub fn contents_scale(&self, id: LayerId) -> f64 {
        self.validate(id);
        self.contents_scale[id.idx as usize]
    }

    /// Returns the padding-adjusted content area in layer coordinates.
    #[must_use]
    pub fn content_bounds(&self, id: LayerId) -> Rect {
        self.validate(id);
        let i = id.idx as usize;
        content_bounds(self.bounds[i], self.padding[i])
    }

    /// Space the layer's shadow reserves on each side (zero without a shadow).
    #[must_use]
    pub fn shadow_margin(&self, id: LayerId) -> Insets {
        self.validate(id);
        self.shadow[id.idx as usize].map_or(Insets::ZERO, |s| s.margin())
    }

    /// Padding plus shadow margin on each side; the inset applied to the
    /// bounds when laying out sublayers.
    #[must_use]
    pub fn sublayer_margin(&self, id: LayerId) -> Insets {
        let padding = self.padding(id).to_insets();
        add_insets(padding, self.shadow_margin(id))
    }

    // -- Mask getters --

    /// Returns whether the layer clips to its outer border.
    #[must_use]
    pub fn masks_to_border(&self, id: LayerId) -> bool {
        self.validate(id);
        self.masks_to_border[id.idx as usize]
    }

    /// Returns the outer border path.
    #[must_use]
    pub fn outer_border_path(&self, id: LayerId) -> Option<&BorderPath> {
        self.validate(id);
        self.outer_border[id.idx as usize].as_ref()
    }

    /// Returns the inner border path.
    #[must_use]
    pub fn inner_border_path(&self, id: LayerId) -> Option<&BorderPath> {
        self.validate(id);
        self.inner_border[id.idx as usize].as_ref()
    }

    /// Returns the computed mask for the layer's own drawing.
    #[must_use]
    pub fn masking_path(&self, id: LayerId) -> Option<&BorderPath> {
        self.validate(id);
        self.masking_path[id.idx as usize].as_ref()
    }

    /// Returns the computed mask for the layer's sublayers.
    #[must_use]
    pub fn sublayer_masking_path(&self, id: LayerId) -> Option<&BorderPath> {
        self.validate(id);
        self.sublayer_masking_path[id.idx as usize].as_ref()
    }

    /// Returns the layer's shadow.
    #[must_use]
    pub fn shadow(&self, id: LayerId) -> Option<Shadow> {
        self.validate(id);
        self.shadow[id.idx as usize]
    }

    // -- Identity and behavior getters --

    /// Returns the layer's identifier.
    #[must_use]
    pub fn identifier(&self, id: LayerId) -> Option<&Identifier> {
        self.validate(id);
        self.identifier[id.idx as usize].as_ref()
    }

    /// Returns the first live layer carrying `identifier`, in slot order.
    #[must_use]
    pub fn find_by_identifier(&self, identifier: &Identifier) -> Option<LayerId> {
        (0..self.len)
            .filter(|idx| !self.free_list.contains(idx))
            .find(|&idx| self.identifier[idx as usize].as_ref() == Some(identifier))
            .map(|idx| self.id_at(idx))
    }

    /// Returns the flags of a layer.
    #[must_use]
    pub fn flags(&self, id: LayerId) -> LayerFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the layer's self-drawing delegate.
    #[must_use]
    pub fn content(&self, id: LayerId) -> Option<Rc<dyn LayerContent>> {
        self.validate(id);
        self.content[id.idx as usize].clone()
    }

    /// Returns the layer's layout policy.
    #[must_use]
    pub fn layout_policy(&self, id: LayerId) -> Option<Rc<dyn LayoutPolicy>> {
        self.validate(id);
        self.layout_policy[id.idx as usize].clone()
    }

    /// Returns the layer's plot space.
    #[must_use]
    pub fn plot_space(&self, id: LayerId) -> Option<Rc<dyn PlotSpace>> {
        self.validate(id);
        self.plot_space[id.idx as usize].clone()
    }

    /// Returns whether `child` is excluded from `parent`'s automatic layout.
    #[must_use]
    pub fn is_excluded_from_layout(&self, parent: LayerId, child: LayerId) -> bool {
        self.validate(parent);
        self.excluded[parent.idx as usize].contains(&child)
    }

    /// Returns the children of `parent` that are excluded from its layout, in
    /// sibling order.
    #[must_use]
    pub fn excluded_sublayers(&self, parent: LayerId) -> Vec<LayerId> {
        self.children(parent)
            .filter(|c| self.excluded[parent.idx as usize].contains(c))
            .collect()
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the layer's position in its parent's space.
    pub fn set_position(&mut self, id: LayerId, position: Point) {
        self.validate(id);
        self.position[id.idx as usize] = position;
        self.geometry_changed(id.idx);
    }

    /// Sets the layer's bounds, notifying bounds-change observers if they
    /// differ from the current bounds.
    pub fn set_bounds(&mut self, id: LayerId, bounds: Rect) {
        self.validate(id);
        let idx = id.idx;
        let bounds = bounds.abs();
        let old = self.bounds[idx as usize];
        if old == bounds {
            return;
        }
        self.bounds[idx as usize] = bounds;
        self.dirty.mark(idx, dirty::LAYOUT);
        self.dirty.mark(idx, dirty::DISPLAY);
        self.geometry_changed(idx);
        self.notify_bounds_changed(idx, old, bounds);
    }

    /// Places the layer so that it occupies `frame` in its parent's space.
    ///
    /// The position becomes the frame origin and the bounds keep their origin
    /// but take the frame size. With a non-identity transform the resulting
    /// [`frame`](Self::frame) is the transformed box, not `frame` itself.
    pub fn set_frame(&mut self, id: LayerId, frame: Rect) {
        self.validate(id);
        let frame = frame.abs();
        let origin = self.bounds[id.idx as usize].origin();
        self.set_position(id, frame.origin());
        self.set_bounds(id, Rect::from_origin_size(origin, frame.size()));
    }

    /// Sets the layer's local transform.
    pub fn set_transform(&mut self, id: LayerId, transform: Affine) {
        self.validate(id);
        self.transform[id.idx as usize] = transform;
        self.geometry_changed(id.idx);
    }

    /// Sets the padding, clamping negative sides to zero.
    pub fn set_padding(&mut self, id: LayerId, padding: Padding) {
        self.validate(id);
        self.padding[id.idx as usize] = padding.clamped();
        self.dirty.mark(id.idx, dirty::LAYOUT);
        self.dirty.mark(id.idx, dirty::DISPLAY);
    }

    /// Sets the device-pixel scale; invalid scales become `1.0`.
    pub fn set_contents_scale(&mut self, id: LayerId, scale: f64) {
        self.validate(id);
        self.contents_scale[id.idx as usize] = sanitize_scale(scale);
        self.dirty.mark(id.idx, dirty::DISPLAY);
    }

    /// Sets whether the layer clips to its outer border.
    pub fn set_masks_to_border(&mut self, id: LayerId, masks: bool) {
        self.validate(id);
        self.masks_to_border[id.idx as usize] = masks;
        self.refresh_masks(id.idx);
    }

    /// Sets the outer border path.
    pub fn set_outer_border_path(&mut self, id: LayerId, path: Option<BorderPath>) {
        self.validate(id);
        self.outer_border[id.idx as usize] = path;
        self.refresh_masks(id.idx);
    }

    /// Sets the inner border path.
    pub fn set_inner_border_path(&mut self, id: LayerId, path: Option<BorderPath>) {
        self.validate(id);
        self.inner_border[id.idx as usize] = path;
        self.refresh_masks(id.idx);
    }

    /// Sets (a copy of) the shadow, or removes it.
    ///
    /// The shadow margin feeds the sublayer mask and the sublayer margin, so
    /// both are refreshed and the layer is marked for layout.
    pub fn set_shadow(&mut self, id: LayerId, shadow: Option<Shadow>) {
        self.validate(id);
        self.shadow[id.idx as usize] = shadow;
        self.refresh_masks(id.idx);
        self.dirty.mark(id.idx, dirty::LAYOUT);
    }

    /// Sets the identifier.
    pub fn set_identifier(&mut self, id: LayerId, identifier: Option<Identifier>) {
        self.validate(id);
        self.identifier[id.idx as usize] = identifier;
    }

    /// Sets the flags of a layer.
    ///
    /// Changing `manual_layout` marks the parent for layout; changing
    /// `hidden` marks the parent for display.
    pub fn set_flags(&mut self, id: LayerId, flags: LayerFlags) {
        self.validate(id);
        let idx = id.idx;
        self.flags[idx as usize] = flags;
        self.dirty.mark(idx, dirty::DISPLAY);
        let p = self.parent[idx as usize];
        if p != INVALID {
            self.dirty.mark(p, dirty::DISPLAY);
            self.dirty.mark(p, dirty::LAYOUT);
        }
    }

    /// Shows or hides a layer and its subtree.
    pub fn set_hidden(&mut self, id: LayerId, hidden: bool) {
        let flags = LayerFlags {
            hidden,
            ..self.flags(id)
        };
        self.set_flags(id, flags);
    }

    /// Sets the self-drawing delegate.
    pub fn set_content(&mut self, id: LayerId, content: Option<Rc<dyn LayerContent>>) {
        self.validate(id);
        self.content[id.idx as usize] = content;
        self.dirty.mark(id.idx, dirty::DISPLAY);
    }

    /// Sets the layout policy used for automatic sublayer layout.
    pub fn set_layout_policy(&mut self, id: LayerId, policy: Option<Rc<dyn LayoutPolicy>>) {
        self.validate(id);
        self.layout_policy[id.idx as usize] = policy;
        self.dirty.mark(id.idx, dirty::LAYOUT);
    }

    /// Sets the plot space that maps data coordinates into this layer.
    ///
    /// Annotations hosted here are repositioned.
    pub fn set_plot_space(&mut self, id: LayerId, plot_space: Option<Rc<dyn PlotSpace>>) {
        self.validate(id);
        self.plot_space[id.idx as usize] = plot_space;
        self.reposition_observers(id.idx);
    }

    /// Excludes `child` from `parent`'s automatic layout.
    ///
    /// The set is keyed by identity and may name layers that are not (yet)
    /// children of `parent`; only actual children are affected by layout.
    pub fn exclude_from_layout(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        self.validate(child);
        if self.excluded[parent.idx as usize].insert(child) {
            self.dirty.mark(parent.idx, dirty::LAYOUT);
        }
    }

    /// Returns `child` to `parent`'s automatic layout.
    pub fn include_in_layout(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        if self.excluded[parent.idx as usize].remove(&child) {
            self.dirty.mark(parent.idx, dirty::LAYOUT);
        }
    }

    // -- Notification API --

    /// Registers `callback` to run synchronously after any layer's bounds
    /// change.
    ///
    /// The callback may mutate the store. Bounds changes it causes are
    /// announced to the other subscribers but not back to the callback
    /// itself, and a layer whose change is still being announced takes new
    /// bounds silently.
    pub fn subscribe_bounds_changed(
        &mut self,
        callback: impl FnMut(&mut Self, &BoundsChanged) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Rc::new(RefCell::new(callback))));
        id
    }

    /// Removes a subscription. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(id, _)| *id != subscription);
        self.subscribers.len() != before
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: LayerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Returns the live handle for slot `idx`.
    pub(crate) fn id_at(&self, idx: u32) -> LayerId {
        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns `true` if slot `idx` holds a live layer.
    pub(crate) fn is_live_slot(&self, idx: u32) -> bool {
        idx < self.len && !self.free_list.contains(&idx)
    }

    /// Pops a free slot (or grows the arrays) and resets it to defaults.
    pub(crate) fn allocate(&mut self) -> LayerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot; its generation was bumped on destroy.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.position[i] = Point::ORIGIN;
            self.bounds[i] = Rect::ZERO;
            self.transform[i] = Affine::IDENTITY;
            self.padding[i] = Padding::ZERO;
            self.contents_scale[i] = 1.0;
            self.masks_to_border[i] = false;
            self.outer_border[i] = None;
            self.inner_border[i] = None;
            self.masking_path[i] = None;
            self.sublayer_masking_path[i] = None;
            self.shadow[i] = None;
            self.identifier[i] = None;
            self.flags[i] = LayerFlags::default();
            self.excluded[i].clear();
            self.content[i] = None;
            self.layout_policy[i] = None;
            self.plot_space[i] = None;
            self.graph[i] = None;
            self.observers[i].clear();
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.position.push(Point::ORIGIN);
            self.bounds.push(Rect::ZERO);
            self.transform.push(Affine::IDENTITY);
            self.padding.push(Padding::ZERO);
            self.contents_scale.push(1.0);
            self.masks_to_border.push(false);
            self.outer_border.push(None);
            self.inner_border.push(None);
            self.masking_path.push(None);
            self.sublayer_masking_path.push(None);
            self.shadow.push(None);
            self.identifier.push(None);
            self.flags.push(LayerFlags::default());
            self.excluded.push(HashSet::new());
            self.content.push(None);
            self.layout_policy.push(None);
            self.plot_space.push(None);
            self.graph.push(None);
            self.observers.push(Vec::new());
            self.generation.push(0);
            idx
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.dirty.mark(idx, dirty::LAYOUT);
        self.dirty.mark(idx, dirty::DISPLAY);

        self.id_at(idx)
    }

    /// Recomputes both derived mask paths of slot `idx`.
    pub(crate) fn refresh_masks(&mut self, idx: u32) {
        let i = idx as usize;
        let margin = self.shadow[i].map_or(Insets::ZERO, |s| s.margin());
        let outer = self.outer_border[i].as_ref();
        let masks = self.masks_to_border[i];
        self.masking_path[i] = masking_path(outer, masks);
        self.sublayer_masking_path[i] = sublayer_masking_path(outer, masks, margin);
        self.dirty.mark(idx, dirty::DISPLAY);
    }

    fn geometry_changed(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
        let p = self.parent[idx as usize];
        if p != INVALID {
            self.dirty.mark(p, dirty::DISPLAY);
        }
    }

    /// Appends `c` to `p`'s child list without touching dirty state.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Bookkeeping shared by every way of linking `c` under `p`.
    fn attached(&mut self, p: u32, c: u32) {
        // Child depends on parent for GEOMETRY.
        let _ = self.dirty.add_dependency(c, p, dirty::GEOMETRY);
        if let Some(graph) = self.graph[p as usize] {
            self.set_subtree_graph(c, Some(graph));
        }
        self.dirty.mark_with(c, dirty::GEOMETRY, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.dirty.mark(p, dirty::LAYOUT);
        self.dirty.mark(p, dirty::DISPLAY);
    }

    /// Unlinks `c` from its parent and undoes [`attached`](Self::attached).
    fn detach(&mut self, c: u32) {
        let p = self.parent[c as usize];
        let child = self.id_at(c);
        self.unlink_from_parent(c);
        self.excluded[p as usize].remove(&child);
        self.dirty.remove_dependency(c, p, dirty::GEOMETRY);
        if !self.is_graph_root(c) {
            self.set_subtree_graph(c, None);
        }
        self.dirty.mark_with(c, dirty::GEOMETRY, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.dirty.mark(p, dirty::LAYOUT);
        self.dirty.mark(p, dirty::DISPLAY);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Pre-order slot indices of the subtree rooted at `idx`.
    pub(crate) fn collect_pre_order(&self, idx: u32, out: &mut Vec<u32>) {
        out.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.collect_pre_order(child, out);
            child = self.next_sibling[child as usize];
        }
    }

    fn collect_post_order(&self, idx: u32, out: &mut Vec<u32>) {
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.collect_post_order(child, out);
            child = self.next_sibling[child as usize];
        }
        out.push(idx);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        assert!(store.is_alive(id));
        store.destroy_layer(id);
        assert!(!store.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = LayerStore::new();
        let id1 = store.create_layer();
        store.destroy_layer(id1);
        let id2 = store.create_layer();
        // id2 reuses the same slot but has a different generation.
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn reused_slot_starts_from_defaults() {
        let mut store = LayerStore::new();
        let id1 = store.create_layer_with_frame(Rect::new(5.0, 5.0, 50.0, 50.0));
        store.set_padding(id1, Padding::uniform(4.0));
        store.set_shadow(id1, Some(Shadow::default()));
        store.destroy_layer(id1);
        let id2 = store.create_layer();
        assert_eq!(store.padding(id2), Padding::ZERO);
        assert_eq!(store.shadow(id2), None);
        assert_eq!(store.bounds(id2), Rect::ZERO);
    }

    #[test]
    fn frame_constructor_sets_position_and_bounds() {
        let mut store = LayerStore::new();
        let id = store.create_layer_with_frame(Rect::new(10.0, 20.0, 110.0, 70.0));
        assert_eq!(store.position(id), Point::new(10.0, 20.0));
        assert_eq!(store.bounds(id), Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(store.frame(id), Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn copying_constructor_copies_properties_not_children() {
        let mut store = LayerStore::new();
        let source = store.create_layer_with_frame(Rect::new(0.0, 0.0, 40.0, 40.0));
        let child = store.create_layer();
        store.add_child(source, child);
        store.set_padding(source, Padding::uniform(3.0));
        store.set_outer_border_path(source, Some(BorderPath::Rect(Rect::new(0.0, 0.0, 40.0, 40.0))));
        store.set_masks_to_border(source, true);
        store.set_identifier(source, Some(Identifier::from("plot-area")));

        let copy = store.create_layer_copying(source);
        assert_eq!(store.padding(copy), Padding::uniform(3.0));
        assert_eq!(store.masking_path(copy), store.masking_path(source));
        assert_eq!(store.identifier(copy), Some(&Identifier::from("plot-area")));
        assert_eq!(store.frame(copy), store.frame(source));
        assert!(store.children(copy).next().is_none());
        assert_eq!(store.parent(copy), None);
    }

    #[test]
    fn add_child_and_query() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child1 = store.create_layer();
        let child2 = store.create_layer();

        store.add_child(parent, child1);
        store.add_child(parent, child2);

        assert_eq!(store.parent(child1), Some(parent));
        assert_eq!(store.parent(child2), Some(parent));

        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
    }

    #[test]
    fn remove_from_parent_works() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();

        store.add_child(parent, child);
        store.exclude_from_layout(parent, child);
        store.remove_from_parent(child);
        assert_eq!(store.parent(child), None);
        assert!(store.children(parent).next().is_none());
        assert!(
            !store.is_excluded_from_layout(parent, child),
            "removal leaves the excluded set"
        );
    }

    #[test]
    fn insert_before_works() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();

        store.add_child(parent, a);
        store.add_child(parent, c);
        store.insert_before(b, c);

        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
    }

    #[test]
    fn reparent_works() {
        let mut store = LayerStore::new();
        let p1 = store.create_layer();
        let p2 = store.create_layer();
        let child = store.create_layer();

        store.add_child(p1, child);
        store.reparent(child, p2);
        assert_eq!(store.parent(child), Some(p2));
        assert!(store.children(p1).next().is_none());
    }

    #[test]
    fn roots_returns_parentless_layers() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();

        store.add_child(a, c);

        let roots = store.roots();
        assert!(roots.contains(&a));
        assert!(roots.contains(&b));
        assert!(!roots.contains(&c));
    }

    #[test]
    fn destroy_subtree_frees_descendants() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let mid = store.create_layer();
        let leaf = store.create_layer();
        store.add_child(root, mid);
        store.add_child(mid, leaf);

        store.destroy_subtree(mid);
        assert!(store.is_alive(root));
        assert!(!store.is_alive(mid));
        assert!(!store.is_alive(leaf));
        assert!(store.children(root).next().is_none());
    }

    #[test]
    #[should_panic(expected = "cannot destroy layer with children")]
    fn destroy_with_children_panics() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_child(parent, child);
        store.destroy_layer(parent);
    }

    #[test]
    #[should_panic(expected = "stale LayerId")]
    fn destroyed_handle_panics_on_bounds() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.destroy_layer(id);
        let _ = store.bounds(id);
    }

    #[test]
    #[should_panic(expected = "stale LayerId")]
    fn destroyed_handle_panics_on_set_padding() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.destroy_layer(id);
        store.set_padding(id, Padding::uniform(1.0));
    }

    #[test]
    #[should_panic(expected = "stale LayerId")]
    fn dangling_handle_panics() {
        let store = LayerStore::new();
        let _ = store.position(LayerId::DANGLING);
    }

    #[test]
    fn negative_padding_is_clamped() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.set_padding(id, Padding {
            left: -5.0,
            top: 2.0,
            right: -1.0,
            bottom: 0.0,
        });
        assert_eq!(store.padding(id), Padding::new(0.0, 2.0, 0.0, 0.0));
    }

    #[test]
    fn masking_path_tracks_its_inputs() {
        let mut store = LayerStore::new();
        let id = store.create_layer_with_frame(Rect::new(0.0, 0.0, 100.0, 100.0));
        let outer = BorderPath::rounded_rect(Rect::new(0.0, 0.0, 100.0, 100.0), 6.0);
        assert_eq!(store.masking_path(id), None);

        store.set_outer_border_path(id, Some(outer.clone()));
        assert_eq!(store.masking_path(id), None, "not masking yet");

        store.set_masks_to_border(id, true);
        assert_eq!(store.masking_path(id), Some(&outer));
        assert_eq!(store.sublayer_masking_path(id), Some(&outer));

        store.set_outer_border_path(id, None);
        assert_eq!(store.masking_path(id), None);
        assert_eq!(store.sublayer_masking_path(id), None);
    }

    #[test]
    fn shadow_insets_sublayer_mask_and_margin() {
        let mut store = LayerStore::new();
        let id = store.create_layer_with_frame(Rect::new(0.0, 0.0, 100.0, 100.0));
        store.set_padding(id, Padding::uniform(10.0));
        store.set_outer_border_path(id, Some(BorderPath::Rect(Rect::new(0.0, 0.0, 100.0, 100.0))));
        store.set_masks_to_border(id, true);
        store.set_shadow(
            id,
            Some(Shadow::new(kurbo::Vec2::new(2.0, 2.0), 3.0, crate::color::Rgba::BLACK)),
        );

        assert_eq!(store.shadow_margin(id), Insets::uniform(5.0));
        assert_eq!(store.sublayer_margin(id), Insets::uniform(15.0));
        assert_eq!(
            store.sublayer_masking_path(id),
            Some(&BorderPath::Rect(Rect::new(5.0, 5.0, 95.0, 95.0)))
        );
        assert_eq!(store.content_bounds(id), Rect::new(10.0, 10.0, 90.0, 90.0));
    }

    #[test]
    fn inner_border_does_not_shape_the_sublayer_mask() {
        let mut store = LayerStore::new();
        let id = store.create_layer_with_frame(Rect::new(0.0, 0.0, 100.0, 100.0));
        let outer = BorderPath::Rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        store.set_outer_border_path(id, Some(outer.clone()));
        store.set_inner_border_path(id, Some(BorderPath::Rect(Rect::new(8.0, 8.0, 92.0, 92.0))));
        store.set_masks_to_border(id, true);
        assert_eq!(store.sublayer_masking_path(id), Some(&outer));

        store.set_shadow(
            id,
            Some(Shadow::new(kurbo::Vec2::new(1.0, 0.0), 1.0, crate::color::Rgba::BLACK)),
        );
        assert_eq!(
            store.sublayer_masking_path(id),
            Some(&BorderPath::Rect(Rect::new(2.0, 1.0, 98.0, 99.0))),
            "outer border inset by the shadow margin"
        );
    }

    #[test]
    fn find_by_identifier_skips_destroyed() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        store.set_identifier(a, Some(Identifier::Index(7)));
        assert_eq!(store.find_by_identifier(&Identifier::Index(7)), Some(a));
        store.destroy_layer(a);
        assert_eq!(store.find_by_identifier(&Identifier::Index(7)), None);
    }

    #[test]
    fn subscribers_see_bounds_changes_until_unsubscribed() {
        use alloc::rc::Rc;
        use core::cell::RefCell;

        let mut store = LayerStore::new();
        let id = store.create_layer();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe_bounds_changed(move |_, e| sink.borrow_mut().push(e.new_bounds));

        store.set_bounds(id, Rect::new(0.0, 0.0, 10.0, 10.0));
        store.set_bounds(id, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(seen.borrow().len(), 1, "unchanged bounds are not announced");

        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.set_bounds(id, Rect::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn bounds_cycles_settle_without_reannouncing() {
        use alloc::rc::Rc;
        use core::cell::RefCell;

        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe_bounds_changed(move |_, e| sink.borrow_mut().push(e.layer));
        // `b` copies `a`, and `a` grows to one unit larger than `b`.
        store.subscribe_bounds_changed(move |store, e| {
            if e.layer == a {
                store.set_bounds(b, e.new_bounds);
            }
        });
        store.subscribe_bounds_changed(move |store, e| {
            if e.layer == b {
                store.set_bounds(a, e.new_bounds.inflate(0.5, 0.5));
            }
        });

        store.set_bounds(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(store.bounds(b), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            store.bounds(a),
            Rect::new(-0.5, -0.5, 10.5, 10.5),
            "the nested change to `a` is applied"
        );
        assert_eq!(*seen.borrow(), vec![a, b], "but `a` is announced only once");
        assert!(store.dispatching.is_empty());
    }
}
