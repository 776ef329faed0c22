// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Floating annotations anchored to a host layer.
//!
//! An [`Annotation`] places a content layer on a host layer: a normalized
//! point of the content layer ([`content_anchor_point`](Annotation::content_anchor_point))
//! lands on the host point described by an [`AnnotationAnchor`], shifted by a
//! displacement and rotated about the landing point. The content layer
//! becomes a sublayer of the host that is excluded from the host's automatic
//! layout.
//!
//! Annotations live in the [`LayerStore`] and observe bounds changes of their
//! host, their content layer, and (for [`AnnotationAnchor::Layer`]) their
//! anchor layer. Every such change, and every change to a positioning
//! attribute, recomputes the content layer's position and transform.
//! Annotations hold only weak handles: a destroyed host detaches them, a
//! destroyed content layer leaves them empty, and neither case is an error.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::geometry::align_point;
use crate::layer::{AnnotationId, LayerId, LayerStore};

/// A named point on a rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RectAnchor {
    /// Top-left corner (the bounds origin).
    #[default]
    TopLeft,
    /// Middle of the top edge.
    Top,
    /// Top-right corner.
    TopRight,
    /// Middle of the left edge.
    Left,
    /// Center.
    Center,
    /// Middle of the right edge.
    Right,
    /// Bottom-left corner.
    BottomLeft,
    /// Middle of the bottom edge.
    Bottom,
    /// Bottom-right corner.
    BottomRight,
}

impl RectAnchor {
    /// The anchor as a fraction of the rectangle's size (y down).
    #[must_use]
    pub fn unit_point(self) -> Point {
        let (x, y) = match self {
            Self::TopLeft => (0.0, 0.0),
            Self::Top => (0.5, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::Left => (0.0, 0.5),
            Self::Center => (0.5, 0.5),
            Self::Right => (1.0, 0.5),
            Self::BottomLeft => (0.0, 1.0),
            Self::Bottom => (0.5, 1.0),
            Self::BottomRight => (1.0, 1.0),
        };
        Point::new(x, y)
    }

    /// The anchor's position on `rect`.
    #[must_use]
    pub fn point_in(self, rect: Rect) -> Point {
        project_unit(self.unit_point(), rect)
    }
}

/// Maps data-space coordinates to points in a host layer.
///
/// Implemented by chart plot spaces; set on a host with
/// [`LayerStore::set_plot_space`].
pub trait PlotSpace {
    /// Returns the host-space point for `data`, or `None` if it cannot be
    /// mapped (wrong dimension, outside the plot range, ...).
    fn plot_point(&self, data: &[f64]) -> Option<Point>;
}

/// Where on the host an annotation's content anchor lands.
#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationAnchor {
    /// A fixed point in the host's local space.
    HostPoint(Point),
    /// A named point of the host's bounds.
    HostRect(RectAnchor),
    /// A named point of another layer's bounds, converted into host space.
    Layer {
        /// The layer whose bounds provide the point.
        layer: LayerId,
        /// Which point of those bounds.
        anchor: RectAnchor,
    },
    /// A data-space point mapped through the host's plot space.
    Data(Vec<f64>),
}

impl Default for AnnotationAnchor {
    fn default() -> Self {
        Self::HostRect(RectAnchor::TopLeft)
    }
}

/// Positioning attributes of an annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    content_layer: Option<LayerId>,
    host: Option<LayerId>,
    anchor: AnnotationAnchor,
    content_anchor_point: Point,
    displacement: Vec2,
    rotation: f64,
}

impl Default for Annotation {
    fn default() -> Self {
        Self::new(AnnotationAnchor::default())
    }
}

impl Annotation {
    /// Creates an annotation landing on `anchor`, with the content layer's
    /// center as content anchor and no content layer yet.
    #[must_use]
    pub fn new(anchor: AnnotationAnchor) -> Self {
        Self {
            content_layer: None,
            host: None,
            anchor,
            content_anchor_point: Point::new(0.5, 0.5),
            displacement: Vec2::ZERO,
            rotation: 0.0,
        }
    }

    /// Sets the content layer.
    #[must_use]
    pub fn with_content_layer(mut self, layer: LayerId) -> Self {
        self.content_layer = Some(layer);
        self
    }

    /// Sets the normalized anchor point within the content layer's bounds.
    #[must_use]
    pub fn with_content_anchor_point(mut self, point: Point) -> Self {
        self.content_anchor_point = point;
        self
    }

    /// Sets the displacement in host coordinates.
    #[must_use]
    pub fn with_displacement(mut self, displacement: Vec2) -> Self {
        self.displacement = displacement;
        self
    }

    /// Sets the rotation in radians.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// The content layer, if any.
    #[must_use]
    pub fn content_layer(&self) -> Option<LayerId> {
        self.content_layer
    }

    /// The host layer, if attached.
    #[must_use]
    pub fn host(&self) -> Option<LayerId> {
        self.host
    }

    /// Where the content anchor lands on the host.
    #[must_use]
    pub fn anchor(&self) -> &AnnotationAnchor {
        &self.anchor
    }

    /// Normalized (0..1 per axis) anchor point within the content bounds.
    #[must_use]
    pub fn content_anchor_point(&self) -> Point {
        self.content_anchor_point
    }

    /// Offset from the anchor point, in host coordinates.
    #[must_use]
    pub fn displacement(&self) -> Vec2 {
        self.displacement
    }

    /// Rotation about the displaced anchor point, in radians.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }
}

#[derive(Debug)]
pub(crate) struct AnnotationSlot {
    pub(crate) generation: u32,
    pub(crate) annotation: Option<Annotation>,
    /// Layer slots whose observer lists contain this annotation.
    pub(crate) observed: Vec<u32>,
}

impl LayerStore {
    /// Registers a detached annotation. Any host set on `annotation` is
    /// ignored; use [`attach_annotation`](Self::attach_annotation).
    pub fn create_annotation(&mut self, mut annotation: Annotation) -> AnnotationId {
        annotation.host = None;
        let idx = if let Some(idx) = self.annotation_free.pop() {
            self.annotations[idx as usize].annotation = Some(annotation);
            idx
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "annotation count is bounded well below u32::MAX"
            )]
            let idx = self.annotations.len() as u32;
            self.annotations.push(AnnotationSlot {
                generation: 0,
                annotation: Some(annotation),
                observed: Vec::new(),
            });
            idx
        };
        self.refresh_observation(idx);
        AnnotationId {
            idx,
            generation: self.annotations[idx as usize].generation,
        }
    }

    /// Registers `annotation` and attaches it to `host`.
    pub fn add_annotation(&mut self, host: LayerId, annotation: Annotation) -> AnnotationId {
        let id = self.create_annotation(annotation);
        self.attach_annotation(id, host);
        id
    }

    /// Attaches an annotation to `host`, detaching it from any previous host.
    ///
    /// The content layer becomes a sublayer of `host`, excluded from its
    /// automatic layout, and is positioned immediately.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn attach_annotation(&mut self, id: AnnotationId, host: LayerId) {
        self.validate_annotation(id);
        self.validate(host);
        if self.annotation(id).host.is_some() {
            self.detach_annotation(id);
        }
        if let Some(a) = self.annotation_mut(id) {
            a.host = Some(host);
        }
        if let Some(content) = self.annotation(id).content_layer {
            self.adopt_content(host, content);
        }
        self.refresh_observation(id.idx);
        self.reposition_annotation(id);
    }

    /// Detaches an annotation from its host. The content layer is removed
    /// from the host but stays alive.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn detach_annotation(&mut self, id: AnnotationId) {
        self.validate_annotation(id);
        let annotation = self.annotation(id).clone();
        if let (Some(host), Some(content)) = (annotation.host, annotation.content_layer) {
            self.release_content(host, content);
        }
        if let Some(a) = self.annotation_mut(id) {
            a.host = None;
        }
        self.refresh_observation(id.idx);
    }

    /// Detaches and unregisters an annotation, returning its content layer so
    /// the caller can destroy or reuse it.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_annotation(&mut self, id: AnnotationId) -> Option<LayerId> {
        self.detach_annotation(id);
        let slot = &mut self.annotations[id.idx as usize];
        let content = slot.annotation.take().and_then(|a| a.content_layer);
        slot.generation += 1;
        self.refresh_observation(id.idx);
        self.annotation_free.push(id.idx);
        content.filter(|c| self.is_alive(*c))
    }

    /// Returns whether `id` refers to a registered annotation.
    #[must_use]
    pub fn is_annotation_alive(&self, id: AnnotationId) -> bool {
        self.annotations
            .get(id.idx as usize)
            .is_some_and(|s| s.generation == id.generation && s.annotation.is_some())
    }

    /// Returns an annotation's attributes.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn annotation(&self, id: AnnotationId) -> &Annotation {
        self.validate_annotation(id);
        match &self.annotations[id.idx as usize].annotation {
            Some(a) => a,
            None => unreachable!("validated annotation slot is occupied"),
        }
    }

    /// Returns the annotations attached to `host`, in registration order.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "annotation count is bounded well below u32::MAX"
    )]
    pub fn annotations_on(&self, host: LayerId) -> Vec<AnnotationId> {
        self.validate(host);
        self.annotations
            .iter()
            .enumerate()
            .filter(|(_, s)| s.annotation.as_ref().is_some_and(|a| a.host == Some(host)))
            .map(|(i, s)| AnnotationId {
                idx: i as u32,
                generation: s.generation,
            })
            .collect()
    }

    /// Replaces the content layer, returning the previous one.
    ///
    /// When attached, the previous content layer is removed from the host and
    /// the new one is adopted and positioned.
    pub fn set_annotation_content_layer(
        &mut self,
        id: AnnotationId,
        layer: Option<LayerId>,
    ) -> Option<LayerId> {
        self.validate_annotation(id);
        if let Some(layer) = layer {
            self.validate(layer);
        }
        let annotation = self.annotation(id).clone();
        if let (Some(host), Some(old)) = (annotation.host, annotation.content_layer) {
            self.release_content(host, old);
        }
        if let Some(a) = self.annotation_mut(id) {
            a.content_layer = layer;
        }
        if let (Some(host), Some(new)) = (annotation.host, layer) {
            self.adopt_content(host, new);
        }
        self.refresh_observation(id.idx);
        self.reposition_annotation(id);
        annotation.content_layer
    }

    /// Sets where the content anchor lands on the host.
    pub fn set_annotation_anchor(&mut self, id: AnnotationId, anchor: AnnotationAnchor) {
        self.validate_annotation(id);
        if let Some(a) = self.annotation_mut(id) {
            a.anchor = anchor;
        }
        self.refresh_observation(id.idx);
        self.reposition_annotation(id);
    }

    /// Sets the normalized anchor point within the content layer.
    pub fn set_annotation_content_anchor_point(&mut self, id: AnnotationId, point: Point) {
        self.validate_annotation(id);
        if let Some(a) = self.annotation_mut(id) {
            a.content_anchor_point = point;
        }
        self.reposition_annotation(id);
    }

    /// Sets the displacement in host coordinates.
    pub fn set_annotation_displacement(&mut self, id: AnnotationId, displacement: Vec2) {
        self.validate_annotation(id);
        if let Some(a) = self.annotation_mut(id) {
            a.displacement = displacement;
        }
        self.reposition_annotation(id);
    }

    /// Sets the rotation in radians.
    pub fn set_annotation_rotation(&mut self, id: AnnotationId, rotation: f64) {
        self.validate_annotation(id);
        if let Some(a) = self.annotation_mut(id) {
            a.rotation = rotation;
        }
        self.reposition_annotation(id);
    }

    /// Recomputes the content layer's position and transform.
    ///
    /// Does nothing without a live host and content layer, or when the anchor
    /// cannot be resolved (destroyed anchor layer, missing plot space,
    /// unmappable data point).
    pub fn reposition_annotation(&mut self, id: AnnotationId) {
        self.validate_annotation(id);
        let annotation = self.annotation(id).clone();
        let (Some(host), Some(content)) = (annotation.host, annotation.content_layer) else {
            return;
        };
        if !self.is_alive(host) || !self.is_alive(content) {
            return;
        }
        let Some(landing) = self.resolve_anchor(&annotation.anchor, host) else {
            return;
        };
        let point = landing + annotation.displacement;

        let bounds = self.bounds(content);
        let local_anchor = project_unit(annotation.content_anchor_point, bounds);
        let transform = Affine::rotate(annotation.rotation)
            * Affine::translate(bounds.origin() - local_anchor);
        let position = align_point(point, self.contents_scale(content));

        if self.transform(content) != transform {
            self.set_transform(content, transform);
        }
        if self.position(content) != position {
            self.set_position(content, position);
        }
    }

    /// Repositions every annotation observing layer slot `idx`.
    pub(crate) fn reposition_observers(&mut self, idx: u32) {
        let observers = self.observers[idx as usize].clone();
        for a in observers {
            let id = AnnotationId {
                idx: a,
                generation: self.annotations[a as usize].generation,
            };
            self.reposition_annotation(id);
        }
    }

    /// Drops every annotation reference to layer slot `idx`, which is about
    /// to be destroyed.
    pub(crate) fn release_annotation_references(&mut self, idx: u32) {
        let layer = self.id_at(idx);
        let observers = core::mem::take(&mut self.observers[idx as usize]);
        for a in observers {
            if let Some(annotation) = self.annotations[a as usize].annotation.as_mut() {
                if annotation.host == Some(layer) {
                    annotation.host = None;
                }
                if annotation.content_layer == Some(layer) {
                    annotation.content_layer = None;
                }
                if let AnnotationAnchor::Layer { layer: anchor, .. } = &mut annotation.anchor {
                    if *anchor == layer {
                        *anchor = LayerId::DANGLING;
                    }
                }
            }
            self.refresh_observation(a);
        }
    }

    fn resolve_anchor(&self, anchor: &AnnotationAnchor, host: LayerId) -> Option<Point> {
        match anchor {
            AnnotationAnchor::HostPoint(p) => Some(*p),
            AnnotationAnchor::HostRect(a) => Some(a.point_in(self.bounds(host))),
            AnnotationAnchor::Layer { layer, anchor } => {
                if !self.is_alive(*layer) {
                    return None;
                }
                let p = anchor.point_in(self.bounds(*layer));
                Some(self.convert_point(p, *layer, host))
            }
            AnnotationAnchor::Data(data) => self.plot_space(host)?.plot_point(data),
        }
    }

    fn adopt_content(&mut self, host: LayerId, content: LayerId) {
        if !self.is_alive(content) {
            return;
        }
        match self.parent(content) {
            Some(p) if p == host => {}
            Some(_) => self.reparent(content, host),
            None => self.add_child(host, content),
        }
        self.exclude_from_layout(host, content);
    }

    fn release_content(&mut self, host: LayerId, content: LayerId) {
        if !self.is_alive(host) || !self.is_alive(content) {
            return;
        }
        if self.parent(content) == Some(host) {
            self.remove_from_parent(content);
        } else {
            self.include_in_layout(host, content);
        }
    }

    /// Re-registers annotation slot `a` with the layers it depends on.
    fn refresh_observation(&mut self, a: u32) {
        let old = core::mem::take(&mut self.annotations[a as usize].observed);
        for l in old {
            if let Some(list) = self.observers.get_mut(l as usize) {
                list.retain(|&x| x != a);
            }
        }
        let mut observed = Vec::new();
        if let Some(annotation) = &self.annotations[a as usize].annotation {
            let anchor_layer = match annotation.anchor {
                AnnotationAnchor::Layer { layer, .. } => Some(layer),
                _ => None,
            };
            for layer in [annotation.host, annotation.content_layer, anchor_layer]
                .into_iter()
                .flatten()
            {
                if self.is_alive(layer) && !observed.contains(&layer.idx) {
                    observed.push(layer.idx);
                }
            }
        }
        for &l in &observed {
            self.observers[l as usize].push(a);
        }
        self.annotations[a as usize].observed = observed;
    }

    fn annotation_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations
            .get_mut(id.idx as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.annotation.as_mut())
    }

    fn validate_annotation(&self, id: AnnotationId) {
        assert!(self.is_annotation_alive(id), "stale AnnotationId: {id:?}");
    }
}

fn project_unit(unit: Point, rect: Rect) -> Point {
    Point::new(
        rect.x0 + unit.x * rect.width(),
        rect.y0 + unit.y * rect.height(),
    )
}
