// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions between layer coordinate spaces.
//!
//! A layer's local space is the space its bounds are expressed in. It maps
//! into its parent's local space by
//!
//! ```text
//! layer_to_parent = translate(position) · transform · translate(−bounds.origin)
//! ```
//!
//! so the local transform pivots about the layer's position. Layers in
//! different trees share their roots' space.

use kurbo::{Affine, Point, Rect};

use super::id::{INVALID, LayerId};
use super::store::LayerStore;

impl LayerStore {
    /// Returns the affine map from `id`'s local space into its parent's.
    #[must_use]
    pub fn layer_to_parent(&self, id: LayerId) -> Affine {
        self.validate(id);
        self.layer_to_parent_at(id.idx)
    }

    /// Returns the affine map from `id`'s local space into its root's.
    #[must_use]
    pub fn layer_to_root(&self, id: LayerId) -> Affine {
        self.validate(id);
        self.layer_to_root_at(id.idx)
    }

    /// Returns the affine map from `from`'s local space into `to`'s.
    ///
    /// A singular transform on `to`'s ancestry makes the inverse undefined;
    /// the result then contains non-finite values.
    #[must_use]
    pub fn transform_between(&self, from: LayerId, to: LayerId) -> Affine {
        self.validate(from);
        self.validate(to);
        if from == to {
            return Affine::IDENTITY;
        }
        self.layer_to_root_at(to.idx).inverse() * self.layer_to_root_at(from.idx)
    }

    /// Converts `point` from `from`'s local space into `to`'s.
    #[must_use]
    pub fn convert_point(&self, point: Point, from: LayerId, to: LayerId) -> Point {
        self.transform_between(from, to) * point
    }

    /// Converts `rect` from `from`'s local space into `to`'s, returning the
    /// bounding box of the result.
    #[must_use]
    pub fn convert_rect(&self, rect: Rect, from: LayerId, to: LayerId) -> Rect {
        self.transform_between(from, to).transform_rect_bbox(rect)
    }

    pub(crate) fn layer_to_parent_at(&self, idx: u32) -> Affine {
        let i = idx as usize;
        let origin = self.bounds[i].origin();
        Affine::translate(self.position[i].to_vec2())
            * self.transform[i]
            * Affine::translate((-origin.x, -origin.y))
    }

    fn layer_to_root_at(&self, idx: u32) -> Affine {
        let mut affine = self.layer_to_parent_at(idx);
        let mut p = self.parent[idx as usize];
        while p != INVALID {
            affine = self.layer_to_parent_at(p) * affine;
            p = self.parent[p as usize];
        }
        affine
    }
}
