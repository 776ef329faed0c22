// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree data model.
//!
//! A *layer* is a drawable node in a chart. Each layer has:
//!
//! - An identity ([`LayerId`]): a generational handle that becomes stale when
//!   the layer is destroyed, preventing use-after-free bugs at the API level.
//! - Topology: parent, first-child, and sibling links forming an ordered tree
//!   (siblings are drawn back to front).
//! - **Geometry**: a position in the parent's space, bounds in its own space,
//!   a local transform, padding, and a contents scale.
//! - **Masks**: outer and inner border paths plus `masks_to_border`, from
//!   which the store derives the [masking path](LayerStore::masking_path) and
//!   [sublayer masking path](LayerStore::sublayer_masking_path). Derived
//!   paths are recomputed by every setter that feeds them and cannot be set
//!   directly.
//! - Optional shadow, identifier, flags, [content](LayerContent) delegate,
//!   [layout policy](LayoutPolicy), and [plot space](crate::annotation::PlotSpace).
//! - A weak back-reference to the owning [graph](GraphId).
//!
//! Layers are stored in struct-of-arrays layout with index-based handles.
//!
//! # Dirty tracking
//!
//! Property mutations automatically mark the corresponding dirty channel
//! (see [`dirty`](crate::dirty)); [`evaluate`](LayerStore::evaluate) drains
//! them into a [`FrameChanges`].
//!
//! # Notification
//!
//! A bounds change is announced synchronously, inside the setter, as a
//! [`BoundsChanged`] event: annotations observing the layer reposition first,
//! then external [subscribers](LayerStore::subscribe_bounds_changed) run.

mod content;
mod evaluate;
mod graph;
mod id;
mod layout;
mod notify;
mod space;
mod store;
mod traverse;

pub use content::{LayerContent, LayerDrawCx, RenderMode, SolidFill};
pub use evaluate::FrameChanges;
pub use id::{AnnotationId, GraphId, INVALID, Identifier, LayerId, SubscriptionId};
pub use layout::{FillLayout, LayoutPolicy};
pub use notify::BoundsChanged;
pub use store::{LayerFlags, LayerStore};
pub use traverse::Children;
