// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree, border masks, annotations, and legend entries for chart
//! composition.
//!
//! `lamina_core` holds the data model behind a chart's drawable layers. It
//! uses struct-of-arrays storage with generational index handles, and leaves
//! pixels to a renderer (see `lamina_render`).
//!
//! # Architecture
//!
//! ```text
//!   setters ──► LayerStore ──► dirty channels ──► evaluate() ──► FrameChanges
//!                  │
//!                  ├─► derived masks (border + shadow margin)
//!                  ├─► BoundsChanged ──► annotations reposition, subscribers run
//!                  └─► layout_if_needed() ──► LayoutPolicy frames
//! ```
//!
//! **[`layer`]**: The [`LayerStore`](layer::LayerStore): topology, geometry,
//! padding, masks, shadows, layout, graph membership, and bounds-change
//! notification.
//!
//! **[`geometry`]** and **[`border`]**: Padding, content bounds, device-pixel
//! alignment, and the [`BorderPath`](border::BorderPath) shapes from which
//! masking paths are derived.
//!
//! **[`shadow`]**: The [`Shadow`](shadow::Shadow) value, its reserved
//! margin, and the halo bands a renderer paints.
//!
//! **[`annotation`]**: Annotations that pin a content layer to a point of a
//! host layer and follow it as the host resizes.
//!
//! **[`legend`]**: Legend entries that measure and draw a plot's series
//! titles.
//!
//! **[`context`]** and **[`color`]**: The [`Canvas`](context::Canvas)
//! drawing trait, the scoped [`ContextStack`](context::ContextStack), and
//! conversion from platform color models.
//!
//! **[`archive`]**: JSON archives of layer trees and legend entries.
//!
//! **[`dirty`]**: Channel constants for `understory_dirty`.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and render-pass
//! events, with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod annotation;
pub mod archive;
pub mod border;
pub mod color;
pub mod context;
pub mod dirty;
pub mod geometry;
pub mod layer;
pub mod legend;
pub mod shadow;
pub mod text;
pub mod trace;
