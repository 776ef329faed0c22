// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render pipeline for lamina layer trees.
//!
//! This crate walks a [`lamina_core`] layer tree and issues draw calls into a
//! [`Canvas`](lamina_core::context::Canvas). It provides:
//!
//! - [`Renderer`]: the render entry points (vector, raster, and
//!   layout-and-raster), mask application, and shadow compositing
//! - [`RasterCanvas`]: a `tiny-skia` pixmap backend
//! - [`VectorCanvas`]: a `pdf-writer` backend with reproducible output
//! - [`RenderPlan`]: a recording canvas for inspecting the command stream
//! - [`RendererConfig`]: presets for screen and print output
//!
//! # Crate features
//!
//! - `trace` (disabled by default): forwards to `lamina_core/trace`, enabling
//!   render-pass events on [`Renderer::with_tracer`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod config;
mod error;
mod pipeline;
mod plan;
mod raster;
mod shadow;
mod vector;

pub use config::RendererConfig;
pub use error::RenderError;
pub use pipeline::{Renderer, apply_mask_to_context, apply_sublayer_mask_to_context};
pub use plan::{RenderItem, RenderPlan};
pub use raster::RasterCanvas;
pub use shadow::composite_shadow;
pub use vector::VectorCanvas;

pub(crate) fn to_f32(v: f64) -> f32 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "device and page coordinates fit comfortably in f32"
    )]
    let v = v as f32;
    v
}
