// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Self-drawing delegates.

use kurbo::Rect;

use crate::context::Canvas;

/// Which backend a render pass targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Screen-like raster output.
    Raster,
    /// Page-description (vector) output.
    Vector,
}

/// Per-layer information handed to [`LayerContent::draw`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerDrawCx {
    /// Backend of the current pass.
    pub mode: RenderMode,
    /// `true` for raster passes: content may trade precision for speed.
    pub use_fast_rendering: bool,
    /// Padding-adjusted content area in layer coordinates.
    pub content_bounds: Rect,
    /// Device pixels per layer unit.
    pub contents_scale: f64,
}

impl LayerDrawCx {
    /// Creates the draw context for a pass in `mode`.
    #[must_use]
    pub fn new(mode: RenderMode, content_bounds: Rect, contents_scale: f64) -> Self {
        Self {
            mode,
            use_fast_rendering: mode == RenderMode::Raster,
            content_bounds,
            contents_scale,
        }
    }
}

/// Draws a layer's own content.
///
/// The canvas is already transformed into layer coordinates and clipped to the
/// layer's masking path. Implementations should draw within
/// [`content_bounds`](LayerDrawCx::content_bounds) and must leave the canvas
/// state balanced.
pub trait LayerContent {
    /// Draws into `canvas`.
    ///
    /// During a render pass the same target is current on the renderer's
    /// [`ContextStack`](crate::context::ContextStack), so helpers may reach it
    /// through [`current`](crate::context::ContextStack::current) instead.
    fn draw(&self, cx: &LayerDrawCx, canvas: &mut dyn Canvas);
}

/// Fills the content area with a solid color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolidFill(pub crate::color::Rgba);

impl LayerContent for SolidFill {
    fn draw(&self, cx: &LayerDrawCx, canvas: &mut dyn Canvas) {
        if cx.content_bounds.area() <= 0.0 || self.0.is_transparent() {
            return;
        }
        canvas.fill_path(&kurbo::Shape::to_path(&cx.content_bounds, 0.1), self.0);
    }
}
