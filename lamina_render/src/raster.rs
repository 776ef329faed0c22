// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raster canvas backed by a `tiny-skia` pixmap.

use alloc::vec::Vec;

use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape, Size};
use lamina_core::color::Rgba;
use lamina_core::context::Canvas;
use lamina_core::geometry::sanitize_scale;
use lamina_core::text::{ADVANCE_EM, BASELINE_EM, TextStyle};
use tiny_skia::{FillRule, Mask, Paint, Pixmap, Stroke, Transform};

use crate::{RenderError, to_f32};

#[derive(Clone)]
struct RasterState {
    transform: Affine,
    clip: Option<Mask>,
}

/// A [`Canvas`] that rasterizes into an RGBA pixmap.
///
/// The canvas is `size` user units wide and high; each unit covers `scale`
/// device pixels. Text is drawn as one filled box per glyph cell, which is
/// enough for previews and pixel tests; use the vector backend for real
/// glyphs.
pub struct RasterCanvas {
    pixmap: Pixmap,
    size: Size,
    state: RasterState,
    stack: Vec<RasterState>,
}

impl core::fmt::Debug for RasterCanvas {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RasterCanvas")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("size", &self.size)
            .field("depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl RasterCanvas {
    /// Creates a transparent canvas of `size` user units at `scale` pixels
    /// per unit.
    pub fn new(size: Size, scale: f64) -> Result<Self, RenderError> {
        let scale = sanitize_scale(scale);
        let width = device_extent(size.width, scale);
        let height = device_extent(size.height, scale);
        let pixmap = Pixmap::new(width, height)
            .ok_or(RenderError::SurfaceAllocation { width, height })?;
        Ok(Self {
            pixmap,
            size,
            state: RasterState {
                transform: Affine::scale(scale),
                clip: None,
            },
            stack: Vec::new(),
        })
    }

    /// The underlying pixmap.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Consumes the canvas, returning the pixmap.
    #[must_use]
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Reads a device pixel as straight-alpha color.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba::new(
            f64::from(c.red()) / 255.0,
            f64::from(c.green()) / 255.0,
            f64::from(c.blue()) / 255.0,
            f64::from(c.alpha()) / 255.0,
        ))
    }

    fn paint(color: Rgba) -> Paint<'static> {
        let mut paint = Paint::default();
        let [r, g, b, a] = color.to_f32_array();
        paint.set_color_rgba8(channel(r), channel(g), channel(b), channel(a));
        paint.anti_alias = true;
        paint
    }

    fn fill(&mut self, path: &BezPath, color: Rgba) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &Self::paint(color),
            FillRule::Winding,
            to_skia_transform(self.state.transform),
            self.state.clip.as_ref(),
        );
    }
}

impl Canvas for RasterCanvas {
    fn size(&self) -> Size {
        self.size
    }

    fn save_state(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore_state(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn concat_transform(&mut self, affine: Affine) {
        self.state.transform = self.state.transform * affine;
    }

    fn clip_path(&mut self, path: &BezPath) {
        let transform = to_skia_transform(self.state.transform);
        let Some(path) = to_skia_path(path) else {
            // An empty clip hides everything.
            self.state.clip = Mask::new(self.pixmap.width(), self.pixmap.height());
            return;
        };
        match &mut self.state.clip {
            Some(mask) => mask.intersect_path(&path, FillRule::Winding, true, transform),
            None => {
                if let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) {
                    mask.fill_path(&path, FillRule::Winding, true, transform);
                    self.state.clip = Some(mask);
                }
            }
        }
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba) {
        self.fill(path, color);
    }

    fn stroke_path(&mut self, path: &BezPath, color: Rgba, width: f64) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let stroke = Stroke {
            width: to_f32(width.max(0.0)),
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &Self::paint(color),
            &stroke,
            to_skia_transform(self.state.transform),
            self.state.clip.as_ref(),
        );
    }

    fn draw_text(&mut self, text: &str, origin: Point, style: &TextStyle) {
        let size = style.effective_size();
        let advance = ADVANCE_EM * size;
        let line_height = style.line_height();
        let mut glyphs = BezPath::new();
        for (row, line) in text.split('\n').enumerate() {
            let top = origin.y + row as f64 * line_height;
            for (col, ch) in line.chars().enumerate() {
                if ch.is_whitespace() {
                    continue;
                }
                let x = origin.x + col as f64 * advance;
                let cell = Rect::new(
                    x + 0.1 * advance,
                    top + 0.3 * size,
                    x + 0.9 * advance,
                    top + BASELINE_EM * size,
                );
                glyphs.extend(cell.path_elements(0.1));
            }
        }
        self.fill(&glyphs, style.color);
    }
}

fn device_extent(units: f64, scale: f64) -> u32 {
    let px = (units * scale).ceil();
    if px.is_finite() && px > 0.0 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "clamped to u32 range above"
        )]
        let px = px.min(f64::from(u32::MAX)) as u32;
        px
    } else {
        0
    }
}

fn channel(v: f32) -> u8 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "color components are clamped to 0..=1"
    )]
    let c = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    c
}

fn to_skia_transform(a: Affine) -> Transform {
    let [sx, ky, kx, sy, tx, ty] = a.as_coeffs().map(to_f32);
    Transform::from_row(sx, ky, kx, sy, tx, ty)
}

fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = tiny_skia::PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(to_f32(p.x), to_f32(p.y)),
            PathEl::LineTo(p) => pb.line_to(to_f32(p.x), to_f32(p.y)),
            PathEl::QuadTo(p1, p2) => {
                pb.quad_to(to_f32(p1.x), to_f32(p1.y), to_f32(p2.x), to_f32(p2.y));
            }
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                to_f32(p1.x),
                to_f32(p1.y),
                to_f32(p2.x),
                to_f32(p2.y),
                to_f32(p3.x),
                to_f32(p3.y),
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_respects_scale() {
        let mut canvas = RasterCanvas::new(Size::new(10.0, 10.0), 2.0).unwrap();
        assert_eq!(canvas.pixmap().width(), 20);
        canvas.fill_path(&Rect::new(0.0, 0.0, 5.0, 10.0).to_path(0.1), Rgba::BLACK);
        assert_eq!(canvas.pixel(5, 10), Some(Rgba::BLACK));
        assert_eq!(canvas.pixel(15, 10), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn clips_intersect_and_restore() {
        let mut canvas = RasterCanvas::new(Size::new(10.0, 10.0), 1.0).unwrap();
        canvas.save_state();
        canvas.clip_path(&Rect::new(0.0, 0.0, 6.0, 10.0).to_path(0.1));
        canvas.clip_path(&Rect::new(4.0, 0.0, 10.0, 10.0).to_path(0.1));
        canvas.fill_path(&Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1), Rgba::BLACK);
        canvas.restore_state();
        assert_eq!(canvas.pixel(5, 5), Some(Rgba::BLACK));
        assert_eq!(canvas.pixel(1, 5), Some(Rgba::TRANSPARENT));
        assert_eq!(canvas.pixel(8, 5), Some(Rgba::TRANSPARENT));

        canvas.fill_path(&Rect::new(0.0, 0.0, 2.0, 2.0).to_path(0.1), Rgba::WHITE);
        assert_eq!(canvas.pixel(1, 1), Some(Rgba::WHITE), "clip was restored");
    }

    #[test]
    fn zero_size_surface_is_an_error() {
        assert_eq!(
            RasterCanvas::new(Size::ZERO, 1.0).err(),
            Some(RenderError::SurfaceAllocation { width: 0, height: 0 })
        );
    }
}
