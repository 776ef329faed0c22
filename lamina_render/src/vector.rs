// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vector canvas that writes a single-page PDF with `pdf-writer`.
//!
//! Output is a pure function of the draw calls: object numbers are fixed,
//! graphics states are numbered in first-use order, and no timestamps or
//! document IDs are written, so identical input yields identical bytes.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Affine, BezPath, PathEl, Point, Size};
use lamina_core::color::Rgba;
use lamina_core::context::Canvas;
use lamina_core::text::TextStyle;
use pdf_writer::{Content, Name, Pdf, Ref, Str};

use crate::to_f32;

const CATALOG_ID: i32 = 1;
const PAGES_ID: i32 = 2;
const PAGE_ID: i32 = 3;
const CONTENT_ID: i32 = 4;
const FONT_ID: i32 = 5;
const FIRST_GS_ID: i32 = 6;
const FONT_NAME: &[u8] = b"F1";

/// A [`Canvas`] that records PDF page content.
///
/// Coordinates are y-down like every other canvas; the page content starts
/// with a flip so the PDF's y-up space matches. Text uses the base-14
/// Courier font, whose metrics [`TextStyle::measure`] mirrors.
pub struct VectorCanvas {
    size: Size,
    content: Content,
    depth: usize,
    /// Alpha values (in thousandths) that need a graphics state, in
    /// first-use order.
    alphas: Vec<u16>,
}

impl core::fmt::Debug for VectorCanvas {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VectorCanvas")
            .field("size", &self.size)
            .field("depth", &self.depth)
            .field("alphas", &self.alphas)
            .finish_non_exhaustive()
    }
}

impl VectorCanvas {
    /// Creates an empty page of `size` points.
    #[must_use]
    pub fn new(size: Size) -> Self {
        let mut content = Content::new();
        content.transform([1.0, 0.0, 0.0, -1.0, 0.0, to_f32(size.height)]);
        Self {
            size,
            content,
            depth: 0,
            alphas: Vec::new(),
        }
    }

    /// Assembles the PDF document.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        let (catalog_id, pages_id, page_id) = (Ref::new(CATALOG_ID), Ref::new(PAGES_ID), Ref::new(PAGE_ID));
        let (content_id, font_id) = (Ref::new(CONTENT_ID), Ref::new(FONT_ID));
        let mut next_id = FIRST_GS_ID;
        let states: Vec<(String, Ref)> = (0..self.alphas.len())
            .map(|i| {
                let r = Ref::new(next_id);
                next_id += 1;
                (format!("GS{i}"), r)
            })
            .collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id).kids([page_id]).count(1);
        {
            let mut page = pdf.page(page_id);
            page.media_box(pdf_writer::Rect::new(
                0.0,
                0.0,
                to_f32(self.size.width),
                to_f32(self.size.height),
            ))
            .parent(pages_id)
            .contents(content_id);
            let mut resources = page.resources();
            resources.fonts().pair(Name(FONT_NAME), font_id);
            if !states.is_empty() {
                let mut ext = resources.ext_g_states();
                for (name, id) in &states {
                    ext.pair(Name(name.as_bytes()), *id);
                }
            }
        }
        pdf.stream(content_id, &self.content.finish());
        pdf.type1_font(font_id).base_font(Name(b"Courier"));
        for ((_, id), &milli) in states.iter().zip(&self.alphas) {
            let alpha = f32::from(milli) / 1000.0;
            pdf.ext_graphics(*id)
                .non_stroking_alpha(alpha)
                .stroking_alpha(alpha);
        }
        pdf.finish()
    }

    /// Selects fill color and alpha for the next paint operation. Returns
    /// whether a state was saved that the caller must restore.
    fn begin_paint(&mut self, color: Rgba, stroke: bool) -> bool {
        let [r, g, b, a] = color.to_f32_array();
        let translucent = a < 1.0;
        if translucent {
            self.content.save_state();
            let name = self.graphics_state(a);
            self.content.set_parameters(Name(name.as_bytes()));
        }
        if stroke {
            self.content.set_stroke_rgb(r, g, b);
        } else {
            self.content.set_fill_rgb(r, g, b);
        }
        translucent
    }

    fn end_paint(&mut self, saved: bool) {
        if saved {
            self.content.restore_state();
        }
    }

    fn graphics_state(&mut self, alpha: f32) -> String {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "alpha is clamped to 0..=1, so thousandths fit in u16"
        )]
        let milli = (alpha.clamp(0.0, 1.0) * 1000.0).round() as u16;
        let index = match self.alphas.iter().position(|&a| a == milli) {
            Some(i) => i,
            None => {
                self.alphas.push(milli);
                self.alphas.len() - 1
            }
        };
        format!("GS{index}")
    }

    fn write_path(&mut self, path: &BezPath) {
        let mut current = Point::ZERO;
        let mut start = Point::ZERO;
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    self.content.move_to(to_f32(p.x), to_f32(p.y));
                    current = p;
                    start = p;
                }
                PathEl::LineTo(p) => {
                    self.content.line_to(to_f32(p.x), to_f32(p.y));
                    current = p;
                }
                PathEl::QuadTo(p1, p2) => {
                    let c1 = current + (p1 - current) * (2.0 / 3.0);
                    let c2 = p2 + (p1 - p2) * (2.0 / 3.0);
                    self.cubic(c1, c2, p2);
                    current = p2;
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    self.cubic(p1, p2, p3);
                    current = p3;
                }
                PathEl::ClosePath => {
                    self.content.close_path();
                    current = start;
                }
            }
        }
    }

    fn cubic(&mut self, p1: Point, p2: Point, p3: Point) {
        self.content.cubic_to(
            to_f32(p1.x),
            to_f32(p1.y),
            to_f32(p2.x),
            to_f32(p2.y),
            to_f32(p3.x),
            to_f32(p3.y),
        );
    }
}

impl Canvas for VectorCanvas {
    fn size(&self) -> Size {
        self.size
    }

    fn save_state(&mut self) {
        self.content.save_state();
        self.depth += 1;
    }

    fn restore_state(&mut self) {
        if self.depth > 0 {
            self.content.restore_state();
            self.depth -= 1;
        }
    }

    fn concat_transform(&mut self, affine: Affine) {
        self.content.transform(affine.as_coeffs().map(to_f32));
    }

    fn clip_path(&mut self, path: &BezPath) {
        self.write_path(path);
        self.content.clip_nonzero();
        self.content.end_path();
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba) {
        if path.elements().is_empty() {
            return;
        }
        let saved = self.begin_paint(color, false);
        self.write_path(path);
        self.content.fill_nonzero();
        self.end_paint(saved);
    }

    fn stroke_path(&mut self, path: &BezPath, color: Rgba, width: f64) {
        if path.elements().is_empty() {
            return;
        }
        let saved = self.begin_paint(color, true);
        self.content.set_line_width(to_f32(width.max(0.0)));
        self.write_path(path);
        self.content.stroke();
        self.end_paint(saved);
    }

    fn draw_text(&mut self, text: &str, origin: Point, style: &TextStyle) {
        let size = style.effective_size();
        if text.is_empty() || size == 0.0 {
            return;
        }
        let saved = self.begin_paint(style.color, false);
        for (row, line) in text.split('\n').enumerate() {
            // Courier's built-in encoding covers ASCII only.
            let bytes: Vec<u8> = line
                .chars()
                .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' })
                .collect();
            let baseline = origin.y + row as f64 * style.line_height() + style.baseline_offset();
            self.content
                .begin_text()
                .set_font(Name(FONT_NAME), to_f32(size))
                // Undo the page flip so glyphs stand upright.
                .set_text_matrix([1.0, 0.0, 0.0, -1.0, to_f32(origin.x), to_f32(baseline)])
                .show(Str(&bytes))
                .end_text();
        }
        self.end_paint(saved);
    }
}
