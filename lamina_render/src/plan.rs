// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: a canvas that records draw commands instead of executing
//! them.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Point, Size};
use lamina_core::color::Rgba;
use lamina_core::context::Canvas;
use lamina_core::text::TextStyle;

/// A single recorded draw command.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderItem {
    /// [`Canvas::save_state`].
    Save,
    /// [`Canvas::restore_state`].
    Restore,
    /// [`Canvas::concat_transform`].
    Transform(Affine),
    /// [`Canvas::clip_path`].
    Clip(BezPath),
    /// [`Canvas::fill_path`].
    Fill {
        /// Filled path.
        path: BezPath,
        /// Fill color.
        color: Rgba,
    },
    /// [`Canvas::stroke_path`].
    Stroke {
        /// Stroked path.
        path: BezPath,
        /// Stroke color.
        color: Rgba,
        /// Line width.
        width: f64,
    },
    /// [`Canvas::draw_text`].
    Text {
        /// The text run.
        text: String,
        /// Top-left of the line box.
        origin: Point,
        /// Style.
        style: TextStyle,
    },
}

impl RenderItem {
    /// Whether this item changes pixels (fill, stroke, or text).
    #[must_use]
    pub fn is_paint(&self) -> bool {
        matches!(self, Self::Fill { .. } | Self::Stroke { .. } | Self::Text { .. })
    }
}

/// An ordered list of draw commands recorded from one or more render passes.
///
/// `RenderPlan` is itself a [`Canvas`], so any render entry point can target
/// it. Passes that differ only in backend produce identical plans.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPlan {
    size: Size,
    /// Recorded commands, in issue order.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty plan for a canvas of the given size.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            items: Vec::new(),
        }
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns the recorded fills, in order.
    pub fn fills(&self) -> impl Iterator<Item = (&BezPath, Rgba)> + '_ {
        self.items.iter().filter_map(|item| match item {
            RenderItem::Fill { path, color } => Some((path, *color)),
            _ => None,
        })
    }

    /// Returns the recorded clips, in order.
    pub fn clips(&self) -> impl Iterator<Item = &BezPath> + '_ {
        self.items.iter().filter_map(|item| match item {
            RenderItem::Clip(path) => Some(path),
            _ => None,
        })
    }
}

impl Canvas for RenderPlan {
    fn size(&self) -> Size {
        self.size
    }

    fn save_state(&mut self) {
        self.items.push(RenderItem::Save);
    }

    fn restore_state(&mut self) {
        self.items.push(RenderItem::Restore);
    }

    fn concat_transform(&mut self, affine: Affine) {
        self.items.push(RenderItem::Transform(affine));
    }

    fn clip_path(&mut self, path: &BezPath) {
        self.items.push(RenderItem::Clip(path.clone()));
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba) {
        self.items.push(RenderItem::Fill {
            path: path.clone(),
            color,
        });
    }

    fn stroke_path(&mut self, path: &BezPath, color: Rgba, width: f64) {
        self.items.push(RenderItem::Stroke {
            path: path.clone(),
            color,
            width,
        });
    }

    fn draw_text(&mut self, text: &str, origin: Point, style: &TextStyle) {
        self.items.push(RenderItem::Text {
            text: text.into(),
            origin,
            style: style.clone(),
        });
    }
}
