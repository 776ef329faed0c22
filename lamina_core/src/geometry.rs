// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Padding, content bounds, margins, and device-pixel alignment.
//!
//! Layer space has its origin at the top-left with y pointing down, so the
//! `top` padding sits on the origin side of the bounds.

use kurbo::{Insets, Point, Rect};
use serde::{Deserialize, Serialize};

/// Per-side padding of a layer.
///
/// All sides are non-negative: [`Padding::new`] and the layer setters clamp
/// negative or non-finite values to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    /// Left padding.
    pub left: f64,
    /// Top padding.
    pub top: f64,
    /// Right padding.
    pub right: f64,
    /// Bottom padding.
    pub bottom: f64,
}

impl Padding {
    /// No padding.
    pub const ZERO: Self = Self {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    /// Creates padding, clamping each side to be non-negative.
    #[must_use]
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left: non_negative(left),
            top: non_negative(top),
            right: non_negative(right),
            bottom: non_negative(bottom),
        }
    }

    /// Creates equal padding on every side.
    #[must_use]
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Returns a copy with every side clamped to be non-negative.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(self.left, self.top, self.right, self.bottom)
    }

    /// Returns the padding as shrinking [`Insets`].
    #[must_use]
    pub fn to_insets(self) -> Insets {
        Insets::new(self.left, self.top, self.right, self.bottom)
    }
}

/// Shrinks `rect` by `insets` on each side.
///
/// Unlike [`Rect::inset`], positive values shrink the rectangle. An axis that
/// would become negative collapses to zero width (or height) at the midpoint
/// of the remaining span, so the result is never inverted.
#[must_use]
pub fn shrink_rect(rect: Rect, insets: Insets) -> Rect {
    let rect = rect.abs();
    let (x0, x1) = shrink_span(rect.x0, rect.x1, insets.x0, insets.x1);
    let (y0, y1) = shrink_span(rect.y0, rect.y1, insets.y0, insets.y1);
    Rect::new(x0, y0, x1, y1)
}

fn shrink_span(lo: f64, hi: f64, inset_lo: f64, inset_hi: f64) -> (f64, f64) {
    let a = lo + inset_lo;
    let b = hi - inset_hi;
    if a <= b {
        (a, b)
    } else {
        let mid = (a + b) * 0.5;
        (mid, mid)
    }
}

/// Returns the padding-adjusted content area of `bounds`.
///
/// A zero-area result is valid: drawing into it is simply a no-op.
#[must_use]
pub fn content_bounds(bounds: Rect, padding: Padding) -> Rect {
    shrink_rect(bounds, padding.clamped().to_insets())
}

/// Adds two sets of insets side by side.
#[must_use]
pub fn add_insets(a: Insets, b: Insets) -> Insets {
    Insets::new(a.x0 + b.x0, a.y0 + b.y0, a.x1 + b.x1, a.y1 + b.y1)
}

/// Returns `true` if every side of `insets` is zero.
#[must_use]
pub fn insets_are_zero(insets: Insets) -> bool {
    insets.x0 == 0.0 && insets.y0 == 0.0 && insets.x1 == 0.0 && insets.y1 == 0.0
}

/// Snaps a coordinate to the nearest device-pixel boundary at `scale`.
///
/// `ceil(v * scale - 0.5) / scale` rounds half-pixels down, which makes the
/// operation idempotent: an already aligned value maps to itself.
#[must_use]
pub fn align_to_device(value: f64, scale: f64) -> f64 {
    let scale = sanitize_scale(scale);
    (value * scale - 0.5).ceil() / scale
}

/// Snaps both coordinates of `point` to device pixels.
#[must_use]
pub fn align_point(point: Point, scale: f64) -> Point {
    Point::new(align_to_device(point.x, scale), align_to_device(point.y, scale))
}

/// Returns a usable contents scale: finite and strictly positive, else `1.0`.
#[must_use]
pub fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}
