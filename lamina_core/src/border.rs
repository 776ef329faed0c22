// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Border paths and the masks derived from them.
//!
//! A layer may carry an *outer* and an *inner* [`BorderPath`]. When
//! `masks_to_border` is set, the outer path clips the layer's own drawing
//! ([`masking_path`]) and the sublayer mask ([`sublayer_masking_path`]) is
//! the same outer path pulled in by the shadow margin, so that sublayers
//! never paint over the shadow. The inner path is carried for content that
//! strokes or fills the border ring; it never clips.
//!
//! Masking is opportunistic: without an outer path the layer renders
//! unclipped even when `masks_to_border` is set.

use alloc::vec::Vec;

use kurbo::{BezPath, Insets, Point, Rect, RoundedRect, Shape};
use serde::{Deserialize, Serialize};

use crate::geometry::{insets_are_zero, shrink_rect};

/// A border or mask outline in layer-local coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BorderPath {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A rectangle with equal circular corners.
    RoundedRect {
        /// Outline rectangle.
        rect: Rect,
        /// Corner radius.
        radius: f64,
    },
    /// A closed polygon.
    Polygon(Vec<Point>),
    /// An open polyline. Used as a clip it is closed implicitly by the fill
    /// rule; that interpretation is the caller's responsibility.
    OpenStroke(Vec<Point>),
}

impl BorderPath {
    /// Creates a rounded-rectangle border, falling back to a plain rectangle
    /// when `radius` is not positive.
    #[must_use]
    pub fn rounded_rect(rect: Rect, radius: f64) -> Self {
        if radius.is_finite() && radius > 0.0 {
            Self::RoundedRect {
                rect: rect.abs(),
                radius,
            }
        } else {
            Self::Rect(rect.abs())
        }
    }

    /// Returns `true` if the outline encloses an area by construction.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !matches!(self, Self::OpenStroke(_))
    }

    /// Returns the axis-aligned bounding box of the outline.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        match self {
            Self::Rect(rect) | Self::RoundedRect { rect, .. } => rect.abs(),
            Self::Polygon(points) | Self::OpenStroke(points) => points_bounds(points),
        }
    }

    /// Returns this outline pulled in by `insets` (positive values shrink).
    ///
    /// Rectangles shrink exactly and rounded rectangles lose the largest
    /// inset from their radius. Polygons and open strokes are mapped from
    /// their bounding box onto the shrunken box.
    #[must_use]
    pub fn inset(&self, insets: Insets) -> Self {
        if insets_are_zero(insets) {
            return self.clone();
        }
        match self {
            Self::Rect(rect) => Self::Rect(shrink_rect(*rect, insets)),
            Self::RoundedRect { rect, radius } => {
                let largest = insets.x0.max(insets.y0).max(insets.x1).max(insets.y1);
                Self::rounded_rect(shrink_rect(*rect, insets), (radius - largest).max(0.0))
            }
            Self::Polygon(points) => Self::Polygon(map_to_inset_box(points, insets)),
            Self::OpenStroke(points) => Self::OpenStroke(map_to_inset_box(points, insets)),
        }
    }

    /// Converts the outline into a Bézier path, flattening curves to within
    /// `tolerance`.
    #[must_use]
    pub fn to_bez_path(&self, tolerance: f64) -> BezPath {
        match self {
            Self::Rect(rect) => rect.to_path(tolerance),
            Self::RoundedRect { rect, radius } => {
                RoundedRect::from_rect(*rect, *radius).to_path(tolerance)
            }
            Self::Polygon(points) => polyline(points, true),
            Self::OpenStroke(points) => polyline(points, false),
        }
    }
}

/// Derives the mask applied to a layer's own drawing.
#[must_use]
pub fn masking_path(outer: Option<&BorderPath>, masks_to_border: bool) -> Option<BorderPath> {
    if masks_to_border { outer.cloned() } else { None }
}

/// Derives the mask applied before drawing a layer's sublayers.
///
/// The outer border shrunk by the reserved shadow margin, so sublayers never
/// draw into the halo. Equals [`masking_path`] when no margin is reserved.
#[must_use]
pub fn sublayer_masking_path(
    outer: Option<&BorderPath>,
    masks_to_border: bool,
    shadow_margin: Insets,
) -> Option<BorderPath> {
    masking_path(outer, masks_to_border).map(|mask| mask.inset(shadow_margin))
}

fn polyline(points: &[Point], close: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
        for p in iter {
            path.line_to(*p);
        }
        if close {
            path.close_path();
        }
    }
    path
}

fn points_bounds(points: &[Point]) -> Rect {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(*first, *first), |acc, p| {
        acc.union_pt(*p)
    })
}

fn map_to_inset_box(points: &[Point], insets: Insets) -> Vec<Point> {
    let from = points_bounds(points);
    let to = shrink_rect(from, insets);
    let sx = if from.width() > 0.0 { to.width() / from.width() } else { 0.0 };
    let sy = if from.height() > 0.0 { to.height() / from.height() } else { 0.0 };
    points
        .iter()
        .map(|p| Point::new(to.x0 + (p.x - from.x0) * sx, to.y0 + (p.y - from.y0) * sy))
        .collect()
}
