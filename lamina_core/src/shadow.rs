// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drop shadows and the margin they reserve.
//!
//! A [`Shadow`] is a plain `Copy` value: assigning one to a layer stores an
//! independent copy. Its [`margin`](Shadow::margin) is a pure function of
//! offset and blur radius, and [`halo`](Shadow::halo) describes the painted
//! shadow as a stack of concentric bands so that raster and vector backends
//! paint exactly the same geometry.

use alloc::vec::Vec;

use kurbo::{Insets, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// Upper bound on the number of halo bands, whatever the blur radius.
pub const MAX_HALO_BANDS: usize = 64;

/// An offset, blurred shadow painted beneath a layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    offset: Vec2,
    blur_radius: f64,
    color: Rgba,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            offset: Vec2::new(0.0, 3.0),
            blur_radius: 0.0,
            color: Rgba::BLACK.with_alpha(1.0 / 3.0),
        }
    }
}

impl Shadow {
    /// Creates a shadow.
    ///
    /// Negative blur radii are treated as their magnitude; non-finite values
    /// become zero.
    #[must_use]
    pub fn new(offset: Vec2, blur_radius: f64, color: Rgba) -> Self {
        Self {
            offset: Vec2::new(finite(offset.x), finite(offset.y)),
            blur_radius: finite(blur_radius).abs(),
            color,
        }
    }

    /// Returns a copy with a different offset.
    #[must_use]
    pub fn with_offset(self, offset: Vec2) -> Self {
        Self::new(offset, self.blur_radius, self.color)
    }

    /// Returns a copy with a different blur radius.
    #[must_use]
    pub fn with_blur_radius(self, blur_radius: f64) -> Self {
        Self::new(self.offset, blur_radius, self.color)
    }

    /// Returns a copy with a different color.
    #[must_use]
    pub fn with_color(self, color: Rgba) -> Self {
        Self::new(self.offset, self.blur_radius, color)
    }

    /// Shadow offset in layer coordinates.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Blur radius.
    #[must_use]
    pub fn blur_radius(&self) -> f64 {
        self.blur_radius
    }

    /// Shadow color.
    #[must_use]
    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Space the shadow needs on each side of the casting shape.
    ///
    /// Each axis reserves `ceil(|offset| + blur)` on both sides, so the margin
    /// grows monotonically with the blur radius and the offset magnitude. A
    /// shadow with no blur and no offset has a zero margin.
    #[must_use]
    pub fn margin(&self) -> Insets {
        let x = (self.offset.x.abs() + self.blur_radius).ceil();
        let y = (self.offset.y.abs() + self.blur_radius).ceil();
        Insets::new(x, y, x, y)
    }

    /// Describes the shadow cast by `source` as concentric bands, outermost
    /// first, using at most `max_bands` bands.
    ///
    /// The band alphas compose (source-over) to the shadow color's alpha in
    /// the fully covered core and fall off linearly over the blur radius. A
    /// shadow with a zero margin produces no bands.
    #[must_use]
    pub fn halo(&self, source: Rect, max_bands: usize) -> Vec<HaloBand> {
        let margin = self.margin();
        if margin.x0 == 0.0 && margin.y0 == 0.0 {
            return Vec::new();
        }
        let core = source.abs() + self.offset;
        if self.blur_radius == 0.0 {
            return alloc::vec![HaloBand {
                rect: core,
                corner_radius: 0.0,
                alpha: self.color.alpha,
            }];
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "the result is clamped to a small band count right away"
        )]
        let steps = (self.blur_radius.ceil() as usize).clamp(1, max_bands.clamp(1, MAX_HALO_BANDS));
        // Per-band alpha such that `steps` overlapping bands reach `alpha`.
        let band_alpha = 1.0 - (1.0 - self.color.alpha).powf(1.0 / steps as f64);
        (0..steps)
            .map(|i| {
                let spread = self.blur_radius * (steps - i) as f64 / steps as f64;
                HaloBand {
                    rect: core.inflate(spread, spread),
                    corner_radius: spread,
                    alpha: band_alpha,
                }
            })
            .collect()
    }
}

/// One band of a shadow halo.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HaloBand {
    /// Band outline.
    pub rect: Rect,
    /// Corner radius of the band outline.
    pub corner_radius: f64,
    /// Alpha applied to the shadow color for this band.
    pub alpha: f64,
}

fn finite(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_shadow_has_zero_margin_and_no_halo() {
        let shadow = Shadow::new(Vec2::ZERO, 0.0, Rgba::BLACK);
        assert_eq!(shadow.margin(), Insets::ZERO);
        assert!(shadow.halo(Rect::new(0.0, 0.0, 10.0, 10.0), 16).is_empty());
    }

    #[test]
    fn margin_grows_with_blur_and_offset() {
        let base = Shadow::new(Vec2::new(1.0, 2.0), 1.0, Rgba::BLACK);
        let blurrier = base.with_blur_radius(4.0);
        let farther = base.with_offset(Vec2::new(-6.0, 2.0));
        assert!(blurrier.margin().x0 > base.margin().x0);
        assert!(blurrier.margin().y0 > base.margin().y0);
        assert!(farther.margin().x0 > base.margin().x0);
        assert_eq!(farther.margin().y0, base.margin().y0);
    }

    #[test]
    fn margin_rounds_up() {
        let shadow = Shadow::new(Vec2::new(0.2, 0.0), 0.3, Rgba::BLACK);
        assert_eq!(shadow.margin(), Insets::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn negative_blur_is_magnitude() {
        let shadow = Shadow::new(Vec2::ZERO, -2.0, Rgba::BLACK);
        assert_eq!(shadow.blur_radius(), 2.0);
    }

    #[test]
    fn copies_are_independent() {
        let original = Shadow::new(Vec2::new(1.0, 1.0), 2.0, Rgba::BLACK);
        let mut copy = original;
        copy = copy.with_blur_radius(9.0);
        assert_eq!(original.blur_radius(), 2.0);
        assert_eq!(copy.blur_radius(), 9.0);
    }

    #[test]
    fn halo_stays_within_margin() {
        let source = Rect::new(10.0, 10.0, 50.0, 30.0);
        let shadow = Shadow::new(Vec2::new(3.0, -2.0), 4.0, Rgba::BLACK.with_alpha(0.5));
        let margin = shadow.margin();
        let reserved = Rect::new(
            source.x0 - margin.x0,
            source.y0 - margin.y0,
            source.x1 + margin.x1,
            source.y1 + margin.y1,
        );
        let bands = shadow.halo(source, 16);
        assert_eq!(bands.len(), 4);
        for band in &bands {
            assert!(
                reserved.contains_rect(band.rect),
                "band {band:?} escapes {reserved:?}"
            );
        }
        assert!(bands[0].rect.area() > bands[3].rect.area(), "outermost first");
    }

    #[test]
    fn halo_band_alphas_compose_to_color_alpha() {
        let shadow = Shadow::new(Vec2::ZERO, 3.0, Rgba::BLACK.with_alpha(0.6));
        let bands = shadow.halo(Rect::new(0.0, 0.0, 10.0, 10.0), 16);
        let remaining = bands.iter().fold(1.0, |acc, b| acc * (1.0 - b.alpha));
        assert!((1.0 - remaining - 0.6).abs() < 1e-9);
    }

    #[test]
    fn unblurred_offset_shadow_is_single_band() {
        let shadow = Shadow::new(Vec2::new(2.0, 2.0), 0.0, Rgba::BLACK);
        let bands = shadow.halo(Rect::new(0.0, 0.0, 10.0, 10.0), 16);
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].rect, Rect::new(2.0, 2.0, 12.0, 12.0));
    }
}
