// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow halo compositing.

use kurbo::{Rect, RoundedRect, Shape};
use lamina_core::context::Canvas;
use lamina_core::shadow::Shadow;

/// Paints the halo `shadow` casts from `source` (in the canvas' current
/// space), with corners rounded by `corner_radius` plus each band's spread.
///
/// Nothing is clipped here; callers paint the halo before applying the
/// layer's own mask. Returns the number of bands painted.
pub fn composite_shadow(
    canvas: &mut dyn Canvas,
    shadow: &Shadow,
    source: Rect,
    corner_radius: f64,
    max_bands: usize,
    tolerance: f64,
) -> usize {
    let bands = shadow.halo(source, max_bands);
    for band in &bands {
        let radius = (band.corner_radius + corner_radius.max(0.0))
            .min(band.rect.width() * 0.5)
            .min(band.rect.height() * 0.5);
        let path = RoundedRect::from_rect(band.rect, radius).to_path(tolerance);
        canvas.fill_path(&path, shadow.color().with_alpha(band.alpha));
    }
    bands.len()
}

#[cfg(test)]
mod tests {
    use kurbo::Vec2;
    use lamina_core::color::Rgba;

    use super::*;
    use crate::RenderPlan;

    #[test]
    fn zero_shadow_paints_nothing() {
        let mut plan = RenderPlan::default();
        let shadow = Shadow::new(Vec2::ZERO, 0.0, Rgba::BLACK);
        let n = composite_shadow(&mut plan, &shadow, Rect::new(0.0, 0.0, 10.0, 10.0), 0.0, 8, 0.1);
        assert_eq!(n, 0);
        assert!(plan.items.is_empty());
    }

    #[test]
    fn bands_are_painted_outermost_first() {
        let mut plan = RenderPlan::default();
        let shadow = Shadow::new(Vec2::new(2.0, 2.0), 4.0, Rgba::BLACK.with_alpha(0.5));
        let n = composite_shadow(&mut plan, &shadow, Rect::new(0.0, 0.0, 10.0, 10.0), 0.0, 8, 0.1);
        assert_eq!(n, 4);
        let widths: alloc::vec::Vec<f64> = plan.fills().map(|(p, _)| p.bounding_box().width()).collect();
        assert!(widths.windows(2).all(|w| w[0] > w[1]), "{widths:?}");
        assert!(plan.fills().all(|(_, c)| c.alpha > 0.0 && c.alpha < 0.5));
    }
}
