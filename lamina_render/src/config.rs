// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer configuration.

/// Configuration for the [`Renderer`](crate::Renderer).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererConfig {
    /// Whether layout passes snap layer positions to device pixels.
    pub pixel_align: bool,
    /// Maximum distance between a curve and its flattened approximation,
    /// in user units.
    pub curve_tolerance: f64,
    /// Upper bound on the number of bands in a shadow halo.
    pub max_shadow_bands: usize,
}

impl RendererConfig {
    /// Configuration for on-screen raster output.
    #[must_use]
    pub const fn screen() -> Self {
        Self {
            pixel_align: true,
            curve_tolerance: 0.1,
            max_shadow_bands: 16,
        }
    }

    /// Configuration for print (vector) output: no pixel snapping, finer
    /// curves, smoother halos.
    #[must_use]
    pub const fn print() -> Self {
        Self {
            pixel_align: false,
            curve_tolerance: 0.01,
            max_shadow_bands: 32,
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::screen()
    }
}
