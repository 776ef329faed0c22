// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// Errors from the render entry points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderError {
    /// The target context has zero (or non-finite) width or height.
    ZeroSizeContext {
        /// Context width.
        width: f64,
        /// Context height.
        height: f64,
    },
    /// A raster surface of the given pixel size could not be allocated.
    SurfaceAllocation {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSizeContext { width, height } => {
                write!(f, "cannot render into a {width}x{height} context")
            }
            Self::SurfaceAllocation { width, height } => {
                write!(f, "raster surface allocation failed ({width}x{height})")
            }
        }
    }
}

impl core::error::Error for RenderError {}
