// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color values and platform color conversion.
//!
//! [`Rgba`] is the straight-alpha quadruple used everywhere drawing takes a
//! color. [`NativeColor`] models the color spaces a platform toolkit hands
//! us (device RGB, gray, HSB, CMYK, packed 8-bit sRGB); the conversion
//! functions are pure and never touch the context stack.

use alloc::sync::Arc;

use serde::{Deserialize, Serialize};

/// A straight-alpha RGBA color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red component.
    pub red: f64,
    /// Green component.
    pub green: f64,
    /// Blue component.
    pub blue: f64,
    /// Alpha component.
    pub alpha: f64,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::new_unchecked(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new_unchecked(1.0, 1.0, 1.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new_unchecked(0.0, 0.0, 0.0, 0.0);

    const fn new_unchecked(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates a color, clamping each component into `0.0..=1.0`.
    ///
    /// Non-finite components become `0.0`.
    #[must_use]
    pub fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red: unit(red),
            green: unit(green),
            blue: unit(blue),
            alpha: unit(alpha),
        }
    }

    /// Returns a copy of this color with a different alpha.
    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            alpha: unit(alpha),
            ..self
        }
    }

    /// Returns the components as `[r, g, b, a]` single-precision floats.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "components are in 0..=1, well within f32 precision needs"
    )]
    pub fn to_f32_array(self) -> [f32; 4] {
        [
            self.red as f32,
            self.green as f32,
            self.blue as f32,
            self.alpha as f32,
        ]
    }

    /// Returns `true` if the color is fully transparent.
    #[must_use]
    pub fn is_transparent(self) -> bool {
        self.alpha <= 0.0
    }

    /// Converts a platform color into an RGBA quadruple.
    #[must_use]
    pub fn from_native(native: &NativeColor) -> Self {
        match *native {
            NativeColor::Rgb {
                red,
                green,
                blue,
                alpha,
            } => Self::new(red, green, blue, alpha),
            NativeColor::Gray { white, alpha } => Self::new(white, white, white, alpha),
            NativeColor::Hsb {
                hue,
                saturation,
                brightness,
                alpha,
            } => {
                let (r, g, b) = hsb_to_rgb(hue, unit(saturation), unit(brightness));
                Self::new(r, g, b, alpha)
            }
            NativeColor::Cmyk {
                cyan,
                magenta,
                yellow,
                black,
                alpha,
            } => {
                let k = 1.0 - unit(black);
                Self::new(
                    (1.0 - unit(cyan)) * k,
                    (1.0 - unit(magenta)) * k,
                    (1.0 - unit(yellow)) * k,
                    alpha,
                )
            }
            NativeColor::Srgb8([r, g, b, a]) => Self::new(
                f64::from(r) / 255.0,
                f64::from(g) / 255.0,
                f64::from(b) / 255.0,
                f64::from(a) / 255.0,
            ),
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<NativeColor> for Rgba {
    fn from(native: NativeColor) -> Self {
        Self::from_native(&native)
    }
}

/// A color as described by a platform toolkit, in its own color space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NativeColor {
    /// Device RGB.
    Rgb {
        /// Red component.
        red: f64,
        /// Green component.
        green: f64,
        /// Blue component.
        blue: f64,
        /// Alpha component.
        alpha: f64,
    },
    /// Calibrated gray.
    Gray {
        /// Gray level (0 is black).
        white: f64,
        /// Alpha component.
        alpha: f64,
    },
    /// Hue, saturation, brightness. Hue is in turns (`0.0..1.0`).
    Hsb {
        /// Hue in turns.
        hue: f64,
        /// Saturation.
        saturation: f64,
        /// Brightness.
        brightness: f64,
        /// Alpha component.
        alpha: f64,
    },
    /// Process CMYK.
    Cmyk {
        /// Cyan ink.
        cyan: f64,
        /// Magenta ink.
        magenta: f64,
        /// Yellow ink.
        yellow: f64,
        /// Black ink.
        black: f64,
        /// Alpha component.
        alpha: f64,
    },
    /// Packed 8-bit sRGB with alpha.
    Srgb8([u8; 4]),
}

/// A shared, immutable color handle.
pub type ColorRef = Arc<Rgba>;

/// Creates a new color handle from a platform color.
///
/// Each call allocates a fresh handle; the caller owns it.
#[must_use]
pub fn create_color_from_native(native: &NativeColor) -> ColorRef {
    Arc::new(Rgba::from_native(native))
}

/// Converts a platform color into an [`Rgba`] quadruple.
#[must_use]
pub fn rgba_color_from_native(native: &NativeColor) -> Rgba {
    Rgba::from_native(native)
}

fn unit(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

fn hsb_to_rgb(hue: f64, saturation: f64, brightness: f64) -> (f64, f64, f64) {
    if saturation <= 0.0 {
        return (brightness, brightness, brightness);
    }
    let h = if hue.is_finite() { hue.rem_euclid(1.0) * 6.0 } else { 0.0 };
    let sector = h.floor();
    let f = h - sector;
    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));
    match sector as u8 {
        0 => (brightness, t, p),
        1 => (q, brightness, p),
        2 => (p, brightness, t),
        3 => (p, q, brightness),
        4 => (t, p, brightness),
        _ => (brightness, p, q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_expands_to_equal_components() {
        let c = Rgba::from_native(&NativeColor::Gray {
            white: 0.25,
            alpha: 0.5,
        });
        assert_eq!(c, Rgba::new(0.25, 0.25, 0.25, 0.5));
    }

    #[test]
    fn hsb_primary_hues() {
        let red = Rgba::from_native(&NativeColor::Hsb {
            hue: 0.0,
            saturation: 1.0,
            brightness: 1.0,
            alpha: 1.0,
        });
        assert_eq!(red, Rgba::new(1.0, 0.0, 0.0, 1.0));

        let blue = Rgba::from_native(&NativeColor::Hsb {
            hue: 2.0 / 3.0,
            saturation: 1.0,
            brightness: 1.0,
            alpha: 1.0,
        });
        assert!(blue.red.abs() < 1e-9, "blue has no red: {blue:?}");
        assert!((blue.blue - 1.0).abs() < 1e-9, "blue is saturated: {blue:?}");
    }

    #[test]
    fn cmyk_black_ink_is_black() {
        let c = Rgba::from_native(&NativeColor::Cmyk {
            cyan: 0.0,
            magenta: 0.0,
            yellow: 0.0,
            black: 1.0,
            alpha: 1.0,
        });
        assert_eq!(c, Rgba::BLACK);
    }

    #[test]
    fn srgb8_scales_to_unit_range() {
        let c = Rgba::from(NativeColor::Srgb8([255, 0, 51, 255]));
        assert_eq!(c.red, 1.0);
        assert_eq!(c.green, 0.0);
        assert!((c.blue - 0.2).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_components_are_clamped() {
        let c = Rgba::new(2.0, -1.0, f64::NAN, 0.5);
        assert_eq!(c, Rgba::new(1.0, 0.0, 0.0, 0.5));
    }

    #[test]
    fn create_color_returns_independent_handles() {
        let native = NativeColor::Rgb {
            red: 0.1,
            green: 0.2,
            blue: 0.3,
            alpha: 1.0,
        };
        let a = create_color_from_native(&native);
        let b = create_color_from_native(&native);
        assert_eq!(*a, *b);
        assert!(!Arc::ptr_eq(&a, &b), "each call allocates a new handle");
        assert_eq!(*a, rgba_color_from_native(&native));
    }
}
