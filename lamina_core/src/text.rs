// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal text style and fixed-pitch text metrics.
//!
//! Measurement assumes a monospaced face with the proportions of Courier, the
//! base-14 font the vector backend embeds, so a size computed here always
//! matches what either backend draws.

use alloc::string::String;

use kurbo::Size;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// Horizontal advance of one glyph, in ems.
pub const ADVANCE_EM: f64 = 0.6;

/// Line height, in ems.
pub const LINE_HEIGHT_EM: f64 = 1.2;

/// Distance from the top of a line box to the baseline, in ems.
pub const BASELINE_EM: f64 = 0.836;

/// Font, size, and color used to draw a run of text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font family name. Backends without the named font use Courier.
    pub font_name: String,
    /// Font size in points.
    pub font_size: f64,
    /// Fill color.
    pub color: Rgba,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_name: String::from("Courier"),
            font_size: 12.0,
            color: Rgba::BLACK,
        }
    }
}

impl TextStyle {
    /// Creates a Courier style of the given size and color.
    #[must_use]
    pub fn new(font_size: f64, color: Rgba) -> Self {
        Self {
            font_size,
            color,
            ..Self::default()
        }
    }

    /// Returns the usable font size (non-finite or negative sizes are zero).
    #[must_use]
    pub fn effective_size(&self) -> f64 {
        if self.font_size.is_finite() && self.font_size > 0.0 {
            self.font_size
        } else {
            0.0
        }
    }

    /// Measures `text`, rounding each dimension up to a whole unit.
    ///
    /// Lines are separated by `\n`. Empty text measures as zero.
    #[must_use]
    pub fn measure(&self, text: &str) -> Size {
        if text.is_empty() {
            return Size::ZERO;
        }
        let size = self.effective_size();
        let mut lines = 0_usize;
        let mut widest = 0_usize;
        for line in text.split('\n') {
            lines += 1;
            widest = widest.max(line.chars().count());
        }
        Size::new(
            (widest as f64 * ADVANCE_EM * size).ceil(),
            (lines as f64 * LINE_HEIGHT_EM * size).ceil(),
        )
    }

    /// Offset from the top of a line box to its baseline.
    #[must_use]
    pub fn baseline_offset(&self) -> f64 {
        BASELINE_EM * self.effective_size()
    }

    /// Height of one line.
    #[must_use]
    pub fn line_height(&self) -> f64 {
        LINE_HEIGHT_EM * self.effective_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(TextStyle::default().measure(""), Size::ZERO);
    }

    #[test]
    fn measure_uses_fixed_pitch() {
        let style = TextStyle::new(10.0, Rgba::BLACK);
        assert_eq!(style.measure("abcde"), Size::new(30.0, 12.0));
    }

    #[test]
    fn measure_rounds_up() {
        let style = TextStyle::new(11.0, Rgba::BLACK);
        // 3 * 0.6 * 11 = 19.8, 1.2 * 11 = 13.2
        assert_eq!(style.measure("abc"), Size::new(20.0, 14.0));
    }

    #[test]
    fn multi_line_uses_widest_line() {
        let style = TextStyle::new(10.0, Rgba::BLACK);
        assert_eq!(style.measure("ab\nabcd"), Size::new(24.0, 24.0));
    }

    #[test]
    fn bogus_size_measures_zero() {
        let style = TextStyle::new(f64::NAN, Rgba::BLACK);
        assert_eq!(style.measure("abc"), Size::ZERO);
    }
}
