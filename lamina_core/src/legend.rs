// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Legend entries.
//!
//! A [`LegendEntry`] stands for one labelled series of a [`Plot`]. It holds
//! the plot weakly: a dropped plot turns the entry into an empty cell rather
//! than keeping the plot alive. The grid position is assigned by whoever lays
//! out the legend and is never touched by measuring or drawing.

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use kurbo::{Point, Rect, Shape, Size};
use serde::{Deserialize, Serialize};

use crate::context::Canvas;
use crate::geometry::align_to_device;
use crate::text::TextStyle;

/// Stable name of a plot, used to re-resolve plot references after
/// unarchiving.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlotKey(pub String);

impl From<&str> for PlotKey {
    fn from(key: &str) -> Self {
        Self(key.into())
    }
}

/// A data series that contributes entries to a legend.
pub trait Plot {
    /// Stable key identifying this plot.
    fn key(&self) -> PlotKey;

    /// Number of legend entries this plot contributes.
    fn number_of_legend_entries(&self) -> usize;

    /// Label for entry `index`, or `None` if it has none.
    fn title_for_legend_entry(&self, index: usize) -> Option<String>;
}

/// One cell of a legend.
#[derive(Clone)]
pub struct LegendEntry {
    plot: Option<Weak<dyn Plot>>,
    index: usize,
    row: usize,
    column: usize,
    text_style: TextStyle,
    /// The title the cached size was measured for, and that size.
    title_cache: RefCell<Option<(String, Size)>>,
}

impl fmt::Debug for LegendEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegendEntry")
            .field("plot", &self.plot().map(|p| p.key()))
            .field("index", &self.index)
            .field("row", &self.row)
            .field("column", &self.column)
            .field("text_style", &self.text_style)
            .field("title_cache", &self.title_cache)
            .finish()
    }
}

impl Default for LegendEntry {
    fn default() -> Self {
        Self {
            plot: None,
            index: 0,
            row: 0,
            column: 0,
            text_style: TextStyle::default(),
            title_cache: RefCell::new(None),
        }
    }
}

impl LegendEntry {
    /// Creates an entry for series `index` of `plot`.
    #[must_use]
    pub fn new(plot: &Rc<dyn Plot>, index: usize, text_style: TextStyle) -> Self {
        Self {
            plot: Some(Rc::downgrade(plot)),
            index,
            text_style,
            ..Self::default()
        }
    }

    /// Creates one entry per legend entry of `plot`, in index order.
    #[must_use]
    pub fn for_plot(plot: &Rc<dyn Plot>, text_style: &TextStyle) -> Vec<Self> {
        (0..plot.number_of_legend_entries())
            .map(|i| Self::new(plot, i, text_style.clone()))
            .collect()
    }

    /// The plot, if it is still alive.
    #[must_use]
    pub fn plot(&self) -> Option<Rc<dyn Plot>> {
        self.plot.as_ref().and_then(Weak::upgrade)
    }

    /// Replaces the plot reference.
    pub fn set_plot(&mut self, plot: Option<&Rc<dyn Plot>>) {
        self.plot = plot.map(Rc::downgrade);
        self.invalidate_title_size();
    }

    /// Series index within the plot.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Sets the series index.
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
        self.invalidate_title_size();
    }

    /// Grid row.
    #[must_use]
    pub fn row(&self) -> usize {
        self.row
    }

    /// Sets the grid row.
    pub fn set_row(&mut self, row: usize) {
        self.row = row;
    }

    /// Grid column.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Sets the grid column.
    pub fn set_column(&mut self, column: usize) {
        self.column = column;
    }

    /// Style used to measure and draw the title.
    #[must_use]
    pub fn text_style(&self) -> &TextStyle {
        &self.text_style
    }

    /// Sets the title style.
    pub fn set_text_style(&mut self, text_style: TextStyle) {
        self.text_style = text_style;
        self.invalidate_title_size();
    }

    /// Drops the cached title size.
    ///
    /// The cache already notices label changes when the size is next read;
    /// this only forces a re-measure.
    pub fn invalidate_title_size(&self) {
        self.title_cache.replace(None);
    }

    /// The plot's current label for this entry.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.plot()?.title_for_legend_entry(self.index)
    }

    /// Size of the title in the current style, rounded up to whole units.
    ///
    /// Zero when the plot is gone or has no label for this entry.
    #[must_use]
    pub fn title_size(&self) -> Size {
        match self.title() {
            Some(title) => self.measured(&title),
            None => Size::ZERO,
        }
    }

    /// Draws the title into `rect`, clipped to it, left-aligned and
    /// vertically centered with the offset snapped to device pixels at
    /// `scale`.
    pub fn draw_title_in_rect(&self, rect: Rect, canvas: &mut dyn Canvas, scale: f64) {
        let Some(title) = self.title() else {
            return;
        };
        let rect = rect.abs();
        let size = self.measured(&title);
        let offset = align_to_device((rect.height() - size.height) * 0.5, scale);

        canvas.save_state();
        canvas.clip_path(&rect.to_path(0.1));
        canvas.draw_text(
            &title,
            Point::new(rect.x0, rect.y0 + offset),
            &self.text_style,
        );
        canvas.restore_state();
    }

    fn measured(&self, title: &str) -> Size {
        if let Some((cached, size)) = &*self.title_cache.borrow() {
            if cached == title {
                return *size;
            }
        }
        let size = self.text_style.measure(title);
        self.title_cache.replace(Some((title.into(), size)));
        size
    }
}
