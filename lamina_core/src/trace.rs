// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for render passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! render pipeline calls as it walks a layer tree. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::layer::LayerId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which render entry point started a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Vector (page-description) rendering.
    Vector,
    /// Recursive raster rendering.
    Raster,
    /// Layout followed by raster rendering.
    LayoutAndRaster,
}

/// Which stage of a layer's render is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    /// Sublayer layout.
    Layout,
    /// Device-pixel alignment.
    PixelAlign,
    /// Mask clip application.
    Mask,
    /// Self drawing.
    Draw,
    /// Shadow halo compositing.
    Shadow,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a render entry point starts.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Monotonic pass counter of the renderer.
    pub pass_index: u64,
    /// Root layer of the pass.
    pub root: LayerId,
    /// Entry point.
    pub kind: PassKind,
}

/// Emitted when a render entry point finishes successfully.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Root layer of the pass.
    pub root: LayerId,
    /// Number of layers that were drawn (hidden subtrees excluded).
    pub layers_drawn: u32,
}

/// Marks the beginning of a per-layer phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Layer being processed.
    pub layer: LayerId,
    /// Which phase is starting.
    pub phase: RenderPhase,
}

/// Marks the end of a per-layer phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Layer being processed.
    pub layer: LayerId,
    /// Which phase is ending.
    pub phase: RenderPhase,
}

/// Emitted once per drawn layer, before its content.
#[derive(Clone, Copy, Debug)]
pub struct LayerDrawEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Layer being drawn.
    pub layer: LayerId,
    /// Depth below the pass root (the root is 0).
    pub depth: u32,
    /// Whether a masking path clipped the layer's own drawing.
    pub clipped: bool,
}

/// Emitted when the context stack changes depth.
#[derive(Clone, Copy, Debug)]
pub struct ContextEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Stack depth after the change.
    pub depth: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the render pipeline.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a render pass starts.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called when a render pass finishes.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called at the beginning of a per-layer phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a per-layer phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a layer is drawn.
    fn on_layer_draw(&mut self, e: &LayerDrawEvent) {
        _ = e;
    }

    /// Called after a context is pushed.
    fn on_context_push(&mut self, e: &ContextEvent) {
        _ = e;
    }

    /// Called after a context is popped.
    fn on_context_pop(&mut self, e: &ContextEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:ident) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        dispatch!(self, on_pass_begin, e);
    }

    /// Emits a [`PassEndEvent`].
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        dispatch!(self, on_pass_end, e);
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        dispatch!(self, on_phase_begin, e);
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        dispatch!(self, on_phase_end, e);
    }

    /// Emits a [`LayerDrawEvent`].
    #[inline]
    pub fn layer_draw(&mut self, e: &LayerDrawEvent) {
        dispatch!(self, on_layer_draw, e);
    }

    /// Emits a context push.
    #[inline]
    pub fn context_push(&mut self, e: &ContextEvent) {
        dispatch!(self, on_context_push, e);
    }

    /// Emits a context pop.
    #[inline]
    pub fn context_pop(&mut self, e: &ContextEvent) {
        dispatch!(self, on_context_pop, e);
    }
}

impl Default for Tracer<'_> {
    fn default() -> Self {
        Self::none()
    }
}
