// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render entry points.
//!
//! Every pass starts fresh from the layer store: nothing is cached between
//! passes. Per layer the walk is
//!
//! ```text
//!   save
//!   ├─ shadow halo            (unclipped by the layer's own mask)
//!   ├─ save, clip masking path, content draw, restore
//!   ├─ clip sublayer masking path
//!   ├─ for each visible child: save, concat layer_to_parent, recurse, restore
//!   restore
//! ```
//!
//! The walk is shared by all backends, so raster and vector passes issue
//! the same sequence of clips and paints. The target context stays current
//! on the renderer's [`ContextStack`] for the whole pass and is never held
//! borrowed between drawing calls, so layer content can draw either into the
//! canvas it is handed or into [`ContextStack::current`].

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::{Affine, Rect, Vec2};
use lamina_core::border::BorderPath;
use lamina_core::context::{Canvas, ContextRef, ContextStack};
use lamina_core::layer::{LayerDrawCx, LayerId, LayerStore, RenderMode};
use lamina_core::trace::{
    ContextEvent, LayerDrawEvent, PassBeginEvent, PassEndEvent, PassKind, PhaseBeginEvent,
    PhaseEndEvent, RenderPhase, TraceSink, Tracer,
};

use crate::{RenderError, RendererConfig, VectorCanvas, composite_shadow};

/// Drives render passes over a [`LayerStore`].
///
/// The renderer owns the [`ContextStack`]: each entry point pushes the
/// target context for the duration of the pass and pops it on every exit
/// path.
pub struct Renderer<'a> {
    config: RendererConfig,
    contexts: Rc<ContextStack>,
    tracer: Tracer<'a>,
    pass_index: u64,
}

impl core::fmt::Debug for Renderer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("contexts", &self.contexts)
            .field("pass_index", &self.pass_index)
            .finish_non_exhaustive()
    }
}

impl<'a> Renderer<'a> {
    /// Creates a renderer without tracing.
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            contexts: Rc::new(ContextStack::new()),
            tracer: Tracer::none(),
            pass_index: 0,
        }
    }

    /// Creates a renderer that reports pass events to `sink`.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    #[must_use]
    pub fn with_tracer(config: RendererConfig, sink: &'a mut dyn TraceSink) -> Self {
        Self {
            tracer: Tracer::new(sink),
            ..Self::new(config)
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// The context stack passes push onto.
    #[must_use]
    pub fn context_stack(&self) -> Rc<ContextStack> {
        Rc::clone(&self.contexts)
    }

    /// Number of passes started so far.
    #[must_use]
    pub fn pass_count(&self) -> u64 {
        self.pass_index
    }

    /// Renders `root` and its subtree into `context` for page output.
    ///
    /// Layer content sees [`RenderMode::Vector`] and is asked for full
    /// precision.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ZeroSizeContext`] if the context has no area.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale.
    pub fn render_as_vector_in_context(
        &mut self,
        store: &LayerStore,
        root: LayerId,
        context: ContextRef,
    ) -> Result<(), RenderError> {
        self.run_pass(store, root, &context, PassKind::Vector)
    }

    /// Renders `root` and its subtree into `context` for screen output.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ZeroSizeContext`] if the context has no area.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale.
    pub fn recursively_render_in_context(
        &mut self,
        store: &LayerStore,
        root: LayerId,
        context: ContextRef,
    ) -> Result<(), RenderError> {
        self.run_pass(store, root, &context, PassKind::Raster)
    }

    /// Lays out the subtree of `root` (pixel-aligning it if configured),
    /// then renders it into `context` for screen output.
    ///
    /// Nothing is laid out when the context is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ZeroSizeContext`] if the context has no area.
    pub fn layout_and_render_in_context(
        &mut self,
        store: &mut LayerStore,
        root: LayerId,
        context: ContextRef,
    ) -> Result<(), RenderError> {
        check_size(&context)?;
        self.layout(store, root, self.config.pixel_align);
        self.run_pass(store, root, &context, PassKind::LayoutAndRaster)
    }

    /// Lays out `root` and returns a one-page PDF of it, sized to its bounds.
    ///
    /// The bytes depend only on the layer tree, so equal trees produce
    /// identical documents.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ZeroSizeContext`] if `root` has no area.
    pub fn data_for_pdf_representation_of_layer(
        &mut self,
        store: &mut LayerStore,
        root: LayerId,
    ) -> Result<Vec<u8>, RenderError> {
        let size = store.bounds(root).size();
        let page = Rc::new(RefCell::new(VectorCanvas::new(size)));
        let context: ContextRef = page.clone();
        check_size(&context)?;
        self.layout(store, root, false);
        self.run_pass(store, root, &context, PassKind::Vector)?;
        drop(context);
        let finished = core::mem::replace(&mut *page.borrow_mut(), VectorCanvas::new(size));
        Ok(finished.finish())
    }

    fn layout(&mut self, store: &mut LayerStore, root: LayerId, align: bool) {
        let pass_index = self.pass_index + 1;
        self.phase(pass_index, root, RenderPhase::Layout, true);
        store.layout_subtree(root, false);
        self.phase(pass_index, root, RenderPhase::Layout, false);
        if align {
            self.phase(pass_index, root, RenderPhase::PixelAlign, true);
            for (id, _) in store.subtree(root) {
                store.pixel_align(id);
            }
            self.phase(pass_index, root, RenderPhase::PixelAlign, false);
        }
    }

    fn run_pass(
        &mut self,
        store: &LayerStore,
        root: LayerId,
        context: &ContextRef,
        kind: PassKind,
    ) -> Result<(), RenderError> {
        check_size(context)?;
        let origin = store.bounds(root).origin();

        self.pass_index += 1;
        let pass_index = self.pass_index;
        self.tracer.pass_begin(&PassBeginEvent {
            pass_index,
            root,
            kind,
        });

        let contexts = Rc::clone(&self.contexts);
        let guard = contexts.scoped(Rc::clone(context));
        self.tracer.context_push(&ContextEvent {
            pass_index,
            depth: contexts.depth(),
        });

        let mode = match kind {
            PassKind::Vector => RenderMode::Vector,
            PassKind::Raster | PassKind::LayoutAndRaster => RenderMode::Raster,
        };
        // Borrowed per call, so content may also draw through
        // `ContextStack::current`.
        let mut canvas = guard.context();
        canvas.save_state();
        canvas.concat_transform(Affine::translate((-origin.x, -origin.y)));
        let layers_drawn = self.render_layer(store, root, mode, 0, &mut canvas);
        canvas.restore_state();
        drop(canvas);

        drop(guard);
        self.tracer.context_pop(&ContextEvent {
            pass_index,
            depth: contexts.depth(),
        });
        self.tracer.pass_end(&PassEndEvent {
            pass_index,
            root,
            layers_drawn,
        });
        Ok(())
    }

    fn render_layer(
        &mut self,
        store: &LayerStore,
        id: LayerId,
        mode: RenderMode,
        depth: u32,
        canvas: &mut dyn Canvas,
    ) -> u32 {
        if store.flags(id).hidden {
            return 0;
        }
        let pass_index = self.pass_index;
        let tolerance = self.config.curve_tolerance;
        canvas.save_state();

        if let Some(shadow) = store.shadow(id) {
            self.phase(pass_index, id, RenderPhase::Shadow, true);
            let (source, radius) = shadow_source(store, id);
            composite_shadow(
                canvas,
                &shadow,
                source,
                radius,
                self.config.max_shadow_bands,
                tolerance,
            );
            self.phase(pass_index, id, RenderPhase::Shadow, false);
        }

        canvas.save_state();
        self.phase(pass_index, id, RenderPhase::Mask, true);
        let clipped = apply_mask_to_context(store, id, canvas, tolerance);
        self.phase(pass_index, id, RenderPhase::Mask, false);
        self.tracer.layer_draw(&LayerDrawEvent {
            pass_index,
            layer: id,
            depth,
            clipped,
        });
        if let Some(content) = store.content(id) {
            self.phase(pass_index, id, RenderPhase::Draw, true);
            let cx = LayerDrawCx::new(mode, store.content_bounds(id), store.contents_scale(id));
            content.draw(&cx, canvas);
            self.phase(pass_index, id, RenderPhase::Draw, false);
        }
        canvas.restore_state();

        let mut drawn = 1;
        let children: Vec<LayerId> = store.children(id).collect();
        if !children.is_empty() {
            if let Some(mask) = store.sublayer_masking_path(id) {
                canvas.clip_path(&mask.to_bez_path(tolerance));
            }
            for child in children {
                canvas.save_state();
                canvas.concat_transform(store.layer_to_parent(child));
                drawn += self.render_layer(store, child, mode, depth + 1, canvas);
                canvas.restore_state();
            }
        }

        canvas.restore_state();
        drawn
    }

    fn phase(&mut self, pass_index: u64, layer: LayerId, phase: RenderPhase, begin: bool) {
        if begin {
            self.tracer.phase_begin(&PhaseBeginEvent {
                pass_index,
                layer,
                phase,
            });
        } else {
            self.tracer.phase_end(&PhaseEndEvent {
                pass_index,
                layer,
                phase,
            });
        }
    }
}

/// Clips `canvas` to the masking path of `layer`, assuming the canvas is in
/// `layer`'s coordinate space.
///
/// Returns whether a clip was applied; layers without a masking path leave
/// the canvas untouched.
pub fn apply_mask_to_context(
    store: &LayerStore,
    layer: LayerId,
    canvas: &mut dyn Canvas,
    tolerance: f64,
) -> bool {
    match store.masking_path(layer) {
        Some(mask) => {
            canvas.clip_path(&mask.to_bez_path(tolerance));
            true
        }
        None => false,
    }
}

/// Clips `canvas` to the sublayer masking path of `layer`, for content that
/// draws on behalf of `sublayer`.
///
/// The canvas is assumed to be in `sublayer`'s coordinate space shifted by
/// `offset`; the mask is mapped from `layer`'s space accordingly. Returns
/// whether a clip was applied.
pub fn apply_sublayer_mask_to_context(
    store: &LayerStore,
    layer: LayerId,
    sublayer: LayerId,
    offset: Vec2,
    canvas: &mut dyn Canvas,
    tolerance: f64,
) -> bool {
    let Some(mask) = store.sublayer_masking_path(layer) else {
        return false;
    };
    let to_sublayer = Affine::translate(offset) * store.transform_between(layer, sublayer);
    canvas.clip_path(&(to_sublayer * mask.to_bez_path(tolerance)));
    true
}

fn check_size(context: &ContextRef) -> Result<(), RenderError> {
    let size = context.borrow().size();
    if size.width > 0.0 && size.height > 0.0 && size.is_finite() {
        Ok(())
    } else {
        Err(RenderError::ZeroSizeContext {
            width: size.width,
            height: size.height,
        })
    }
}

/// The outline a layer's shadow is cast from, and its corner radius.
fn shadow_source(store: &LayerStore, id: LayerId) -> (Rect, f64) {
    match store.outer_border_path(id) {
        Some(BorderPath::RoundedRect { rect, radius }) => (*rect, *radius),
        Some(path) => (path.bounding_box(), 0.0),
        None => (store.bounds(id), 0.0),
    }
}
