// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output and layer-tree dumps.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).
//! [`write_tree`] prints a layer subtree, one indented line per layer.

use std::io::{self, Write};

use kurbo::Rect;
use lamina_core::border::BorderPath;
use lamina_core::layer::{LayerId, LayerStore};
use lamina_core::trace::{
    ContextEvent, LayerDrawEvent, PassBeginEvent, PassEndEvent, PhaseBeginEvent, PhaseEndEvent,
    RenderPhase, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    /// Indentation follows layer depth when set.
    indent_layers: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("indent_layers", &self.indent_layers)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            indent_layers: true,
        }
    }

    /// Disables depth indentation of layer-draw lines.
    #[must_use]
    pub fn flat(mut self) -> Self {
        self.indent_layers = false;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn phase_name(phase: RenderPhase) -> &'static str {
    match phase {
        RenderPhase::Layout => "layout",
        RenderPhase::PixelAlign => "align",
        RenderPhase::Mask => "mask",
        RenderPhase::Draw => "draw",
        RenderPhase::Shadow => "shadow",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] pass={} root={:?} kind={:?}",
            e.pass_index, e.root, e.kind,
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:end] pass={} root={:?} drawn={}",
            e.pass_index, e.root, e.layers_drawn,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] pass={} {} layer={:?}",
            e.pass_index,
            phase_name(e.phase),
            e.layer,
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] pass={} {} layer={:?}",
            e.pass_index,
            phase_name(e.phase),
            e.layer,
        );
    }

    fn on_layer_draw(&mut self, e: &LayerDrawEvent) {
        let indent = if self.indent_layers {
            e.depth as usize * 2
        } else {
            0
        };
        let clipped = if e.clipped { " clipped" } else { "" };
        let _ = writeln!(
            self.writer,
            "[draw] pass={} {:indent$}{:?} depth={}{clipped}",
            e.pass_index, "", e.layer, e.depth,
        );
    }

    fn on_context_push(&mut self, e: &ContextEvent) {
        let _ = writeln!(self.writer, "[context:push] pass={} depth={}", e.pass_index, e.depth);
    }

    fn on_context_pop(&mut self, e: &ContextEvent) {
        let _ = writeln!(self.writer, "[context:pop] pass={} depth={}", e.pass_index, e.depth);
    }
}

/// Writes the subtree of `root`, one line per layer, indented by depth.
///
/// Each line shows the handle, identifier, frame, and whichever of padding,
/// mask, shadow, flags, and delegates are set.
///
/// # Panics
///
/// Panics if `root` is stale.
pub fn write_tree(store: &LayerStore, root: LayerId, writer: &mut dyn Write) -> io::Result<()> {
    for (id, depth) in store.subtree(root) {
        write!(writer, "{:indent$}{id:?}", "", indent = depth as usize * 2)?;
        if let Some(identifier) = store.identifier(id) {
            write!(writer, " \"{identifier}\"")?;
        }
        write!(writer, " frame={}", rect(store.frame(id)))?;
        let padding = store.padding(id);
        if padding != lamina_core::geometry::Padding::ZERO {
            write!(
                writer,
                " padding=({}, {}, {}, {})",
                padding.left, padding.top, padding.right, padding.bottom
            )?;
        }
        if let Some(mask) = store.masking_path(id) {
            write!(writer, " mask={}", border_kind(mask))?;
        }
        if let Some(shadow) = store.shadow(id) {
            let m = shadow.margin();
            write!(writer, " shadow=+{}x{}", m.x0, m.y0)?;
        }
        let flags = store.flags(id);
        if flags.hidden {
            write!(writer, " hidden")?;
        }
        if flags.manual_layout {
            write!(writer, " manual")?;
        }
        if let Some(parent) = store.parent(id) {
            if store.is_excluded_from_layout(parent, id) {
                write!(writer, " excluded")?;
            }
        }
        if store.content(id).is_some() {
            write!(writer, " content")?;
        }
        if store.layout_policy(id).is_some() {
            write!(writer, " policy")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn rect(r: Rect) -> String {
    format!("({}, {})-({}, {})", r.x0, r.y0, r.x1, r.y1)
}

fn border_kind(path: &BorderPath) -> &'static str {
    match path {
        BorderPath::Rect(_) => "rect",
        BorderPath::RoundedRect { .. } => "rounded",
        BorderPath::Polygon(_) => "polygon",
        BorderPath::OpenStroke(_) => "open",
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use kurbo::Vec2;
    use lamina_core::color::Rgba;
    use lamina_core::layer::{Identifier, SolidFill};
    use lamina_core::shadow::Shadow;

    use super::*;

    #[test]
    fn pretty_print_pass() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_pass_begin(&PassBeginEvent {
            pass_index: 1,
            root,
            kind: lamina_core::trace::PassKind::Raster,
        });
        sink.on_layer_draw(&LayerDrawEvent {
            pass_index: 1,
            layer: root,
            depth: 2,
            clipped: true,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[pass:begin] pass=1"), "got: {output}");
        assert!(output.contains("kind=Raster"), "got: {output}");
        assert!(output.contains("[draw] pass=1     LayerId"), "got: {output}");
        assert!(output.contains("clipped"), "got: {output}");
    }

    #[test]
    fn tree_dump_lists_layers_by_depth() {
        let mut store = LayerStore::new();
        let root = store.create_layer_with_frame(Rect::new(0.0, 0.0, 100.0, 50.0));
        store.set_identifier(root, Some(Identifier::from("chart")));
        let area = store.create_layer_with_frame(Rect::new(10.0, 10.0, 90.0, 40.0));
        store.set_outer_border_path(area, Some(BorderPath::rounded_rect(Rect::new(0.0, 0.0, 80.0, 30.0), 4.0)));
        store.set_masks_to_border(area, true);
        store.set_shadow(area, Some(Shadow::new(Vec2::new(1.0, 1.0), 2.0, Rgba::BLACK)));
        store.set_content(area, Some(Rc::new(SolidFill(Rgba::WHITE))));
        store.add_child(root, area);

        let mut out = Vec::new();
        write_tree(&store, root, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2, "got: {text}");
        assert!(lines[0].starts_with("LayerId(0@gen0) \"chart\" frame=(0, 0)-(100, 50)"), "got: {text}");
        assert!(lines[1].starts_with("  LayerId(1@gen0)"), "got: {text}");
        assert!(lines[1].contains("mask=rounded shadow=+3x3 content"), "got: {text}");
    }
}
