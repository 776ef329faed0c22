// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes render-pass events
//! into a `Vec<u8>` as fixed-size little-endian records, each stamped with
//! the nanoseconds elapsed since the recorder was created. [`decode`] reads
//! them back as an iterator of [`Record`].

use std::time::Instant;

use lamina_core::layer::LayerId;
use lamina_core::trace::{
    ContextEvent, LayerDrawEvent, PassBeginEvent, PassEndEvent, PassKind, PhaseBeginEvent,
    PhaseEndEvent, RenderPhase, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_BEGIN: u8 = 1;
const TAG_PASS_END: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_LAYER_DRAW: u8 = 5;
const TAG_CONTEXT_PUSH: u8 = 6;
const TAG_CONTEXT_POP: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug)]
pub struct RecorderSink {
    buf: Vec<u8>,
    origin: Instant,
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder whose clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            origin: Instant::now(),
        }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8, pass_index: u64) {
        let elapsed = self.origin.elapsed().as_nanos();
        self.write_u8(tag);
        self.write_u64(u64::try_from(elapsed).unwrap_or(u64::MAX));
        self.write_u64(pass_index);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_layer(&mut self, id: LayerId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_kind(&mut self, kind: PassKind) {
        self.write_u8(match kind {
            PassKind::Vector => 0,
            PassKind::Raster => 1,
            PassKind::LayoutAndRaster => 2,
        });
    }

    fn write_phase(&mut self, p: RenderPhase) {
        self.write_u8(match p {
            RenderPhase::Layout => 0,
            RenderPhase::PixelAlign => 1,
            RenderPhase::Mask => 2,
            RenderPhase::Draw => 3,
            RenderPhase::Shadow => 4,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.begin(TAG_PASS_BEGIN, e.pass_index);
        self.write_layer(e.root);
        self.write_kind(e.kind);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.begin(TAG_PASS_END, e.pass_index);
        self.write_layer(e.root);
        self.write_u32(e.layers_drawn);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.begin(TAG_PHASE_BEGIN, e.pass_index);
        self.write_layer(e.layer);
        self.write_phase(e.phase);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.begin(TAG_PHASE_END, e.pass_index);
        self.write_layer(e.layer);
        self.write_phase(e.phase);
    }

    fn on_layer_draw(&mut self, e: &LayerDrawEvent) {
        self.begin(TAG_LAYER_DRAW, e.pass_index);
        self.write_layer(e.layer);
        self.write_u32(e.depth);
        self.write_u8(u8::from(e.clipped));
    }

    fn on_context_push(&mut self, e: &ContextEvent) {
        self.begin(TAG_CONTEXT_PUSH, e.pass_index);
        self.write_u32(u32::try_from(e.depth).unwrap_or(u32::MAX));
    }

    fn on_context_pop(&mut self, e: &ContextEvent) {
        self.begin(TAG_CONTEXT_POP, e.pass_index);
        self.write_u32(u32::try_from(e.depth).unwrap_or(u32::MAX));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A layer handle as recorded: slot index and generation.
///
/// Recordings outlive the store they came from, so they do not hand back
/// live [`LayerId`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerRef {
    /// Slot index.
    pub index: u32,
    /// Generation of the slot when the event was recorded.
    pub generation: u32,
}

impl From<LayerId> for LayerRef {
    fn from(id: LayerId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin {
        /// Pass counter.
        pass_index: u64,
        /// Root layer of the pass.
        root: LayerRef,
        /// Entry point.
        kind: PassKind,
    },
    /// A [`PassEndEvent`].
    PassEnd {
        /// Pass counter.
        pass_index: u64,
        /// Root layer of the pass.
        root: LayerRef,
        /// Number of layers drawn.
        layers_drawn: u32,
    },
    /// A [`PhaseBeginEvent`].
    PhaseBegin {
        /// Pass counter.
        pass_index: u64,
        /// Layer being processed.
        layer: LayerRef,
        /// Phase.
        phase: RenderPhase,
    },
    /// A [`PhaseEndEvent`].
    PhaseEnd {
        /// Pass counter.
        pass_index: u64,
        /// Layer being processed.
        layer: LayerRef,
        /// Phase.
        phase: RenderPhase,
    },
    /// A [`LayerDrawEvent`].
    LayerDraw {
        /// Pass counter.
        pass_index: u64,
        /// Layer drawn.
        layer: LayerRef,
        /// Depth below the pass root.
        depth: u32,
        /// Whether a masking path clipped the layer.
        clipped: bool,
    },
    /// A context push.
    ContextPush {
        /// Pass counter.
        pass_index: u64,
        /// Stack depth after the push.
        depth: u32,
    },
    /// A context pop.
    ContextPop {
        /// Pass counter.
        pass_index: u64,
        /// Stack depth after the pop.
        depth: u32,
    },
}

impl RecordedEvent {
    /// The pass the event belongs to.
    #[must_use]
    pub fn pass_index(&self) -> u64 {
        match *self {
            Self::PassBegin { pass_index, .. }
            | Self::PassEnd { pass_index, .. }
            | Self::PhaseBegin { pass_index, .. }
            | Self::PhaseEnd { pass_index, .. }
            | Self::LayerDraw { pass_index, .. }
            | Self::ContextPush { pass_index, .. }
            | Self::ContextPop { pass_index, .. } => pass_index,
        }
    }
}

/// A decoded event with its timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Nanoseconds since the recorder was created.
    pub elapsed_nanos: u64,
    /// The event.
    pub event: RecordedEvent,
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Record`]s.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_layer(&mut self) -> Option<LayerRef> {
        Some(LayerRef {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        })
    }

    fn read_kind(&mut self) -> Option<PassKind> {
        Some(match self.read_u8()? {
            0 => PassKind::Vector,
            1 => PassKind::Raster,
            _ => PassKind::LayoutAndRaster,
        })
    }

    fn read_phase(&mut self) -> Option<RenderPhase> {
        Some(match self.read_u8()? {
            0 => RenderPhase::Layout,
            1 => RenderPhase::PixelAlign,
            2 => RenderPhase::Mask,
            3 => RenderPhase::Draw,
            _ => RenderPhase::Shadow,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let elapsed_nanos = self.read_u64()?;
        let pass_index = self.read_u64()?;
        let event = match tag {
            TAG_PASS_BEGIN => RecordedEvent::PassBegin {
                pass_index,
                root: self.read_layer()?,
                kind: self.read_kind()?,
            },
            TAG_PASS_END => RecordedEvent::PassEnd {
                pass_index,
                root: self.read_layer()?,
                layers_drawn: self.read_u32()?,
            },
            TAG_PHASE_BEGIN => RecordedEvent::PhaseBegin {
                pass_index,
                layer: self.read_layer()?,
                phase: self.read_phase()?,
            },
            TAG_PHASE_END => RecordedEvent::PhaseEnd {
                pass_index,
                layer: self.read_layer()?,
                phase: self.read_phase()?,
            },
            TAG_LAYER_DRAW => RecordedEvent::LayerDraw {
                pass_index,
                layer: self.read_layer()?,
                depth: self.read_u32()?,
                clipped: self.read_u8()? != 0,
            },
            TAG_CONTEXT_PUSH => RecordedEvent::ContextPush {
                pass_index,
                depth: self.read_u32()?,
            },
            TAG_CONTEXT_POP => RecordedEvent::ContextPop {
                pass_index,
                depth: self.read_u32()?,
            },
            _ => return None, // unknown tag → stop iteration
        };
        Some(Record {
            elapsed_nanos,
            event,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use lamina_core::layer::LayerStore;

    use super::*;

    fn layer() -> LayerId {
        let mut store = LayerStore::new();
        store.create_layer();
        store.create_layer()
    }

    fn events(rec: &RecorderSink) -> Vec<RecordedEvent> {
        decode(rec.as_bytes()).map(|r| r.event).collect()
    }

    #[test]
    fn pass_events_decode() {
        let root = layer();
        let mut rec = RecorderSink::new();
        rec.on_pass_begin(&PassBeginEvent {
            pass_index: 3,
            root,
            kind: PassKind::LayoutAndRaster,
        });
        rec.on_pass_end(&PassEndEvent {
            pass_index: 3,
            root,
            layers_drawn: 12,
        });
        assert_eq!(
            events(&rec),
            vec![
                RecordedEvent::PassBegin {
                    pass_index: 3,
                    root: LayerRef {
                        index: 1,
                        generation: 0
                    },
                    kind: PassKind::LayoutAndRaster,
                },
                RecordedEvent::PassEnd {
                    pass_index: 3,
                    root: root.into(),
                    layers_drawn: 12,
                },
            ]
        );
    }

    #[test]
    fn per_layer_events_decode() {
        let layer = layer();
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            pass_index: 1,
            layer,
            phase: RenderPhase::Shadow,
        });
        rec.on_phase_end(&PhaseEndEvent {
            pass_index: 1,
            layer,
            phase: RenderPhase::Shadow,
        });
        rec.on_layer_draw(&LayerDrawEvent {
            pass_index: 1,
            layer,
            depth: 2,
            clipped: true,
        });
        rec.on_context_push(&ContextEvent {
            pass_index: 1,
            depth: 1,
        });
        rec.on_context_pop(&ContextEvent {
            pass_index: 1,
            depth: 0,
        });

        let decoded = events(&rec);
        assert_eq!(decoded.len(), 5);
        assert!(
            matches!(
                decoded[2],
                RecordedEvent::LayerDraw {
                    depth: 2,
                    clipped: true,
                    ..
                }
            ),
            "got {:?}",
            decoded[2]
        );
        assert_eq!(
            decoded[4],
            RecordedEvent::ContextPop {
                pass_index: 1,
                depth: 0
            }
        );
        assert!(decoded.iter().all(|e| e.pass_index() == 1));
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let layer = layer();
        let mut rec = RecorderSink::new();
        for depth in 0..4 {
            rec.on_layer_draw(&LayerDrawEvent {
                pass_index: 0,
                layer,
                depth,
                clipped: false,
            });
        }
        let stamps: Vec<u64> = decode(rec.as_bytes()).map(|r| r.elapsed_nanos).collect();
        assert_eq!(stamps.len(), 4);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]), "{stamps:?}");
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0);
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_context_push(&ContextEvent {
            pass_index: 0,
            depth: 1,
        });
        let bytes = rec.into_bytes();
        assert_eq!(decode(&bytes[..bytes.len() - 1]).count(), 0);
    }

    #[test]
    fn records_a_real_render_pass() {
        use std::cell::RefCell;
        use std::rc::Rc;

        use kurbo::{Rect, Size};
        use lamina_core::context::ContextRef;
        use lamina_render::{RenderPlan, Renderer, RendererConfig};

        let mut store = LayerStore::new();
        let root = store.create_layer_with_frame(Rect::new(0.0, 0.0, 20.0, 20.0));
        let child = store.create_layer();
        store.add_child(root, child);

        let mut rec = RecorderSink::new();
        {
            let mut renderer = Renderer::with_tracer(RendererConfig::screen(), &mut rec);
            let context: ContextRef = Rc::new(RefCell::new(RenderPlan::new(Size::new(20.0, 20.0))));
            renderer
                .layout_and_render_in_context(&mut store, root, context)
                .unwrap();
        }

        let decoded = events(&rec);
        let begin = decoded
            .iter()
            .position(|e| matches!(e, RecordedEvent::PassBegin { .. }))
            .unwrap();
        assert!(
            decoded[..begin]
                .iter()
                .all(|e| matches!(e, RecordedEvent::PhaseBegin { .. } | RecordedEvent::PhaseEnd { .. })),
            "only layout phases precede the pass: {decoded:?}"
        );
        assert_eq!(
            decoded.last(),
            Some(&RecordedEvent::PassEnd {
                pass_index: 1,
                root: root.into(),
                layers_drawn: 2,
            })
        );
        let draws = decoded
            .iter()
            .filter(|e| matches!(e, RecordedEvent::LayerDraw { .. }))
            .count();
        assert_eq!(draws, 2);
    }

    #[test]
    fn unknown_tag_stops_decoding() {
        let mut bytes = vec![0xFF];
        bytes.extend_from_slice(&[0; 16]);
        assert_eq!(decode(&bytes).count(), 0);
    }
}
