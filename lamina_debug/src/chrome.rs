// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Passes and per-layer phases become duration slices, layer draws become
//! instant events, and context-stack depth becomes a counter track.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{LayerRef, RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for record in decode(bytes) {
        let ts = nanos_to_us(record.elapsed_nanos);
        let event = match record.event {
            RecordedEvent::PassBegin {
                pass_index,
                root,
                kind,
            } => json!({
                "ph": "B",
                "name": format!("{kind:?}"),
                "cat": "Pass",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": {
                    "pass_index": pass_index,
                    "root": layer_label(root),
                }
            }),
            RecordedEvent::PassEnd {
                pass_index,
                root,
                layers_drawn,
            } => json!({
                "ph": "E",
                "cat": "Pass",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": {
                    "pass_index": pass_index,
                    "root": layer_label(root),
                    "layers_drawn": layers_drawn,
                }
            }),
            RecordedEvent::PhaseBegin {
                pass_index,
                layer,
                phase,
            } => json!({
                "ph": "B",
                "name": format!("{phase:?}"),
                "cat": "Layer",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": {
                    "pass_index": pass_index,
                    "layer": layer_label(layer),
                }
            }),
            RecordedEvent::PhaseEnd { phase, .. } => json!({
                "ph": "E",
                "name": format!("{phase:?}"),
                "cat": "Layer",
                "ts": ts,
                "pid": 0,
                "tid": 0,
            }),
            RecordedEvent::LayerDraw {
                pass_index,
                layer,
                depth,
                clipped,
            } => json!({
                "ph": "i",
                "name": "LayerDraw",
                "cat": "Layer",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "pass_index": pass_index,
                    "layer": layer_label(layer),
                    "depth": depth,
                    "clipped": clipped,
                }
            }),
            RecordedEvent::ContextPush { depth, .. } | RecordedEvent::ContextPop { depth, .. } => {
                json!({
                    "ph": "C",
                    "name": "ContextStack",
                    "ts": ts,
                    "pid": 0,
                    "args": { "depth": depth }
                })
            }
        };
        events.push(event);
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn layer_label(layer: LayerRef) -> String {
    format!("{}@gen{}", layer.index, layer.generation)
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use lamina_core::layer::LayerStore;
    use lamina_core::trace::{
        ContextEvent, LayerDrawEvent, PassBeginEvent, PassEndEvent, PassKind, PhaseBeginEvent,
        PhaseEndEvent, RenderPhase, TraceSink,
    };

    use super::*;
    use crate::recorder::RecorderSink;

    #[test]
    fn export_produces_valid_json() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let mut rec = RecorderSink::new();
        rec.on_pass_begin(&PassBeginEvent {
            pass_index: 1,
            root,
            kind: PassKind::Vector,
        });
        rec.on_context_push(&ContextEvent {
            pass_index: 1,
            depth: 1,
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            pass_index: 1,
            layer: root,
            phase: RenderPhase::Mask,
        });
        rec.on_phase_end(&PhaseEndEvent {
            pass_index: 1,
            layer: root,
            phase: RenderPhase::Mask,
        });
        rec.on_layer_draw(&LayerDrawEvent {
            pass_index: 1,
            layer: root,
            depth: 0,
            clipped: false,
        });
        rec.on_pass_end(&PassEndEvent {
            pass_index: 1,
            root,
            layers_drawn: 1,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 6);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "Vector");
        assert_eq!(parsed[0]["args"]["root"], "0@gen0");

        assert_eq!(parsed[1]["ph"], "C");
        assert_eq!(parsed[1]["args"]["depth"], 1);

        assert_eq!(parsed[2]["name"], "Mask");
        assert_eq!(parsed[3]["ph"], "E");

        assert_eq!(parsed[4]["ph"], "i");
        assert_eq!(parsed[4]["args"]["clipped"], false);

        assert_eq!(parsed[5]["ph"], "E");
        assert_eq!(parsed[5]["args"]["layers_drawn"], 1);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
