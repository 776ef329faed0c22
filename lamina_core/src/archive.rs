// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serializable snapshots of layer trees and legend entries.
//!
//! Archives hold plain values only. References between layers (the excluded
//! set, annotation hosts, content and anchor layers) are stored as pre-order
//! indices into the archived tree, with the root at index 0. Plot references
//! are stored as [`PlotKey`]s. On restore, each reference resolves against
//! the newly created layers or a caller-supplied plot lookup; a reference that
//! does not resolve is dropped, never an error.
//!
//! Behavior objects (content delegates, layout policies, plot spaces) and
//! graph membership are not archived.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use std::collections::HashMap;

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, AnnotationAnchor, RectAnchor};
use crate::border::BorderPath;
use crate::geometry::{Padding, sanitize_scale};
use crate::layer::{AnnotationId, Identifier, LayerFlags, LayerId, LayerStore};
use crate::legend::{LegendEntry, Plot, PlotKey};
use crate::shadow::Shadow;
use crate::text::TextStyle;

/// Archive format version written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Errors from decoding or restoring an archive.
#[derive(Debug)]
pub enum ArchiveError {
    /// The JSON text could not be encoded or decoded.
    Json(serde_json::Error),
    /// The archive decoded but cannot describe a valid tree.
    Malformed(String),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "archive JSON error: {err}"),
            Self::Malformed(reason) => write!(f, "malformed archive: {reason}"),
        }
    }
}

impl core::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Malformed(_) => None,
        }
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// A layer subtree plus the annotations hosted inside it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeArchive {
    /// Format version; see [`FORMAT_VERSION`].
    pub version: u32,
    /// The root layer, with its sublayers nested inside.
    pub root: LayerArchive,
    /// Annotations whose host is in the tree.
    #[serde(default)]
    pub annotations: Vec<AnnotationArchive>,
}

impl TreeArchive {
    /// Encodes the archive as JSON.
    pub fn to_json(&self) -> Result<String, ArchiveError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes an archive from JSON.
    pub fn from_json(json: &str) -> Result<Self, ArchiveError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The archived properties of one layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerArchive {
    /// Position in the parent's space.
    pub position: Point,
    /// Bounds in local space.
    pub bounds: Rect,
    /// Local transform.
    pub transform: Affine,
    /// Padding.
    pub padding: Padding,
    /// Device-pixel scale.
    pub contents_scale: f64,
    /// Whether the layer clips to its outer border.
    pub masks_to_border: bool,
    /// Outer border path.
    pub outer_border: Option<BorderPath>,
    /// Inner border path.
    pub inner_border: Option<BorderPath>,
    /// Shadow.
    pub shadow: Option<Shadow>,
    /// Identifier.
    pub identifier: Option<Identifier>,
    /// Flags.
    pub flags: LayerFlags,
    /// Pre-order indices of sublayers excluded from automatic layout.
    pub excluded: Vec<usize>,
    /// Sublayers, back to front.
    pub sublayers: Vec<LayerArchive>,
}

impl Default for LayerArchive {
    fn default() -> Self {
        Self {
            position: Point::ORIGIN,
            bounds: Rect::ZERO,
            transform: Affine::IDENTITY,
            padding: Padding::ZERO,
            contents_scale: 1.0,
            masks_to_border: false,
            outer_border: None,
            inner_border: None,
            shadow: None,
            identifier: None,
            flags: LayerFlags::default(),
            excluded: Vec::new(),
            sublayers: Vec::new(),
        }
    }
}

/// Archived form of an [`AnnotationAnchor`].
///
/// Mirrors the live type, with the anchor layer stored as an index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AnchorArchive {
    /// See [`AnnotationAnchor::HostPoint`].
    HostPoint(Point),
    /// See [`AnnotationAnchor::HostRect`].
    HostRect(RectAnchor),
    /// See [`AnnotationAnchor::Layer`].
    Layer {
        /// Pre-order index of the anchor layer.
        layer: Option<usize>,
        /// Which point of its bounds.
        anchor: RectAnchor,
    },
    /// See [`AnnotationAnchor::Data`].
    Data(Vec<f64>),
}

/// The archived attributes of one annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationArchive {
    /// Pre-order index of the host.
    pub host: Option<usize>,
    /// Pre-order index of the content layer.
    pub content_layer: Option<usize>,
    /// Where the content anchor lands.
    pub anchor: AnchorArchive,
    /// Normalized anchor point within the content bounds.
    pub content_anchor_point: Point,
    /// Displacement in host coordinates.
    pub displacement: Vec2,
    /// Rotation in radians.
    pub rotation: f64,
}

/// Handles of the layers and annotations created by
/// [`LayerStore::restore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoredTree {
    /// The restored root.
    pub root: LayerId,
    /// Every restored layer, in archive (pre-order) order.
    pub layers: Vec<LayerId>,
    /// Restored annotations, in archive order.
    pub annotations: Vec<AnnotationId>,
}

/// The archived attributes of a [`LegendEntry`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegendEntryArchive {
    /// Key of the plot, if the entry referred to a live plot.
    pub plot: Option<PlotKey>,
    /// Series index within the plot.
    pub index: usize,
    /// Grid row.
    pub row: usize,
    /// Grid column.
    pub column: usize,
    /// Title style.
    pub text_style: TextStyle,
}

impl LegendEntryArchive {
    /// Encodes the archive as JSON.
    pub fn to_json(&self) -> Result<String, ArchiveError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes an archive from JSON.
    pub fn from_json(json: &str) -> Result<Self, ArchiveError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl LegendEntry {
    /// Snapshots the entry. A dropped plot is archived as `None`.
    #[must_use]
    pub fn archive(&self) -> LegendEntryArchive {
        LegendEntryArchive {
            plot: self.plot().map(|p| p.key()),
            index: self.index(),
            row: self.row(),
            column: self.column(),
            text_style: self.text_style().clone(),
        }
    }

    /// Rebuilds an entry, resolving its plot through `resolve`.
    #[must_use]
    pub fn from_archive(
        archive: &LegendEntryArchive,
        resolve: impl FnOnce(&PlotKey) -> Option<Rc<dyn Plot>>,
    ) -> Self {
        let mut entry = Self::default();
        let plot = archive.plot.as_ref().and_then(resolve);
        entry.set_plot(plot.as_ref());
        entry.set_index(archive.index);
        entry.set_row(archive.row);
        entry.set_column(archive.column);
        entry.set_text_style(archive.text_style.clone());
        entry
    }
}

impl LayerStore {
    /// Snapshots the subtree rooted at `root` and the annotations it hosts.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn archive(&self, root: LayerId) -> TreeArchive {
        self.validate(root);
        let mut order = Vec::new();
        self.collect_pre_order(root.idx, &mut order);
        let index_of: HashMap<LayerId, usize> = order
            .iter()
            .enumerate()
            .map(|(i, &idx)| (self.id_at(idx), i))
            .collect();

        let annotations = self
            .annotations
            .iter()
            .filter_map(|slot| slot.annotation.as_ref())
            .filter(|a| a.host().is_some_and(|h| index_of.contains_key(&h)))
            .map(|a| archive_annotation(a, &index_of))
            .collect();

        TreeArchive {
            version: FORMAT_VERSION,
            root: self.archive_layer(root, &index_of),
            annotations,
        }
    }

    /// Recreates an archived tree as a new root in this store.
    ///
    /// Every layer goes through the same allocation path as
    /// [`create_layer_with_frame`](Self::create_layer_with_frame). Annotations
    /// are re-registered and, where their host resolves, attached and
    /// repositioned.
    pub fn restore(&mut self, archive: &TreeArchive) -> Result<RestoredTree, ArchiveError> {
        if archive.version != FORMAT_VERSION {
            return Err(ArchiveError::Malformed(format!(
                "unsupported format version {}",
                archive.version
            )));
        }
        let mut flat = Vec::new();
        flatten(&archive.root, None, &mut flat);
        if let Some(i) = flat.iter().position(|(l, _)| !is_finite(l)) {
            return Err(ArchiveError::Malformed(format!(
                "layer {i} has non-finite geometry"
            )));
        }

        let mut layers: Vec<LayerId> = Vec::with_capacity(flat.len());
        for (layer, parent) in &flat {
            let id = self.allocate();
            self.apply_archived(id, layer);
            if let Some(p) = parent {
                self.add_child(layers[*p], id);
            }
            layers.push(id);
        }
        let resolve = |i: Option<usize>| i.and_then(|i| layers.get(i).copied());

        for ((layer, _), &id) in flat.iter().zip(&layers) {
            for &e in &layer.excluded {
                if let Some(child) = resolve(Some(e)) {
                    self.exclude_from_layout(id, child);
                }
            }
        }

        let mut annotations = Vec::with_capacity(archive.annotations.len());
        for a in &archive.annotations {
            let anchor = match &a.anchor {
                AnchorArchive::HostPoint(p) => AnnotationAnchor::HostPoint(*p),
                AnchorArchive::HostRect(r) => AnnotationAnchor::HostRect(*r),
                AnchorArchive::Layer { layer, anchor } => AnnotationAnchor::Layer {
                    layer: resolve(*layer).unwrap_or(LayerId::DANGLING),
                    anchor: *anchor,
                },
                AnchorArchive::Data(d) => AnnotationAnchor::Data(d.clone()),
            };
            let mut annotation = Annotation::new(anchor)
                .with_content_anchor_point(a.content_anchor_point)
                .with_displacement(a.displacement)
                .with_rotation(a.rotation);
            if let Some(content) = resolve(a.content_layer) {
                annotation = annotation.with_content_layer(content);
            }
            let id = self.create_annotation(annotation);
            if let Some(host) = resolve(a.host) {
                self.attach_annotation(id, host);
            }
            annotations.push(id);
        }

        Ok(RestoredTree {
            root: layers[0],
            layers,
            annotations,
        })
    }

    fn archive_layer(&self, id: LayerId, index_of: &HashMap<LayerId, usize>) -> LayerArchive {
        let i = id.idx as usize;
        let mut excluded: Vec<usize> = self.excluded[i]
            .iter()
            .filter_map(|l| index_of.get(l).copied())
            .collect();
        excluded.sort_unstable();
        LayerArchive {
            position: self.position[i],
            bounds: self.bounds[i],
            transform: self.transform[i],
            padding: self.padding[i],
            contents_scale: self.contents_scale[i],
            masks_to_border: self.masks_to_border[i],
            outer_border: self.outer_border[i].clone(),
            inner_border: self.inner_border[i].clone(),
            shadow: self.shadow[i],
            identifier: self.identifier[i].clone(),
            flags: self.flags[i],
            excluded,
            sublayers: self
                .children(id)
                .map(|c| self.archive_layer(c, index_of))
                .collect(),
        }
    }

    fn apply_archived(&mut self, id: LayerId, layer: &LayerArchive) {
        let i = id.idx as usize;
        self.position[i] = layer.position;
        self.bounds[i] = layer.bounds.abs();
        self.transform[i] = layer.transform;
        self.padding[i] = layer.padding.clamped();
        self.contents_scale[i] = sanitize_scale(layer.contents_scale);
        self.masks_to_border[i] = layer.masks_to_border;
        self.outer_border[i] = layer.outer_border.clone();
        self.inner_border[i] = layer.inner_border.clone();
        self.shadow[i] = layer.shadow;
        self.identifier[i] = layer.identifier.clone();
        self.flags[i] = layer.flags;
        self.refresh_masks(id.idx);
    }
}

fn archive_annotation(a: &Annotation, index_of: &HashMap<LayerId, usize>) -> AnnotationArchive {
    let index = |l: Option<LayerId>| l.and_then(|l| index_of.get(&l).copied());
    let anchor = match a.anchor() {
        AnnotationAnchor::HostPoint(p) => AnchorArchive::HostPoint(*p),
        AnnotationAnchor::HostRect(r) => AnchorArchive::HostRect(*r),
        AnnotationAnchor::Layer { layer, anchor } => AnchorArchive::Layer {
            layer: index(Some(*layer)),
            anchor: *anchor,
        },
        AnnotationAnchor::Data(d) => AnchorArchive::Data(d.clone()),
    };
    AnnotationArchive {
        host: index(a.host()),
        content_layer: index(a.content_layer()),
        anchor,
        content_anchor_point: a.content_anchor_point(),
        displacement: a.displacement(),
        rotation: a.rotation(),
    }
}

/// Pre-order list of `(layer, parent index)`.
fn flatten<'a>(
    layer: &'a LayerArchive,
    parent: Option<usize>,
    out: &mut Vec<(&'a LayerArchive, Option<usize>)>,
) {
    let index = out.len();
    out.push((layer, parent));
    for sublayer in &layer.sublayers {
        flatten(sublayer, Some(index), out);
    }
}

fn is_finite(layer: &LayerArchive) -> bool {
    layer.position.is_finite() && layer.bounds.is_finite() && layer.transform.is_finite()
}
