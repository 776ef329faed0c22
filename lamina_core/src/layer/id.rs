// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer, graph, and annotation identity types.

use alloc::string::String;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel value indicating "no layer" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a layer in a [`LayerStore`](super::LayerStore).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a layer is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId {
    /// Slot index into the store's arrays.
    pub(crate) idx: u32,
    /// Generation counter: must match the store's generation for this slot.
    pub(crate) generation: u32,
}

impl LayerId {
    /// A handle that never refers to a live layer.
    ///
    /// Restored archives use it for layer references that could not be
    /// resolved.
    pub const DANGLING: Self = Self {
        idx: INVALID,
        generation: INVALID,
    };

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({}@gen{})", self.idx, self.generation)
    }
}

/// A weak handle to a graph: the owner of a layer tree.
///
/// Layers only point at their graph; once the graph is destroyed every such
/// back-reference reads as `None`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl fmt::Debug for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphId({}@gen{})", self.idx, self.generation)
    }
}

/// A handle to an annotation registered with a layer store.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl fmt::Debug for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationId({}@gen{})", self.idx, self.generation)
    }
}

/// A handle returned by
/// [`subscribe_bounds_changed`](super::LayerStore::subscribe_bounds_changed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// An opaque, comparable, archivable layer identifier.
///
/// The store never interprets identifiers; they exist so that chart code can
/// find layers by role.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    /// A symbolic name.
    Name(String),
    /// A numeric tag.
    Index(u64),
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::Name(String::from(name))
    }
}

impl From<u64> for Identifier {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "#{index}"),
        }
    }
}
