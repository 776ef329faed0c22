// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Lamina uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! record which layers need layout, redisplay, or geometry recomputation.
//! Each channel represents an independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`GEOMETRY`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and has dependency edges
//!   from child to parent. Moving or resizing a layer marks every descendant,
//!   because their positions in root space change with it.
//!
//! - **Local-only**: [`LAYOUT`] and [`DISPLAY`] are marked with the default
//!   policy. Only the explicitly marked layer appears in the drain output:
//!   a layer lays out its own sublayers, and redisplay is per layer.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on topology mutations
//!   (add/remove sublayer, create/destroy layer). It triggers a
//!   traversal-order rebuild during evaluation.
//!
//! # Consumption
//!
//! [`LayerStore::evaluate`](crate::layer::LayerStore::evaluate) drains all
//! channels and surfaces the results as
//! [`FrameChanges`](crate::layer::FrameChanges).
//! [`LayerStore::layout_if_needed`](crate::layer::LayerStore::layout_if_needed)
//! drains only [`LAYOUT`].

use understory_dirty::Channel;

/// Sublayer frames must be recomputed (bounds, padding, shadow, or the
/// excluded set changed).
pub const LAYOUT: Channel = Channel::new(0);

/// The layer's rendered output is stale (masks, shadow, content, flags).
pub const DISPLAY: Channel = Channel::new(1);

/// Position, bounds, or transform changed; propagates to descendants.
pub const GEOMETRY: Channel = Channel::new(2);

/// Tree topology changed: triggers traversal order rebuild.
pub const TOPOLOGY: Channel = Channel::new(3);
