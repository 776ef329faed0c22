// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Graph ownership of layer trees.
//!
//! A graph is the owner of a layer tree. Layers hold only a weak
//! [`GraphId`]: destroying a layer never touches its graph, and destroying a
//! graph clears the back-reference of every layer that pointed at it.

use super::id::{GraphId, INVALID, LayerId};
use super::store::LayerStore;

#[derive(Clone, Copy, Debug)]
pub(crate) struct GraphSlot {
    pub(crate) root: u32,
    pub(crate) root_generation: u32,
    pub(crate) generation: u32,
    pub(crate) alive: bool,
}

impl LayerStore {
    /// Creates a graph owning the tree rooted at `root`.
    ///
    /// Every layer in the subtree (and every layer added to it later) points
    /// back at the new graph.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale.
    pub fn create_graph(&mut self, root: LayerId) -> GraphId {
        self.validate(root);
        let idx = if let Some(idx) = self.graph_free.pop() {
            let slot = &mut self.graphs[idx as usize];
            slot.root = root.idx;
            slot.root_generation = root.generation;
            slot.alive = true;
            idx
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "graph count is bounded well below u32::MAX"
            )]
            let idx = self.graphs.len() as u32;
            self.graphs.push(GraphSlot {
                root: root.idx,
                root_generation: root.generation,
                generation: 0,
                alive: true,
            });
            idx
        };
        let graph = GraphId {
            idx,
            generation: self.graphs[idx as usize].generation,
        };
        self.set_subtree_graph(root.idx, Some(graph));
        graph
    }

    /// Destroys a graph, clearing every layer's back-reference to it.
    ///
    /// The layers themselves are left alive. Destroying an already destroyed
    /// graph is a no-op.
    pub fn destroy_graph(&mut self, graph: GraphId) {
        if !self.is_graph_alive(graph) {
            return;
        }
        for slot in &mut self.graph {
            if *slot == Some(graph) {
                *slot = None;
            }
        }
        let slot = &mut self.graphs[graph.idx as usize];
        slot.alive = false;
        slot.root = INVALID;
        slot.generation += 1;
        self.graph_free.push(graph.idx);
    }

    /// Returns whether `graph` has not been destroyed.
    #[must_use]
    pub fn is_graph_alive(&self, graph: GraphId) -> bool {
        self.graphs
            .get(graph.idx as usize)
            .is_some_and(|slot| slot.alive && slot.generation == graph.generation)
    }

    /// Returns the graph that owns `id`, if it is still alive.
    #[must_use]
    pub fn graph(&self, id: LayerId) -> Option<GraphId> {
        self.validate(id);
        self.graph[id.idx as usize].filter(|g| self.is_graph_alive(*g))
    }

    /// Returns the root layer of `graph`, if both are still alive.
    #[must_use]
    pub fn graph_root(&self, graph: GraphId) -> Option<LayerId> {
        if !self.is_graph_alive(graph) {
            return None;
        }
        let slot = self.graphs[graph.idx as usize];
        let root = LayerId {
            idx: slot.root,
            generation: slot.root_generation,
        };
        self.is_alive(root).then_some(root)
    }

    pub(crate) fn is_graph_root(&self, idx: u32) -> bool {
        self.graph[idx as usize].is_some_and(|g| {
            self.is_graph_alive(g) && {
                let slot = self.graphs[g.idx as usize];
                slot.root == idx && slot.root_generation == self.generation[idx as usize]
            }
        })
    }

    pub(crate) fn set_subtree_graph(&mut self, idx: u32, graph: Option<GraphId>) {
        let mut order = alloc::vec::Vec::new();
        self.collect_pre_order(idx, &mut order);
        for i in order {
            self.graph[i as usize] = graph;
        }
    }
}
