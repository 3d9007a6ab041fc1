// Copyright 2026 the Liveflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena-allocated control-flow graph.
//!
//! Nodes are addressed by [`NodeId`] into a flat array; predecessor and
//! successor adjacency is stored as index sequences, which keeps the cyclic
//! graph free of ownership cycles and lets workers share the topology without
//! locking.
//!
//! ## Invariants
//!
//! - Topology and `use`/`def` sets are fixed once [`CfgBuilder::build`]
//!   returns; the analysis only ever reads them.
//! - Edges are directed and duplicates are allowed (multi-edges change
//!   nothing for liveness: union is idempotent).
//! - Malformed input (dangling edge indices, mismatched set universes) is
//!   rejected at construction time; there is no error path during a run.

use core::fmt;

use crate::bitset::BitSet;

/// Identifier for a node within a [`Cfg`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new node id.
    #[must_use]
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer backing this id.
    #[must_use]
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the id as an array index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Graph construction errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CfgError {
    /// An edge referenced a node id outside the graph.
    BadNodeId {
        /// The offending id.
        id: NodeId,
    },
    /// A node's `use`/`def` set was built over the wrong universe.
    UniverseMismatch {
        /// Universe the graph was created with.
        expected: usize,
        /// Universe of the offered set.
        got: usize,
    },
}

impl fmt::Display for CfgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadNodeId { id } => write!(f, "bad node id: {}", id.as_u32()),
            Self::UniverseMismatch { expected, got } => {
                write!(f, "set universe mismatch: expected={expected} got={got}")
            }
        }
    }
}

impl core::error::Error for CfgError {}

#[derive(Clone, Debug)]
struct NodeData {
    preds: Vec<NodeId>,
    succs: Vec<NodeId>,
    use_set: BitSet,
    def_set: BitSet,
}

/// An immutable control-flow graph with per-node `use`/`def` sets.
///
/// Built via [`CfgBuilder`]; read-only afterwards.
#[derive(Clone, Debug)]
pub struct Cfg {
    symbols: usize,
    nodes: Vec<NodeData>,
}

impl Cfg {
    /// Returns the number of nodes.
    #[must_use]
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the symbol universe size shared by all sets in this graph.
    #[must_use]
    #[inline]
    pub fn symbol_count(&self) -> usize {
        self.symbols
    }

    /// Iterates over all node ids in index order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId::new(i as u32))
    }

    /// Returns the predecessors of `node`, in insertion order.
    #[must_use]
    #[inline]
    pub fn preds(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.index()].preds
    }

    /// Returns the successors of `node`, in insertion order.
    #[must_use]
    #[inline]
    pub fn succs(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.index()].succs
    }

    /// Returns the `use` set of `node`.
    #[must_use]
    #[inline]
    pub fn use_set(&self, node: NodeId) -> &BitSet {
        &self.nodes[node.index()].use_set
    }

    /// Returns the `def` set of `node`.
    #[must_use]
    #[inline]
    pub fn def_set(&self, node: NodeId) -> &BitSet {
        &self.nodes[node.index()].def_set
    }
}

/// Builder for [`Cfg`].
///
/// All validation happens here so the analysis itself never sees a malformed
/// graph.
#[derive(Clone, Debug)]
pub struct CfgBuilder {
    symbols: usize,
    nodes: Vec<NodeData>,
}

impl CfgBuilder {
    /// Creates a builder for graphs over `symbols` symbols.
    #[must_use]
    pub fn new(symbols: usize) -> Self {
        Self {
            symbols,
            nodes: Vec::new(),
        }
    }

    /// Creates a builder with room for `nodes` nodes.
    #[must_use]
    pub fn with_capacity(symbols: usize, nodes: usize) -> Self {
        Self {
            symbols,
            nodes: Vec::with_capacity(nodes),
        }
    }

    /// Adds a node with the given `use`/`def` sets and returns its id.
    ///
    /// Fails if either set was built over a different universe than the
    /// graph's symbol count.
    pub fn add_node(&mut self, use_set: BitSet, def_set: BitSet) -> Result<NodeId, CfgError> {
        for s in [&use_set, &def_set] {
            if s.universe() != self.symbols {
                return Err(CfgError::UniverseMismatch {
                    expected: self.symbols,
                    got: s.universe(),
                });
            }
        }
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            preds: Vec::new(),
            succs: Vec::new(),
            use_set,
            def_set,
        });
        Ok(id)
    }

    /// Adds a directed edge `pred → succ`.
    ///
    /// Duplicate edges are kept; self-edges are allowed.
    pub fn add_edge(&mut self, pred: NodeId, succ: NodeId) -> Result<(), CfgError> {
        for id in [pred, succ] {
            if id.index() >= self.nodes.len() {
                return Err(CfgError::BadNodeId { id });
            }
        }
        self.nodes[pred.index()].succs.push(succ);
        self.nodes[succ.index()].preds.push(pred);
        Ok(())
    }

    /// Freezes the graph.
    #[must_use]
    pub fn build(self) -> Cfg {
        Cfg {
            symbols: self.symbols,
            nodes: self.nodes,
        }
    }
}
