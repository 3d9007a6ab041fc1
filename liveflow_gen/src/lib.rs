// Copyright 2026 the Liveflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic synthetic workloads for the liveness solver.
//!
//! Graphs and use/def sets are derived from a tiny multiply-with-carry
//! generator with fully pinned arithmetic, so a `(params, seed)` pair always
//! produces the same workload on every platform. That determinism is what the
//! cross-discipline conformance tests and benchmarks key on.
//!
//! The generated shape is deliberately crude: node 0 fans out to nodes 1 and
//! 2, and every node from 2 up gets a small random number of successors
//! chosen uniformly over the whole graph. Cycles, self-edges, multi-edges and
//! unreachable nodes all occur, which is exactly the stress the solver wants.

use liveflow::{BitSet, Cfg, CfgBuilder, CfgError};

/// Pair multiply-with-carry pseudo-random generator.
///
/// All arithmetic wraps on `i32`; the output mixes both lags. Not a quality
/// source of randomness, just a cheap reproducible one.
#[derive(Clone, Debug)]
pub struct Mwc {
    w: i32,
    z: i32,
}

impl Mwc {
    /// Creates a generator from `seed`.
    #[must_use]
    pub fn new(seed: i32) -> Self {
        Self {
            w: seed.wrapping_add(1),
            z: seed
                .wrapping_mul(seed)
                .wrapping_add(seed)
                .wrapping_add(2),
        }
    }

    /// Returns the next pseudo-random value (full `i32` range).
    pub fn next_i32(&mut self) -> i32 {
        self.z = 36969_i32
            .wrapping_mul(self.z & 0xffff)
            .wrapping_add(self.z >> 16);
        self.w = 18000_i32
            .wrapping_mul(self.w & 0xffff)
            .wrapping_add(self.w >> 16);
        (self.z << 16).wrapping_add(self.w)
    }

    fn next_index(&mut self, bound: usize) -> usize {
        (self.next_i32().unsigned_abs() as usize) % bound
    }
}

/// Shape parameters for a synthetic workload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Workload {
    /// Symbol universe size.
    pub symbols: usize,
    /// Node count; at least [`Workload::MIN_NODES`].
    pub nodes: usize,
    /// Upper bound on the random successor count drawn per node.
    pub max_succ: usize,
    /// Use/def assignment rounds per node.
    pub active: usize,
}

impl Workload {
    /// The generator wires `0 → 1` and `0 → 2` unconditionally, so graphs
    /// smaller than this are not expressible.
    pub const MIN_NODES: usize = 3;
}

/// Workload generation errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenError {
    /// Fewer than [`Workload::MIN_NODES`] nodes were requested.
    TooFewNodes {
        /// The requested node count.
        requested: usize,
    },
    /// `symbols`, `max_succ`, or `active` was zero.
    ZeroParameter {
        /// Name of the offending parameter.
        name: &'static str,
    },
    /// Graph construction rejected the generated topology.
    Cfg(CfgError),
}

impl core::fmt::Display for GenError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooFewNodes { requested } => {
                write!(
                    f,
                    "workload needs at least {} nodes, got {requested}",
                    Workload::MIN_NODES
                )
            }
            Self::ZeroParameter { name } => write!(f, "workload parameter `{name}` must be > 0"),
            Self::Cfg(e) => write!(f, "generated graph was rejected: {e}"),
        }
    }
}

impl core::error::Error for GenError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Cfg(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CfgError> for GenError {
    fn from(e: CfgError) -> Self {
        Self::Cfg(e)
    }
}

/// Generates a CFG with populated use/def sets.
///
/// Edges are drawn before use/def symbols, so the RNG stream layout (and with
/// it every historical seed) stays stable if either half changes internally.
pub fn generate(params: &Workload, rng: &mut Mwc) -> Result<Cfg, GenError> {
    if params.nodes < Workload::MIN_NODES {
        return Err(GenError::TooFewNodes {
            requested: params.nodes,
        });
    }
    for (value, name) in [
        (params.symbols, "symbols"),
        (params.max_succ, "max_succ"),
        (params.active, "active"),
    ] {
        if value == 0 {
            return Err(GenError::ZeroParameter { name });
        }
    }

    log::info!(
        "generating workload: {} nodes, {} symbols, max_succ {}, active {}",
        params.nodes,
        params.symbols,
        params.max_succ,
        params.active
    );

    let edges = draw_edges(params, rng);
    let use_defs = draw_use_defs(params, rng);

    let mut builder = CfgBuilder::with_capacity(params.symbols, params.nodes);
    let mut ids = Vec::with_capacity(params.nodes);
    for (use_set, def_set) in use_defs {
        ids.push(builder.add_node(use_set, def_set)?);
    }
    for (pred, succ) in edges {
        builder.add_edge(ids[pred], ids[succ])?;
    }
    Ok(builder.build())
}

fn draw_edges(params: &Workload, rng: &mut Mwc) -> Vec<(usize, usize)> {
    let mut edges = vec![(0, 1), (0, 2)];
    for i in 2..params.nodes {
        // Signed remainder: a negative draw yields zero successors for this
        // node, which is a deliberate part of the workload's shape.
        let succs = succ_count(rng.next_i32(), params.max_succ);
        for _ in 0..succs {
            edges.push((i, rng.next_index(params.nodes)));
        }
    }
    edges
}

fn succ_count(draw: i32, max_succ: usize) -> usize {
    let bound = i32::try_from(max_succ).unwrap_or(i32::MAX);
    let s = (draw % bound) + 1;
    usize::try_from(s).unwrap_or(0)
}

fn draw_use_defs(params: &Workload, rng: &mut Mwc) -> Vec<(BitSet, BitSet)> {
    let mut out = Vec::with_capacity(params.nodes);
    for _ in 0..params.nodes {
        let mut use_set = BitSet::new_empty(params.symbols);
        let mut def_set = BitSet::new_empty(params.symbols);
        for round in 0..params.active {
            let sym = rng.next_index(params.symbols);
            // Three use draws for every def draw; a symbol never lands in
            // both sets of one node.
            if round % 4 != 0 {
                if !def_set.get(sym) {
                    use_set.set(sym);
                }
            } else if !use_set.get(sym) {
                def_set.set(sym);
            }
        }
        out.push((use_set, def_set));
    }
    out
}
