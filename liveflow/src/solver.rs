// Copyright 2026 the Liveflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The blocking run-to-fixpoint entry point and the analysis result.

use crate::bitset::BitSet;
use crate::cfg::{Cfg, NodeId};
use crate::schedule::{self, Discipline};
use crate::transfer::NodeCell;

/// Per-node liveness fixpoint, indexed by [`NodeId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Liveness {
    live_in: Vec<BitSet>,
    live_out: Vec<BitSet>,
}

impl Liveness {
    /// Returns the `in` set of `node`.
    #[must_use]
    #[inline]
    pub fn live_in(&self, node: NodeId) -> &BitSet {
        &self.live_in[node.index()]
    }

    /// Returns the `out` set of `node`.
    #[must_use]
    #[inline]
    pub fn live_out(&self, node: NodeId) -> &BitSet {
        &self.live_out[node.index()]
    }
}

/// Computes the liveness fixpoint of `cfg` with `workers` threads.
///
/// Blocks until every node's `in`/`out` are stable and all workers have been
/// joined; there are no partial or streaming results. `workers` is clamped to
/// at least one, and the static discipline may further clamp it to one for
/// trivially small graphs.
///
/// The run always terminates: the sets only grow, the universe and node count
/// are finite, so only finitely many changes are possible.
#[must_use]
pub fn solve(cfg: &Cfg, workers: usize, discipline: Discipline) -> Liveness {
    let cells: Vec<NodeCell> = (0..cfg.node_count())
        .map(|_| NodeCell::new(cfg.symbol_count()))
        .collect();

    log::debug!(
        "solving liveness: {} nodes, {} symbols, {workers} workers, {discipline:?}",
        cfg.node_count(),
        cfg.symbol_count()
    );
    schedule::run(cfg, &cells, workers, discipline);

    // All workers joined; the cells are exclusively ours again.
    let mut live_in = Vec::with_capacity(cells.len());
    let mut live_out = Vec::with_capacity(cells.len());
    for cell in cells {
        let (in_set, out_set) = cell.into_sets();
        live_in.push(in_set);
        live_out.push(out_set);
    }
    Liveness { live_in, live_out }
}

/// Checks the fixpoint invariant: for every node,
/// `in == use ∪ (out − def)` and `out == ∪ succ.in` hold simultaneously.
///
/// Equivalent to running one more scheduling-free pass and confirming that
/// nothing changes.
#[must_use]
pub fn is_fixpoint(cfg: &Cfg, result: &Liveness) -> bool {
    for node in cfg.node_ids() {
        let mut out = BitSet::new_empty(cfg.symbol_count());
        for &succ in cfg.succs(node) {
            out.union_with(result.live_in(succ));
        }
        if &out != result.live_out(node) {
            return false;
        }

        let mut expect_in = out;
        expect_in.subtract_with(cfg.def_set(node));
        expect_in.union_with(cfg.use_set(node));
        if &expect_in != result.live_in(node) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::CfgBuilder;
    use crate::transfer;

    fn set_of(universe: usize, bits: &[usize]) -> BitSet {
        let mut s = BitSet::new_empty(universe);
        for &b in bits {
            s.set(b);
        }
        s
    }

    fn both_disciplines() -> [Discipline; 2] {
        [Discipline::StaticPartition, Discipline::Supervised]
    }

    #[test]
    fn value_flows_backward_through_a_chain() {
        // A → B → C, use[C] = {x}: x is live through the whole chain.
        for discipline in both_disciplines() {
            let mut b = CfgBuilder::new(1);
            let empty = BitSet::new_empty(1);
            let a = b.add_node(empty.clone(), empty.clone()).expect("node");
            let m = b.add_node(empty.clone(), empty.clone()).expect("node");
            let c = b.add_node(set_of(1, &[0]), empty.clone()).expect("node");
            b.add_edge(a, m).expect("edge");
            b.add_edge(m, c).expect("edge");
            let cfg = b.build();

            let result = solve(&cfg, 3, discipline);
            assert_eq!(result.live_in(c), &set_of(1, &[0]));
            assert!(result.live_out(c).is_empty());
            for node in [a, m] {
                assert_eq!(result.live_in(node), &set_of(1, &[0]));
                assert_eq!(result.live_out(node), &set_of(1, &[0]));
            }
            assert!(is_fixpoint(&cfg, &result));
        }
    }

    #[test]
    fn use_beats_def_of_the_same_symbol() {
        // Single node, use = def = {x}, no successors:
        // in = use ∪ (∅ − def) = {x}.
        for discipline in both_disciplines() {
            let mut b = CfgBuilder::new(1);
            let n = b
                .add_node(set_of(1, &[0]), set_of(1, &[0]))
                .expect("node");
            let cfg = b.build();

            let result = solve(&cfg, 1, discipline);
            assert_eq!(result.live_in(n), &set_of(1, &[0]));
            assert!(result.live_out(n).is_empty());
            assert!(is_fixpoint(&cfg, &result));
        }
    }

    #[test]
    fn cycle_converges_to_a_uniform_fixpoint() {
        // A → B → A, use[B] = {y}: y circulates through both nodes.
        for discipline in both_disciplines() {
            let mut b = CfgBuilder::new(1);
            let empty = BitSet::new_empty(1);
            let a = b.add_node(empty.clone(), empty.clone()).expect("node");
            let n = b.add_node(set_of(1, &[0]), empty.clone()).expect("node");
            b.add_edge(a, n).expect("edge");
            b.add_edge(n, a).expect("edge");
            let cfg = b.build();

            let result = solve(&cfg, 2, discipline);
            for node in [a, n] {
                assert_eq!(result.live_in(node), &set_of(1, &[0]));
                assert_eq!(result.live_out(node), &set_of(1, &[0]));
            }
            assert!(is_fixpoint(&cfg, &result));
        }
    }

    #[test]
    fn empty_graph_solves_to_an_empty_result() {
        for discipline in both_disciplines() {
            let cfg = CfgBuilder::new(4).build();
            let result = solve(&cfg, 8, discipline);
            assert!(is_fixpoint(&cfg, &result));
        }
    }

    #[test]
    fn def_blocks_propagation_past_the_defining_node() {
        // A → B, use[B] = {x}, def[A] = {x}: x is live out of A but not in.
        for discipline in both_disciplines() {
            let mut b = CfgBuilder::new(1);
            let a = b
                .add_node(BitSet::new_empty(1), set_of(1, &[0]))
                .expect("node");
            let n = b
                .add_node(set_of(1, &[0]), BitSet::new_empty(1))
                .expect("node");
            b.add_edge(a, n).expect("edge");
            let cfg = b.build();

            let result = solve(&cfg, 2, discipline);
            assert_eq!(result.live_out(a), &set_of(1, &[0]));
            assert!(result.live_in(a).is_empty());
            assert!(is_fixpoint(&cfg, &result));
        }
    }

    #[test]
    fn is_fixpoint_rejects_a_stale_result() {
        let mut b = CfgBuilder::new(1);
        let empty = BitSet::new_empty(1);
        let a = b.add_node(empty.clone(), empty.clone()).expect("node");
        let n = b.add_node(set_of(1, &[0]), empty.clone()).expect("node");
        b.add_edge(a, n).expect("edge");
        let cfg = b.build();

        // All-empty sets satisfy nothing: in[n] should be {x}.
        let stale = Liveness {
            live_in: vec![empty.clone(), empty.clone()],
            live_out: vec![empty.clone(), empty],
        };
        assert!(!is_fixpoint(&cfg, &stale));
    }

    #[test]
    fn transfer_module_is_reachable_from_solver() {
        // Guard against the scheduling layer bypassing the shared transfer
        // function: a lone evaluation must agree with a full solve.
        let mut b = CfgBuilder::new(2);
        let n = b
            .add_node(set_of(2, &[1]), set_of(2, &[0]))
            .expect("node");
        let cfg = b.build();

        let cells = vec![transfer::NodeCell::new(cfg.symbol_count())];
        transfer::evaluate(&cfg, &cells, n, |_| {});
        let (lone_in, _) = cells.into_iter().next().expect("cell").into_sets();

        let result = solve(&cfg, 1, Discipline::Supervised);
        assert_eq!(&lone_in, result.live_in(n));
    }
}
