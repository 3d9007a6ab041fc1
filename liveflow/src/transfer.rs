// Copyright 2026 the Liveflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The liveness transfer function and the mutable per-node analysis state.
//!
//! `in`/`out` are published as whole bitset values under per-node locks, so a
//! concurrent reader of a successor's `in` sees either the old or the new
//! complete set, never a torn mix. Updates are grow-only unions: `in` sets
//! only ever gain bits during a run, so a stale snapshot computed by one
//! worker can never retract bits a racing evaluation of the same node already
//! published. Convergence is unaffected because the union of two monotone
//! approximations is still below the fixpoint.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::bitset::BitSet;
use crate::cfg::{Cfg, NodeId};

/// Mutable analysis state for one node.
///
/// The `queued` flag is `true` exactly while the node sits in some worklist
/// (or is about to be pushed by the thread that won the flag). It makes the
/// "is this node already scheduled" decision a single compare-exchange, so
/// two workers can never enqueue the same node twice.
#[derive(Debug)]
pub(crate) struct NodeCell {
    in_set: RwLock<BitSet>,
    out_set: RwLock<BitSet>,
    queued: AtomicBool,
}

impl NodeCell {
    /// Creates the initial state: `in`/`out` empty, node enqueued.
    ///
    /// Every node starts on a worklist, so the flag starts `true`.
    pub(crate) fn new(universe: usize) -> Self {
        Self {
            in_set: RwLock::new(BitSet::new_empty(universe)),
            out_set: RwLock::new(BitSet::new_empty(universe)),
            queued: AtomicBool::new(true),
        }
    }

    /// Clears the queued flag. Called by the worker that dequeued the node,
    /// before evaluating it, so any change that lands after this point
    /// re-triggers scheduling.
    pub(crate) fn mark_dequeued(&self) {
        self.queued.store(false, Ordering::Release);
    }

    /// Atomically claims the right to enqueue this node.
    ///
    /// Returns `true` for exactly one caller while the flag is clear; the
    /// winner must push the node onto a worklist.
    pub(crate) fn try_claim_for_enqueue(&self) -> bool {
        self.queued
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[cfg(test)]
    pub(crate) fn is_queued(&self) -> bool {
        self.queued.load(Ordering::Acquire)
    }

    /// Consumes the cell after all workers have been joined.
    pub(crate) fn into_sets(self) -> (BitSet, BitSet) {
        (self.in_set.into_inner(), self.out_set.into_inner())
    }
}

/// Applies the liveness transfer function to `node`.
///
/// Recomputes `out = ∪ succ.in` from a snapshot of each successor's current
/// `in`, then `in = use ∪ (out − def)`, and reports whether `in` grew. When
/// it did, every predecessor whose queued flag this call wins is handed to
/// `enqueue`; where the item goes is the caller's scheduling policy. The
/// function never blocks on scheduling state and never consults global
/// termination state.
pub(crate) fn evaluate<F>(cfg: &Cfg, cells: &[NodeCell], node: NodeId, mut enqueue: F) -> bool
where
    F: FnMut(NodeId),
{
    let cell = &cells[node.index()];

    // A node with no successors keeps out = ∅.
    let mut new_out = BitSet::new_empty(cfg.symbol_count());
    for &succ in cfg.succs(node) {
        new_out.union_with(&cells[succ.index()].in_set.read());
    }

    // in = use ∪ (out − def)
    let mut new_in = new_out.clone();
    new_in.subtract_with(cfg.def_set(node));
    new_in.union_with(cfg.use_set(node));

    cell.out_set.write().union_with(&new_out);

    let changed = {
        let mut in_guard = cell.in_set.write();
        if in_guard.contains_all(&new_in) {
            false
        } else {
            in_guard.union_with(&new_in);
            true
        }
    };

    if changed {
        for &pred in cfg.preds(node) {
            if cells[pred.index()].try_claim_for_enqueue() {
                enqueue(pred);
            }
        }
    }

    changed
}
