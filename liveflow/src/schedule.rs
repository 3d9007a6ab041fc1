// Copyright 2026 the Liveflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Worklist scheduling disciplines.
//!
//! Both disciplines partition the nodes round-robin over N worklists
//! (`index % N`), start N workers, and return once no node can trigger any
//! further re-evaluation. They differ in how work moves after the initial
//! seed and in how termination is detected:
//!
//! - [`Discipline::StaticPartition`]: every worker owns one worklist and
//!   pushes newly-dirty predecessors onto *its own* list, wherever their home
//!   partition is. A worker stops when its list runs dry; no cross-thread
//!   signaling is needed because nothing can re-fill a drained list owner's
//!   queue from outside. Correct because every dirtied node lands on exactly
//!   one list and every list is drained to empty.
//! - [`Discipline::Supervised`]: a [`Supervisor`] owns all worklists plus a
//!   counter of outstanding items, and newly-dirty nodes go to their home
//!   partition. Workers block on empty partitions until either work arrives
//!   or the counter reaches zero.
//!
//! ## Termination protocol (supervised)
//!
//! One mutex guards both the queues and the counter, paired with exactly one
//! condvar. Incrementing the counter and publishing the item happen in the
//! same critical section, and the decrement happens only after the item's
//! evaluation finished, so the counter can reach zero only when every queue
//! is empty and nothing is in flight. A counter underflow would mean a
//! protocol violation and asserts instead of being handled.

use std::collections::VecDeque;
use std::thread;

use parking_lot::{Condvar, Mutex};

use crate::cfg::{Cfg, NodeId};
use crate::transfer::{self, NodeCell};

/// Below this node count the static discipline runs single-threaded; thread
/// fan-out costs more than it saves on graphs this small.
const SEQUENTIAL_CUTOFF: usize = 2000;

/// Selects how the worklist is distributed across workers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Discipline {
    /// Statically partitioned worklists, local-only re-enqueue, join-based
    /// termination.
    StaticPartition,
    /// Supervisor-owned worklists with home-partition handoff and
    /// counter-based global termination detection.
    Supervised,
}

/// Runs the chosen discipline to the global fixpoint. Returns after all
/// workers have been joined.
pub(crate) fn run(cfg: &Cfg, cells: &[NodeCell], workers: usize, discipline: Discipline) {
    match discipline {
        Discipline::StaticPartition => run_static(cfg, cells, workers),
        Discipline::Supervised => run_supervised(cfg, cells, workers),
    }
}

fn seed_partitions(node_count: usize, partitions: usize) -> Vec<VecDeque<NodeId>> {
    let mut lists: Vec<VecDeque<NodeId>> = (0..partitions).map(|_| VecDeque::new()).collect();
    for i in 0..node_count {
        lists[i % partitions].push_back(NodeId::new(i as u32));
    }
    lists
}

fn run_static(cfg: &Cfg, cells: &[NodeCell], requested: usize) {
    let workers = if cfg.node_count() < SEQUENTIAL_CUTOFF {
        1
    } else {
        requested.max(1)
    };
    let seeds = seed_partitions(cfg.node_count(), workers);

    thread::scope(|scope| {
        for (id, mut local) in seeds.into_iter().enumerate() {
            scope.spawn(move || {
                let mut processed = 0_usize;
                while let Some(node) = local.pop_front() {
                    cells[node.index()].mark_dequeued();
                    // Newly-dirty predecessors stay with the discovering
                    // worker, not their home partition.
                    transfer::evaluate(cfg, cells, node, |pred| local.push_back(pred));
                    processed += 1;
                }
                log::debug!("static worker {id}: list drained after {processed} evaluations");
            });
        }
    });
}

fn run_supervised(cfg: &Cfg, cells: &[NodeCell], requested: usize) {
    let workers = requested.max(1);
    let supervisor = Supervisor::new(cfg.node_count(), workers);

    thread::scope(|scope| {
        for id in 0..workers {
            let supervisor = &supervisor;
            scope.spawn(move || {
                let mut processed = 0_usize;
                while let Some(node) = supervisor.fetch(id) {
                    cells[node.index()].mark_dequeued();
                    transfer::evaluate(cfg, cells, node, |pred| supervisor.submit(pred));
                    supervisor.complete();
                    processed += 1;
                }
                log::debug!("worker {id}: global drain observed after {processed} evaluations");
            });
        }
    });

    debug_assert!(
        supervisor.is_drained(),
        "supervisor terminated with pending work"
    );
}

struct SupervisorState {
    partitions: Vec<VecDeque<NodeId>>,
    /// Nodes currently enqueued anywhere or in flight between a fetch and
    /// the matching completion report.
    outstanding: usize,
}

/// Coordinator for the dynamic discipline: N worklists plus the
/// outstanding-work counter, all behind one lock.
pub(crate) struct Supervisor {
    shared: Mutex<SupervisorState>,
    /// Signaled when a partition gains an item or the counter reaches zero.
    /// Paired with `shared`; waiters re-check their predicate on every wake.
    work_ready: Condvar,
}

impl Supervisor {
    /// Seeds every node into its home partition (`index % partitions`) and
    /// initializes the counter to the node count.
    pub(crate) fn new(node_count: usize, partitions: usize) -> Self {
        Self {
            shared: Mutex::new(SupervisorState {
                partitions: seed_partitions(node_count, partitions),
                outstanding: node_count,
            }),
            work_ready: Condvar::new(),
        }
    }

    /// Takes the next node from `partition`, blocking while the partition is
    /// empty but outstanding work remains anywhere. Returns `None` once the
    /// global drain is complete; no further fetch can succeed after that.
    pub(crate) fn fetch(&self, partition: usize) -> Option<NodeId> {
        let mut shared = self.shared.lock();
        loop {
            if let Some(node) = shared.partitions[partition].pop_front() {
                return Some(node);
            }
            if shared.outstanding == 0 {
                return None;
            }
            self.work_ready.wait(&mut shared);
        }
    }

    /// Publishes a newly-dirty node to its home partition.
    ///
    /// The counter increment and the queue push share one critical section,
    /// so no concurrent `complete` can observe the counter at zero while the
    /// item is still unpublished.
    pub(crate) fn submit(&self, node: NodeId) {
        let mut shared = self.shared.lock();
        shared.outstanding += 1;
        let home = node.index() % shared.partitions.len();
        shared.partitions[home].push_back(node);
        self.work_ready.notify_all();
    }

    /// Reports one finished evaluation, whether or not it changed anything.
    ///
    /// The decrement that reaches zero is the termination event: it wakes
    /// every blocked worker, each of which then observes "no local work, no
    /// global work" and exits.
    pub(crate) fn complete(&self) {
        let mut shared = self.shared.lock();
        debug_assert!(
            shared.outstanding > 0,
            "completion reported with no outstanding work"
        );
        shared.outstanding -= 1;
        if shared.outstanding == 0 {
            self.work_ready.notify_all();
        }
    }

    /// `true` once the counter is zero and every partition is empty. These
    /// coincide at termination by construction; the check exists for
    /// assertions and tests.
    pub(crate) fn is_drained(&self) -> bool {
        let shared = self.shared.lock();
        shared.outstanding == 0 && shared.partitions.iter().all(VecDeque::is_empty)
    }
}

impl core::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("Supervisor")
            .field("outstanding", &shared.outstanding)
            .field("partitions", &shared.partitions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::BitSet;
    use crate::cfg::CfgBuilder;

    fn chain(symbols: usize, uses: &[&[usize]]) -> Cfg {
        let mut b = CfgBuilder::new(symbols);
        let mut ids = Vec::new();
        for node_uses in uses {
            let mut use_set = BitSet::new_empty(symbols);
            for &s in *node_uses {
                use_set.set(s);
            }
            ids.push(
                b.add_node(use_set, BitSet::new_empty(symbols))
                    .expect("node"),
            );
        }
        for w in ids.windows(2) {
            b.add_edge(w[0], w[1]).expect("edge");
        }
        b.build()
    }

    fn cells_for(cfg: &Cfg) -> Vec<NodeCell> {
        (0..cfg.node_count())
            .map(|_| NodeCell::new(cfg.symbol_count()))
            .collect()
    }

    #[test]
    fn round_robin_seed_covers_every_node_once() {
        let lists = seed_partitions(7, 3);
        assert_eq!(lists[0].len(), 3); // 0, 3, 6
        assert_eq!(lists[1].len(), 2); // 1, 4
        assert_eq!(lists[2].len(), 2); // 2, 5
        let mut all: Vec<u32> = lists
            .iter()
            .flat_map(|l| l.iter().map(|n| n.as_u32()))
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn supervisor_counts_down_to_drain() {
        let s = Supervisor::new(2, 1);
        assert!(!s.is_drained());

        let first = s.fetch(0).expect("seeded node");
        assert_eq!(first, NodeId::new(0));
        s.complete();
        let second = s.fetch(0).expect("seeded node");
        assert_eq!(second, NodeId::new(1));
        s.complete();

        assert!(s.is_drained());
        assert_eq!(s.fetch(0), None);
    }

    #[test]
    fn submit_keeps_the_counter_ahead_of_the_queue() {
        let s = Supervisor::new(1, 1);
        let node = s.fetch(0).expect("seeded node");

        // Work discovered while `node` is in flight: counter goes to 2, so
        // the completion below cannot terminate the run early.
        s.submit(NodeId::new(0));
        s.complete();

        assert!(!s.is_drained());
        assert_eq!(s.fetch(0), Some(node));
        s.complete();
        assert!(s.is_drained());
    }

    #[test]
    fn submit_routes_to_home_partition() {
        let s = Supervisor::new(0, 2);
        s.submit(NodeId::new(3)); // 3 % 2 == 1
        assert_eq!(s.fetch(1), Some(NodeId::new(3)));
        s.complete();
        assert_eq!(s.fetch(0), None);
        assert_eq!(s.fetch(1), None);
    }

    #[test]
    fn static_discipline_solves_a_chain() {
        // A → B → C, only C uses a symbol: liveness flows all the way back.
        let cfg = chain(1, &[&[], &[], &[0]]);
        let cells = cells_for(&cfg);
        run(&cfg, &cells, 4, Discipline::StaticPartition);

        for cell in cells {
            let (in_set, _) = cell.into_sets();
            assert!(in_set.get(0));
        }
    }

    #[test]
    fn supervised_discipline_converges_on_a_cycle() {
        // A ⇄ B with one use: the cyclic dependency must still terminate.
        let mut b = CfgBuilder::new(1);
        let empty = BitSet::new_empty(1);
        let mut use_b = BitSet::new_empty(1);
        use_b.set(0);
        let a = b.add_node(empty.clone(), empty.clone()).expect("node");
        let n = b.add_node(use_b, empty.clone()).expect("node");
        b.add_edge(a, n).expect("edge");
        b.add_edge(n, a).expect("edge");
        let cfg = b.build();

        let cells = cells_for(&cfg);
        run(&cfg, &cells, 2, Discipline::Supervised);

        for cell in cells {
            let (in_set, out_set) = cell.into_sets();
            assert!(in_set.get(0));
            assert!(out_set.get(0));
        }
    }
}
