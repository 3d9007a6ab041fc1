// Copyright 2026 the Liveflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `liveflow`: parallel backward liveness analysis over a control-flow graph.
//!
//! The crate solves the classic liveness equations
//!
//! ```text
//! in[n]  = use[n] ∪ (out[n] − def[n])
//! out[n] = ∪ { in[s] : s ∈ succ(n) }
//! ```
//!
//! to a fixpoint with the iterative worklist algorithm, distributed over a
//! fixed pool of worker threads. Two scheduling disciplines are provided (see
//! [`Discipline`]): a statically partitioned scheme where every worker drains
//! only its own worklist, and a supervisor-coordinated scheme with dynamic
//! handoff and explicit global termination detection.
//!
//! The graph topology and the `use`/`def` sets are fixed before the analysis
//! starts; only the `in`/`out` sets and the scheduling state mutate during a
//! run. Both disciplines converge to the same fixpoint because the lattice is
//! finite and the transfer function is monotone.
//!
//! ## Example
//!
//! ```
//! use liveflow::{BitSet, CfgBuilder, Discipline, solve};
//!
//! // A → B, one symbol, used in B.
//! let mut b = CfgBuilder::new(1);
//! let empty = BitSet::new_empty(1);
//! let mut use_b = BitSet::new_empty(1);
//! use_b.set(0);
//! let a = b.add_node(empty.clone(), empty.clone())?;
//! let n = b.add_node(use_b, empty.clone())?;
//! b.add_edge(a, n)?;
//! let cfg = b.build();
//!
//! let result = solve(&cfg, 2, Discipline::Supervised);
//! assert!(result.live_in(a).get(0));
//! # Ok::<(), liveflow::CfgError>(())
//! ```

mod bitset;
mod cfg;
mod schedule;
mod solver;
mod transfer;

pub use bitset::BitSet;
pub use cfg::{Cfg, CfgBuilder, CfgError, NodeId};
pub use schedule::Discipline;
pub use solver::{Liveness, is_fixpoint, solve};
