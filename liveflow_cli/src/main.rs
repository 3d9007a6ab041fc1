// Copyright 2026 the Liveflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command-line driver for the parallel liveness solver.
//!
//! Generates a synthetic workload, solves it with the requested discipline
//! and worker count, reports the solve wall time, and optionally prints every
//! node's `use`/`def`/`in`/`out` sets.

use std::io::{self, BufWriter, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use liveflow::{BitSet, Cfg, Discipline, Liveness, solve};
use liveflow_gen::{Mwc, Workload, generate};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DisciplineArg {
    /// Statically partitioned worklists, local re-enqueue.
    Static,
    /// Supervisor-coordinated worklists with termination detection.
    Supervised,
}

impl From<DisciplineArg> for Discipline {
    fn from(arg: DisciplineArg) -> Self {
        match arg {
            DisciplineArg::Static => Self::StaticPartition,
            DisciplineArg::Supervised => Self::Supervised,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Parallel liveness analysis over a synthetic CFG")]
struct Cli {
    /// Symbol universe size.
    #[arg(long, default_value_t = 100)]
    symbols: usize,

    /// Node count (at least 3).
    #[arg(long, default_value_t = 10_000)]
    nodes: usize,

    /// Upper bound on random successors per node.
    #[arg(long, default_value_t = 4)]
    max_succ: usize,

    /// Use/def assignment rounds per node.
    #[arg(long, default_value_t = 10)]
    active: usize,

    /// Worker thread count.
    #[arg(long, short = 'j', default_value_t = 4)]
    threads: usize,

    /// Scheduling discipline.
    #[arg(long, value_enum, default_value = "supervised")]
    discipline: DisciplineArg,

    /// Workload seed.
    #[arg(long, default_value_t = 1)]
    seed: i32,

    /// Print every node's use/def/in/out sets after solving.
    #[arg(long)]
    print: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let params = Workload {
        symbols: cli.symbols,
        nodes: cli.nodes,
        max_succ: cli.max_succ,
        active: cli.active,
    };
    let mut rng = Mwc::new(cli.seed);
    let cfg = generate(&params, &mut rng).context("workload generation failed")?;

    log::info!(
        "computing liveness with {} workers ({:?})",
        cli.threads,
        cli.discipline
    );
    let begin = Instant::now();
    let result = solve(&cfg, cli.threads, cli.discipline.into());
    let elapsed = begin.elapsed();
    println!("T = {:.6} s", elapsed.as_secs_f64());

    if cli.print {
        let stdout = io::stdout().lock();
        print_sets(&cfg, &result, BufWriter::new(stdout)).context("failed to print result sets")?;
    }
    Ok(())
}

fn print_sets(cfg: &Cfg, result: &Liveness, mut w: impl Write) -> io::Result<()> {
    for node in cfg.node_ids() {
        let i = node.as_u32();
        write_set(&mut w, "use", i, cfg.use_set(node))?;
        write_set(&mut w, "def", i, cfg.def_set(node))?;
        writeln!(w)?;
        write_set(&mut w, "in", i, result.live_in(node))?;
        write_set(&mut w, "out", i, result.live_out(node))?;
        writeln!(w)?;
    }
    Ok(())
}

fn write_set(w: &mut impl Write, name: &str, node: u32, set: &BitSet) -> io::Result<()> {
    write!(w, "{name}[{node}] = {{ ")?;
    for sym in set.ones() {
        write!(w, "{sym} ")?;
    }
    writeln!(w, "}}")
}
