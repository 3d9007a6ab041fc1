// Copyright 2026 the Liveflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmark-only crate. Scenarios live in `benches/solve.rs`.
