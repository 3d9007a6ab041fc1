// Copyright 2026 the Liveflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test-only crate. The conformance suite lives in `tests/conformance.rs`.
