// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test runner for the silver compiler.
//!
//! silvertest discovers `programs/*.sl` test files, compiles each one with
//! the `silver` compiler in both unoptimized and optimized mode, and
//! validates the result. A regular test must compile and exit with the
//! expected code when run; a `*_error.sl` test must fail to compile,
//! optionally with a diagnostic declared on its first line:
//!
//! ```text
//! # expect-error: type mismatch
//! ```
//!
//! Tests run sequentially by default, or on a worker pool with `-j`. The
//! report is sorted by test path either way.

pub mod artifacts;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod executor;
pub mod output;
pub mod reporter;
pub mod runner;
pub mod test_list;
