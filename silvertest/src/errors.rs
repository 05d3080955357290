// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by silvertest.
//!
//! Per-test failures are not errors: they are captured in
//! [`OutcomeStatus::Fail`](crate::executor::OutcomeStatus) and reported at the
//! end of the run. The types here cover conditions that prevent a run from
//! starting or from producing a complete report.

use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// An error that occurred while reading or parsing the harness config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config at `{path}`")]
    Read {
        /// The path to the config file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The config file could not be parsed as TOML.
    #[error("failed to parse config at `{path}`")]
    Parse {
        /// The path to the config file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: toml::de::Error,
    },
}

/// The compiler under test was not found at startup.
///
/// This is a precondition check: a missing compiler fails the whole run
/// before any test executes, rather than failing every test individually.
#[derive(Debug, Error)]
#[error("compiler `{path}` not found")]
pub struct CompilerNotFound {
    path: Utf8PathBuf,
}

impl CompilerNotFound {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// An error that occurred while discovering test programs.
#[derive(Debug, Error)]
#[error("failed to read test directory `{dir}`")]
pub struct DiscoveryError {
    dir: Utf8PathBuf,
    #[source]
    error: io::Error,
}

impl DiscoveryError {
    pub(crate) fn new(dir: impl Into<Utf8PathBuf>, error: io::Error) -> Self {
        Self {
            dir: dir.into(),
            error,
        }
    }
}
