// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build artifact paths and cleanup.
//!
//! Each test compiles to a single executable next to its source, plus
//! whatever side-products the platform linker emits. Cleanup is best-effort:
//! it can never turn a passing test into a failing one, and it runs on every
//! exit path via [`CleanupGuard`].

use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use tracing::debug;

/// Extensions of linker side-products removed alongside the executable.
const AUX_EXTENSIONS: &[&str] = &["lib", "exp", "pdb", "obj"];

/// The set of build artifacts associated with one test source file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestArtifacts {
    base: Utf8PathBuf,
}

impl TestArtifacts {
    /// Derives the artifact set for a test source path.
    pub fn for_source(source: &Utf8Path) -> Self {
        Self {
            base: source.with_extension(""),
        }
    }

    /// The path the compiler writes the executable to.
    pub fn executable(&self) -> Utf8PathBuf {
        let mut path = self.base.clone().into_string();
        path.push_str(std::env::consts::EXE_SUFFIX);
        path.into()
    }

    /// Removes the executable and any linker side-products.
    ///
    /// Removal is idempotent and swallows all errors: "not found" is the
    /// common case (a failed compile produces nothing), and anything else is
    /// logged at debug level.
    pub fn cleanup(&self) {
        remove_quietly(&self.executable());
        for ext in AUX_EXTENSIONS {
            remove_quietly(&self.base.with_extension(ext));
        }
    }
}

fn remove_quietly(path: &Utf8Path) {
    match fs_err::remove_file(path) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => debug!("failed to remove artifact: {error}"),
    }
}

/// Scoped ownership of a test's artifacts: cleanup runs when the guard is
/// dropped, on every exit path of an executor.
#[derive(Debug)]
pub struct CleanupGuard {
    artifacts: TestArtifacts,
}

impl CleanupGuard {
    /// Acquires the artifact set for the given source file.
    pub fn acquire(source: &Utf8Path) -> Self {
        Self {
            artifacts: TestArtifacts::for_source(source),
        }
    }

    /// The executable path covered by this guard.
    pub fn executable(&self) -> Utf8PathBuf {
        self.artifacts.executable()
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.artifacts.cleanup();
    }
}
