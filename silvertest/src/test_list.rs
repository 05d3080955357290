// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test discovery and classification.

use crate::{config::HarnessConfig, errors::DiscoveryError};
use camino::{Utf8Path, Utf8PathBuf};
use owo_colors::{OwoColorize, Style};
use std::io;
use tracing::warn;

/// The validation contract a test file carries, determined by its name.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TestKind {
    /// The program must compile, and the produced executable must exit with
    /// the expected code.
    Run,

    /// Compilation must fail, optionally with a declared diagnostic
    /// substring in the compiler output.
    CompileFail,
}

/// A single discovered test program.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCase {
    /// Path to the test source file.
    pub path: Utf8PathBuf,

    /// The contract this test is validated against.
    pub kind: TestKind,
}

/// Classifies a test file by its base name.
///
/// Base names ending in the compile-fail suffix (before the extension) are
/// compile-fail tests; everything else is a run test. Pure function of the
/// path.
pub fn classify(path: &Utf8Path, compile_fail_suffix: &str) -> TestKind {
    match path.file_stem() {
        Some(stem) if stem.ends_with(compile_fail_suffix) => TestKind::CompileFail,
        _ => TestKind::Run,
    }
}

/// The list of discovered tests, sorted by path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestList {
    tests: Vec<TestCase>,
}

impl TestList {
    /// Discovers test programs in the configured directory.
    ///
    /// Files with the configured source extension are classified and
    /// collected; anything else in the directory is ignored. An empty or
    /// missing set of matches is valid and produces an empty list.
    pub fn discover(config: &HarnessConfig) -> Result<Self, DiscoveryError> {
        let dir = &config.programs_dir;
        let entries = fs_err::read_dir(dir.as_std_path())
            .map_err(|error| DiscoveryError::new(dir.clone(), error))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|error| DiscoveryError::new(dir.clone(), error))?;
            match Utf8PathBuf::from_path_buf(entry.path()) {
                Ok(path) => paths.push(path),
                Err(path) => {
                    // Test paths must be valid UTF-8 to appear in reports.
                    warn!("skipping non-UTF-8 path {}", path.display());
                }
            }
        }

        Ok(Self::from_paths(paths, config))
    }

    /// Builds a test list from the given paths, applying the extension
    /// filter and classification. Used directly by tests.
    pub fn from_paths(
        paths: impl IntoIterator<Item = Utf8PathBuf>,
        config: &HarnessConfig,
    ) -> Self {
        let mut tests: Vec<_> = paths
            .into_iter()
            .filter(|path| path.extension() == Some(config.source_ext.as_str()))
            .map(|path| {
                let kind = classify(&path, &config.compile_fail_suffix);
                TestCase { path, kind }
            })
            .collect();
        tests.sort_by(|a, b| a.path.cmp(&b.path));
        Self { tests }
    }

    /// Returns the total number of tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if no tests were discovered.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Returns the number of run tests.
    pub fn run_count(&self) -> usize {
        self.count(TestKind::Run)
    }

    /// Returns the number of compile-fail tests.
    pub fn compile_fail_count(&self) -> usize {
        self.count(TestKind::CompileFail)
    }

    fn count(&self, kind: TestKind) -> usize {
        self.tests.iter().filter(|test| test.kind == kind).count()
    }

    /// Iterates over the tests in path order.
    pub fn iter(&self) -> impl Iterator<Item = &TestCase> + '_ {
        self.tests.iter()
    }

    /// Writes the list in a human-readable format.
    pub fn write_plain(&self, styles: &ListStyles, mut writer: impl io::Write) -> io::Result<()> {
        for test in &self.tests {
            let kind = match test.kind {
                TestKind::Run => "run",
                TestKind::CompileFail => "compile-fail",
            };
            writeln!(
                writer,
                "{} ({})",
                test.path.style(styles.test_name),
                kind.style(styles.kind),
            )?;
        }
        writeln!(
            writer,
            "{} tests: {} run, {} compile-fail",
            self.len().style(styles.count),
            self.run_count().style(styles.count),
            self.compile_fail_count().style(styles.count),
        )
    }
}

/// Styles for [`TestList::write_plain`].
#[derive(Clone, Debug, Default)]
pub struct ListStyles {
    pub(crate) test_name: Style,
    pub(crate) kind: Style,
    pub(crate) count: Style,
}

impl ListStyles {
    pub(crate) fn colorize(&mut self) {
        self.test_name = Style::new().blue().bold();
        self.kind = Style::new().magenta();
        self.count = Style::new().bold();
    }
}
