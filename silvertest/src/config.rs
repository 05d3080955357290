// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Harness configuration.
//!
//! Everything the original runner hard-coded is configuration here: the
//! compiler to invoke, where test programs live, the exit code a passing
//! program must return, and the naming conventions that classify tests.
//! Values come from an optional `silvertest.toml`, with CLI flags layered on
//! top.

use crate::errors::{CompilerNotFound, ConfigError};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The default config file, looked up in the current directory if `--config`
/// isn't passed.
pub const DEFAULT_CONFIG_FILE: &str = "silvertest.toml";

/// Configuration for a test run.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// The compiler under test.
    pub compiler: Utf8PathBuf,

    /// The directory containing test programs.
    pub programs_dir: Utf8PathBuf,

    /// The extension of test source files, without the leading dot.
    pub source_ext: String,

    /// The exit code a passing test program must return.
    pub expected_code: i32,

    /// The flag appended to the compiler invocation in optimized mode.
    pub optimize_flag: String,

    /// Base names ending in this suffix mark compile-fail tests.
    pub compile_fail_suffix: String,

    /// The first-line marker declaring an expected diagnostic substring.
    pub expect_error_prefix: String,

    /// Bounded wait for a single compiler or artifact invocation, in seconds.
    /// Zero disables the timeout.
    pub timeout_secs: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            compiler: format!("silver{}", std::env::consts::EXE_SUFFIX).into(),
            programs_dir: "programs".into(),
            source_ext: "sl".into(),
            expected_code: 50,
            optimize_flag: "-optimize".into(),
            compile_fail_suffix: "_error".into(),
            expect_error_prefix: "# expect-error:".into(),
            timeout_secs: 60,
        }
    }
}

impl HarnessConfig {
    /// Loads the config from the given file, or from `silvertest.toml` in the
    /// current directory if no file is specified.
    ///
    /// An explicitly specified file must exist; the default file is optional.
    pub fn load(file: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        match file {
            Some(path) => Self::from_file(path),
            None => {
                let path = Utf8Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = fs_err::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_owned(),
            error,
        })?;
        toml::from_str(&contents).map_err(|error| ConfigError::Parse {
            path: path.to_owned(),
            error,
        })
    }

    /// Checks that the compiler executable exists.
    pub fn check_compiler(&self) -> Result<(), CompilerNotFound> {
        if self.compiler.exists() || which_on_path(&self.compiler) {
            Ok(())
        } else {
            Err(CompilerNotFound::new(self.compiler.clone()))
        }
    }

    /// Returns the bounded wait for child processes, if enabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Returns true if a bare command name resolves through `PATH`.
fn which_on_path(compiler: &Utf8Path) -> bool {
    // Only bare names are looked up; anything with a separator was already
    // checked directly against the filesystem.
    if compiler.as_str().contains(std::path::MAIN_SEPARATOR) {
        return false;
    }
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(compiler.as_std_path()).exists())
}
