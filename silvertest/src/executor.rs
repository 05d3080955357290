// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test execution: compile, run, validate, clean up.
//!
//! A test failure is never an `Err` here. Everything that can go wrong with a
//! single test (compiler failed, artifact missing, wrong exit code, missing
//! diagnostic, hung process, spawn failure) is captured as an
//! [`OutcomeStatus::Fail`] so that one bad test can't abort the run.

use crate::{
    artifacts::CleanupGuard,
    config::HarnessConfig,
    test_list::{TestCase, TestKind},
};
use camino::Utf8Path;
use std::{
    fmt,
    io::{self, BufRead, BufReader},
    thread,
    time::{Duration, Instant},
};
use tracing::debug;

/// How long to sleep between completion polls when a timeout is set.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The compilation variant a test is evaluated under.
///
/// Every test is evaluated under both modes independently; a failure in one
/// mode never short-circuits the other.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Unoptimized,
    Optimized,
}

impl BuildMode {
    /// Both modes, in the order they are evaluated.
    pub const ALL: [BuildMode; 2] = [BuildMode::Unoptimized, BuildMode::Optimized];
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Unoptimized => f.pad("unoptimized"),
            BuildMode::Optimized => f.pad("optimized"),
        }
    }
}

/// The result of evaluating one test under one build mode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outcome {
    /// The build mode this outcome was produced under.
    pub mode: BuildMode,

    /// The verdict. Never mutated after creation.
    pub status: OutcomeStatus,
}

/// The verdict for one (test, build mode) pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OutcomeStatus {
    /// The test satisfied its contract.
    Pass,

    /// The test violated its contract.
    Fail {
        /// Why the test failed.
        reason: String,

        /// Captured compiler and program output, if there was any.
        output: Option<String>,
    },
}

impl OutcomeStatus {
    /// Returns true if this is a pass.
    pub fn passed(&self) -> bool {
        matches!(self, OutcomeStatus::Pass)
    }

    fn fail(reason: String, output: String) -> Self {
        OutcomeStatus::Fail {
            reason,
            output: (!output.is_empty()).then_some(output),
        }
    }
}

/// All outcomes for one test across both build modes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestResult {
    /// The test this result belongs to.
    pub test: TestCase,

    /// One outcome per build mode.
    pub outcomes: Vec<Outcome>,
}

impl TestResult {
    /// A test passes iff every per-mode outcome passed.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.status.passed())
    }

    /// Iterates over the failing outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &Outcome> + '_ {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.status.passed())
    }
}

/// Executes tests against the configured compiler.
#[derive(Copy, Clone, Debug)]
pub struct TestExecutor<'a> {
    config: &'a HarnessConfig,
}

impl<'a> TestExecutor<'a> {
    /// Creates a new executor for the given config.
    pub fn new(config: &'a HarnessConfig) -> Self {
        Self { config }
    }

    /// Evaluates one test under both build modes.
    ///
    /// The two modes compile to the same output path, so they run
    /// sequentially here; the runner never splits a test across workers.
    pub fn run_test_case(&self, test: &TestCase) -> TestResult {
        let outcomes = BuildMode::ALL
            .iter()
            .map(|&mode| Outcome {
                mode,
                status: match test.kind {
                    TestKind::Run => self.run_test(&test.path, mode),
                    TestKind::CompileFail => self.run_compile_fail_test(&test.path, mode),
                },
            })
            .collect();
        TestResult {
            test: test.clone(),
            outcomes,
        }
    }

    /// Compiles and runs a test program, checking its exit code.
    fn run_test(&self, path: &Utf8Path, mode: BuildMode) -> OutcomeStatus {
        // The guard removes the executable and linker side-products on every
        // return below, including panics.
        let guard = CleanupGuard::acquire(path);

        let compile = match self.invoke_compiler(path, mode) {
            Ok(compile) => compile,
            Err(error) => {
                return OutcomeStatus::fail(
                    format!("failed to run compiler: {error} ({mode})"),
                    String::new(),
                );
            }
        };
        if compile.timed_out {
            return OutcomeStatus::fail(
                format!(
                    "compiler timed out after {}s ({mode})",
                    self.config.timeout_secs
                ),
                compile.output,
            );
        }
        if compile.code != Some(0) {
            return OutcomeStatus::fail(
                format!(
                    "compilation failed ({mode}) with code {}",
                    display_code(compile.code)
                ),
                compile.output,
            );
        }

        let exe = guard.executable();
        if !exe.exists() {
            // Guards against a compiler that reports success but produces
            // nothing.
            return OutcomeStatus::fail(
                format!("compiled executable {exe} not found ({mode})"),
                compile.output,
            );
        }

        debug!("running {exe}");
        let run = match self.run_captured(duct::cmd(exe.as_str(), Vec::<String>::new())) {
            Ok(run) => run,
            Err(error) => {
                return OutcomeStatus::fail(
                    format!("failed to run {exe}: {error} ({mode})"),
                    compile.output,
                );
            }
        };
        let combined = compile.output + &run.output;
        if run.timed_out {
            return OutcomeStatus::fail(
                format!(
                    "test program timed out after {}s ({mode})",
                    self.config.timeout_secs
                ),
                combined,
            );
        }

        let expected = self.config.expected_code;
        if run.code == Some(expected) {
            OutcomeStatus::Pass
        } else {
            OutcomeStatus::fail(
                format!(
                    "expected code {expected} but got {} ({mode})",
                    display_code(run.code)
                ),
                combined,
            )
        }
    }

    /// Compiles a test expected to fail, optionally checking the diagnostic.
    fn run_compile_fail_test(&self, path: &Utf8Path, mode: BuildMode) -> OutcomeStatus {
        // A compile-fail test that unexpectedly compiles must not leak build
        // products, so the guard is held here too.
        let _guard = CleanupGuard::acquire(path);

        let compile = match self.invoke_compiler(path, mode) {
            Ok(compile) => compile,
            Err(error) => {
                return OutcomeStatus::fail(
                    format!("failed to run compiler: {error} ({mode})"),
                    String::new(),
                );
            }
        };
        if compile.timed_out {
            return OutcomeStatus::fail(
                format!(
                    "compiler timed out after {}s ({mode})",
                    self.config.timeout_secs
                ),
                compile.output,
            );
        }
        if compile.code == Some(0) {
            return OutcomeStatus::fail(
                format!("compilation should have failed but succeeded ({mode})"),
                compile.output,
            );
        }

        match self.expected_error(path) {
            None => OutcomeStatus::Pass,
            Some(expected) if compile.output.contains(&expected) => OutcomeStatus::Pass,
            Some(expected) => OutcomeStatus::fail(
                format!("expected error '{expected}' not found in output ({mode})"),
                compile.output,
            ),
        }
    }

    /// Reads the expected-error annotation from the first line of the test
    /// source, if present.
    ///
    /// Read errors are treated as "no annotation": an unreadable source file
    /// surfaces through the compiler invocation instead.
    fn expected_error(&self, path: &Utf8Path) -> Option<String> {
        let file = fs_err::File::open(path).ok()?;
        let first_line = BufReader::new(file).lines().next()?.ok()?;
        let rest = first_line
            .strip_prefix(&self.config.expect_error_prefix)?
            .trim_end_matches('\r')
            .trim_start();
        (!rest.is_empty()).then(|| rest.to_owned())
    }

    fn invoke_compiler(&self, path: &Utf8Path, mode: BuildMode) -> io::Result<ProcessOutput> {
        let mut args = vec![path.as_str()];
        if mode == BuildMode::Optimized {
            args.push(&self.config.optimize_flag);
        }
        debug!("running {} {}", self.config.compiler, args.join(" "));
        self.run_captured(duct::cmd(self.config.compiler.as_str(), args))
    }

    /// Runs a child process with stderr folded into captured stdout, without
    /// inheriting the console.
    ///
    /// If a timeout is configured and the deadline passes, the child is
    /// killed and the output captured so far is returned with `timed_out`
    /// set.
    fn run_captured(&self, expr: duct::Expression) -> io::Result<ProcessOutput> {
        let handle = expr
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .start()?;

        let timed_out = match self.config.timeout() {
            None => {
                handle.wait()?;
                false
            }
            Some(limit) => {
                let deadline = Instant::now() + limit;
                loop {
                    if handle.try_wait()?.is_some() {
                        break false;
                    }
                    if Instant::now() >= deadline {
                        handle.kill()?;
                        break true;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let output = handle.into_output()?;
        Ok(ProcessOutput {
            code: output.status.code(),
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
            timed_out,
        })
    }
}

/// Captured result of one child process.
#[derive(Clone, Debug)]
struct ProcessOutput {
    /// The exit code, or `None` if the process was killed by a signal.
    code: Option<i32>,
    /// Combined stdout and stderr.
    output: String,
    /// True if the process hit the configured deadline and was killed.
    timed_out: bool,
}

fn display_code(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_owned(),
    }
}
