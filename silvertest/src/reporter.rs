// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable reporting of run results.
//!
//! Results arrive already sorted by path, so the report is identical whether
//! the run was sequential or parallel.

use crate::{
    executor::OutcomeStatus,
    runner::{RunResults, RunStats},
};
use owo_colors::{OwoColorize, Style};
use std::io;

/// Writes run headers, failure blocks and the final summary.
#[derive(Clone, Debug, Default)]
pub struct TestReporter {
    styles: ReporterStyles,
}

impl TestReporter {
    /// Creates a reporter, colorized or not.
    pub fn new(colorize: bool) -> Self {
        let mut styles = ReporterStyles::default();
        if colorize {
            styles.colorize();
        }
        Self { styles }
    }

    /// Writes the run header.
    pub fn report_start(
        &self,
        test_count: usize,
        jobs: Option<usize>,
        mut writer: impl io::Write,
    ) -> io::Result<()> {
        match jobs {
            Some(jobs) => writeln!(
                writer,
                "Running {} silver tests in parallel ({} threads)...",
                test_count.style(self.styles.count),
                jobs.style(self.styles.count),
            ),
            None => writeln!(
                writer,
                "Running {} silver tests (both unoptimized and optimized)...",
                test_count.style(self.styles.count),
            ),
        }
    }

    /// Writes one failure block per failing outcome, then the summary line.
    pub fn report_results(
        &self,
        results: &RunResults,
        mut writer: impl io::Write,
    ) -> io::Result<()> {
        for result in results.results() {
            for failure in result.failures() {
                let OutcomeStatus::Fail { reason, output } = &failure.status else {
                    continue;
                };
                writeln!(
                    writer,
                    "    {} {}",
                    result.test.path.style(self.styles.test_name),
                    "failed".style(self.styles.fail),
                )?;
                writeln!(writer, "        Reason: {reason}")?;
                if let Some(output) = output {
                    let trimmed = output.trim_end();
                    if !trimmed.is_empty() {
                        writeln!(
                            writer,
                            "        Output: {}",
                            trimmed.style(self.styles.fail_output),
                        )?;
                    }
                }
            }
        }

        let stats = results.stats();
        let verdict_style = if stats.is_success() {
            self.styles.pass
        } else {
            self.styles.fail
        };
        writeln!(
            writer,
            "{} {} passed, {} failed",
            "Results:".style(verdict_style),
            stats.passed.style(self.styles.count),
            stats.failed.style(self.styles.count),
        )
    }

    /// Writes the message for an empty test directory.
    pub fn report_no_tests(
        &self,
        programs_dir: &camino::Utf8Path,
        mut writer: impl io::Write,
    ) -> io::Result<()> {
        writeln!(writer, "No test files found in {programs_dir}")
    }
}

/// Convenience summary accessor for callers that only need the exit status.
pub fn exit_code(stats: RunStats) -> i32 {
    if stats.is_success() { 0 } else { 1 }
}

#[derive(Clone, Debug, Default)]
struct ReporterStyles {
    pass: Style,
    fail: Style,
    fail_output: Style,
    count: Style,
    test_name: Style,
}

impl ReporterStyles {
    fn colorize(&mut self) {
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.fail_output = Style::new().red();
        self.count = Style::new().bold();
        self.test_name = Style::new().blue().bold();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        executor::{BuildMode, Outcome, OutcomeStatus, TestResult},
        test_list::{TestCase, TestKind},
    };
    use camino::Utf8PathBuf;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn render(results: RunResults) -> String {
        let reporter = TestReporter::new(false);
        let mut buf = Vec::new();
        reporter
            .report_results(&results, &mut buf)
            .expect("report written");
        String::from_utf8(buf).expect("report is valid UTF-8")
    }

    fn outcome(mode: BuildMode, status: OutcomeStatus) -> Outcome {
        Outcome { mode, status }
    }

    #[test]
    fn all_passing_prints_only_summary() {
        let results = RunResults::new(vec![TestResult {
            test: TestCase {
                path: Utf8PathBuf::from("programs/add.sl"),
                kind: TestKind::Run,
            },
            outcomes: vec![
                outcome(BuildMode::Unoptimized, OutcomeStatus::Pass),
                outcome(BuildMode::Optimized, OutcomeStatus::Pass),
            ],
        }]);

        assert_eq!(render(results), "Results: 1 passed, 0 failed\n");
    }

    #[test]
    fn failure_blocks_include_reason_and_trimmed_output() {
        let results = RunResults::new(vec![TestResult {
            test: TestCase {
                path: Utf8PathBuf::from("programs/add.sl"),
                kind: TestKind::Run,
            },
            outcomes: vec![
                outcome(
                    BuildMode::Unoptimized,
                    OutcomeStatus::Fail {
                        reason: "expected code 50 but got 7 (unoptimized)".to_owned(),
                        output: Some("some program output\n\n".to_owned()),
                    },
                ),
                outcome(
                    BuildMode::Optimized,
                    OutcomeStatus::Fail {
                        reason: "expected code 50 but got 7 (optimized)".to_owned(),
                        output: None,
                    },
                ),
            ],
        }]);

        let expected = indoc! {"
                programs/add.sl failed
                    Reason: expected code 50 but got 7 (unoptimized)
                    Output: some program output
                programs/add.sl failed
                    Reason: expected code 50 but got 7 (optimized)
            Results: 0 passed, 1 failed
        "};
        assert_eq!(render(results), expected);
    }

    #[test]
    fn exit_code_from_stats() {
        assert_eq!(
            exit_code(RunStats {
                total: 1,
                passed: 1,
                failed: 0,
            }),
            0,
        );
        assert_eq!(
            exit_code(RunStats {
                total: 1,
                passed: 0,
                failed: 1,
            }),
            1,
        );
    }
}
