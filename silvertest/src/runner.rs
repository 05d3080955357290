// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Work dispatch and result aggregation.
//!
//! The unit dispatched to a worker is a whole test case: its two build-mode
//! evaluations share one artifact path, so they run back to back on a single
//! worker and never race on the output file. Tests are independent of each
//! other and run freely in parallel.

use crate::{
    config::HarnessConfig,
    executor::{TestExecutor, TestResult},
    test_list::TestList,
};
use clap::Args;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// Test runner options.
#[derive(Clone, Copy, Debug, Default, Args)]
pub struct TestRunnerOpts {
    /// Run tests in parallel with N worker threads [default if N omitted: available parallelism]
    #[arg(short = 'j', long, value_name = "N", num_args = 0..=1)]
    jobs: Option<Option<usize>>,
}

impl TestRunnerOpts {
    /// Creates options programmatically: `None` for sequential execution,
    /// `Some(n)` for a pool of `n` workers.
    pub fn with_jobs(jobs: Option<usize>) -> Self {
        Self {
            jobs: jobs.map(Some),
        }
    }

    /// Creates a new test runner.
    pub fn build<'a>(self, config: &'a HarnessConfig, test_list: &'a TestList) -> TestRunner<'a> {
        let jobs = self
            .jobs
            .map(|jobs| jobs.unwrap_or_else(default_parallelism).max(1));
        let run_pool = jobs.map(|jobs| {
            ThreadPoolBuilder::new()
                // The scope closure draining results needs its own thread.
                .num_threads(jobs + 1)
                .thread_name(|idx| format!("silvertest-run-{idx}"))
                .build()
                .expect("run pool built")
        });
        TestRunner {
            config,
            test_list,
            jobs,
            run_pool,
        }
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Context for running tests.
pub struct TestRunner<'a> {
    config: &'a HarnessConfig,
    test_list: &'a TestList,
    jobs: Option<usize>,
    run_pool: Option<ThreadPool>,
}

impl TestRunner<'_> {
    /// The worker count, or `None` for sequential execution.
    pub fn jobs(&self) -> Option<usize> {
        self.jobs
    }

    /// Executes every discovered test under both build modes and aggregates
    /// the results.
    ///
    /// Sequential execution processes tests inline in discovery order. With
    /// a pool, each test case is one unit of work; completed results travel
    /// over a channel to a single draining consumer, so workers never touch
    /// a shared collection. The aggregate is sorted either way.
    pub fn execute(&self) -> RunResults {
        let executor = TestExecutor::new(self.config);
        let mut results = Vec::with_capacity(self.test_list.len());

        match &self.run_pool {
            None => {
                for test in self.test_list.iter() {
                    debug!("running test case {}", test.path);
                    results.push(executor.run_test_case(test));
                }
            }
            Some(pool) => {
                let (sender, receiver) = crossbeam_channel::unbounded();
                let results_mut = &mut results;
                pool.scope(move |scope| {
                    for test in self.test_list.iter() {
                        let sender = sender.clone();
                        scope.spawn(move |_| {
                            debug!("running test case {}", test.path);
                            // Failure to send means the receiver was dropped.
                            let _ = sender.send(executor.run_test_case(test));
                        });
                    }
                    drop(sender);

                    // The iteration completes once every worker has finished
                    // and dropped its sender clone.
                    for result in receiver {
                        results_mut.push(result);
                    }
                });
            }
        }

        RunResults::new(results)
    }
}

/// Statistics for a test run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RunStats {
    /// The number of tests that were run.
    pub total: usize,

    /// The number of tests whose outcomes passed under both build modes.
    pub passed: usize,

    /// The number of tests with at least one failing outcome.
    pub failed: usize,
}

impl RunStats {
    /// Returns true if this run is considered a success.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// All results of a run, sorted by test path, plus aggregate counts.
#[derive(Clone, Debug)]
pub struct RunResults {
    results: Vec<TestResult>,
    stats: RunStats,
}

impl RunResults {
    /// Aggregates per-test results, sorting by source path so that the
    /// report is independent of scheduling order.
    pub fn new(mut results: Vec<TestResult>) -> Self {
        results.sort_by(|a, b| a.test.path.cmp(&b.test.path));
        let passed = results.iter().filter(|result| result.passed()).count();
        let stats = RunStats {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        };
        Self { results, stats }
    }

    /// The per-test results in path order.
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Aggregate pass/fail counts.
    pub fn stats(&self) -> RunStats {
        self.stats
    }
}
