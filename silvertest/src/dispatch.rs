// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line interface.

use crate::{
    config::HarnessConfig,
    output::{OutputContext, OutputOpts},
    reporter::{exit_code, TestReporter},
    runner::TestRunnerOpts,
    test_list::{ListStyles, TestList},
};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use std::io::{self, Write};

/// Test runner for the silver compiler.
///
/// Discovers test programs, compiles each one in both unoptimized and
/// optimized mode, and checks the outcome against the test's contract.
#[derive(Debug, Parser)]
#[command(name = "silvertest", version)]
pub struct SilvertestApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(subcommand)]
    command: Command,
}

impl SilvertestApp {
    /// Executes the app, returning the process exit code.
    pub fn exec(self) -> Result<i32> {
        let output = self.output.init();
        self.command.exec(output)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List discovered tests and their classification
    List {
        #[command(flatten)]
        config_opts: ConfigOpts,
    },
    /// Compile and run every test in both build modes
    Run {
        #[command(flatten)]
        config_opts: ConfigOpts,

        #[command(flatten)]
        runner_opts: TestRunnerOpts,
    },
}

impl Command {
    fn exec(self, output: OutputContext) -> Result<i32> {
        let colorize = output
            .color
            .should_colorize(supports_color::Stream::Stdout);

        match self {
            Command::List { config_opts } => {
                let config = config_opts.into_config()?;
                let test_list = TestList::discover(&config)?;

                let mut styles = ListStyles::default();
                if colorize {
                    styles.colorize();
                }
                test_list.write_plain(&styles, io::stdout().lock())?;
                Ok(0)
            }
            Command::Run {
                config_opts,
                runner_opts,
            } => {
                let config = config_opts.into_config()?;
                // A missing compiler fails the whole run up front; it is not
                // a per-test failure.
                config.check_compiler()?;

                let test_list = TestList::discover(&config)?;
                let reporter = TestReporter::new(colorize);
                let mut stdout = io::stdout().lock();

                if test_list.is_empty() {
                    reporter.report_no_tests(&config.programs_dir, &mut stdout)?;
                    return Ok(0);
                }

                let runner = runner_opts.build(&config, &test_list);
                reporter.report_start(test_list.len(), runner.jobs(), &mut stdout)?;
                stdout.flush()?;

                let results = runner.execute();
                reporter.report_results(&results, &mut stdout)?;
                Ok(exit_code(results.stats()))
            }
        }
    }
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Path to silvertest.toml
    #[arg(long, value_name = "PATH")]
    config: Option<Utf8PathBuf>,

    /// Compiler executable to test [overrides config]
    #[arg(long, value_name = "PATH")]
    compiler: Option<Utf8PathBuf>,

    /// Directory containing test programs [overrides config]
    #[arg(long, value_name = "DIR")]
    programs: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn into_config(self) -> Result<HarnessConfig> {
        let mut config = HarnessConfig::load(self.config.as_deref())?;
        if let Some(compiler) = self.compiler {
            config.compiler = compiler;
        }
        if let Some(programs) = self.programs {
            config.programs_dir = programs;
        }
        Ok(config)
    }
}
