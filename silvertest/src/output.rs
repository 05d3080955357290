// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Color handling and logger setup.

use clap::{Args, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::Targets, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

#[derive(Copy, Clone, Debug, Args)]
#[must_use]
pub struct OutputOpts {
    /// Produce color output: auto, always, never
    #[arg(
        long,
        value_enum,
        default_value_t,
        hide_possible_values = true,
        global = true,
        value_name = "WHEN",
        env = "SILVERTEST_COLOR"
    )]
    pub color: Color,
}

impl OutputOpts {
    /// Initializes the logger and returns the output context.
    pub fn init(self) -> OutputContext {
        let OutputOpts { color } = self;
        color.init();
        OutputContext { color }
    }
}

/// The resolved output settings for this invocation.
#[derive(Copy, Clone, Debug)]
#[must_use]
pub struct OutputContext {
    pub color: Color,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[must_use]
pub enum Color {
    #[default]
    Auto,
    Always,
    Never,
}

static INIT_LOGGER: std::sync::Once = std::sync::Once::new();

impl Color {
    pub(crate) fn init(self) {
        INIT_LOGGER.call_once(|| {
            let level_str = std::env::var("SILVERTEST_LOG").unwrap_or_default();

            // If the level string is empty, use the standard level filter instead.
            let targets = if level_str.is_empty() {
                Targets::new().with_default(LevelFilter::WARN)
            } else {
                level_str.parse().expect("unable to parse SILVERTEST_LOG")
            };

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(targets);

            tracing_subscriber::registry().with(layer).init();
        });
    }

    /// Returns true if output to the given stream should be colorized.
    pub fn should_colorize(self, stream: supports_color::Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}
