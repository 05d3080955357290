// Copyright (c) The silvertest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use silvertest::dispatch::SilvertestApp;

fn main() -> Result<()> {
    color_eyre::install()?;

    let app = SilvertestApp::parse();
    let code = app.exec()?;
    std::process::exit(code);
}
