// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = querygate_lib::cli::Cli::parse();
    querygate_lib::cli::run_cli(cli)
}
