mod cli;
mod config;
mod report;
mod util;

use std::process::ExitCode;

use clap::Parser;
use cli::CliArgs;
use eyre::Result;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = CliArgs::parse();

    cli.execute()
}
