mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;
mod web;

use anyhow::Result;
use cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    let cli    = Cli::parse();
    let _guard = infra::logging::init(&cli.log_dir)?;

    if let Err(e) = cli.run() {
        tracing::error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
