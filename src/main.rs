mod archive;
mod auth;
mod boq;
mod cli;
mod error;
mod exceptions;
mod ledger;
mod perf;
mod prune;
mod rename;
mod ticket;
mod tmx;
mod vr;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use env_logger::Env;
use log::debug;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    debug!("Starting workbench {}", env!("CARGO_PKG_VERSION"));
    cli.execute().await?;

    Ok(())
}
