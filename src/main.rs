mod aggregate;
mod auth;
mod cli;
mod config;
mod dispatch;
mod error;
mod git;
mod model;
mod output;
mod providers;
mod select;
mod state;
mod workflows;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting Quick Workflow");
    cli.execute().await?;

    Ok(())
}
