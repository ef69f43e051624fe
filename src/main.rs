mod bulk;
mod cli;
mod config;
mod error;
mod jira;
mod logging;
mod model;
mod util;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose);
    cli::run(cli).await
}
