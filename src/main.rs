//! fda-grants: grant-dataset aggregation and the $FDA question-answering assistant.
//!
//! Loads a page of funded grants, computes the dashboard figures over it, and
//! answers free-text questions about it from a fixed set of keyword rules.

mod app;
mod cli;
mod data;
mod error;
mod format;
mod metrics;
mod query;

use anyhow::Result;
use cli::{AppConfig, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = AppConfig::from_source_args(cli.source);
    app::run(config, cli.command).await
}
