//! Modal CLI - inspect and exercise modal catalogs from the command line

mod catalog;
mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use modal_runtime::{LogFormat, init_tracing};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose, LogFormat::Pretty);

    let rt = tokio::runtime::Runtime::new()?;
    if let Err(err) = rt.block_on(run_command_async(cli)) {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
    Ok(())
}

async fn run_command_async(cli: Cli) -> anyhow::Result<()> {
    let format = cli.output;
    let catalog = cli.catalog.as_path();

    match &cli.command {
        Commands::Validate => commands::validate::run(catalog, format)?,
        Commands::List { enabled } => commands::list::run(catalog, *enabled, format).await?,
        Commands::Compatible(args) => commands::compatible::run(catalog, args, format).await?,
        Commands::Orchestrate(args) => commands::orchestrate::run(catalog, args, format).await?,
        Commands::Adapt(args) => commands::adapt::run(catalog, args, format).await?,
    }

    Ok(())
}
