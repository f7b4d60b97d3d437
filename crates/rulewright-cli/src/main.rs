//! Rulewright CLI - Compile natural-language rules into decision tables.

use anyhow::Context;
use clap::Parser;
use rulewright_cli::commands;
use rulewright_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let formatter = Formatter::new(!cli.no_color);
    if let Err(e) = run(cli, &formatter).await {
        eprintln!("{}", formatter.error(&format!("{:#}", e)));
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

async fn run(cli: Cli, formatter: &Formatter) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Compile(args) => {
            let llm = config.llm.provider();
            commands::execute_compile(args, &config, llm, formatter)
                .await
                .context("Compilation failed")?;
        }
        Command::Search(args) => {
            commands::execute_search(args, &config, formatter).context("Search failed")?;
        }
        Command::Seed(args) => {
            commands::execute_seed(args, &config, formatter).context("Seeding failed")?;
        }
    }

    Ok(())
}
