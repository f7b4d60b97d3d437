//! Seed command implementation.

use crate::cli::SeedArgs;
use crate::commands::open_index;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rulewright_store::load_seed_dir;
use tracing::info;

/// Execute the seed command.
///
/// Returns the number of exemplars added.
pub fn execute_seed(args: SeedArgs, config: &Config, formatter: &Formatter) -> Result<usize> {
    if !args.dir.is_dir() {
        return Err(CliError::InvalidInput(format!(
            "{} is not a directory",
            args.dir.display()
        )));
    }

    let exemplars = load_seed_dir(&args.dir)?;
    if exemplars.is_empty() {
        println!(
            "{}",
            formatter.warning(&format!("No exemplar files found in {}", args.dir.display()))
        );
        return Ok(0);
    }

    let index = open_index(config)?;
    let added = index.seed(exemplars)?;
    info!("Journal now holds {} exemplars", index.len());

    println!(
        "{}",
        formatter.success(&format!("Seeded {} exemplar(s); journal holds {}", added, index.len()))
    );
    Ok(added)
}
