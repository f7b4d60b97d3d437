//! Search command implementation.

use crate::cli::SearchArgs;
use crate::commands::open_index;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the search command.
pub fn execute_search(args: SearchArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    if args.query.trim().is_empty() {
        return Err(CliError::InvalidInput("Search text must not be empty".to_string()));
    }
    if args.limit == 0 {
        return Err(CliError::InvalidInput("Limit must be at least 1".to_string()));
    }

    let index = open_index(config)?;
    if index.is_empty() {
        println!("{}", formatter.info("The exemplar journal is empty; use 'seed' first"));
        return Ok(());
    }

    let results = index.search(&args.query, args.limit)?;
    println!("{}", formatter.format_search_results(&results));
    Ok(())
}
