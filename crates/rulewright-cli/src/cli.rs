//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rulewright - Compile natural-language business rules into decision tables.
#[derive(Debug, Parser)]
#[command(name = "rulewright")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.rulewright/config.toml)
    #[arg(short, long, global = true, env = "RULEWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile rule text into a decision table
    Compile(CompileArgs),

    /// Search stored exemplars by similarity
    Search(SearchArgs),

    /// Load exemplar files into the exemplar journal
    Seed(SeedArgs),
}

/// Document output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DocumentFormat {
    /// Decision table JSON (default)
    Json,
    /// Guided decision table XML
    Gdst,
    /// Drools rule language, one rule per row
    Drl,
}

impl DocumentFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Json => "json",
            DocumentFormat::Gdst => "gdst",
            DocumentFormat::Drl => "drl",
        }
    }
}

/// Arguments for the compile command.
#[derive(Debug, Parser)]
pub struct CompileArgs {
    /// Rule texts; all of them are compiled in one request
    #[arg(required = true)]
    pub texts: Vec<String>,

    /// Table name (derived from the rules when omitted)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: DocumentFormat,

    /// Write the document to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Give up after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Compile each rule into its own table
    #[arg(long)]
    pub per_clause: bool,
}

/// Arguments for the search command.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Rule text to search for
    pub query: String,

    /// Maximum number of results
    #[arg(short, long, default_value = "5")]
    pub limit: usize,
}

/// Arguments for the seed command.
#[derive(Debug, Parser)]
pub struct SeedArgs {
    /// Directory of `*.json` exemplar files
    pub dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_command() {
        let cli = Cli::parse_from([
            "rulewright",
            "compile",
            "if the restaurant size is large then assign 10 employees",
            "--table",
            "staffing",
            "--format",
            "gdst",
        ]);
        match cli.command {
            Command::Compile(args) => {
                assert_eq!(args.texts.len(), 1);
                assert_eq!(args.table.as_deref(), Some("staffing"));
                assert_eq!(args.format, DocumentFormat::Gdst);
                assert!(args.output.is_none());
                assert!(!args.per_clause);
            }
            _ => panic!("Expected Compile command"),
        }
    }

    #[test]
    fn test_drl_format() {
        let cli = Cli::parse_from(["rulewright", "compile", "rule", "-f", "drl"]);
        match cli.command {
            Command::Compile(args) => {
                assert_eq!(args.format, DocumentFormat::Drl);
                assert_eq!(args.format.extension(), "drl");
            }
            _ => panic!("Expected Compile command"),
        }
    }

    #[test]
    fn test_compile_requires_text() {
        assert!(Cli::try_parse_from(["rulewright", "compile"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["rulewright", "search", "large restaurant", "-v", "--limit", "2"]);
        assert!(cli.verbose);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.query, "large restaurant");
                assert_eq!(args.limit, 2);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_seed_command() {
        let cli = Cli::parse_from(["rulewright", "--config", "/tmp/rw.toml", "seed", "seeds"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/rw.toml")));
        assert!(matches!(cli.command, Command::Seed(args) if args.dir == PathBuf::from("seeds")));
    }
}
