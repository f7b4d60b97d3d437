//! Compile command implementation.

use crate::cli::CompileArgs;
use crate::commands::open_index;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{output_paths, render_document, render_documents, Formatter};
use rulewright_compiler::{ClausePolicy, CompilationResult, CompileRequest, Compiler};
use rulewright_domain::traits::LlmProvider;
use rulewright_llm::LlmError;
use std::fs;
use std::time::Duration;
use tracing::{info, warn};

/// Execute the compile command against `llm`.
///
/// The document goes to `--output` when given, otherwise to stdout; the
/// summary always goes to stderr.
pub async fn execute_compile<L>(
    args: CompileArgs,
    config: &Config,
    llm: L,
    formatter: &Formatter,
) -> Result<CompilationResult>
where
    L: LlmProvider<Error = LlmError> + Send + Sync + 'static,
{
    if args.texts.iter().all(|t| t.trim().is_empty()) {
        return Err(CliError::InvalidInput("Rule text must not be empty".to_string()));
    }

    let mut compiler_config = config.compiler.clone();
    if args.per_clause {
        compiler_config.clause_policy = ClausePolicy::TablePerClause;
    }

    let index = open_index(config)?;
    let compiler = Compiler::new(llm, index, compiler_config)?;

    let mut request = CompileRequest::batch(args.texts);
    if let Some(name) = args.table {
        request = request.with_metadata(config.compiler.table.metadata().with_table_name(name));
    }
    if let Some(secs) = args.deadline_secs {
        request = request.with_time_budget(Duration::from_secs(secs));
    }

    let result = match compiler.compile(request).await {
        Ok(result) => result,
        Err(e) => {
            warn!(kind = %e.kind(), "Compilation failed");
            return Err(e.into());
        }
    };

    match &args.output {
        Some(path) => {
            let paths = output_paths(path, result.documents.len(), args.format);
            for (document, target) in result.documents.iter().zip(&paths) {
                if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(target, render_document(document, args.format)?)?;
                info!("Wrote {}", target.display());
                eprintln!("{}", formatter.info(&format!("Wrote {}", target.display())));
            }
        }
        None => println!("{}", render_documents(&result.documents, args.format)?),
    }

    eprintln!(
        "{}",
        formatter.compilation_summary(&result.metadata, result.documents.len())
    );
    Ok(result)
}
