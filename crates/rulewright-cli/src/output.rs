//! Output formatting for the CLI.

use crate::cli::DocumentFormat;
use crate::error::Result;
use colored::*;
use rulewright_compiler::CompilationMetadata;
use rulewright_domain::Exemplar;
use rulewright_template::CompiledDocument;
use std::path::{Path, PathBuf};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const PREVIEW_CHARS: usize = 60;

/// Output formatter.
pub struct Formatter {
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    /// Format ranked exemplar search results as a table.
    pub fn format_search_results(&self, results: &[(Exemplar, f32)]) -> String {
        if results.is_empty() {
            return self.colorize("No exemplars found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["#", "Score", "Table", "Rule text", "ID"]);

        for (rank, (exemplar, score)) in results.iter().enumerate() {
            let table = CompiledDocument::new(exemplar.compiled_document.as_str())
                .table_name()
                .unwrap_or_else(|| "-".to_string());
            let id = exemplar.id.to_string();
            builder.push_record([
                (rank + 1).to_string(),
                format!("{:.3}", score),
                table,
                preview(&exemplar.rule_text),
                id.chars().take(8).collect(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Summarize a successful compilation.
    pub fn compilation_summary(&self, metadata: &CompilationMetadata, documents: usize) -> String {
        let mut summary = format!(
            "Compiled {} rule(s) into {} table(s) in {} ms ({} candidate(s), {} exemplar(s))",
            metadata.rules,
            documents,
            metadata.elapsed.as_millis(),
            metadata.generation_attempts,
            metadata.exemplars_used,
        );
        if metadata.exemplars_recorded > 0 {
            summary.push_str(&format!(", recorded {}", metadata.exemplars_recorded));
        }
        let mut out = self.success(&summary);
        if metadata.retrieval_degraded {
            out.push('\n');
            out.push_str(&self.warning("Exemplar index unavailable; compiled without exemplars"));
        }
        out
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Render one document in the requested format.
pub fn render_document(document: &CompiledDocument, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Json => Ok(document.as_str().to_string()),
        DocumentFormat::Gdst => Ok(document.to_gdst()?),
        DocumentFormat::Drl => Ok(document.to_drl()?),
    }
}

/// Render every document for stdout.
///
/// Several JSON documents become one array; several GDST or DRL documents
/// are separated by blank lines.
pub fn render_documents(documents: &[CompiledDocument], format: DocumentFormat) -> Result<String> {
    if let [document] = documents {
        return render_document(document, format);
    }
    match format {
        DocumentFormat::Json => {
            let values = documents
                .iter()
                .map(|d| serde_json::from_str::<serde_json::Value>(d.as_str()))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(serde_json::to_string_pretty(&values)?)
        }
        DocumentFormat::Gdst | DocumentFormat::Drl => {
            let rendered = documents
                .iter()
                .map(|d| render_document(d, format))
                .collect::<Result<Vec<_>>>()?;
            Ok(rendered.join("\n\n"))
        }
    }
}

/// Output file for each of `count` documents.
///
/// A single document goes to `path`; several go to `<stem>-<n>.<ext>`
/// beside it, numbered from 1.
pub fn output_paths(path: &Path, count: usize, format: DocumentFormat) -> Vec<PathBuf> {
    if count == 1 {
        return vec![path.to_path_buf()];
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| format.extension().to_string());
    (1..=count)
        .map(|n| path.with_file_name(format!("{}-{}.{}", stem, n, extension)))
        .collect()
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS - 1).collect();
        format!("{}…", cut)
    }
}
