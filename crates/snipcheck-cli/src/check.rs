//! Check command implementation for snipcheck CLI.
//!
//! Compiles every code block once and reports the results.

use std::path::PathBuf;
use std::time::Instant;

use snipcheck_core::SnippetCompiler;

use crate::OutputFormat;
use crate::output::{print_json, print_report};

/// Check the documents once. Returns whether every block compiled.
pub async fn execute(
    compiler: &SnippetCompiler,
    files: &[PathBuf],
    format: OutputFormat,
) -> anyhow::Result<bool> {
    let start = Instant::now();

    let results = compiler.compile_snippets(files).await?;

    match format {
        OutputFormat::Human => print_report(&results, start.elapsed()),
        OutputFormat::Json => print_json(&results)?,
    }

    Ok(results.iter().all(|r| r.is_success()))
}
