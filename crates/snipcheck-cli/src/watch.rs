//! Watch command implementation for snipcheck CLI.
//!
//! Watches the documents for changes and re-checks them.

use std::path::PathBuf;

use snipcheck_core::SnippetCompiler;

use crate::OutputFormat;
use crate::check;
use crate::colors;
use crate::watcher::{FileEvent, FileWatcher};

/// Execute the watch command. Runs until the watcher shuts down.
pub async fn execute(
    compiler: &SnippetCompiler,
    files: &[PathBuf],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let root = &compiler.config().project_root;
    let documents: Vec<PathBuf> = files.iter().map(|f| root.join(f)).collect();
    for (file, document) in files.iter().zip(&documents) {
        if !tokio::fs::try_exists(document).await.unwrap_or(false) {
            return Err(snipcheck_core::Error::DocumentNotFound { path: file.clone() }.into());
        }
    }

    let names = files
        .iter()
        .map(|f| f.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    println!(
        "\n{}snipcheck watch{} - {}{}{}",
        colors::BOLD,
        colors::RESET,
        colors::CYAN,
        names,
        colors::RESET
    );
    println!("{}", "─".repeat(50));

    run_check(compiler, files, format).await;

    let mut watcher = FileWatcher::new(&documents)
        .map_err(|e| anyhow::anyhow!("Failed to create file watcher: {}", e))?;

    while let Some(event) = watcher.recv().await {
        match event {
            FileEvent::Modified(path) => {
                tracing::debug!("Change detected in {}", path.display());
                println!(
                    "\n{}File changed, re-checking...{}",
                    colors::YELLOW,
                    colors::RESET
                );
                run_check(compiler, files, format).await;
            }
            FileEvent::Removed(path) => {
                eprintln!(
                    "\n{}Warning:{} Document removed: {}",
                    colors::YELLOW,
                    colors::RESET,
                    path.display()
                );
            }
        }
    }

    Ok(())
}

/// Check once, reporting structural errors without leaving the loop.
async fn run_check(compiler: &SnippetCompiler, files: &[PathBuf], format: OutputFormat) {
    if let Err(e) = check::execute(compiler, files, format).await {
        let message = match e.downcast_ref::<snipcheck_core::Error>() {
            Some(core_err) => core_err.with_hint(),
            None => format!("{e:#}"),
        };
        eprintln!("{}Error:{} {}", colors::RED, colors::RESET, message);
    }

    println!(
        "\n{}Watching for changes... (Ctrl+C to stop){}",
        colors::DIM,
        colors::RESET
    );
}
