//! snipcheck CLI - type-check the TypeScript examples in your documentation.

mod check;
mod colors;
mod output;
mod watch;
mod watcher;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use snipcheck_core::paths::DEFAULT_SCRATCH_DIR;
use snipcheck_core::{CompilerConfig, SnippetCompiler};

#[derive(Parser)]
#[command(name = "snipcheck")]
#[command(about = "Type-check the TypeScript code blocks in Markdown documentation")]
#[command(version)]
struct Cli {
    /// Documents to check, relative to the project root
    #[arg(default_value = "README.md")]
    files: Vec<PathBuf>,

    /// Package root (contains package.json)
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    /// Path to the tsc executable (default: node_modules/.bin/tsc, then PATH)
    #[arg(long)]
    tsc: Option<PathBuf>,

    /// Project tsconfig, relative to the project root
    #[arg(long, default_value = "tsconfig.json")]
    tsconfig: PathBuf,

    /// Name of the scratch directory created under the project root
    #[arg(long, default_value = DEFAULT_SCRATCH_DIR)]
    scratch_dir: String,

    /// Maximum number of blocks compiled at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Re-run whenever one of the documents changes
    #[arg(short, long)]
    watch: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// How results are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored report for terminals
    Human,
    /// The result list as JSON
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = CompilerConfig {
        project_root: cli.project,
        scratch_dir_name: cli.scratch_dir,
        tsconfig: cli.tsconfig,
        tsc_path: cli.tsc,
        jobs: cli.jobs,
        ..CompilerConfig::default()
    };
    let compiler: SnippetCompiler = SnippetCompiler::new(config);

    let outcome = if cli.watch {
        watch::execute(&compiler, &cli.files, cli.format).await.map(|()| true)
    } else {
        check::execute(&compiler, &cli.files, cli.format).await
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{}Error:{} {}", colors::RED, colors::RESET, format_error(&err));
            ExitCode::from(2)
        }
    }
}

/// Format snipcheck-core errors with recovery hints.
fn format_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<snipcheck_core::Error>() {
        Some(core_err) => core_err.with_hint(),
        None => format!("{err:#}"),
    }
}
