//! Snippet compiler: the top-level orchestrator.
//!
//! One call to [`SnippetCompiler::compile_snippets`] goes through
//!
//! ```text
//! reset scratch dir ─► read package.json ─► extract + localise (per file, concurrent)
//!                                                   │
//!        remove scratch dir ◄── collect results ◄── compile (per block, concurrent)
//! ```
//!
//! The scratch directory is removed on every exit path.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures::future::{join_all, try_join_all};
use regex::Regex;
use tokio::sync::Semaphore;

use super::diagnostic::Diagnostic;
use super::service::CompilerService;
use super::toolchain::TscService;
use super::types::{CodeBlock, CompilationResult, CompilerConfig};
use crate::error::Result;
use crate::extract::extract_code_blocks;
use crate::localise::LocalImportSubstituter;
use crate::package::PackageDefinition;
use crate::paths::{BLOCK_FILE_PREFIX, ScratchDir};

/// Compiles the TypeScript blocks of a set of documents, each in isolation.
///
/// The compiler owns its scratch directory. Calls on one instance must not
/// overlap, since each call resets and removes that directory; use separate
/// instances with distinct `scratch_dir_name`s to run concurrently.
pub struct SnippetCompiler<S = TscService> {
    /// Run configuration
    config: CompilerConfig,

    /// Scratch directory owned by this compiler
    scratch: ScratchDir,

    /// Matches any snippet file path inside the scratch directory
    block_path_pattern: Regex,

    /// Source of unique snippet file ids
    next_block_id: AtomicU64,

    _service: PhantomData<fn() -> S>,
}

impl<S: CompilerService> SnippetCompiler<S> {
    /// Create a compiler. Nothing is touched on disk until a run starts.
    pub fn new(config: CompilerConfig) -> Self {
        let scratch = ScratchDir::new(&config.project_root, config.scratch_dir_name.clone());
        let block_path_pattern = Regex::new(&format!(
            r#"(?:[^\s'"`()]*[/\\])?{}[/\\]{}\d+\.ts\b"#,
            regex::escape(scratch.name()),
            regex::escape(BLOCK_FILE_PREFIX),
        ))
        .expect("escaped scratch path forms a valid pattern");

        Self {
            config,
            scratch,
            block_path_pattern,
            next_block_id: AtomicU64::new(1),
            _service: PhantomData,
        }
    }

    /// Get the run configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Get the scratch directory.
    pub fn scratch_dir(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Compile every TypeScript block in `documents`.
    ///
    /// Results are ordered by document (in the order given) and then by block
    /// index. A block that fails to compile becomes a failed result; only a
    /// missing document, an unreadable manifest, a missing compiler or a
    /// scratch directory failure fails the whole call.
    pub async fn compile_snippets<I, P>(&self, documents: I) -> Result<Vec<CompilationResult>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let documents: Vec<PathBuf> = documents
            .into_iter()
            .map(|d| d.as_ref().to_path_buf())
            .collect();
        let start = Instant::now();
        tracing::info!("Checking code blocks in {} documents", documents.len());

        let scratch = self.scratch.acquire().await?;
        let outcome = self.compile_in_scratch(&documents).await;
        let cleanup = scratch.release().await;

        let results = outcome?;
        cleanup?;

        tracing::info!(
            "Compiled {} code blocks ({} failed) in {:.2}s",
            results.len(),
            results.iter().filter(|r| !r.is_success()).count(),
            start.elapsed().as_secs_f64()
        );
        Ok(results)
    }

    async fn compile_in_scratch(&self, documents: &[PathBuf]) -> Result<Vec<CompilationResult>> {
        let package = PackageDefinition::read(&self.config.project_root).await?;
        let substituter = LocalImportSubstituter::new(&package, self.scratch.root_reference());
        tracing::debug!(
            "Localising imports of {} to {}",
            package.name,
            substituter.entry_reference()
        );

        let blocks = self.collect_blocks(documents, &substituter).await?;
        if blocks.is_empty() {
            return Ok(Vec::new());
        }

        let service = S::create(&self.config).await?;
        let limiter = self.config.jobs.map(|jobs| Semaphore::new(jobs.max(1)));

        // join_all keeps input order whatever order the compilations finish in
        let results = join_all(
            blocks
                .iter()
                .map(|block| self.compile_block(&service, block, limiter.as_ref())),
        )
        .await;

        Ok(results)
    }

    /// Extract and localise the blocks of every document, in document order.
    async fn collect_blocks(
        &self,
        documents: &[PathBuf],
        substituter: &LocalImportSubstituter,
    ) -> Result<Vec<CodeBlock>> {
        let per_document = try_join_all(documents.iter().map(|document| async move {
            let path = self.config.project_root.join(document);
            let extracted = extract_code_blocks(&path, &self.config.languages).await?;

            Ok::<_, crate::Error>(
                extracted
                    .into_iter()
                    .map(|block| CodeBlock {
                        file: document.clone(),
                        index: block.index,
                        line: block.line,
                        sanitised_code: substituter.substitute_local_package_imports(&block.snippet),
                        snippet: block.snippet,
                    })
                    .collect::<Vec<_>>(),
            )
        }))
        .await?;

        Ok(per_document.into_iter().flatten().collect())
    }

    /// Compile one block. Never fails: problems become the result's error.
    async fn compile_block(
        &self,
        service: &S,
        block: &CodeBlock,
        limiter: Option<&Semaphore>,
    ) -> CompilationResult {
        let _permit = match limiter {
            Some(semaphore) => semaphore.acquire().await.ok(),
            None => None,
        };

        let id = self.next_block_id.fetch_add(1, Ordering::Relaxed);
        let path = self.scratch.block_path(id);
        tracing::debug!("Compiling {} as {}", block.label(), path.display());

        let outcome = match tokio::fs::write(&path, &block.sanitised_code).await {
            Ok(()) => service.compile(&block.sanitised_code, &path).await,
            Err(e) => Err(Diagnostic::crash(format!(
                "cannot write {}: {}",
                path.display(),
                e
            ))),
        };

        match outcome {
            Ok(()) => CompilationResult::success(block),
            Err(mut diagnostic) => {
                diagnostic.scrub_paths(&self.block_path_pattern, &block.label());
                let result = CompilationResult::failure(block, diagnostic);
                if result.lines_with_errors.is_empty() {
                    tracing::debug!("No line numbers recovered for {}", block.label());
                }
                result
            }
        }
    }
}
