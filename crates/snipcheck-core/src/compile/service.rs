//! The compiler seam.

use std::future::Future;
use std::path::Path;

use super::diagnostic::Diagnostic;
use super::types::CompilerConfig;
use crate::error::Result;

/// A service that type-checks one snippet at a time.
///
/// A fresh service is created for every
/// [`compile_snippets`](crate::SnippetCompiler::compile_snippets) call, and
/// `compile` may be called concurrently for different blocks.
pub trait CompilerService: Sized + Send + Sync {
    /// Create the service. Failing here aborts the run.
    fn create(config: &CompilerConfig) -> impl Future<Output = Result<Self>> + Send;

    /// Compile `source`, which has already been written to `path`.
    ///
    /// Diagnostics must reference `path` so they can be attributed back to
    /// the block.
    fn compile(
        &self,
        source: &str,
        path: &Path,
    ) -> impl Future<Output = std::result::Result<(), Diagnostic>> + Send;
}
