//! Core engine for snipcheck.
//!
//! Finds the TypeScript code blocks in Markdown documentation, points their
//! imports of the documented package at local source, and type-checks every
//! block on its own:
//!
//! - Block extraction from Markdown
//! - Import localisation
//! - Isolated per-block compilation with scrubbed diagnostics

pub mod compile;
pub mod error;
pub mod extract;
pub mod localise;
pub mod package;
pub mod paths;

pub use compile::{
    CodeBlock, CompilationResult, CompilerConfig, CompilerService, Diagnostic, DiagnosticKind,
    Position, SnippetCompiler, TscService,
};
pub use error::{Error, Result};
pub use extract::{ExtractedBlock, code_blocks_in, extract_code_blocks};
pub use localise::LocalImportSubstituter;
pub use package::PackageDefinition;
pub use paths::{ScratchDir, ScratchGuard};
