//! Compilation pipeline for documentation snippets.
//!
//! This module provides:
//! - The compiler seam ([`CompilerService`]) and its `tsc` implementation
//! - Diagnostics and their post-processing (path scrubbing, line recovery)
//! - The per-run orchestrator ([`SnippetCompiler`])
//!
//! # Architecture
//!
//! ```text
//! README.md
//!     │
//!     └── extract ──► localise imports ──► compiled-docs/block-<id>.ts
//!                                                   │
//!                              TscService ◄─────────┘
//!                                   │
//!                                   └── Diagnostic ──► scrub paths ──► CompilationResult
//! ```

mod diagnostic;
mod service;
mod snippet;
mod toolchain;
mod types;

pub use diagnostic::{Diagnostic, DiagnosticKind, Position};
pub use service::CompilerService;
pub use snippet::SnippetCompiler;
pub use toolchain::TscService;
pub use types::{CodeBlock, CompilationResult, CompilerConfig, block_label};
