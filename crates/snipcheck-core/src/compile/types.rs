//! Common types for the snippet compilation pipeline.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::diagnostic::Diagnostic;
use crate::extract::DEFAULT_LANGUAGES;
use crate::paths::DEFAULT_SCRATCH_DIR;

/// Configuration for a snippet compilation run.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Package root: holds `package.json`, `tsconfig.json` and the scratch directory.
    /// Document paths are resolved against it.
    pub project_root: PathBuf,

    /// Name of the scratch directory created under the project root.
    pub scratch_dir_name: String,

    /// Project compiler configuration, relative to the project root.
    pub tsconfig: PathBuf,

    /// Explicit path to the `tsc` executable.
    /// If None, `node_modules/.bin/tsc` and then `PATH` are searched.
    pub tsc_path: Option<PathBuf>,

    /// Maximum number of blocks compiled at once. None means unbounded.
    pub jobs: Option<usize>,

    /// Fence language tags treated as TypeScript.
    pub languages: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            scratch_dir_name: DEFAULT_SCRATCH_DIR.to_string(),
            tsconfig: PathBuf::from("tsconfig.json"),
            tsc_path: None,
            jobs: None,
            languages: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl CompilerConfig {
    /// Default configuration rooted at `project_root`.
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Path of the project's compiler configuration.
    pub fn tsconfig_path(&self) -> PathBuf {
        self.project_root.join(&self.tsconfig)
    }
}

/// A code block ready for compilation.
#[derive(Debug, Clone)]
pub struct CodeBlock {
    /// Document the block came from, as requested.
    pub file: PathBuf,

    /// 1-based position among the document's TypeScript blocks.
    pub index: usize,

    /// 1-based document line of the opening fence.
    pub line: usize,

    /// Original block text.
    pub snippet: String,

    /// Snippet after import localisation; this is what gets compiled.
    pub(crate) sanitised_code: String,
}

impl CodeBlock {
    /// Human-readable name used in place of the scratch file path.
    pub fn label(&self) -> String {
        block_label(&self.file, self.index)
    }
}

/// Label that replaces scratch file paths in diagnostics.
pub fn block_label(file: &Path, index: usize) -> String {
    format!("{} → Code Block {}", file.display(), index)
}

/// Outcome of compiling one code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
    /// Document the block came from.
    pub file: PathBuf,

    /// 1-based block index within the document.
    pub index: usize,

    /// 1-based document line of the opening fence.
    pub line: usize,

    /// Original block text, unchanged by localisation.
    pub snippet: String,

    /// Snippet lines (1-based, ascending, unique) named by the diagnostic.
    pub lines_with_errors: Vec<usize>,

    /// Compiler diagnostic, present iff compilation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Diagnostic>,
}

impl CompilationResult {
    pub(crate) fn success(block: &CodeBlock) -> Self {
        Self {
            file: block.file.clone(),
            index: block.index,
            line: block.line,
            snippet: block.snippet.clone(),
            lines_with_errors: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn failure(block: &CodeBlock, error: Diagnostic) -> Self {
        Self {
            lines_with_errors: error.error_lines(),
            error: Some(error),
            ..Self::success(block)
        }
    }

    /// Returns true if the block compiled.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Label of the block (`README.md → Code Block 2`).
    pub fn label(&self) -> String {
        block_label(&self.file, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::DiagnosticKind;

    fn block() -> CodeBlock {
        CodeBlock {
            file: PathBuf::from("README.md"),
            index: 2,
            line: 14,
            snippet: "const y: number = 'bad'\n".to_string(),
            sanitised_code: "const y: number = 'bad'\n".to_string(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.scratch_dir_name, "compiled-docs");
        assert_eq!(config.languages, vec!["ts", "typescript"]);
        assert_eq!(config.jobs, None);
    }

    #[test]
    fn test_tsconfig_path() {
        let config = CompilerConfig::for_project("/work/pkg");
        assert_eq!(config.tsconfig_path(), PathBuf::from("/work/pkg/tsconfig.json"));
    }

    #[test]
    fn test_label() {
        assert_eq!(block().label(), "README.md → Code Block 2");
    }

    #[test]
    fn test_failure_collects_lines() {
        let diagnostic = Diagnostic::new(
            DiagnosticKind::TypeCheck,
            "Unable to compile TypeScript",
            "README.md → Code Block 2(1,7): error TS2322: Type 'string' is not assignable to type 'number'.",
        );
        let result = CompilationResult::failure(&block(), diagnostic);

        assert!(!result.is_success());
        assert_eq!(result.lines_with_errors, vec![1]);
        assert_eq!(result.snippet, "const y: number = 'bad'\n");
    }

    #[test]
    fn test_json_shape() {
        let result = CompilationResult::success(&block());
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["file"], "README.md");
        assert_eq!(json["index"], 2);
        assert_eq!(json["linesWithErrors"], serde_json::json!([]));
        assert!(json.get("error").is_none());
    }
}
