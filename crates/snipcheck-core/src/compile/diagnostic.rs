//! Compiler diagnostics and their post-processing.
//!
//! A failed compilation yields one [`Diagnostic`]. Before it reaches the
//! caller every string in it has the scratch file path replaced with a
//! readable block label, and the implicated snippet lines are recovered from
//! the detail text.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `Code Block N:LINE:COL`, produced when a `file:line:col` reference is scrubbed.
static LABELLED_POSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Code Block \d+:(\d+):\d+").expect("labelled position pattern is valid")
});

/// `(LINE,COL)`, the position suffix of `tsc --pretty false`.
static PAREN_POSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((\d+),\d+\)").expect("paren position pattern is valid")
});

/// One `tsc --pretty false` diagnostic line.
static TSC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<file>.+?)\((?P<line>\d+),(?P<column>\d+)\): (?P<level>error|warning|message) (?P<code>TS\d+): ",
    )
    .expect("tsc line pattern is valid")
});

/// Global `tsc` diagnostics that carry no position (`error TS5083: ...`).
static TSC_GLOBAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:error|warning) (?P<code>TS\d+): ").expect("tsc global pattern is valid")
});

/// What produced the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// The compiler rejected the snippet.
    TypeCheck,
    /// The compiler failed without reporting anything it could attribute.
    Crash,
}

/// A source position reported by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    /// File as reported (scrubbed to a block label before it reaches callers).
    pub file: String,

    /// Line number (1-indexed).
    pub line: usize,

    /// Column number (1-indexed).
    pub column: usize,
}

/// A structured compiler failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// What produced the diagnostic.
    pub kind: DiagnosticKind,

    /// Top-level message.
    pub message: String,

    /// Full compiler output containing inline position references.
    pub detail: String,

    /// Positions the compiler reported, in output order.
    pub positions: Vec<Position>,

    /// Diagnostic codes (e.g. "TS2322"), in output order.
    pub codes: Vec<String>,

    /// Supplementary string fields.
    pub extra: BTreeMap<String, String>,
}

impl Diagnostic {
    /// Create a diagnostic with no positions or supplementary fields.
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: detail.into(),
            positions: Vec::new(),
            codes: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Create a crash diagnostic where message and detail are the same text.
    pub fn crash(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(DiagnosticKind::Crash, message.clone(), message)
    }

    /// Add a supplementary field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Build a diagnostic from the output of a failed `tsc` run.
    pub fn from_tsc_output(stdout: &str, stderr: &str, exit_code: Option<i32>) -> Self {
        let mut positions = Vec::new();
        let mut codes = Vec::new();

        for line in stdout.lines() {
            if let Some(caps) = TSC_LINE.captures(line) {
                let (Ok(line_no), Ok(column)) = (caps["line"].parse(), caps["column"].parse())
                else {
                    continue;
                };
                positions.push(Position {
                    file: caps["file"].to_string(),
                    line: line_no,
                    column,
                });
                codes.push(caps["code"].to_string());
            } else if let Some(caps) = TSC_GLOBAL.captures(line) {
                codes.push(caps["code"].to_string());
            }
        }

        let stdout = stdout.trim_end();
        let stderr = stderr.trim_end();
        let detail = if stdout.is_empty() { stderr } else { stdout };

        let kind = if codes.is_empty() {
            DiagnosticKind::Crash
        } else {
            DiagnosticKind::TypeCheck
        };

        let mut diagnostic = Self::new(
            kind,
            format!("Unable to compile TypeScript:\n{detail}"),
            detail,
        )
        .with_field("name", "TSError");
        diagnostic.positions = positions;
        diagnostic.codes = codes;

        if let Some(code) = exit_code {
            diagnostic = diagnostic.with_field("exitCode", code.to_string());
        }
        if !stdout.is_empty() && !stderr.is_empty() {
            diagnostic = diagnostic.with_field("stderr", stderr);
        }
        if diagnostic.positions.is_empty() && !detail.is_empty() {
            tracing::debug!("No positions recognised in compiler output");
        }

        diagnostic
    }

    /// Apply `f` to every string-valued field.
    pub fn map_strings(&mut self, mut f: impl FnMut(&str) -> String) {
        self.message = f(&self.message);
        self.detail = f(&self.detail);
        for position in &mut self.positions {
            position.file = f(&position.file);
        }
        for code in &mut self.codes {
            *code = f(code);
        }
        for value in self.extra.values_mut() {
            *value = f(value);
        }
    }

    /// Replace every match of `pattern` in every string field with `label`.
    pub fn scrub_paths(&mut self, pattern: &Regex, label: &str) {
        self.map_strings(|s| pattern.replace_all(s, regex::NoExpand(label)).into_owned());
    }

    /// Snippet lines referenced by the detail text, ascending and unique.
    ///
    /// Both `Code Block N:LINE:COL` and `(LINE,COL)` references are recognised.
    pub fn error_lines(&self) -> Vec<usize> {
        let lines: BTreeSet<usize> = LABELLED_POSITION
            .captures_iter(&self.detail)
            .chain(PAREN_POSITION.captures_iter(&self.detail))
            .filter_map(|caps| caps[1].parse().ok())
            .collect();
        lines.into_iter().collect()
    }

    /// Format the diagnostic for terminal display.
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        for line in self.detail.lines() {
            if let Some((location, text)) = line.split_once(": error ") {
                output.push_str(&format!(
                    "  \x1b[1;34m-->\x1b[0m {location}\n      \x1b[1;31merror\x1b[0m {text}\n"
                ));
            } else {
                output.push_str(&format!("  {line}\n"));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Diagnostic {}
