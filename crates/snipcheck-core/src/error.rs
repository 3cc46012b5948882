//! Error types for snipcheck-core.
//!
//! Only structural failures live here. A snippet that fails to compile is not
//! an error of the run; it is reported as a [`Diagnostic`](crate::Diagnostic)
//! inside its [`CompilationResult`](crate::CompilationResult).

use std::path::PathBuf;

use thiserror::Error;

/// Result type for snipcheck-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole snippet compilation run.
#[derive(Debug, Error)]
pub enum Error {
    /// A requested document does not exist.
    #[error("document not found: {}", path.display())]
    DocumentNotFound { path: PathBuf },

    /// The package manifest is missing or malformed.
    #[error("invalid package manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// The scratch directory could not be created or removed.
    #[error("scratch directory {}: {source}", path.display())]
    ScratchDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TypeScript compiler could not be located or started.
    #[error("toolchain error: {0}")]
    Toolchain(String),
}

impl Error {
    /// Render the error followed by a recovery hint, when one applies.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Self::DocumentNotFound { .. } => {
                Some("paths are resolved against the project root (see --project)")
            }
            Self::Manifest { .. } => {
                Some("run snipcheck from a directory containing package.json with a \"name\" field")
            }
            Self::ScratchDir { .. } => Some("check that the project directory is writable"),
            Self::Toolchain(_) => {
                Some("install typescript (npm install --save-dev typescript) or pass --tsc")
            }
            Self::Io(_) => None,
        };

        match hint {
            Some(hint) => format!("{self}\n  hint: {hint}"),
            None => self.to_string(),
        }
    }
}
