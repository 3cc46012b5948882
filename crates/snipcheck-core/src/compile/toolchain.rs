//! TypeScript toolchain: runs `tsc` on one snippet at a time.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde_json::{Value, json};
use tokio::process::Command;

use super::diagnostic::Diagnostic;
use super::service::CompilerService;
use super::types::CompilerConfig;
use crate::error::{Error, Result};
use crate::paths::BLOCK_FILE_PREFIX;

#[cfg(windows)]
const TSC_BINARY: &str = "tsc.cmd";
#[cfg(not(windows))]
const TSC_BINARY: &str = "tsc";

/// Compiles snippets with the project's TypeScript compiler.
///
/// Every snippet gets a generated tsconfig that extends the project's own
/// configuration, restricts compilation to that one file and turns off
/// `noUnusedLocals`, since snippets often declare names only to show an API.
/// Incremental build info is disabled so concurrent runs share no state.
#[derive(Debug, Clone)]
pub struct TscService {
    /// Path to tsc
    tsc_path: PathBuf,

    /// Working directory for tsc; paths in its output are relative to it
    project_root: PathBuf,

    /// Project tsconfig to extend, if it exists
    base_config: Option<PathBuf>,
}

impl TscService {
    /// Get the tsc path.
    pub fn tsc_path(&self) -> &Path {
        &self.tsc_path
    }

    /// Find tsc: explicit path, then the project's `node_modules`, then `PATH`.
    ///
    /// Blocking: probes the filesystem and searches `PATH`.
    fn find_tsc(config: &CompilerConfig) -> Result<PathBuf> {
        if let Some(path) = &config.tsc_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return which::which(path).map_err(|_| {
                Error::Toolchain(format!("tsc not found at {}", path.display()))
            });
        }

        let local = config
            .project_root
            .join("node_modules")
            .join(".bin")
            .join(TSC_BINARY);
        if local.exists() {
            return Ok(local);
        }

        which::which(TSC_BINARY)
            .map_err(|_| Error::Toolchain("tsc not found in node_modules/.bin or PATH".to_string()))
    }

    /// Generated tsconfig for one snippet.
    fn snippet_config(&self, snippet: &Path) -> Value {
        let mut config = json!({
            "compilerOptions": {
                "noEmit": true,
                "noUnusedLocals": false,
                "composite": false,
                "incremental": false,
            },
            "files": [path_string(snippet)],
            "include": [],
        });

        if let Some(base) = &self.base_config {
            config["extends"] = Value::String(path_string(base));
        }

        config
    }
}

impl CompilerService for TscService {
    async fn create(config: &CompilerConfig) -> Result<Self> {
        let lookup = config.clone();
        let tsc_path = tokio::task::spawn_blocking(move || Self::find_tsc(&lookup))
            .await
            .map_err(|e| Error::Toolchain(format!("tsc lookup failed: {e}")))??;
        let project_root = std::path::absolute(&config.project_root)?;

        let base_config = config.tsconfig_path();
        let is_file = tokio::fs::metadata(&base_config)
            .await
            .is_ok_and(|meta| meta.is_file());
        let base_config = if is_file {
            Some(std::path::absolute(base_config)?)
        } else {
            tracing::debug!(
                "No tsconfig at {}, compiling with compiler defaults",
                base_config.display()
            );
            None
        };

        tracing::info!("Using tsc at {}", tsc_path.display());

        Ok(Self {
            tsc_path,
            project_root,
            base_config,
        })
    }

    async fn compile(&self, _source: &str, path: &Path) -> std::result::Result<(), Diagnostic> {
        let snippet = std::path::absolute(path)
            .map_err(|e| Diagnostic::crash(format!("cannot resolve {}: {}", path.display(), e)))?;

        let config_path = snippet.with_file_name(format!("tsconfig-{}.json", block_token(&snippet)));
        let config = serde_json::to_vec_pretty(&self.snippet_config(&snippet))
            .map_err(|e| Diagnostic::crash(format!("cannot serialise tsconfig: {e}")))?;
        tokio::fs::write(&config_path, config).await.map_err(|e| {
            Diagnostic::crash(format!("cannot write {}: {}", config_path.display(), e))
        })?;

        tracing::debug!("Running tsc for {}", snippet.display());

        let output = Command::new(&self.tsc_path)
            .arg("--project")
            .arg(&config_path)
            .arg("--pretty")
            .arg("false")
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                Diagnostic::crash(format!("failed to run {}: {}", self.tsc_path.display(), e))
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Diagnostic::from_tsc_output(
            &stdout,
            &stderr,
            output.status.code(),
        ))
    }
}

/// The id part of a `block-<id>.ts` file name.
fn block_token(snippet: &Path) -> String {
    let stem = snippet
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    match stem.strip_prefix(BLOCK_FILE_PREFIX) {
        Some(id) => id.to_string(),
        None => stem,
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
