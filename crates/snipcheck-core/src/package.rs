//! Package manifest (`package.json`) reading.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// File name of the npm package manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// The facts about the host package that import localisation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDefinition {
    /// Package name as written in an import, possibly scoped (`@org/pkg`).
    pub name: String,

    /// Entry point relative to the package root.
    pub main: String,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    name: Option<String>,
    main: Option<String>,
}

impl PackageDefinition {
    /// Read `package.json` from the project root.
    pub async fn read(project_root: &Path) -> Result<Self> {
        let path = project_root.join(MANIFEST_FILE);
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Manifest {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Self::from_json(&json).map_err(|message| Error::Manifest { path, message })
    }

    /// Parse manifest JSON.
    ///
    /// `main` falls back to `index.js`, the npm default.
    pub fn from_json(json: &str) -> std::result::Result<Self, String> {
        let raw: RawManifest = serde_json::from_str(json).map_err(|e| e.to_string())?;

        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| "missing \"name\" field".to_string())?;

        Ok(Self {
            name,
            main: raw.main.unwrap_or_else(|| "index.js".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_scoped_manifest() {
        let pkg = PackageDefinition::from_json(
            r#"{"name": "@acme/widgets", "main": "dist/index.js", "types": "dist/index.d.ts"}"#,
        )
        .unwrap();

        assert_eq!(pkg.name, "@acme/widgets");
        assert_eq!(pkg.main, "dist/index.js");
    }

    #[test]
    fn test_main_defaults_to_index_js() {
        let pkg = PackageDefinition::from_json(r#"{"name": "widgets"}"#).unwrap();
        assert_eq!(pkg.main, "index.js");
    }

    #[test]
    fn test_missing_name_rejected() {
        let err = PackageDefinition::from_json(r#"{"main": "index.ts"}"#).unwrap_err();
        assert!(err.contains("name"));
    }

    #[tokio::test]
    async fn test_read_missing_manifest() {
        let temp = TempDir::new().unwrap();
        let err = PackageDefinition::read(temp.path()).await.unwrap_err();
        assert!(matches!(err, Error::Manifest { .. }));
        assert!(err.to_string().contains("package.json"));
    }

    #[tokio::test]
    async fn test_read_from_disk() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(MANIFEST_FILE),
            r#"{"name": "widgets", "main": "src/index.ts", "version": "1.0.0"}"#,
        )
        .unwrap();

        let pkg = PackageDefinition::read(temp.path()).await.unwrap();
        assert_eq!(pkg.name, "widgets");
        assert_eq!(pkg.main, "src/index.ts");
    }
}
