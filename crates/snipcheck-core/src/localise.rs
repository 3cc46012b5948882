//! Rewrites imports of the documented package to local source.
//!
//! Snippets in a README import the package by its published name
//! (`import { thing } from '@acme/widgets'`). While checking them the package
//! is not installed, so those specifiers are rewritten to relative references
//! into the package itself.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::package::PackageDefinition;

/// Module specifiers in `from '…'`, `import '…'`, `import('…')` and `require('…')`.
static SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?P<lead>\bfrom\s*|\bimport\s*|\bimport\s*\(\s*|\brequire\s*\(\s*)(?:'(?P<single>[^'\n]*)'|"(?P<double>[^"\n]*)")"#,
    )
    .expect("specifier pattern is valid")
});

const SOURCE_EXTENSIONS: [&str; 4] = [".tsx", ".mts", ".cts", ".ts"];
const COMPILED_EXTENSIONS: [&str; 6] = [".d.mts", ".d.cts", ".d.ts", ".mjs", ".cjs", ".js"];

/// Substitutes local references for imports of one package.
#[derive(Debug, Clone)]
pub struct LocalImportSubstituter {
    /// Package name as imported.
    package_name: String,

    /// Reference from the compiled snippet to the package root, no trailing slash.
    root: String,

    /// Reference used for a bare import of the package.
    entry: String,
}

impl LocalImportSubstituter {
    /// Create a substituter for `package`.
    ///
    /// `root_reference` is the path from the directory the snippets are
    /// compiled in to the package root (`..` for the default scratch layout).
    pub fn new(package: &PackageDefinition, root_reference: &str) -> Self {
        let root = normalise(root_reference).trim_end_matches('/').to_string();
        let entry = join(&root, &entry_module(package));

        Self {
            package_name: package.name.clone(),
            root,
            entry,
        }
    }

    /// Reference a bare import of the package is rewritten to.
    pub fn entry_reference(&self) -> &str {
        &self.entry
    }

    /// Rewrite every import of the package in `code`.
    ///
    /// Code without a matching import is returned unchanged.
    pub fn substitute_local_package_imports(&self, code: &str) -> String {
        SPECIFIER
            .replace_all(code, |caps: &Captures| {
                let (specifier, quote) = match (caps.name("single"), caps.name("double")) {
                    (Some(s), _) => (s.as_str(), '\''),
                    (_, Some(d)) => (d.as_str(), '"'),
                    _ => return caps[0].to_string(),
                };

                match self.localise(specifier) {
                    Some(local) => format!("{}{quote}{local}{quote}", &caps["lead"]),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Local reference for a specifier, if it names this package.
    fn localise(&self, specifier: &str) -> Option<Cow<'_, str>> {
        let rest = specifier.strip_prefix(self.package_name.as_str())?;
        if rest.is_empty() {
            return Some(Cow::Borrowed(&self.entry));
        }
        let sub_path = rest.strip_prefix('/')?;
        if sub_path.is_empty() {
            return Some(Cow::Borrowed(&self.entry));
        }
        Some(Cow::Owned(join(&self.root, sub_path)))
    }
}

/// Module path (relative to the package root, no extension) that a bare
/// import of the package should load.
fn entry_module(package: &PackageDefinition) -> String {
    let main = normalise(&package.main);

    if strip_any(&main, &COMPILED_EXTENSIONS).is_none()
        && let Some(stem) = strip_any(&main, &SOURCE_EXTENSIONS)
    {
        return stem.to_string();
    }

    // Compiled entry point: the extension-less path lets the compiler pick
    // the sibling source file over the build artifact.
    strip_any(&main, &COMPILED_EXTENSIONS)
        .unwrap_or(&main)
        .to_string()
}

fn strip_any<'a>(path: &'a str, extensions: &[&str]) -> Option<&'a str> {
    extensions.iter().find_map(|ext| path.strip_suffix(ext))
}

fn normalise(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut path = path.as_str();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.to_string()
}

fn join(root: &str, relative: &str) -> String {
    let relative = normalise(relative);
    let relative = relative.trim_start_matches('/');
    if root.is_empty() || root == "." {
        format!("./{relative}")
    } else if relative.is_empty() {
        root.to_string()
    } else {
        format!("{root}/{relative}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str, main: &str) -> PackageDefinition {
        PackageDefinition {
            name: name.to_string(),
            main: main.to_string(),
        }
    }

    fn substituter(name: &str, main: &str) -> LocalImportSubstituter {
        LocalImportSubstituter::new(&package(name, main), "..")
    }

    #[test]
    fn test_bare_import_to_source_main() {
        let sub = substituter("my-pkg", "src/index.ts");
        let code = "import { widget } from 'my-pkg'\nwidget()\n";

        assert_eq!(
            sub.substitute_local_package_imports(code),
            "import { widget } from '../src/index'\nwidget()\n"
        );
    }

    #[test]
    fn test_double_quotes_preserved() {
        let sub = substituter("my-pkg", "index.ts");
        let code = r#"import * as pkg from "my-pkg";"#;

        assert_eq!(
            sub.substitute_local_package_imports(code),
            r#"import * as pkg from "../index";"#
        );
    }

    #[test]
    fn test_scoped_name() {
        let sub = substituter("@acme/widgets", "./lib/main.ts");
        let code = "import { Button } from '@acme/widgets'\n";

        assert_eq!(
            sub.substitute_local_package_imports(code),
            "import { Button } from '../lib/main'\n"
        );
    }

    #[test]
    fn test_sub_path_resolved_against_root() {
        let sub = substituter("@acme/widgets", "src/index.ts");
        let code = "import { Grid } from '@acme/widgets/src/layout/grid'\n";

        assert_eq!(
            sub.substitute_local_package_imports(code),
            "import { Grid } from '../src/layout/grid'\n"
        );
    }

    #[test]
    fn test_unscoped_sub_path() {
        let sub = substituter("my-pkg", "index.ts");
        let code = "import { helper } from \"my-pkg/utils/helper\"";

        assert_eq!(
            sub.substitute_local_package_imports(code),
            "import { helper } from \"../utils/helper\""
        );
    }

    #[test]
    fn test_compiled_main_strips_extension() {
        let sub = substituter("my-pkg", "dist/index.js");
        assert_eq!(sub.entry_reference(), "../dist/index");

        let sub = substituter("my-pkg", "index.js");
        assert_eq!(
            sub.substitute_local_package_imports("import x from 'my-pkg'"),
            "import x from '../index'"
        );
    }

    #[test]
    fn test_compiled_main_resolves_beside_artifact() {
        // A separate declaration directory is never targeted.
        let sub = substituter("my-pkg", "dist/index.js");
        assert_eq!(sub.entry_reference(), "../dist/index");
        assert_eq!(
            sub.substitute_local_package_imports("import { a } from 'my-pkg'"),
            "import { a } from '../dist/index'"
        );
    }

    #[test]
    fn test_source_main_extension_removed() {
        let sub = substituter("my-pkg", "./src/index.mts");
        assert_eq!(sub.entry_reference(), "../src/index");
    }

    #[test]
    fn test_prefix_sharing_name_untouched() {
        let sub = substituter("my-pkg", "index.ts");
        let code = "import a from 'my-pkg-extra'\nimport b from 'my-pkgs/x'\nimport c from '@scope/my-pkg'\n";

        assert_eq!(sub.substitute_local_package_imports(code), code);
    }

    #[test]
    fn test_no_match_is_identity() {
        let sub = substituter("my-pkg", "index.ts");
        let code = "import fs from 'fs'\nconst s = 'my-pkg'\nconsole.log(s)\n";

        assert_eq!(sub.substitute_local_package_imports(code), code);
    }

    #[test]
    fn test_side_effect_dynamic_and_require() {
        let sub = substituter("my-pkg", "index.ts");
        let code = "import 'my-pkg/polyfill'\nconst m = await import('my-pkg')\nconst r = require(\"my-pkg\")\n";

        assert_eq!(
            sub.substitute_local_package_imports(code),
            "import '../polyfill'\nconst m = await import('../index')\nconst r = require(\"../index\")\n"
        );
    }

    #[test]
    fn test_reexport_and_type_import() {
        let sub = substituter("my-pkg", "index.ts");
        let code = "export { a } from 'my-pkg'\nimport type { T } from 'my-pkg/types'\n";

        assert_eq!(
            sub.substitute_local_package_imports(code),
            "export { a } from '../index'\nimport type { T } from '../types'\n"
        );
    }

    #[test]
    fn test_multiple_imports_in_one_snippet() {
        let sub = substituter("@org/pkg", "src/index.ts");
        let code = "import { a } from '@org/pkg'\nimport { b } from '@org/pkg/src/b'\nimport { c } from 'other'\n";

        assert_eq!(
            sub.substitute_local_package_imports(code),
            "import { a } from '../src/index'\nimport { b } from '../src/b'\nimport { c } from 'other'\n"
        );
    }

    #[test]
    fn test_declaration_main_is_compiled() {
        let sub = substituter("my-pkg", "lib/index.d.ts");
        assert_eq!(sub.entry_reference(), "../lib/index");
    }

    #[test]
    fn test_current_directory_root() {
        let sub = LocalImportSubstituter::new(&package("my-pkg", "index.ts"), ".");
        assert_eq!(sub.entry_reference(), "./index");
    }
}
