//! Test code block extraction from documentation files.

use std::fs;

use snipcheck_core::extract::DEFAULT_LANGUAGES;
use snipcheck_core::{Error, extract_code_blocks};
use tempfile::TempDir;

const GUIDE: &str = r#"# Widgets

Install it:

```bash
npm install @acme/widgets
```

Create a button:

```ts
import { Button } from '@acme/widgets'

const button = new Button('OK')
```

Some JavaScript for comparison:

```js
const button = new Button('OK')
```

And a grid:

```typescript
import { Grid } from '@acme/widgets/src/grid'
const grid: Grid = new Grid(2, 2)
```

1. A nested example:

   ```ts
   const nested = true
   ```
"#;

#[tokio::test]
async fn test_guide_extraction() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("GUIDE.md");
    fs::write(&path, GUIDE).expect("Failed to write guide");

    let blocks = extract_code_blocks(&path, &DEFAULT_LANGUAGES)
        .await
        .expect("Failed to extract");

    assert_eq!(blocks.len(), 3, "bash and js blocks are skipped");

    let indices: Vec<usize> = blocks.iter().map(|b| b.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);

    assert_eq!(
        blocks[0].snippet,
        "import { Button } from '@acme/widgets'\n\nconst button = new Button('OK')\n"
    );
    assert_eq!(
        blocks[1].snippet,
        "import { Grid } from '@acme/widgets/src/grid'\nconst grid: Grid = new Grid(2, 2)\n"
    );
    assert_eq!(blocks[2].snippet, "const nested = true\n");

    assert_eq!(blocks[0].line, 11);
}

#[tokio::test]
async fn test_missing_document() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("NOPE.md");

    let err = extract_code_blocks(&path, &DEFAULT_LANGUAGES)
        .await
        .expect_err("Missing document should fail");

    assert!(matches!(err, Error::DocumentNotFound { .. }));
    assert!(err.to_string().contains("NOPE.md"));
}

#[tokio::test]
async fn test_document_without_typescript() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("CHANGELOG.md");
    fs::write(&path, "# Changelog\n\n```json\n{}\n```\n").expect("Failed to write");

    let blocks = extract_code_blocks(&path, &DEFAULT_LANGUAGES)
        .await
        .expect("Failed to extract");
    assert!(blocks.is_empty());
}
