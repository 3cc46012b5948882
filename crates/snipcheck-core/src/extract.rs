//! Code block extraction from Markdown documents.
//!
//! Only fenced blocks whose info string starts with one of the configured
//! language tags are returned. Blocks are numbered from 1 in document order;
//! skipped blocks do not consume an index.

use std::io::ErrorKind;
use std::path::Path;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::error::{Error, Result};

/// Language tags accepted by default: the short and the long spelling.
pub const DEFAULT_LANGUAGES: [&str; 2] = ["ts", "typescript"];

/// A code block as it appears in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBlock {
    /// 1-based position among matching blocks.
    pub index: usize,

    /// 1-based document line of the opening fence.
    pub line: usize,

    /// Block body, exactly as written.
    pub snippet: String,
}

/// Read a document and extract its code blocks.
pub async fn extract_code_blocks<S: AsRef<str>>(
    path: &Path,
    languages: &[S],
) -> Result<Vec<ExtractedBlock>> {
    let markdown = match tokio::fs::read_to_string(path).await {
        Ok(markdown) => markdown,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::DocumentNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let blocks = code_blocks_in(&markdown, languages);
    tracing::debug!("Found {} code blocks in {}", blocks.len(), path.display());
    Ok(blocks)
}

/// Extract code blocks from Markdown source.
pub fn code_blocks_in<S: AsRef<str>>(markdown: &str, languages: &[S]) -> Vec<ExtractedBlock> {
    let mut blocks = Vec::new();
    // Blocks nested in lists or quotes carry container markup in the raw
    // source, so their body comes from the parser's text events instead.
    let mut container_depth = 0usize;
    let mut current: Option<PendingBlock> = None;

    for (event, range) in Parser::new_ext(markdown, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::BlockQuote(_) | Tag::Item) => container_depth += 1,
            Event::End(TagEnd::BlockQuote(_) | TagEnd::Item) => {
                container_depth = container_depth.saturating_sub(1)
            }
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                if matches_language(&info, languages) {
                    current = Some(PendingBlock {
                        start: range.start,
                        raw: &markdown[range],
                        nested: container_depth > 0,
                        text: String::new(),
                    });
                }
            }
            Event::Text(text) => {
                if let Some(block) = current.as_mut() {
                    block.text.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = current.take() {
                    let snippet = if block.nested {
                        block.text
                    } else {
                        fenced_body(block.raw).to_string()
                    };
                    blocks.push(ExtractedBlock {
                        index: blocks.len() + 1,
                        line: line_of(markdown, block.start),
                        snippet,
                    });
                }
            }
            _ => {}
        }
    }

    blocks
}

struct PendingBlock<'a> {
    start: usize,
    raw: &'a str,
    nested: bool,
    text: String,
}

fn matches_language<S: AsRef<str>>(info: &str, languages: &[S]) -> bool {
    let Some(tag) = info.split_whitespace().next() else {
        return false;
    };
    languages
        .iter()
        .any(|lang| tag.eq_ignore_ascii_case(lang.as_ref()))
}

/// Strip the opening fence line and, if present, the line that closes it.
fn fenced_body(raw: &str) -> &str {
    let Some(open_end) = raw.find('\n') else {
        return "";
    };
    let Some((marker, width)) = fence_marker(&raw[..open_end]) else {
        return "";
    };
    let body = &raw[open_end + 1..];

    let content = body.trim_end_matches(['\n', '\r']);
    let close_start = content.rfind('\n').map_or(0, |i| i + 1);
    if closes_fence(&content[close_start..], marker, width) {
        &body[..close_start]
    } else {
        body
    }
}

/// Marker character and run length of an opening fence line.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let line = line.trim_start_matches(' ');
    let marker = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
    Some((marker, line.chars().take_while(|&c| c == marker).count()))
}

/// A closing fence repeats the opening marker at least as many times.
fn closes_fence(line: &str, marker: char, width: usize) -> bool {
    let line = line.trim();
    line.chars().count() >= width && line.chars().all(|c| c == marker)
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(markdown: &str) -> Vec<ExtractedBlock> {
        code_blocks_in(markdown, &DEFAULT_LANGUAGES)
    }

    #[test]
    fn test_both_spellings_extracted() {
        let md = "# Title\n\n```ts\nconst a = 1\n```\n\ntext\n\n```typescript\nconst b = 2\n```\n";
        let blocks = extract(md);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].index, 1);
        assert_eq!(blocks[0].snippet, "const a = 1\n");
        assert_eq!(blocks[1].index, 2);
        assert_eq!(blocks[1].snippet, "const b = 2\n");
    }

    #[test]
    fn test_other_languages_do_not_consume_index() {
        let md = "```js\nlet a = 1\n```\n\n```\nplain\n```\n\n```ts\nconst b = 2\n```\n\n```bash\nnpm i\n```\n\n```TypeScript\nconst c = 3\n```\n";
        let blocks = extract(md);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].index, 1);
        assert_eq!(blocks[0].snippet, "const b = 2\n");
        assert_eq!(blocks[1].index, 2);
        assert_eq!(blocks[1].snippet, "const c = 3\n");
    }

    #[test]
    fn test_mismatched_fence_line_kept_in_unterminated_block() {
        let blocks = extract("```ts\nconst a = 1\n~~~\n");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].snippet, "const a = 1\n~~~\n");
    }

    #[test]
    fn test_shorter_fence_inside_longer_fence() {
        let md = "````ts\nconst doc = `\n```\n`\n````\n";
        let blocks = extract(md);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].snippet, "const doc = `\n```\n`\n");
    }

    #[test]
    fn test_longer_closing_fence_accepted() {
        let blocks = extract("~~~ts\nconst a = 1\n~~~~~\n");

        assert_eq!(blocks[0].snippet, "const a = 1\n");
    }

    #[test]
    fn test_body_preserved_exactly() {
        let body = "import { x } from 'pkg'\n\n    const indented = x  \n\t// tab\n";
        let md = format!("intro\n\n```ts\n{body}```\n");
        let blocks = extract(&md);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].snippet, body);
    }

    #[test]
    fn test_info_string_attributes() {
        let md = "```ts title=\"example.ts\"\nconst a = 1\n```\n";
        let blocks = extract(md);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].snippet, "const a = 1\n");
    }

    #[test]
    fn test_prefix_of_tag_not_matched() {
        let md = "```tsx\nconst a = <div />\n```\n\n```typescriptreact\nx\n```\n";
        assert!(extract(md).is_empty());
    }

    #[test]
    fn test_empty_document() {
        assert!(extract("").is_empty());
        assert!(extract("# Nothing here\n\nJust prose.\n").is_empty());
    }

    #[test]
    fn test_empty_block() {
        let blocks = extract("```ts\n```\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].snippet, "");
    }

    #[test]
    fn test_tilde_fence() {
        let blocks = extract("~~~ts\nconst a = 1\n~~~\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].snippet, "const a = 1\n");
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let blocks = extract("```ts\nconst a = 1\nconst b = 2\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].snippet, "const a = 1\nconst b = 2\n");
    }

    #[test]
    fn test_line_numbers() {
        let md = "# Title\n\nSome text.\n\n```ts\nconst a = 1\n```\n\n```ts\nconst b = 2\n```\n";
        let blocks = extract(md);
        assert_eq!(blocks[0].line, 5);
        assert_eq!(blocks[1].line, 9);
    }

    #[test]
    fn test_block_inside_list() {
        let md = "- step one:\n\n  ```ts\n  const a = 1\n  ```\n";
        let blocks = extract(md);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].snippet, "const a = 1\n");
    }

    #[test]
    fn test_custom_languages() {
        let md = "```mts\nconst a = 1\n```\n\n```ts\nconst b = 2\n```\n";
        let blocks = code_blocks_in(md, &["mts"]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].snippet, "const a = 1\n");
    }

    #[tokio::test]
    async fn test_missing_document_reports_path() {
        let err = extract_code_blocks(Path::new("does-not-exist/GUIDE.md"), &DEFAULT_LANGUAGES)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DocumentNotFound { .. }));
        assert!(err.to_string().contains("does-not-exist/GUIDE.md"));
    }
}
