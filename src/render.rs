//! File content rendering.
//!
//! Turns one file of the content root into an HTML fragment:
//!
//! | Kind | Output |
//! |------|--------|
//! | code (`.dart`) | escaped source in `<pre><code class="language-dart">` plus the sidecar's external ref id |
//! | documentation (`.md`) | markdown as HTML; single newlines become `<br />`; fenced blocks highlighted |
//! | anything else | escaped text in a plain `<pre><code>` |
//!
//! Rendering never fails outward. Any read failure (missing file, permission
//! denied, a directory, a path leaving the root) produces [`ERROR_PAYLOAD`]
//! with no external ref id, and the cause goes to the log.

use crate::config::ContentConfig;
use crate::highlight::Highlighter;
use crate::metadata;
use crate::tree::{ContentError, FileKind, resolve_relative};
use maud::html;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html as md_html};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Markup returned in place of content that couldn't be read.
pub const ERROR_PAYLOAD: &str =
    r#"<div class="text-red-500">Error: Could not load file content</div>"#;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedContent {
    #[serde(rename = "content")]
    pub html: String,
    #[serde(rename = "gistId")]
    pub external_ref_id: Option<String>,
}

impl RenderedContent {
    pub fn error() -> Self {
        Self {
            html: ERROR_PAYLOAD.to_string(),
            external_ref_id: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.html == ERROR_PAYLOAD
    }
}

#[derive(Debug)]
pub struct Renderer {
    root: PathBuf,
    content: ContentConfig,
    highlighter: Highlighter,
}

impl Renderer {
    pub fn new(root: impl Into<PathBuf>, content: ContentConfig) -> Self {
        let highlighter = Highlighter::new(&content.highlight_theme);
        Self {
            root: root.into(),
            content,
            highlighter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Render `relative`, degrading to the error payload on failure.
    pub fn render(&self, relative: &str) -> RenderedContent {
        match self.try_render(relative) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(path = relative, error = %err, "could not render file");
                RenderedContent::error()
            }
        }
    }

    /// Render `relative`, surfacing the read failure.
    pub fn try_render(&self, relative: &str) -> Result<RenderedContent, ContentError> {
        let file = resolve_relative(&self.root, relative)?;
        let meta = fs::metadata(&file).map_err(|e| ContentError::from_io(&file, e))?;
        if !meta.is_file() {
            return Err(ContentError::NotFound(file));
        }
        let text = fs::read_to_string(&file).map_err(|e| ContentError::from_io(&file, e))?;

        let rendered = match FileKind::of(&self.content, relative) {
            FileKind::Code => RenderedContent {
                html: code_block(&text, Some(&self.content.code_language)),
                external_ref_id: self.external_ref_id(&file, relative),
            },
            FileKind::Markdown => RenderedContent {
                html: markdown_to_html(&text, &self.highlighter),
                external_ref_id: None,
            },
            FileKind::Other => RenderedContent {
                html: code_block(&text, None),
                external_ref_id: None,
            },
        };
        Ok(rendered)
    }

    fn external_ref_id(&self, file: &Path, relative: &str) -> Option<String> {
        match metadata::resolve_external_ref(file, &self.content.metadata_extension) {
            Ok(id) => id,
            Err(err) => {
                warn!(path = relative, error = %err, "ignoring sidecar metadata");
                None
            }
        }
    }
}

/// Escaped source in a `<pre><code>` block, tagged with its language if known.
pub fn code_block(code: &str, language: Option<&str>) -> String {
    let class = language.map(|l| format!("language-{l}"));
    html! {
        pre {
            code class=[class] { (code) }
        }
    }
    .into_string()
}

/// Convert markdown to HTML.
///
/// Soft line breaks are emitted as hard breaks. Fenced and indented code
/// blocks are replaced by highlighted markup when a syntax can be resolved,
/// otherwise by an escaped [`code_block`].
pub fn markdown_to_html(source: &str, highlighter: &Highlighter) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;

    let mut events = Vec::new();
    let mut block: Option<(Option<String>, String)> = None;

    for event in Parser::new_ext(source, options) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                block = Some((fence_language(&kind), String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, code)) = block.take() {
                    let html = highlighter
                        .highlight(&code, language.as_deref())
                        .unwrap_or_else(|| code_block(&code, language.as_deref()));
                    events.push(Event::Html(html.into()));
                }
            }
            Event::Text(text) => match block.as_mut() {
                Some((_, code)) => code.push_str(&text),
                None => events.push(Event::Text(text)),
            },
            Event::SoftBreak => events.push(Event::HardBreak),
            other => events.push(other),
        }
    }

    let mut out = String::new();
    md_html::push_html(&mut out, events.into_iter());
    out
}

/// First token of a fence info string (`rust,ignore` → `rust`).
fn fence_language(kind: &CodeBlockKind<'_>) -> Option<String> {
    match kind {
        CodeBlockKind::Fenced(info) => info
            .split(|c: char| c.is_whitespace() || c == ',')
            .next()
            .filter(|lang| !lang.is_empty())
            .map(str::to_string),
        CodeBlockKind::Indented => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn renderer(tmp: &TempDir) -> Renderer {
        Renderer::new(tmp.path(), ContentConfig::default())
    }

    #[test]
    fn code_file_is_escaped_and_tagged() {
        let tmp = setup_fixtures();
        let out = renderer(&tmp).render("Arrays/two_sum_easy.dart");
        assert!(out.html.starts_with(r#"<pre><code class="language-dart">"#));
        assert!(out.html.contains("List&lt;int&gt; twoSum"));
        assert!(!out.html.contains("List<int>"));
        assert_eq!(out.external_ref_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn code_file_without_sidecar_has_no_ref() {
        let tmp = setup_fixtures();
        let out = renderer(&tmp).render("Arrays/three_sum_medium.dart");
        assert!(!out.is_error());
        assert_eq!(out.external_ref_id, None);
    }

    #[test]
    fn malformed_sidecar_still_renders_code() {
        let tmp = setup_fixtures();
        fs::write(tmp.path().join("Arrays/three_sum_medium.txt"), "").unwrap();
        let out = renderer(&tmp).render("Arrays/three_sum_medium.dart");
        assert!(out.html.contains("threeSum"));
        assert_eq!(out.external_ref_id, None);
    }

    #[test]
    fn markdown_is_converted() {
        let tmp = setup_fixtures();
        let out = renderer(&tmp).render("README.md");
        assert!(out.html.contains("<h1>DSA with Dart</h1>"));
        assert!(out.html.contains("<strong>Arrays</strong>"));
        assert_eq!(out.external_ref_id, None);
    }

    #[test]
    fn single_newline_becomes_line_break() {
        let tmp = setup_fixtures();
        let out = renderer(&tmp).render("Arrays/theory.md");
        assert!(out.html.contains("side by side.<br />"));
    }

    #[test]
    fn recognized_fence_is_highlighted() {
        let tmp = setup_fixtures();
        let out = renderer(&tmp).render("Arrays/theory.md");
        assert!(out.html.contains("<span style="));
        assert!(!out.html.contains("<code class=\"language-rust\">"));
    }

    #[test]
    fn dart_fence_is_highlighted() {
        let h = Highlighter::default();
        let html = markdown_to_html("```dart\nvoid main() {\n  print(1);\n}\n```\n", &h);
        assert!(html.contains("<span style="));
        assert!(!html.contains(r#"<code class="language-dart">"#));
    }

    #[test]
    fn unknown_fence_falls_back_to_plain_block() {
        let h = Highlighter::default();
        let html = markdown_to_html("```nolang\na < b\n```\n", &h);
        assert!(html.contains(r#"<pre><code class="language-nolang">a &lt; b"#));
    }

    #[test]
    fn fence_without_language_falls_back_to_plain_block() {
        let h = Highlighter::default();
        let html = markdown_to_html("```\nplain words\n```\n", &h);
        assert!(html.contains("<pre><code>plain words"));
    }

    #[test]
    fn fence_without_language_uses_detection() {
        let h = Highlighter::default();
        let html = markdown_to_html("```\n#!/bin/bash\necho hi\n```\n", &h);
        assert!(html.contains("<span style="));
    }

    #[test]
    fn fence_info_takes_first_token() {
        let h = Highlighter::default();
        let html = markdown_to_html("```rust,ignore\nfn main() {}\n```\n", &h);
        assert!(html.contains("<span style="));
    }

    #[test]
    fn markdown_tables_enabled() {
        let h = Highlighter::default();
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n", &h);
        assert!(html.contains("<table>"));
    }

    #[test]
    fn other_extension_is_plain_block() {
        let tmp = setup_fixtures();
        let out = renderer(&tmp).render("Arrays/two_sum_easy.txt");
        assert!(out.html.starts_with("<pre><code>https://gist.github.com"));
        assert_eq!(out.external_ref_id, None);
    }

    #[test]
    fn missing_file_is_error_payload() {
        let tmp = setup_fixtures();
        let out = renderer(&tmp).render("Arrays/nope.md");
        assert_eq!(out.html, ERROR_PAYLOAD);
        assert_eq!(out.external_ref_id, None);
        assert!(out.is_error());
    }

    #[test]
    fn directory_is_error_payload() {
        let tmp = setup_fixtures();
        assert!(renderer(&tmp).render("Arrays").is_error());
        assert!(matches!(
            renderer(&tmp).try_render("Arrays"),
            Err(ContentError::NotFound(_))
        ));
    }

    #[test]
    fn escaping_path_is_error_payload() {
        let tmp = setup_fixtures();
        assert!(renderer(&tmp).render("../etc/passwd").is_error());
        assert!(matches!(
            renderer(&tmp).try_render("Arrays/../../x.md"),
            Err(ContentError::OutsideRoot(_))
        ));
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_value(RenderedContent::error()).unwrap();
        assert_eq!(json["content"], ERROR_PAYLOAD);
        assert!(json["gistId"].is_null());
    }
}
