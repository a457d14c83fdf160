use comrak::{
    Arena,
    nodes::{AstNode, NodeHtmlBlock, NodeValue},
    options::Options,
    parse_document,
};

use crate::application::render::types::{HeadingInfo, RenderError};
use crate::domain::slug::AnchorSlugger;

use super::{config::default_options, highlight::CodeHighlighter};

/// The bare markdown engine: comrak parsing, default code highlighting and
/// HTML formatting. Pipeline passes run between [`parse`](Self::parse) and
/// [`finish`](Self::finish).
pub(crate) struct MarkdownEngine {
    options: Options<'static>,
    highlighter: CodeHighlighter,
}

pub(crate) struct FinishedHtml {
    pub(crate) html: String,
    pub(crate) code_blocks: usize,
}

impl MarkdownEngine {
    pub(crate) fn new() -> Self {
        Self {
            options: default_options(),
            highlighter: CodeHighlighter::new(),
        }
    }

    pub(crate) fn parse<'a>(&self, arena: &'a Arena<'a>, markdown: &str) -> &'a AstNode<'a> {
        parse_document(arena, markdown, &self.options)
    }

    /// Highlight every code block still present in the tree, then format it.
    pub(crate) fn finish<'a>(&self, root: &'a AstNode<'a>) -> Result<FinishedHtml, RenderError> {
        let code_blocks = self.highlight_code_blocks(root)?;

        let mut html = String::new();
        comrak::format_html(root, &self.options, &mut html).map_err(|err| {
            RenderError::Markdown {
                message: err.to_string(),
            }
        })?;

        Ok(FinishedHtml { html, code_blocks })
    }

    pub(crate) fn render_default(&self, markdown: &str) -> Result<String, RenderError> {
        let arena = Arena::new();
        let root = self.parse(&arena, markdown);
        Ok(self.finish(root)?.html)
    }

    fn highlight_code_blocks<'a>(&self, root: &'a AstNode<'a>) -> Result<usize, RenderError> {
        let blocks: Vec<_> = root
            .descendants()
            .filter_map(|node| code_block(node).map(|(info, literal)| (node, info, literal)))
            .collect();

        for (node, info, literal) in &blocks {
            let (language, meta) = split_info(info);
            let html = self.highlighter.highlight(language, meta, literal)?;
            replace_with_html(node, html);
        }

        Ok(blocks.len())
    }
}

/// `(info, literal)` of a code block node.
pub(crate) fn code_block(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    match &data.value {
        NodeValue::CodeBlock(block) => Some((block.info.trim().to_string(), block.literal.clone())),
        _ => None,
    }
}

/// Language token and the rest of a fence info string.
pub(crate) fn split_info(info: &str) -> (Option<&str>, Option<&str>) {
    let info = info.trim();
    match info.split_once(char::is_whitespace) {
        Some((language, meta)) => (Some(language), Some(meta.trim()).filter(|m| !m.is_empty())),
        None if info.is_empty() => (None, None),
        None => (Some(info), None),
    }
}

pub(crate) fn replace_with_html(node: &AstNode<'_>, html: String) {
    let mut data = node.data.borrow_mut();
    data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
        block_type: 0,
        literal: html,
    });
}

pub(crate) fn html_block(html: String) -> NodeValue {
    NodeValue::HtmlBlock(NodeHtmlBlock {
        block_type: 0,
        literal: html,
    })
}

/// Outline of the document's headings, in order. Headings without any
/// sluggable text are left out.
pub(crate) fn collect_outline<'a>(root: &'a AstNode<'a>) -> Vec<HeadingInfo> {
    let mut slugger = AnchorSlugger::new();
    root.descendants()
        .filter_map(|node| {
            let level = heading_level(node)?;
            let text = inline_text(node)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            let slug = slugger.anchor_for(&text).ok()?;
            Some(HeadingInfo { level, slug, text })
        })
        .collect()
}

pub(crate) fn heading_level(node: &AstNode<'_>) -> Option<u8> {
    match &node.data.borrow().value {
        NodeValue::Heading(heading) => Some(heading.level),
        _ => None,
    }
}

fn inline_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    for descendant in node.descendants().skip(1) {
        match &descendant.data.borrow().value {
            NodeValue::Text(value) => text.push_str(value),
            NodeValue::Code(code) => text.push_str(&code.literal),
            NodeValue::LineBreak | NodeValue::SoftBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_info_separates_language_and_meta() {
        assert_eq!(split_info("rust"), (Some("rust"), None));
        assert_eq!(
            split_info("ts [config.ts]"),
            (Some("ts"), Some("[config.ts]"))
        );
        assert_eq!(split_info("  "), (None, None));
    }

    #[test]
    fn finish_highlights_fenced_code() {
        let engine = MarkdownEngine::new();
        let html = engine
            .render_default("```rust\nlet x = 1;\n```\n")
            .expect("render");
        assert!(html.contains("syntax-highlight syntax-lang-rust"));
        assert!(!html.contains("<pre><code"));
    }

    #[test]
    fn outline_slugs_headings_in_order() {
        let engine = MarkdownEngine::new();
        let arena = Arena::new();
        let root = engine.parse(&arena, "# 所有权\n\n## Move `semantics`\n\n## Move semantics\n");

        let outline = collect_outline(root);
        let slugs: Vec<_> = outline.iter().map(|h| h.slug.as_str()).collect();
        assert_eq!(slugs, ["suo-you-quan", "move-semantics", "move-semantics-2"]);
        assert_eq!(outline[1].text, "Move semantics");
        assert_eq!(outline[0].level, 1);
    }
}
