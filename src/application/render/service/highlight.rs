use syntect::{
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::render::types::RenderError;

const PLAIN_TEXT: &str = "text";

/// Default code renderer: syntect scopes emitted as `syntax-` prefixed classes.
pub(crate) struct CodeHighlighter {
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
}

impl CodeHighlighter {
    pub(crate) fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            class_style: ClassStyle::SpacedPrefixed { prefix: "syntax-" },
        }
    }

    /// Highlight `code` as a `<pre>` block. Unknown languages are rendered as
    /// plain text rather than rejected.
    pub(crate) fn highlight(
        &self,
        language: Option<&str>,
        meta: Option<&str>,
        code: &str,
    ) -> Result<String, RenderError> {
        let token = language
            .filter(|lang| !lang.is_empty())
            .unwrap_or(PLAIN_TEXT)
            .to_ascii_lowercase();
        let syntax = self
            .find_syntax(&token)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut source = code.to_string();
        if !source.ends_with('\n') {
            source.push('\n');
        }

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, self.class_style);
        for line in LinesWithEndings::from(source.as_str()) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|err| RenderError::Highlighting {
                    language: token.clone(),
                    message: err.to_string(),
                })?;
        }

        let language_attr = escape_html(&token);
        let meta_attr = meta
            .filter(|m| !m.is_empty())
            .map(|m| format!(" data-meta=\"{}\"", escape_html(m)))
            .unwrap_or_default();

        Ok(format!(
            "<pre class=\"syntax-highlight syntax-lang-{language_attr}\" data-language=\"{language_attr}\">\
             <code class=\"language-{language_attr} syntax-code\"{meta_attr}>{}</code></pre>",
            generator.finalize()
        ))
    }

    fn find_syntax(&self, token: &str) -> Option<&SyntaxReference> {
        self.syntax_set
            .find_syntax_by_token(token)
            .or_else(|| self.syntax_set.find_syntax_by_name(token))
            .or_else(|| self.syntax_set.find_syntax_by_extension(token))
    }
}

/// Escaped, unhighlighted `<pre>` block.
pub(crate) fn plain_block(class: &str, language: Option<&str>, literal: &str) -> String {
    let mut html = format!("<pre class=\"{class}\"");
    if let Some(language) = language.filter(|lang| !lang.is_empty()) {
        html.push_str(" data-language=\"");
        html.push_str(&escape_html(language));
        html.push('"');
    }
    html.push('>');
    html.push_str(&escape_html(literal));
    if !literal.ends_with('\n') {
        html.push('\n');
    }
    html.push_str("</pre>");
    html
}

/// Escape text for use in element content or a double-quoted attribute.
pub(crate) fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_language_gets_scoped_classes() {
        let highlighter = CodeHighlighter::new();
        let html = highlighter
            .highlight(Some("rust"), None, "fn main() {}")
            .expect("highlight");

        assert!(html.starts_with("<pre class=\"syntax-highlight syntax-lang-rust\""));
        assert!(html.contains("class=\"language-rust syntax-code\""));
        assert!(html.contains("syntax-"));
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let highlighter = CodeHighlighter::new();
        let html = highlighter
            .highlight(Some("no-such-lang"), Some("[demo]"), "a < b")
            .expect("highlight");

        assert!(html.contains("data-language=\"no-such-lang\""));
        assert!(html.contains("data-meta=\"[demo]\""));
        assert!(html.contains("&lt;"));
    }

    #[test]
    fn plain_block_escapes_content() {
        let html = plain_block("mermaid", None, "A --> B");
        assert_eq!(html, "<pre class=\"mermaid\">A --&gt; B\n</pre>");
    }
}
