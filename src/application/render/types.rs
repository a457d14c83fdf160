use serde::Serialize;
use thiserror::Error;

use crate::domain::content::{ContentFile, Locale, SiteLayout};

/// Per-document state handed to the render pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// Source path of the document; used for logging only.
    pub source_path: String,
    pub is_home_page: bool,
    pub locale: Locale,
    pub raw_markdown: String,
}

impl RenderContext {
    pub fn new(source_path: impl Into<String>, raw_markdown: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            is_home_page: false,
            locale: Locale::Root,
            raw_markdown: raw_markdown.into(),
        }
    }

    /// Classify `file` against the site layout and capture its body.
    pub fn for_file(file: &ContentFile, layout: &SiteLayout) -> Self {
        Self {
            source_path: file.source_path().to_string(),
            is_home_page: layout.is_home_page(file.source_path()),
            locale: layout.locale_of(file.source_path()),
            raw_markdown: file.body().to_string(),
        }
    }

    pub fn home_page(mut self, is_home_page: bool) -> Self {
        self.is_home_page = is_home_page;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}

/// Entry of the document outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingInfo {
    pub level: u8,
    pub slug: String,
    pub text: String,
}

/// Final HTML for one document plus facts gathered while rendering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOutput {
    pub html: String,
    pub headings: Vec<HeadingInfo>,
    pub contains_code: bool,
    pub contains_diagram: bool,
    pub contains_nested: bool,
}

/// Closed set of admonition kinds understood by the markdown engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdmonitionKind {
    Note,
    Tip,
    Important,
    Warning,
    Caution,
}

/// Titles shown on admonitions of root-locale documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmonitionLabels {
    pub note: String,
    pub tip: String,
    pub important: String,
    pub warning: String,
    pub caution: String,
}

impl Default for AdmonitionLabels {
    fn default() -> Self {
        Self {
            note: "说明".to_string(),
            tip: "提示".to_string(),
            important: "重要".to_string(),
            warning: "警告".to_string(),
            caution: "危险".to_string(),
        }
    }
}

impl AdmonitionLabels {
    pub fn label_for(&self, kind: AdmonitionKind) -> &str {
        match kind {
            AdmonitionKind::Note => &self.note,
            AdmonitionKind::Tip => &self.tip,
            AdmonitionKind::Important => &self.important,
            AdmonitionKind::Warning => &self.warning,
            AdmonitionKind::Caution => &self.caution,
        }
    }
}

/// Structured errors surfaced by the rendering pipeline.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("html formatting failed: {message}")]
    Markdown { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("nested markdown block failed to render: {message}")]
    Nested { message: String },
    #[error("nested markdown blocks exceed the maximum depth of {limit}")]
    NestingTooDeep { limit: usize },
}

/// Render entry point. Implementations are deterministic: the same context
/// yields identical output or the same error.
pub trait RenderService: Send + Sync {
    fn render(&self, context: &RenderContext) -> Result<RenderOutput, RenderError>;

    /// Output of the bare markdown engine, without any pipeline pass.
    fn render_default(&self, markdown: &str) -> Result<String, RenderError>;
}
