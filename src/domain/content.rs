//! Content files as scanned from the docs tree.
//!
//! A content file is immutable once loaded: its source path, the YAML
//! front-matter block at the top of the file, and the markdown body that
//! follows it. [`SiteLayout`] classifies files by path (home page, locale)
//! without looking at their contents.

use std::{collections::BTreeMap, fmt, path::Path};

use serde::Deserialize;

use super::error::ContentError;

const FRONT_MATTER_FENCE: &str = "---";

/// Metadata declared at the top of a content file.
///
/// Only `permalink` is interpreted by the routing layer; every other key is
/// kept verbatim for downstream consumers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml_ng::Value>,
}

impl FrontMatter {
    pub fn with_permalink(permalink: impl Into<String>) -> Self {
        Self {
            permalink: Some(permalink.into()),
            extra: BTreeMap::new(),
        }
    }

    fn from_yaml(path: &str, yaml: &str) -> Result<Self, ContentError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml)
            .map_err(|err| ContentError::front_matter(path, err.to_string()))?;
        if value.is_null() {
            return Ok(Self::default());
        }
        if !value.is_mapping() {
            return Err(ContentError::front_matter(
                path,
                "front-matter must be a mapping of keys to values",
            ));
        }

        serde_yaml_ng::from_value(value)
            .map_err(|err| ContentError::front_matter(path, err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentFile {
    source_path: String,
    front_matter: FrontMatter,
    body: String,
}

impl ContentFile {
    pub fn new(
        source_path: impl Into<String>,
        front_matter: FrontMatter,
        body: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            front_matter,
            body: body.into(),
        }
    }

    /// Split `raw` into front-matter and body and parse the front-matter block.
    ///
    /// A file that does not open with a `---` line, or whose opening fence is
    /// never closed, has no front-matter and the whole input becomes the body.
    pub fn parse(source_path: impl Into<String>, raw: &str) -> Result<Self, ContentError> {
        let source_path = source_path.into();
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let (front_matter, body) = match split_front_matter(raw) {
            Some((yaml, body)) => (FrontMatter::from_yaml(&source_path, yaml)?, body),
            None => (FrontMatter::default(), raw),
        };

        Ok(Self {
            source_path,
            front_matter,
            body: body.to_string(),
        })
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn front_matter(&self) -> &FrontMatter {
        &self.front_matter
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The author-declared permalink, when present and not blank.
    pub fn declared_permalink(&self) -> Option<&str> {
        self.front_matter
            .permalink
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

fn split_front_matter(raw: &str) -> Option<(&str, &str)> {
    let first_line_end = raw.find('\n')?;
    if raw[..first_line_end].trim_end() != FRONT_MATTER_FENCE {
        return None;
    }

    let rest = &raw[first_line_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

/// Render a filesystem path relative to the content root as a source path.
pub fn source_path_from(relative: &Path) -> Result<String, ContentError> {
    let mut segments = Vec::new();
    for component in relative.components() {
        let segment = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| ContentError::NonUtf8Path {
                path: relative.display().to_string(),
            })?;
        segments.push(segment);
    }
    Ok(segments.join("/"))
}

/// Locale a document belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    Root,
    Named(String),
}

impl Locale {
    pub fn is_root(&self) -> bool {
        matches!(self, Locale::Root)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Locale::Root => "root",
            Locale::Named(name) => name.as_str(),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path-based classification of content files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    home_pages: Vec<String>,
    locales: Vec<String>,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            home_pages: vec!["index.md".to_string()],
            locales: Vec::new(),
        }
    }
}

impl SiteLayout {
    pub fn new(home_pages: Vec<String>, locales: Vec<String>) -> Self {
        Self {
            home_pages,
            locales,
        }
    }

    /// Exact match against the configured home page paths.
    pub fn is_home_page(&self, source_path: &str) -> bool {
        self.home_pages.iter().any(|home| home == source_path)
    }

    /// The first path segment selects a named locale; anything else is root.
    pub fn locale_of(&self, source_path: &str) -> Locale {
        let Some((first, _)) = source_path.split_once('/') else {
            return Locale::Root;
        };

        self.locales
            .iter()
            .find(|locale| locale.as_str() == first)
            .map(|locale| Locale::Named(locale.clone()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_permalink_and_keeps_other_keys() {
        let raw = "---\ntitle: Ownership\npermalink: /rust/ownership\ntags: [rust]\n---\n# Ownership\n";
        let file = ContentFile::parse("rust/ownership.md", raw).expect("parse");

        assert_eq!(file.declared_permalink(), Some("/rust/ownership"));
        assert!(file.front_matter().extra.contains_key("title"));
        assert!(file.front_matter().extra.contains_key("tags"));
        assert_eq!(file.body(), "# Ownership\n");
    }

    #[test]
    fn parse_without_front_matter_keeps_whole_body() {
        let file = ContentFile::parse("notes.md", "# Notes\n\ntext\n").expect("parse");
        assert_eq!(file.front_matter(), &FrontMatter::default());
        assert_eq!(file.body(), "# Notes\n\ntext\n");
    }

    #[test]
    fn unterminated_front_matter_is_treated_as_body() {
        let raw = "---\n\nJust a rule above.\n";
        let file = ContentFile::parse("rule.md", raw).expect("parse");
        assert_eq!(file.body(), raw);
        assert!(file.declared_permalink().is_none());
    }

    #[test]
    fn empty_front_matter_block_is_allowed() {
        let file = ContentFile::parse("empty.md", "---\n---\nbody\n").expect("parse");
        assert_eq!(file.front_matter(), &FrontMatter::default());
        assert_eq!(file.body(), "body\n");
    }

    #[test]
    fn malformed_front_matter_is_reported_with_path() {
        let err = ContentFile::parse("bad.md", "---\npermalink: [unclosed\n---\n")
            .expect_err("malformed yaml");
        assert!(matches!(err, ContentError::FrontMatter { .. }));
        assert_eq!(err.path(), "bad.md");
    }

    #[test]
    fn scalar_front_matter_is_rejected() {
        let err = ContentFile::parse("scalar.md", "---\njust text\n---\n").expect_err("scalar");
        assert!(matches!(err, ContentError::FrontMatter { .. }));
    }

    #[test]
    fn blank_permalink_counts_as_missing() {
        let file = ContentFile::new("a.md", FrontMatter::with_permalink("   "), "");
        assert!(file.declared_permalink().is_none());
    }

    #[test]
    fn layout_detects_home_page_by_exact_path() {
        let layout = SiteLayout::default();
        assert!(layout.is_home_page("index.md"));
        assert!(!layout.is_home_page("guide/index.md"));
        assert!(!layout.is_home_page("./index.md"));
    }

    #[test]
    fn layout_resolves_locale_from_first_segment() {
        let layout = SiteLayout::new(vec!["index.md".into()], vec!["en".into()]);
        assert_eq!(layout.locale_of("en/guide.md"), Locale::Named("en".into()));
        assert_eq!(layout.locale_of("guide/en.md"), Locale::Root);
        assert_eq!(layout.locale_of("en.md"), Locale::Root);
        assert!(layout.locale_of("rust/intro.md").is_root());
    }

    #[test]
    fn source_path_uses_forward_slashes() {
        let path = Path::new("guide").join("intro.md");
        assert_eq!(source_path_from(&path).expect("utf-8"), "guide/intro.md");
    }
}
