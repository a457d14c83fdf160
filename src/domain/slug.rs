//! Anchor slugs for document headings.
//!
//! Notes on this site mix English and Chinese, so headings are transliterated
//! with the `pinyin` crate before `slug` lowercases and hyphenates them:
//! “所有权 Ownership” becomes `suo-you-quan-ownership`.

use std::collections::HashMap;

use pinyin::ToPinyin;
use slug::slugify;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("heading text is empty")]
    EmptyHeading,
    #[error("heading `{heading}` has no sluggable characters")]
    Unrepresentable { heading: String },
}

/// Derive the base anchor for a heading without any deduplication.
pub fn heading_slug(heading: &str) -> Result<String, SlugError> {
    if heading.trim().is_empty() {
        return Err(SlugError::EmptyHeading);
    }

    let slug = slugify(romanize(heading));
    if slug.is_empty() {
        return Err(SlugError::Unrepresentable {
            heading: heading.to_string(),
        });
    }

    Ok(slug)
}

/// Hands out anchors for the headings of a single document, in order.
///
/// Repeated headings receive `-2`, `-3`, … suffixes.
#[derive(Debug, Default)]
pub struct AnchorSlugger {
    seen: HashMap<String, usize>,
}

impl AnchorSlugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor_for(&mut self, heading: &str) -> Result<String, SlugError> {
        let base = heading_slug(heading)?;
        let count = self.seen.entry(base.clone()).or_default();
        *count += 1;

        Ok(match *count {
            1 => base,
            n => format!("{base}-{n}"),
        })
    }
}

fn romanize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }

        if let Some(syllable) = ch.to_pinyin() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            out.push_str(syllable.plain());
            out.push(' ');
        } else if ch.is_whitespace() {
            out.push(' ');
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_headings_are_transliterated() {
        assert_eq!(
            heading_slug("所有权 Ownership").expect("slug"),
            "suo-you-quan-ownership"
        );
    }

    #[test]
    fn duplicate_headings_get_suffixes() {
        let mut slugger = AnchorSlugger::new();
        assert_eq!(slugger.anchor_for("Example").expect("slug"), "example");
        assert_eq!(slugger.anchor_for("Example").expect("slug"), "example-2");
        assert_eq!(slugger.anchor_for("Example").expect("slug"), "example-3");
    }

    #[test]
    fn punctuation_only_heading_is_unrepresentable() {
        assert!(matches!(
            heading_slug("!!!"),
            Err(SlugError::Unrepresentable { .. })
        ));
        assert_eq!(heading_slug("  "), Err(SlugError::EmptyHeading));
    }
}
