//! The rewrite table consumed by the serving layer.

use std::collections::{BTreeMap, btree_map};

use serde::Serialize;

/// Mapping from a file's default (source) path to the path it is served at.
///
/// Keys are unique by construction. Values may collide when two authors
/// declare the same permalink; see [`RewriteTable::conflicts`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RewriteTable {
    entries: BTreeMap<String, String>,
}

/// Two or more source files resolving to the same served path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteConflict {
    pub served_path: String,
    /// Sorted source paths claiming `served_path`.
    pub sources: Vec<String>,
}

impl RewriteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the served path for `source_path`, returning the previous value
    /// when the source was already present.
    pub fn insert(
        &mut self,
        source_path: impl Into<String>,
        served_path: impl Into<String>,
    ) -> Option<String> {
        self.entries.insert(source_path.into(), served_path.into())
    }

    pub fn rewrite(&self, source_path: &str) -> Option<&str> {
        self.entries.get(source_path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    pub fn served_paths(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    /// Served paths claimed by more than one source, ordered by served path.
    pub fn conflicts(&self) -> Vec<RouteConflict> {
        let mut claims: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for (source, served) in &self.entries {
            claims.entry(served.as_str()).or_default().push(source.clone());
        }

        claims
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(served_path, sources)| RouteConflict {
                served_path: served_path.to_string(),
                sources,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a RewriteTable {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Relative HTML file written for a served path.
///
/// `guide/intro.md` becomes `guide/intro.html`, a directory-style path such as
/// `/rust/` becomes `rust/index.html`, and an extension-less path gets `.html`
/// appended. Leading slashes are dropped so the result stays relative.
pub fn output_file(served_path: &str) -> String {
    let trimmed = served_path.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        return format!("{trimmed}index.html");
    }

    if let Some(stem) = trimmed.strip_suffix(".md") {
        return format!("{stem}.html");
    }

    if trimmed.ends_with(".html") {
        return trimmed.to_string();
    }

    format!("{trimmed}.html")
}
