//! Front-matter permalinks to the site's rewrite table.

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{
    content::ContentFile,
    routes::{RewriteTable, RouteConflict},
};

const TARGET: &str = "application::permalink";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{} served path(s) claimed by more than one document: {}", .conflicts.len(), describe(.conflicts))]
    Conflicts { conflicts: Vec<RouteConflict> },
}

fn describe(conflicts: &[RouteConflict]) -> String {
    conflicts
        .iter()
        .map(|conflict| format!("`{}` <- {}", conflict.served_path, conflict.sources.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Builds the rewrite table from every file's declared permalink.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermalinkResolver {
    strict: bool,
}

impl PermalinkResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject tables in which two documents share a served path.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// One entry per file: the trimmed permalink when declared, the source
    /// path otherwise. Shared served paths are logged, and fail the call in
    /// strict mode.
    pub fn resolve(&self, files: &[ContentFile]) -> Result<RewriteTable, ResolveError> {
        let mut table = RewriteTable::new();
        for file in files {
            let served = file.declared_permalink().unwrap_or(file.source_path());
            if let Some(previous) = table.insert(file.source_path(), served) {
                debug!(
                    target = TARGET,
                    source_path = file.source_path(),
                    previous = %previous,
                    "source listed twice; keeping the later entry"
                );
            }
        }

        let conflicts = table.conflicts();
        for conflict in &conflicts {
            warn!(
                target = TARGET,
                served_path = %conflict.served_path,
                sources = %conflict.sources.join(", "),
                "served path claimed by more than one document"
            );
        }

        if self.strict && !conflicts.is_empty() {
            return Err(ResolveError::Conflicts { conflicts });
        }

        debug!(
            target = TARGET,
            entries = table.len(),
            rewritten = table.iter().filter(|(source, served)| source != served).count(),
            "rewrite table resolved"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::FrontMatter;

    fn file(path: &str, permalink: Option<&str>) -> ContentFile {
        let front_matter = permalink
            .map(FrontMatter::with_permalink)
            .unwrap_or_default();
        ContentFile::new(path, front_matter, "# Body\n")
    }

    #[test]
    fn blank_permalink_maps_to_identity() {
        let table = PermalinkResolver::new()
            .resolve(&[file("guide/a.md", Some("   "))])
            .expect("resolve");
        assert_eq!(table.rewrite("guide/a.md"), Some("guide/a.md"));
    }

    #[test]
    fn strict_mode_rejects_shared_served_paths() {
        let files = [
            file("a.md", Some("shared.md")),
            file("b.md", Some(" shared.md ")),
        ];

        let lenient = PermalinkResolver::new().resolve(&files).expect("lenient");
        assert_eq!(lenient.len(), 2);

        let err = PermalinkResolver::new()
            .strict(true)
            .resolve(&files)
            .expect_err("strict");
        let ResolveError::Conflicts { conflicts } = &err;
        assert_eq!(conflicts[0].sources, vec!["a.md", "b.md"]);
        assert!(err.to_string().contains("`shared.md` <- a.md, b.md"));
    }
}
