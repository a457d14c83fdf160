//! Content directory scan.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::domain::{
    content::{ContentFile, source_path_from},
    error::ContentError,
};

use super::error::InfraError;

const TARGET: &str = "infra::content";
const MARKDOWN_EXTENSION: &str = "md";

/// Markdown files found under a content root. Files that could not be read
/// or parsed are reported next to the ones that loaded.
#[derive(Debug, Default)]
pub struct ContentScan {
    pub files: Vec<ContentFile>,
    pub failures: Vec<ContentError>,
}

/// Load every `.md` file under `root`, in path order. Hidden files and
/// directories are skipped.
pub fn scan(root: &Path) -> Result<ContentScan, InfraError> {
    let metadata = fs::metadata(root).map_err(|err| InfraError::io(root, err))?;
    if !metadata.is_dir() {
        return Err(InfraError::io(
            root,
            io::Error::new(io::ErrorKind::NotADirectory, "content root is not a directory"),
        ));
    }

    let mut scan = ContentScan::default();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(|path| relative_display(root, path))
                    .unwrap_or_default();
                warn!(target = TARGET, path = %path, error = %err, "skipping unreadable entry");
                scan.failures
                    .push(ContentError::read(path, io::Error::other(err.to_string())));
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }

        match load_entry(root, entry.path()) {
            Ok(file) => scan.files.push(file),
            Err(err) => {
                warn!(target = TARGET, path = err.path(), error = %err, "content file rejected");
                scan.failures.push(err);
            }
        }
    }

    debug!(
        target = TARGET,
        root = %root.display(),
        files = scan.files.len(),
        failures = scan.failures.len(),
        "content scanned"
    );
    Ok(scan)
}

/// Load one file from anywhere on disk, treating it as `source_path`.
pub fn load_file(path: &Path, source_path: &str) -> Result<ContentFile, ContentError> {
    let raw = fs::read_to_string(path).map_err(|err| ContentError::read(source_path, err))?;
    ContentFile::parse(source_path, &raw)
}

fn load_entry(root: &Path, path: &Path) -> Result<ContentFile, ContentError> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let source_path = source_path_from(relative)?;
    load_file(path, &source_path)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MARKDOWN_EXTENSION))
}

fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(PathBuf::from)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
