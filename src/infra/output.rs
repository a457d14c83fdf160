//! Output directory writer.

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use serde::Serialize;
use tracing::trace;

use super::error::InfraError;

const TARGET: &str = "infra::output";

pub const ROUTES_FILE: &str = "routes.json";
pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `contents` at `relative` below the output root, creating parent
    /// directories. Paths that would leave the output root are rejected.
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf, InfraError> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| InfraError::io(parent, err))?;
        }
        fs::write(&path, contents).map_err(|err| InfraError::io(&path, err))?;
        trace!(target = TARGET, path = %path.display(), bytes = contents.len(), "file written");
        Ok(path)
    }

    /// Pretty-printed JSON file at `relative`.
    pub fn write_json<T: Serialize>(&self, relative: &str, value: &T) -> Result<PathBuf, InfraError> {
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        self.write(relative, &json)
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, InfraError> {
        let relative = Path::new(relative);
        let escapes = relative.as_os_str().is_empty()
            || relative
                .components()
                .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(InfraError::io(
                relative,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "output path must stay inside the output directory",
                ),
            ));
        }
        Ok(self.root.join(relative))
    }
}
