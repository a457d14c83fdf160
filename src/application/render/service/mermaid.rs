//! Server-side rendering of Mermaid diagrams through the `mmdc` CLI.
//!
//! Rendered SVGs are cached on disk under the SHA-256 of the diagram source,
//! so unchanged diagrams never spawn the CLI twice.

use std::{
    fs,
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Instant,
};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

const TARGET: &str = "application::render::mermaid";

#[derive(Debug, Error)]
pub(crate) enum DiagramError {
    #[error("failed to prepare diagram cache `{path}`: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("diagram i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("mermaid CLI `{cli}` is not installed")]
    Missing { cli: PathBuf },
    #[error("mermaid CLI exited with {exit_code:?}: {stderr}")]
    Cli {
        exit_code: Option<i32>,
        stderr: String,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct MermaidCli {
    cli_path: PathBuf,
    cache_dir: PathBuf,
}

impl MermaidCli {
    pub(crate) fn new(cli_path: PathBuf, cache_dir: PathBuf) -> Result<Self, DiagramError> {
        fs::create_dir_all(&cache_dir).map_err(|source| DiagramError::CacheDir {
            path: cache_dir.clone(),
            source,
        })?;
        Ok(Self {
            cli_path,
            cache_dir,
        })
    }

    pub(crate) fn render_svg(&self, source: &str) -> Result<String, DiagramError> {
        let started_at = Instant::now();
        let cache_path = self.cache_dir.join(format!("{}.svg", digest(source)));

        match fs::read_to_string(&cache_path) {
            Ok(svg) => {
                debug!(
                    target = TARGET,
                    result = "cache_hit",
                    cache_path = %cache_path.display(),
                    "diagram served from cache"
                );
                return Ok(svg);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                warn!(
                    target = TARGET,
                    cache_path = %cache_path.display(),
                    error = %err,
                    "unreadable diagram cache entry; re-rendering"
                );
            }
        }

        let mut input = NamedTempFile::new()?;
        input.write_all(source.as_bytes())?;
        input.flush()?;

        let output = tempfile::Builder::new()
            .suffix(".svg")
            .tempfile_in(&self.cache_dir)?;

        self.invoke(input.path(), output.path())?;

        match output.persist(&cache_path) {
            Ok(_) => {}
            // A concurrent build already stored the same diagram.
            Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(DiagramError::Io(err.error)),
        }

        let svg = fs::read_to_string(&cache_path)?;
        debug!(
            target = TARGET,
            result = "cache_miss",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            svg_bytes = svg.len(),
            "diagram rendered via CLI"
        );
        Ok(svg)
    }

    fn invoke(&self, input: &Path, output: &Path) -> Result<(), DiagramError> {
        let result = Command::new(&self.cli_path)
            .arg("--input")
            .arg(input)
            .arg("--output")
            .arg(output)
            .arg("--outputFormat")
            .arg("svg")
            .arg("--quiet")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    DiagramError::Missing {
                        cli: self.cli_path.clone(),
                    }
                } else {
                    DiagramError::Io(err)
                }
            })?;

        if result.status.success() {
            return Ok(());
        }

        Err(DiagramError::Cli {
            exit_code: result.status.code(),
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        })
    }
}

fn digest(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}
