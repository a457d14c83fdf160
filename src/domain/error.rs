use thiserror::Error;

/// Failures raised while turning a file on disk into a [`ContentFile`](super::content::ContentFile).
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read content file `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid front-matter in `{path}`: {message}")]
    FrontMatter { path: String, message: String },
    #[error("content path `{path}` is not valid UTF-8")]
    NonUtf8Path { path: String },
}

impl ContentError {
    pub fn read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn front_matter(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FrontMatter {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Source path of the file that failed to load.
    pub fn path(&self) -> &str {
        match self {
            ContentError::Read { path, .. }
            | ContentError::FrontMatter { path, .. }
            | ContentError::NonUtf8Path { path } => path.as_str(),
        }
    }
}
