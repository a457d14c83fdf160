use thiserror::Error;

use crate::{
    application::{permalink::ResolveError, render::RenderError},
    config::LoadError,
    domain::error::ContentError,
    infra::error::InfraError,
};

/// Top-level failure of a `leafpress` command.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("{failed} of {total} documents failed")]
    BuildFailed { failed: usize, total: usize },
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code reported by the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => 2,
            _ => 1,
        }
    }
}
