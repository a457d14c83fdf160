//! Markdown rendering.
//!
//! The pipeline is pure: it takes a document's markdown plus its site context
//! and produces deterministic HTML, or a structured error. Writing the result
//! anywhere is the caller's business.

mod service;
mod types;

pub use service::{ComrakRenderService, NESTED_CONTAINER_CLASS, RenderPipelineConfig};
pub use types::{
    AdmonitionKind, AdmonitionLabels, HeadingInfo, RenderContext, RenderError, RenderOutput,
    RenderService,
};
