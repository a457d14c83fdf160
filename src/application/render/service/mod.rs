mod config;
mod engine;
mod highlight;
mod mermaid;
mod passes;

use std::{path::PathBuf, time::Instant};

use comrak::Arena;
use tracing::{debug, warn};

use crate::application::render::types::{
    AdmonitionLabels, RenderContext, RenderError, RenderOutput, RenderService,
};
use crate::config::{
    DEFAULT_MAX_NESTING_DEPTH, DEFAULT_MERMAID_CACHE_DIR, DEFAULT_METADATA_PLACEHOLDER,
    DEFAULT_NESTED_FENCE_MARKER, RenderSettings,
};

use self::engine::{MarkdownEngine, collect_outline};
use self::mermaid::MermaidCli;
use self::passes::{
    AdmonitionLabelPass, DiagramPass, FenceTitlePass, HeadingMetadataPass, NestedFencePass,
    PassContext, PassOutcome, RenderPipeline,
};

pub use self::passes::NESTED_CONTAINER_CLASS;

const TARGET: &str = "application::render::service";

/// Comrak-based render pipeline: parse, apply the pass list, highlight the
/// remaining code and format.
pub struct ComrakRenderService {
    engine: MarkdownEngine,
    pipeline: RenderPipeline,
}

#[derive(Debug, Clone)]
pub struct RenderPipelineConfig {
    pub metadata_placeholder: String,
    pub nested_fence_marker: String,
    pub max_nesting_depth: usize,
    pub admonition_labels: AdmonitionLabels,
    /// Server-side diagram rendering is enabled only when a CLI is set.
    pub mermaid_cli_path: Option<PathBuf>,
    pub mermaid_cache_dir: PathBuf,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            metadata_placeholder: DEFAULT_METADATA_PLACEHOLDER.to_string(),
            nested_fence_marker: DEFAULT_NESTED_FENCE_MARKER.to_string(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            admonition_labels: AdmonitionLabels::default(),
            mermaid_cli_path: None,
            mermaid_cache_dir: PathBuf::from(DEFAULT_MERMAID_CACHE_DIR),
        }
    }
}

impl From<&RenderSettings> for RenderPipelineConfig {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            metadata_placeholder: settings.metadata_placeholder.clone(),
            nested_fence_marker: settings.nested_fence_marker.clone(),
            max_nesting_depth: settings.max_nesting_depth,
            admonition_labels: settings.admonition_labels.clone(),
            mermaid_cli_path: settings.mermaid_cli_path.clone(),
            mermaid_cache_dir: settings.mermaid_cache_dir.clone(),
        }
    }
}

impl ComrakRenderService {
    pub fn new(config: RenderPipelineConfig) -> Self {
        let mermaid = config.mermaid_cli_path.clone().and_then(|cli_path| {
            match MermaidCli::new(cli_path, config.mermaid_cache_dir.clone()) {
                Ok(cli) => Some(cli),
                Err(err) => {
                    warn!(
                        target = TARGET,
                        error = %err,
                        cache_dir = %config.mermaid_cache_dir.display(),
                        "mermaid renderer unavailable; diagrams fall back to client-side rendering"
                    );
                    None
                }
            }
        });

        let pipeline = RenderPipeline::new(config.max_nesting_depth)
            .with_pass(HeadingMetadataPass::new(config.metadata_placeholder))
            .with_pass(AdmonitionLabelPass::new(config.admonition_labels))
            .with_pass(NestedFencePass::new(config.nested_fence_marker))
            .with_pass(DiagramPass::new(mermaid))
            .with_pass(FenceTitlePass);

        Self {
            engine: MarkdownEngine::new(),
            pipeline,
        }
    }

    /// Names of the configured passes, in the order they run.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.pipeline.pass_names()
    }
}

impl Default for ComrakRenderService {
    fn default() -> Self {
        Self::new(RenderPipelineConfig::default())
    }
}

impl RenderService for ComrakRenderService {
    fn render(&self, context: &RenderContext) -> Result<RenderOutput, RenderError> {
        let started_at = Instant::now();
        let arena = Arena::new();
        let root = self.engine.parse(&arena, &context.raw_markdown);

        let mut outcome = PassOutcome::default();
        if context.is_home_page {
            debug!(
                target = TARGET,
                source_path = %context.source_path,
                "home page rendered without passes"
            );
        } else {
            let mut cx = PassContext {
                arena: &arena,
                document: context,
                engine: &self.engine,
                pipeline: &self.pipeline,
                depth: 0,
                outcome: &mut outcome,
            };
            self.pipeline.run(root, &mut cx)?;
        }

        let headings = collect_outline(root);
        let finished = self.engine.finish(root)?;

        debug!(
            target = TARGET,
            source_path = %context.source_path,
            locale = %context.locale,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            placeholder = outcome.placeholder_inserted,
            admonitions = outcome.labelled_admonitions,
            nested = outcome.nested_blocks,
            diagrams = outcome.diagrams,
            "document rendered"
        );

        Ok(RenderOutput {
            html: finished.html,
            headings,
            contains_code: finished.code_blocks + outcome.nested_code_blocks > 0,
            contains_diagram: outcome.diagrams > 0,
            contains_nested: outcome.nested_blocks > 0,
        })
    }

    fn render_default(&self, markdown: &str) -> Result<String, RenderError> {
        self.engine.render_default(markdown)
    }
}
