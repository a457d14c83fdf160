use comrak::{Arena, nodes::AstNode};
use tracing::debug;

use crate::application::render::service::engine::replace_with_html;
use crate::application::render::types::RenderError;

use super::{DocumentPass, PassContext, TARGET, fenced_blocks};

pub const NESTED_CONTAINER_CLASS: &str = "nested-markdown";

/// Renders fences tagged with the marker word as markdown of their own.
///
/// The fence body goes through the same pass list one level deeper and the
/// result replaces the fence inside a container `div`, so its content never
/// reaches the code highlighter.
pub(crate) struct NestedFencePass {
    marker: String,
}

impl NestedFencePass {
    pub(crate) fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    fn is_marked(&self, info: &str) -> bool {
        info.split_whitespace().any(|word| word == self.marker)
    }
}

impl DocumentPass for NestedFencePass {
    fn name(&self) -> &'static str {
        "nested-markdown"
    }

    fn apply<'a>(
        &self,
        root: &'a AstNode<'a>,
        cx: &mut PassContext<'a, '_>,
    ) -> Result<(), RenderError> {
        for (node, info, literal) in fenced_blocks(root) {
            if !self.is_marked(&info) {
                continue;
            }

            let limit = cx.pipeline.max_depth();
            if cx.depth >= limit {
                return Err(RenderError::NestingTooDeep { limit });
            }

            let inner = render_nested(&literal, cx).map_err(nested_error)?;
            replace_with_html(
                node,
                format!("<div class=\"{NESTED_CONTAINER_CLASS}\">\n{inner}</div>\n"),
            );
            cx.outcome.nested_blocks += 1;
            debug!(
                target = TARGET,
                source_path = %cx.document.source_path,
                depth = cx.depth + 1,
                "nested markdown fence rendered"
            );
        }
        Ok(())
    }
}

fn render_nested(markdown: &str, cx: &mut PassContext<'_, '_>) -> Result<String, RenderError> {
    let arena = Arena::new();
    let root = cx.engine.parse(&arena, markdown);

    let mut nested = PassContext {
        arena: &arena,
        document: cx.document,
        engine: cx.engine,
        pipeline: cx.pipeline,
        depth: cx.depth + 1,
        outcome: &mut *cx.outcome,
    };
    cx.pipeline.run(root, &mut nested)?;

    let finished = cx.engine.finish(root)?;
    cx.outcome.nested_code_blocks += finished.code_blocks;
    Ok(finished.html)
}

fn nested_error(err: RenderError) -> RenderError {
    match err {
        RenderError::Nested { .. } | RenderError::NestingTooDeep { .. } => err,
        other => RenderError::Nested {
            message: other.to_string(),
        },
    }
}
