use comrak::nodes::AstNode;
use tracing::warn;

use crate::application::render::service::engine::{replace_with_html, split_info};
use crate::application::render::service::highlight::plain_block;
use crate::application::render::service::mermaid::MermaidCli;
use crate::application::render::types::RenderError;

use super::{DocumentPass, PassContext, TARGET, fenced_blocks};

const MERMAID: &str = "mermaid";

/// Turns `mermaid` fences into diagrams instead of highlighted code.
///
/// With a CLI configured the diagram is inlined as SVG; otherwise, or when
/// the CLI fails, the source is emitted for client-side rendering.
pub(crate) struct DiagramPass {
    cli: Option<MermaidCli>,
}

impl DiagramPass {
    pub(crate) fn new(cli: Option<MermaidCli>) -> Self {
        Self { cli }
    }

    fn render(&self, source: &str, cx: &PassContext<'_, '_>) -> String {
        let fallback = || plain_block(MERMAID, None, source);
        let Some(cli) = &self.cli else {
            return fallback();
        };

        match cli.render_svg(source) {
            Ok(svg) => format!(
                "<figure class=\"diagram\" data-role=\"diagram-{MERMAID}\">{}</figure>\n",
                svg.trim()
            ),
            Err(err) => {
                warn!(
                    target = TARGET,
                    source_path = %cx.document.source_path,
                    error = %err,
                    "diagram rendering failed; falling back to client-side source"
                );
                fallback()
            }
        }
    }
}

impl DocumentPass for DiagramPass {
    fn name(&self) -> &'static str {
        "diagrams"
    }

    fn apply<'a>(
        &self,
        root: &'a AstNode<'a>,
        cx: &mut PassContext<'a, '_>,
    ) -> Result<(), RenderError> {
        for (node, info, literal) in fenced_blocks(root) {
            let (language, _) = split_info(&info);
            if !language.is_some_and(|lang| lang.eq_ignore_ascii_case(MERMAID)) {
                continue;
            }
            let html = self.render(&literal, cx);
            replace_with_html(node, html);
            cx.outcome.diagrams += 1;
        }
        Ok(())
    }
}
