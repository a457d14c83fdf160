use comrak::nodes::AstNode;

use crate::application::render::service::engine::{heading_level, html_block};
use crate::application::render::types::{RenderContext, RenderError};

use super::{DocumentPass, PassContext};

/// Places the metadata placeholder right after the first level-1 heading.
pub(crate) struct HeadingMetadataPass {
    placeholder: String,
}

impl HeadingMetadataPass {
    pub(crate) fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }
}

impl DocumentPass for HeadingMetadataPass {
    fn name(&self) -> &'static str {
        "heading-metadata"
    }

    fn runs_nested(&self) -> bool {
        false
    }

    fn applies_to(&self, document: &RenderContext) -> bool {
        !document.is_home_page
    }

    fn apply<'a>(
        &self,
        root: &'a AstNode<'a>,
        cx: &mut PassContext<'a, '_>,
    ) -> Result<(), RenderError> {
        let Some(heading) = root
            .descendants()
            .find(|node| heading_level(node) == Some(1))
        else {
            return Ok(());
        };

        heading.insert_after(cx.alloc(html_block(format!("{}\n", self.placeholder))));
        cx.outcome.placeholder_inserted = true;
        Ok(())
    }
}
