use comrak::nodes::{AlertType, AstNode, NodeValue};

use crate::application::render::types::{
    AdmonitionKind, AdmonitionLabels, RenderContext, RenderError,
};

use super::{DocumentPass, PassContext};

/// Gives untitled admonitions of root-locale documents their localized title.
///
/// Only alert nodes are touched, so prose or code that happens to contain the
/// English label text is left alone. Explicit titles win.
pub(crate) struct AdmonitionLabelPass {
    labels: AdmonitionLabels,
}

impl AdmonitionLabelPass {
    pub(crate) fn new(labels: AdmonitionLabels) -> Self {
        Self { labels }
    }
}

impl DocumentPass for AdmonitionLabelPass {
    fn name(&self) -> &'static str {
        "admonition-labels"
    }

    fn applies_to(&self, document: &RenderContext) -> bool {
        !document.is_home_page && document.locale.is_root()
    }

    fn apply<'a>(
        &self,
        root: &'a AstNode<'a>,
        cx: &mut PassContext<'a, '_>,
    ) -> Result<(), RenderError> {
        for node in root.descendants() {
            let mut data = node.data.borrow_mut();
            let NodeValue::Alert(alert) = &mut data.value else {
                continue;
            };
            if alert.title.is_some() {
                continue;
            }
            let kind = kind_of(alert.alert_type);
            alert.title = Some(self.labels.label_for(kind).to_string());
            cx.outcome.labelled_admonitions += 1;
        }
        Ok(())
    }
}

fn kind_of(alert_type: AlertType) -> AdmonitionKind {
    match alert_type {
        AlertType::Note => AdmonitionKind::Note,
        AlertType::Tip => AdmonitionKind::Tip,
        AlertType::Important => AdmonitionKind::Important,
        AlertType::Warning => AdmonitionKind::Warning,
        AlertType::Caution => AdmonitionKind::Caution,
    }
}
