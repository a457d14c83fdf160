use comrak::nodes::AstNode;

use crate::application::render::service::engine::{html_block, split_info};
use crate::application::render::service::highlight::escape_html;
use crate::application::render::types::RenderError;

use super::{DocumentPass, PassContext, fenced_blocks};

/// Adds a title bar with a file-type icon above fences that name a file,
/// e.g. ```` ```ts [config.ts] ````.
pub(crate) struct FenceTitlePass;

impl DocumentPass for FenceTitlePass {
    fn name(&self) -> &'static str {
        "fence-titles"
    }

    fn apply<'a>(
        &self,
        root: &'a AstNode<'a>,
        cx: &mut PassContext<'a, '_>,
    ) -> Result<(), RenderError> {
        for (node, info, _) in fenced_blocks(root) {
            let (language, meta) = split_info(&info);
            let Some(title) = meta.and_then(bracketed_title) else {
                continue;
            };
            let icon = icon_for(title, language);
            let html = format!(
                "<div class=\"code-block-title\" data-icon=\"{icon}\">{}</div>\n",
                escape_html(title)
            );
            node.insert_before(cx.alloc(html_block(html)));
            cx.outcome.titled_fences += 1;
        }
        Ok(())
    }
}

fn bracketed_title(meta: &str) -> Option<&str> {
    let start = meta.find('[')?;
    let end = start + meta[start..].find(']')?;
    Some(meta[start + 1..end].trim()).filter(|title| !title.is_empty())
}

/// Icon name keyed on the title's file extension, then on the fence language.
fn icon_for(title: &str, language: Option<&str>) -> &'static str {
    let extension = title
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    extension
        .as_deref()
        .and_then(icon_by_key)
        .or_else(|| language.map(str::to_ascii_lowercase).as_deref().and_then(icon_by_key))
        .unwrap_or("code")
}

fn icon_by_key(key: &str) -> Option<&'static str> {
    let icon = match key {
        "ts" | "tsx" | "typescript" => "typescript",
        "js" | "jsx" | "mjs" | "javascript" => "javascript",
        "rs" | "rust" => "rust",
        "py" | "python" => "python",
        "sh" | "bash" | "zsh" | "shell" => "terminal",
        "json" => "json",
        "md" | "markdown" => "markdown",
        "toml" | "yaml" | "yml" => "settings",
        "vue" => "vue",
        "html" => "html",
        "css" | "scss" => "css",
        "go" => "go",
        _ => return None,
    };
    Some(icon)
}
