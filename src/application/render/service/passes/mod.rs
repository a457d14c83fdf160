//! Document passes applied between parsing and formatting.
//!
//! Each pass rewrites the comrak AST of one document. The pipeline owns an
//! ordered list of passes; nested markdown fences re-enter the same list at a
//! greater depth, where passes that only make sense for the page as a whole
//! are skipped.

mod admonition;
mod diagram;
mod fence_title;
mod heading;
mod nested;

use comrak::{
    Arena,
    nodes::{AstNode, NodeValue},
};
use tracing::trace;

use crate::application::render::types::{RenderContext, RenderError};

use super::engine::{MarkdownEngine, code_block};

pub(crate) use admonition::AdmonitionLabelPass;
pub(crate) use diagram::DiagramPass;
pub(crate) use fence_title::FenceTitlePass;
pub(crate) use heading::HeadingMetadataPass;
pub(crate) use nested::NestedFencePass;
pub use nested::NESTED_CONTAINER_CLASS;

const TARGET: &str = "application::render::passes";

/// Facts recorded by passes while rewriting a document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct PassOutcome {
    pub(crate) placeholder_inserted: bool,
    pub(crate) labelled_admonitions: usize,
    pub(crate) nested_blocks: usize,
    pub(crate) diagrams: usize,
    pub(crate) titled_fences: usize,
    /// Code blocks highlighted inside nested documents.
    pub(crate) nested_code_blocks: usize,
}

/// State shared by the passes of one (possibly nested) document.
pub(crate) struct PassContext<'a, 'r> {
    pub(crate) arena: &'a Arena<'a>,
    pub(crate) document: &'r RenderContext,
    pub(crate) engine: &'r MarkdownEngine,
    pub(crate) pipeline: &'r RenderPipeline,
    /// Zero for the page itself, one more for every enclosing marked fence.
    pub(crate) depth: usize,
    pub(crate) outcome: &'r mut PassOutcome,
}

impl<'a> PassContext<'a, '_> {
    pub(crate) fn alloc(&self, value: NodeValue) -> &'a AstNode<'a> {
        self.arena.alloc(AstNode::from(value))
    }
}

pub(crate) trait DocumentPass: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the pass also runs inside nested markdown fences.
    fn runs_nested(&self) -> bool {
        true
    }

    fn applies_to(&self, _document: &RenderContext) -> bool {
        true
    }

    fn apply<'a>(
        &self,
        root: &'a AstNode<'a>,
        cx: &mut PassContext<'a, '_>,
    ) -> Result<(), RenderError>;
}

/// Ordered list of passes.
pub(crate) struct RenderPipeline {
    passes: Vec<Box<dyn DocumentPass>>,
    max_depth: usize,
}

impl RenderPipeline {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            passes: Vec::new(),
            max_depth,
        }
    }

    pub(crate) fn with_pass(mut self, pass: impl DocumentPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    pub(crate) fn run<'a>(
        &self,
        root: &'a AstNode<'a>,
        cx: &mut PassContext<'a, '_>,
    ) -> Result<(), RenderError> {
        for pass in &self.passes {
            if cx.depth > 0 && !pass.runs_nested() {
                continue;
            }
            if !pass.applies_to(cx.document) {
                continue;
            }
            trace!(
                target = TARGET,
                pass = pass.name(),
                depth = cx.depth,
                source_path = %cx.document.source_path,
                "applying pass"
            );
            pass.apply(root, cx)?;
        }
        Ok(())
    }
}

/// Fenced code blocks of the tree as `(node, info, literal)`, collected up
/// front so passes can rewrite nodes while walking the list.
pub(crate) fn fenced_blocks<'a>(root: &'a AstNode<'a>) -> Vec<(&'a AstNode<'a>, String, String)> {
    root.descendants()
        .filter(|node| is_fenced(node))
        .filter_map(|node| code_block(node).map(|(info, literal)| (node, info, literal)))
        .collect()
}

fn is_fenced(node: &AstNode<'_>) -> bool {
    matches!(&node.data.borrow().value, NodeValue::CodeBlock(block) if block.fenced)
}
