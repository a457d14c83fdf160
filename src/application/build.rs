//! Site build: resolve routes, render every document, write the results.
//!
//! A document that fails to load, render or be written is recorded in the
//! report and never stops the others.

use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::application::{
    error::AppError,
    permalink::PermalinkResolver,
    render::{HeadingInfo, RenderContext, RenderService},
};
use crate::domain::{
    content::SiteLayout,
    routes::{RewriteTable, RouteConflict, output_file},
};
use crate::infra::{
    content::ContentScan,
    output::{OutputWriter, REPORT_FILE, ROUTES_FILE},
    telemetry::{DOCUMENTS_FAILED_TOTAL, DOCUMENTS_RENDERED_TOTAL, RENDER_MS, ROUTE_CONFLICTS_TOTAL},
};

const TARGET: &str = "application::build";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Load,
    Render,
    Write,
}

impl FailureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureStage::Load => "load",
            FailureStage::Render => "render",
            FailureStage::Write => "write",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Rendered {
        output_file: String,
        headings: Vec<HeadingInfo>,
        contains_code: bool,
        contains_diagram: bool,
        contains_nested: bool,
    },
    Failed {
        stage: FailureStage,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentOutcome {
    pub source_path: String,
    /// Absent when the document never made it into the rewrite table.
    pub served_path: Option<String>,
    #[serde(flatten)]
    pub status: DocumentStatus,
}

impl DocumentOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, DocumentStatus::Failed { .. })
    }
}

/// Result of one build, ordered by source path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub documents: Vec<DocumentOutcome>,
    pub conflicts: Vec<RouteConflict>,
}

impl BuildReport {
    pub fn rendered(&self) -> usize {
        self.documents.len() - self.failed()
    }

    pub fn failed(&self) -> usize {
        self.documents.iter().filter(|doc| doc.is_failed()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, source_path: &str) -> Option<&DocumentOutcome> {
        self.documents
            .iter()
            .find(|doc| doc.source_path == source_path)
    }
}

pub struct SiteBuilder<'a> {
    layout: &'a SiteLayout,
    resolver: PermalinkResolver,
    renderer: &'a dyn RenderService,
    writer: &'a OutputWriter,
}

impl<'a> SiteBuilder<'a> {
    pub fn new(
        layout: &'a SiteLayout,
        resolver: PermalinkResolver,
        renderer: &'a dyn RenderService,
        writer: &'a OutputWriter,
    ) -> Self {
        Self {
            layout,
            resolver,
            renderer,
            writer,
        }
    }

    /// Build every scanned document. Only a rejected rewrite table or a
    /// failure to write the route table or report aborts the build.
    pub fn build(&self, scan: ContentScan) -> Result<BuildReport, AppError> {
        let started_at = Instant::now();
        let ContentScan { files, failures } = scan;

        let table = self.resolver.resolve(&files)?;
        let conflicts = table.conflicts();
        if !conflicts.is_empty() {
            counter!(ROUTE_CONFLICTS_TOTAL).increment(conflicts.len() as u64);
        }

        let mut documents: Vec<DocumentOutcome> = failures
            .into_iter()
            .map(|err| {
                record_failure(FailureStage::Load);
                DocumentOutcome {
                    source_path: err.path().to_string(),
                    served_path: None,
                    status: DocumentStatus::Failed {
                        stage: FailureStage::Load,
                        message: err.to_string(),
                    },
                }
            })
            .collect();

        for file in &files {
            let context = RenderContext::for_file(file, self.layout);
            documents.push(self.build_document(&context, &table));
        }
        documents.sort_by(|a, b| a.source_path.cmp(&b.source_path));

        let report = BuildReport {
            documents,
            conflicts,
        };
        self.writer.write_json(ROUTES_FILE, &table)?;
        self.writer.write_json(REPORT_FILE, &report)?;

        info!(
            target = TARGET,
            rendered = report.rendered(),
            failed = report.failed(),
            conflicts = report.conflicts.len(),
            output_dir = %self.writer.root().display(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "site build finished"
        );
        Ok(report)
    }

    fn build_document(&self, context: &RenderContext, table: &RewriteTable) -> DocumentOutcome {
        let source_path = context.source_path.clone();
        let served_path = table
            .rewrite(&source_path)
            .unwrap_or(source_path.as_str())
            .to_string();

        let render_started = Instant::now();
        let rendered = self.renderer.render(context);
        histogram!(RENDER_MS).record(render_started.elapsed().as_secs_f64() * 1000.0);

        let status = match rendered {
            Ok(output) => {
                let relative = output_file(&served_path);
                match self.writer.write(&relative, &output.html) {
                    Ok(_) => {
                        counter!(DOCUMENTS_RENDERED_TOTAL).increment(1);
                        DocumentStatus::Rendered {
                            output_file: relative,
                            headings: output.headings,
                            contains_code: output.contains_code,
                            contains_diagram: output.contains_diagram,
                            contains_nested: output.contains_nested,
                        }
                    }
                    Err(err) => {
                        error!(
                            target = TARGET,
                            source_path = %source_path,
                            output_file = %relative,
                            error = %err,
                            "failed to write rendered document"
                        );
                        failed(FailureStage::Write, err.to_string())
                    }
                }
            }
            Err(err) => {
                warn!(
                    target = TARGET,
                    source_path = %source_path,
                    error = %err,
                    "document failed to render"
                );
                failed(FailureStage::Render, err.to_string())
            }
        };

        DocumentOutcome {
            source_path,
            served_path: Some(served_path),
            status,
        }
    }
}

fn failed(stage: FailureStage, message: String) -> DocumentStatus {
    record_failure(stage);
    DocumentStatus::Failed { stage, message }
}

fn record_failure(stage: FailureStage) {
    counter!(DOCUMENTS_FAILED_TOTAL, "stage" => stage.as_str()).increment(1);
}
