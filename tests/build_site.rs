use std::fs;
use std::path::Path;

use leafpress::application::build::{DocumentStatus, FailureStage, SiteBuilder};
use leafpress::application::error::AppError;
use leafpress::application::permalink::PermalinkResolver;
use leafpress::application::render::{
    ComrakRenderService, RenderContext, RenderError, RenderOutput, RenderPipelineConfig,
    RenderService,
};
use leafpress::domain::content::SiteLayout;
use leafpress::infra::content;
use leafpress::infra::output::{OutputWriter, REPORT_FILE, ROUTES_FILE};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dirs");
    }
    fs::write(path, contents).expect("write file");
}

fn seed_site(root: &Path) {
    write(root, "index.md", "# Home\n\n> [!TIP]\n> Start here.\n");
    write(
        root,
        "rust/ownership.md",
        "---\npermalink: /rust/ownership/\n---\n# Ownership\n\n> [!TIP]\n> Borrow first.\n",
    );
    write(root, "en/intro.md", "# Intro\n\n> [!TIP]\n> Welcome.\n");
    write(root, "broken.md", "---\npermalink: [oops\n---\n# Broken\n");
    write(
        root,
        "deep.md",
        "# Deep\n\n`````md render\n````md render\ntoo deep\n````\n`````\n",
    );
}

fn layout() -> SiteLayout {
    SiteLayout::new(vec!["index.md".to_string()], vec!["en".to_string()])
}

#[test]
fn failing_documents_do_not_stop_the_build() {
    let content_dir = TempDir::new().expect("content dir");
    let output_dir = TempDir::new().expect("output dir");
    seed_site(content_dir.path());

    let renderer = ComrakRenderService::new(RenderPipelineConfig {
        max_nesting_depth: 1,
        ..RenderPipelineConfig::default()
    });
    let writer = OutputWriter::new(output_dir.path());
    let layout = layout();
    let scan = content::scan(content_dir.path()).expect("scan");

    let report = SiteBuilder::new(&layout, PermalinkResolver::new(), &renderer, &writer)
        .build(scan)
        .expect("build");

    assert_eq!(report.documents.len(), 5);
    assert_eq!(report.rendered(), 3);
    assert_eq!(report.failed(), 2);

    let broken = report.outcome("broken.md").expect("broken outcome");
    assert!(matches!(
        broken.status,
        DocumentStatus::Failed {
            stage: FailureStage::Load,
            ..
        }
    ));
    assert_eq!(broken.served_path, None);

    let deep = report.outcome("deep.md").expect("deep outcome");
    assert!(matches!(
        deep.status,
        DocumentStatus::Failed {
            stage: FailureStage::Render,
            ..
        }
    ));
    assert!(!output_dir.path().join("deep.html").exists());

    let ownership = fs::read_to_string(output_dir.path().join("rust/ownership/index.html"))
        .expect("ownership html");
    assert!(ownership.contains("<ArticleMetadata />"));
    assert!(ownership.contains("提示"));

    let intro = fs::read_to_string(output_dir.path().join("en/intro.html")).expect("intro html");
    assert!(intro.contains("<ArticleMetadata />"));
    assert!(!intro.contains("提示"));

    let home = fs::read_to_string(output_dir.path().join("index.html")).expect("home html");
    assert!(!home.contains("<ArticleMetadata />"));
    assert!(!home.contains("提示"));
}

#[test]
fn routes_and_report_are_written_next_to_the_pages() {
    let content_dir = TempDir::new().expect("content dir");
    let output_dir = TempDir::new().expect("output dir");
    seed_site(content_dir.path());

    let renderer = ComrakRenderService::default();
    let writer = OutputWriter::new(output_dir.path());
    let layout = layout();
    let scan = content::scan(content_dir.path()).expect("scan");
    SiteBuilder::new(&layout, PermalinkResolver::new(), &renderer, &writer)
        .build(scan)
        .expect("build");

    let routes: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output_dir.path().join(ROUTES_FILE)).expect("routes"),
    )
    .expect("routes json");
    assert_eq!(routes["rust/ownership.md"], "/rust/ownership/");
    assert_eq!(routes["index.md"], "index.md");
    assert!(routes.get("broken.md").is_none());

    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output_dir.path().join(REPORT_FILE)).expect("report"),
    )
    .expect("report json");
    let documents = report["documents"].as_array().expect("documents");
    let broken = documents
        .iter()
        .find(|doc| doc["source_path"] == "broken.md")
        .expect("broken entry");
    assert_eq!(broken["status"], "failed");
    assert_eq!(broken["stage"], "load");
}

#[test]
fn strict_conflicts_abort_before_rendering() {
    let content_dir = TempDir::new().expect("content dir");
    let output_dir = TempDir::new().expect("output dir");
    write(content_dir.path(), "a.md", "---\npermalink: /same/\n---\n# A\n");
    write(content_dir.path(), "b.md", "---\npermalink: /same/\n---\n# B\n");

    let renderer = ComrakRenderService::default();
    let writer = OutputWriter::new(output_dir.path());
    let layout = layout();
    let scan = content::scan(content_dir.path()).expect("scan");

    let result = SiteBuilder::new(
        &layout,
        PermalinkResolver::new().strict(true),
        &renderer,
        &writer,
    )
    .build(scan);

    assert!(matches!(result, Err(AppError::Resolve(_))));
    assert!(!output_dir.path().join("same/index.html").exists());
}

/// Renders everything except one document.
struct FlakyRenderer {
    inner: ComrakRenderService,
    failing: &'static str,
}

impl RenderService for FlakyRenderer {
    fn render(&self, context: &RenderContext) -> Result<RenderOutput, RenderError> {
        if context.source_path == self.failing {
            return Err(RenderError::Markdown {
                message: "synthetic failure".to_string(),
            });
        }
        self.inner.render(context)
    }

    fn render_default(&self, markdown: &str) -> Result<String, RenderError> {
        self.inner.render_default(markdown)
    }
}

#[test]
fn render_failures_are_isolated_per_document() {
    let content_dir = TempDir::new().expect("content dir");
    let output_dir = TempDir::new().expect("output dir");
    write(content_dir.path(), "a.md", "# A\n");
    write(content_dir.path(), "b.md", "# B\n");
    write(content_dir.path(), "c.md", "# C\n");

    let renderer = FlakyRenderer {
        inner: ComrakRenderService::default(),
        failing: "b.md",
    };
    let writer = OutputWriter::new(output_dir.path());
    let layout = layout();
    let scan = content::scan(content_dir.path()).expect("scan");

    let report = SiteBuilder::new(&layout, PermalinkResolver::new(), &renderer, &writer)
        .build(scan)
        .expect("build");

    let sources: Vec<_> = report
        .documents
        .iter()
        .map(|doc| (doc.source_path.as_str(), doc.is_failed()))
        .collect();
    assert_eq!(sources, [("a.md", false), ("b.md", true), ("c.md", false)]);
    assert!(output_dir.path().join("a.html").exists());
    assert!(output_dir.path().join("c.html").exists());
    assert!(!output_dir.path().join("b.html").exists());
}
