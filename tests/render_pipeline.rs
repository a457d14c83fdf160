use leafpress::application::render::{
    ComrakRenderService, NESTED_CONTAINER_CLASS, RenderContext, RenderError, RenderPipelineConfig,
    RenderService,
};
use leafpress::domain::content::Locale;

const PLACEHOLDER: &str = "<ArticleMetadata />";

fn guide() -> String {
    include_str!("fixtures/guide.md").to_string()
}

fn render(source_path: &str, markdown: &str) -> String {
    ComrakRenderService::default()
        .render(&RenderContext::new(source_path, markdown))
        .expect("render succeeds")
        .html
}

#[test]
fn home_page_matches_default_engine_byte_for_byte() {
    let service = ComrakRenderService::default();
    let markdown = guide();

    let home = service
        .render(&RenderContext::new("index.md", markdown.clone()).home_page(true))
        .expect("home render");
    let default = service.render_default(&markdown).expect("default render");

    assert_eq!(home.html, default);
    assert!(!home.html.contains(PLACEHOLDER));
    assert!(!home.html.contains(NESTED_CONTAINER_CLASS));
    assert!(!home.html.contains("提示"));
}

#[test]
fn placeholder_follows_only_the_first_top_level_heading() {
    let html = render("guide/ownership.md", &guide());

    assert_eq!(html.matches(PLACEHOLDER).count(), 1);
    assert!(html.contains("<h1>Ownership</h1>\n<ArticleMetadata />"));
    assert!(!html.contains("<h1>A second top-level heading</h1>\n<ArticleMetadata />"));
}

#[test]
fn documents_without_top_level_heading_get_no_placeholder() {
    let html = render("guide/a.md", "## Only a subheading\n\nText.\n");
    assert!(!html.contains(PLACEHOLDER));
}

#[test]
fn rendering_rendered_html_does_not_add_a_second_placeholder() {
    let service = ComrakRenderService::default();
    let first = service
        .render(&RenderContext::new("guide/a.md", "# Title\n\nBody.\n"))
        .expect("first render");
    let second = service
        .render(&RenderContext::new("guide/a.md", first.html))
        .expect("second render");

    assert_eq!(second.html.matches(PLACEHOLDER).count(), 1);
}

#[test]
fn headings_inside_nested_fences_do_not_receive_the_placeholder() {
    let html = render("guide/a.md", "Intro.\n\n````md render\n# Inner\n````\n");

    assert!(html.contains("<h1>Inner</h1>"));
    assert!(!html.contains(PLACEHOLDER));
}

#[test]
fn marked_fence_is_rendered_as_nested_markdown() {
    let service = ComrakRenderService::default();
    let output = service
        .render(&RenderContext::new("guide/ownership.md", guide()))
        .expect("render");

    assert!(output.contains_nested);
    assert!(
        output
            .html
            .contains(&format!("<div class=\"{NESTED_CONTAINER_CLASS}\">"))
    );
    assert!(output.html.contains("type=\"checkbox\""));
    assert!(!output.html.contains("syntax-lang-md"));
    assert!(!output.html.contains("md render"));
}

#[test]
fn ordinary_fences_are_highlighted_not_reparsed() {
    let output = ComrakRenderService::default()
        .render(&RenderContext::new(
            "guide/a.md",
            "```rust\nlet heading = \"# not a heading\";\n```\n",
        ))
        .expect("render");

    assert!(output.contains_code);
    assert!(!output.contains_nested);
    assert!(output.html.contains("syntax-lang-rust"));
    assert!(!output.html.contains("<h1>"));
}

#[test]
fn marker_must_be_a_separate_word_of_the_info_string() {
    let html = render("guide/a.md", "```md renderer\n# Literal\n```\n");

    assert!(!html.contains(NESTED_CONTAINER_CLASS));
    assert!(!html.contains("<h1>Literal</h1>"));
    assert!(html.contains("syntax-lang-md"));
}

#[test]
fn nesting_beyond_the_limit_is_an_error() {
    let service = ComrakRenderService::new(RenderPipelineConfig {
        max_nesting_depth: 1,
        ..RenderPipelineConfig::default()
    });
    let markdown = "`````md render\n````md render\ninner\n````\n`````\n";

    let err = service
        .render(&RenderContext::new("guide/deep.md", markdown))
        .expect_err("too deep");
    assert!(matches!(err, RenderError::NestingTooDeep { limit: 1 }));

    let shallow = "````md render\ninner\n````\n";
    assert!(
        service
            .render(&RenderContext::new("guide/shallow.md", shallow))
            .is_ok()
    );
}

#[test]
fn root_locale_admonitions_get_localized_titles() {
    let html = render("guide/ownership.md", &guide());

    assert!(html.contains("<p class=\"markdown-alert-title\">提示</p>"));
    // Alerts inside nested fences are localized as well.
    assert!(html.contains("<p class=\"markdown-alert-title\">说明</p>"));
}

#[test]
fn explicit_admonition_titles_are_preserved() {
    let html = render("guide/ownership.md", &guide());

    assert!(html.contains("<p class=\"markdown-alert-title\">Mind the lifetimes</p>"));
    assert!(!html.contains("警告"));
}

#[test]
fn non_root_locales_keep_default_titles() {
    let service = ComrakRenderService::default();
    let context = RenderContext::new("en/guide.md", "# Guide\n\n> [!TIP]\n> Hello.\n")
        .with_locale(Locale::Named("en".to_string()));

    let html = service.render(&context).expect("render").html;
    assert!(html.contains("<p class=\"markdown-alert-title\">Tip</p>"));
    assert!(!html.contains("提示"));
    // Heading augmentation is not locale dependent.
    assert!(html.contains(PLACEHOLDER));
}

#[test]
fn label_words_inside_code_are_untouched() {
    let html = render(
        "guide/a.md",
        "Say Tip and Note.\n\n```text\nTip: Warning\n```\n\n> [!CAUTION]\n> Hot.\n",
    );

    assert!(html.contains("Say Tip and Note."));
    assert!(html.contains("Tip: Warning"));
    assert!(html.contains("<p class=\"markdown-alert-title\">危险</p>"));
}

#[test]
fn configured_labels_override_defaults() {
    let mut config = RenderPipelineConfig::default();
    config.admonition_labels.tip = "Hint".to_string();
    let service = ComrakRenderService::new(config);

    let html = service
        .render(&RenderContext::new("a.md", "> [!TIP]\n> x\n"))
        .expect("render")
        .html;
    assert!(html.contains("<p class=\"markdown-alert-title\">Hint</p>"));
}

#[test]
fn mermaid_fences_fall_back_to_client_side_source() {
    let output = ComrakRenderService::default()
        .render(&RenderContext::new("guide/ownership.md", guide()))
        .expect("render");

    assert!(output.contains_diagram);
    assert!(
        output
            .html
            .contains("<pre class=\"mermaid\">graph TD; Owner--&gt;Borrower\n</pre>")
    );
}

#[test]
fn titled_fences_get_an_icon_title_bar() {
    let html = render("guide/ownership.md", &guide());

    assert!(html.contains("<div class=\"code-block-title\" data-icon=\"rust\">main.rs</div>"));
    let title_at = html.find("code-block-title").expect("title bar");
    let code_at = html.find("syntax-lang-rust").expect("highlighted code");
    assert!(title_at < code_at);
}

#[test]
fn outline_lists_top_level_document_headings() {
    let output = ComrakRenderService::default()
        .render(&RenderContext::new("guide/ownership.md", guide()))
        .expect("render");

    let slugs: Vec<_> = output.headings.iter().map(|h| h.slug.as_str()).collect();
    assert_eq!(slugs, ["ownership", "borrowing", "a-second-top-level-heading"]);
    assert_eq!(output.headings[1].level, 2);
}
