use comrak::options::{ListStyleType, Options};

/// Engine options shared by top-level and nested documents.
pub(crate) fn default_options() -> Options<'static> {
    let mut options = Options::default();
    configure_extensions(&mut options);
    options
}

fn configure_extensions(options: &mut Options<'static>) {
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.tagfilter = false;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.superscript = true;
    ext.footnotes = true;
    ext.description_lists = true;
    ext.multiline_block_quotes = true;
    ext.alerts = true;
    ext.underline = true;
    ext.subscript = true;
    ext.cjk_friendly_emphasis = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.full_info_string = true;
    render.tasklist_classes = true;
    render.list_style = ListStyleType::Dash;
    render.r#unsafe = true;
    render.figure_with_caption = true;
    render.sourcepos = false;
    render.gfm_quirks = true;
}
