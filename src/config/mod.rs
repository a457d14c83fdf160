//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::render::AdmonitionLabels;
use crate::domain::content::SiteLayout;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "leafpress";
const DEFAULT_CONTENT_ROOT: &str = "docs";
const DEFAULT_OUTPUT_DIR: &str = "dist";
const DEFAULT_HOME_PAGE: &str = "index.md";
pub(crate) const DEFAULT_METADATA_PLACEHOLDER: &str = "<ArticleMetadata />";
pub(crate) const DEFAULT_NESTED_FENCE_MARKER: &str = "render";
pub(crate) const DEFAULT_MAX_NESTING_DEPTH: usize = 8;
pub(crate) const DEFAULT_MERMAID_CACHE_DIR: &str = ".leafpress/mermaid";

/// Command-line arguments for the leafpress binary.
#[derive(Debug, Parser)]
#[command(
    name = "leafpress",
    version,
    about = "Markdown site builder with permalink routing"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "LEAFPRESS_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render every document under the content root into the output directory.
    Build(BuildArgs),
    /// Render a single markdown file to stdout.
    Render(RenderArgs),
    /// Print the rewrite table as JSON.
    Routes(RoutesArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ContentOverrides {
    /// Override the content root directory.
    #[arg(long = "content", value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Fail when two documents resolve to the same served path.
    #[arg(long = "strict-conflicts", action = clap::ArgAction::SetTrue)]
    pub strict_conflicts: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the Mermaid CLI executable path used for diagram rendering.
    #[arg(long = "render-mermaid-cli-path", value_name = "PATH")]
    pub mermaid_cli_path: Option<PathBuf>,

    /// Override the directory used to cache rendered Mermaid diagrams.
    #[arg(long = "render-mermaid-cache-dir", value_name = "PATH")]
    pub mermaid_cache_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub content: ContentOverrides,

    #[command(flatten)]
    pub render: RenderOverrides,

    /// Override the output directory.
    #[arg(long = "output", value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub render: RenderOverrides,

    /// Markdown file to render.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Source path the file is treated as, for home page and locale detection.
    /// Defaults to the file name.
    #[arg(long = "as", value_name = "PATH")]
    pub source_path: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RoutesArgs {
    #[command(flatten)]
    pub content: ContentOverrides,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub content: ContentSettings,
    pub routing: RoutingSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub home_pages: Vec<String>,
    /// Non-root locales, named by their top-level directory.
    pub locales: Vec<String>,
}

impl ContentSettings {
    pub fn layout(&self) -> SiteLayout {
        SiteLayout::new(self.home_pages.clone(), self.locales.clone())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingSettings {
    pub strict_conflicts: bool,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub metadata_placeholder: String,
    pub nested_fence_marker: String,
    pub max_nesting_depth: usize,
    pub admonition_labels: AdmonitionLabels,
    pub mermaid_cli_path: Option<PathBuf>,
    pub mermaid_cache_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix("LEAFPRESS")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("content.home_pages")
            .with_list_parse_key("content.locales"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_cli_overrides(cli);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    content: RawContentSettings,
    routing: RawRoutingSettings,
    render: RawRenderSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    root: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    home_pages: Option<Vec<String>>,
    locales: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRoutingSettings {
    strict_conflicts: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    metadata_placeholder: Option<String>,
    nested_fence_marker: Option<String>,
    max_nesting_depth: Option<usize>,
    admonition_labels: RawAdmonitionLabels,
    mermaid_cli_path: Option<PathBuf>,
    mermaid_cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAdmonitionLabels {
    note: Option<String>,
    tip: Option<String>,
    important: Option<String>,
    warning: Option<String>,
    caution: Option<String>,
}

impl RawSettings {
    fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        if let Some(level) = cli.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = cli.log_json {
            self.logging.json = Some(json);
        }

        match &cli.command {
            Command::Build(args) => {
                self.apply_content_overrides(&args.content);
                self.apply_render_overrides(&args.render);
                if let Some(dir) = args.output_dir.as_ref() {
                    self.content.output_dir = Some(dir.clone());
                }
            }
            Command::Render(args) => self.apply_render_overrides(&args.render),
            Command::Routes(args) => self.apply_content_overrides(&args.content),
        }
    }

    fn apply_content_overrides(&mut self, overrides: &ContentOverrides) {
        if let Some(root) = overrides.root.as_ref() {
            self.content.root = Some(root.clone());
        }
        if overrides.strict_conflicts {
            self.routing.strict_conflicts = Some(true);
        }
    }

    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(path) = overrides.mermaid_cli_path.as_ref() {
            self.render.mermaid_cli_path = Some(path.clone());
        }
        if let Some(dir) = overrides.mermaid_cache_dir.as_ref() {
            self.render.mermaid_cache_dir = Some(dir.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            content,
            routing,
            render,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            content: build_content_settings(content)?,
            routing: RoutingSettings {
                strict_conflicts: routing.strict_conflicts.unwrap_or(false),
            },
            render: build_render_settings(render)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let root = non_empty_path(content.root, DEFAULT_CONTENT_ROOT, "content.root")?;
    let output_dir = non_empty_path(content.output_dir, DEFAULT_OUTPUT_DIR, "content.output_dir")?;

    let home_pages = content
        .home_pages
        .unwrap_or_else(|| vec![DEFAULT_HOME_PAGE.to_string()])
        .into_iter()
        .map(|page| page.trim().trim_start_matches('/').to_string())
        .collect::<Vec<_>>();
    if home_pages.iter().any(String::is_empty) {
        return Err(LoadError::invalid(
            "content.home_pages",
            "entries must not be empty",
        ));
    }

    let locales = content
        .locales
        .unwrap_or_default()
        .into_iter()
        .map(|locale| locale.trim().trim_matches('/').to_string())
        .collect::<Vec<_>>();
    if let Some(bad) = locales
        .iter()
        .find(|locale| locale.is_empty() || locale.contains('/') || locale.as_str() == "root")
    {
        return Err(LoadError::invalid(
            "content.locales",
            format!("`{bad}` is not a valid locale directory name"),
        ));
    }

    Ok(ContentSettings {
        root,
        output_dir,
        home_pages,
        locales,
    })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let metadata_placeholder = non_empty_string(
        render.metadata_placeholder,
        DEFAULT_METADATA_PLACEHOLDER,
        "render.metadata_placeholder",
    )?;

    let nested_fence_marker = non_empty_string(
        render.nested_fence_marker,
        DEFAULT_NESTED_FENCE_MARKER,
        "render.nested_fence_marker",
    )?;
    if nested_fence_marker.contains(char::is_whitespace) {
        return Err(LoadError::invalid(
            "render.nested_fence_marker",
            "marker must be a single word",
        ));
    }

    let max_nesting_depth = render
        .max_nesting_depth
        .unwrap_or(DEFAULT_MAX_NESTING_DEPTH);
    if max_nesting_depth == 0 {
        return Err(LoadError::invalid(
            "render.max_nesting_depth",
            "must be greater than zero",
        ));
    }

    let mermaid_cli_path = match render.mermaid_cli_path {
        Some(path) if path.as_os_str().is_empty() => {
            return Err(LoadError::invalid(
                "render.mermaid_cli_path",
                "path must not be empty",
            ));
        }
        other => other,
    };
    let mermaid_cache_dir = non_empty_path(
        render.mermaid_cache_dir,
        DEFAULT_MERMAID_CACHE_DIR,
        "render.mermaid_cache_dir",
    )?;

    Ok(RenderSettings {
        metadata_placeholder,
        nested_fence_marker,
        max_nesting_depth,
        admonition_labels: build_admonition_labels(render.admonition_labels)?,
        mermaid_cli_path,
        mermaid_cache_dir,
    })
}

fn build_admonition_labels(raw: RawAdmonitionLabels) -> Result<AdmonitionLabels, LoadError> {
    let defaults = AdmonitionLabels::default();
    Ok(AdmonitionLabels {
        note: non_empty_string(raw.note, &defaults.note, "render.admonition_labels.note")?,
        tip: non_empty_string(raw.tip, &defaults.tip, "render.admonition_labels.tip")?,
        important: non_empty_string(
            raw.important,
            &defaults.important,
            "render.admonition_labels.important",
        )?,
        warning: non_empty_string(
            raw.warning,
            &defaults.warning,
            "render.admonition_labels.warning",
        )?,
        caution: non_empty_string(
            raw.caution,
            &defaults.caution,
            "render.admonition_labels.caution",
        )?,
    })
}

fn non_empty_string(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    let value = value.unwrap_or_else(|| default.to_string());
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoadError::invalid(key, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn non_empty_path(
    value: Option<PathBuf>,
    default: &str,
    key: &'static str,
) -> Result<PathBuf, LoadError> {
    let path = value.unwrap_or_else(|| PathBuf::from(default));
    if path.as_os_str().is_empty() {
        return Err(LoadError::invalid(key, "path must not be empty"));
    }
    Ok(path)
}
