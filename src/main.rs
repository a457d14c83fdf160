use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use leafpress::{
    application::{
        build::SiteBuilder,
        error::AppError,
        permalink::PermalinkResolver,
        render::{ComrakRenderService, RenderContext, RenderPipelineConfig, RenderService},
    },
    config::{self, CliArgs, Command, RenderArgs, Settings},
    infra::{content, error::InfraError, output::OutputWriter, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, warn};
use tracing_subscriber::fmt as tracing_fmt;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_application_error(&error);
            ExitCode::from(error.exit_code())
        }
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

fn run() -> Result<(), AppError> {
    let cli_args = CliArgs::parse();
    let settings = config::load(&cli_args)?;

    telemetry::init(&settings.logging)?;

    match &cli_args.command {
        Command::Build(_) => run_build(&settings),
        Command::Render(args) => run_render(&settings, args),
        Command::Routes(_) => run_routes(&settings),
    }
}

fn render_service(settings: &Settings) -> ComrakRenderService {
    ComrakRenderService::new(RenderPipelineConfig::from(&settings.render))
}

fn run_build(settings: &Settings) -> Result<(), AppError> {
    let scan = content::scan(&settings.content.root)?;
    let layout = settings.content.layout();
    let renderer = render_service(settings);
    let writer = OutputWriter::new(&settings.content.output_dir);
    let resolver = PermalinkResolver::new().strict(settings.routing.strict_conflicts);

    let report = SiteBuilder::new(&layout, resolver, &renderer, &writer).build(scan)?;
    if !report.is_success() {
        return Err(AppError::BuildFailed {
            failed: report.failed(),
            total: report.documents.len(),
        });
    }
    Ok(())
}

fn run_render(settings: &Settings, args: &RenderArgs) -> Result<(), AppError> {
    let source_path = match args.source_path.as_ref() {
        Some(path) => path.trim_start_matches('/').to_string(),
        None => args
            .file
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::unexpected(format!(
                    "cannot derive a source path from `{}`; pass --as",
                    args.file.display()
                ))
            })?,
    };

    let file = content::load_file(&args.file, &source_path)?;
    let context = RenderContext::for_file(&file, &settings.content.layout());
    let output = render_service(settings).render(&context)?;

    write_stdout(&output.html)
}

fn run_routes(settings: &Settings) -> Result<(), AppError> {
    let scan = content::scan(&settings.content.root)?;
    for failure in &scan.failures {
        warn!(
            path = failure.path(),
            error = %failure,
            "document left out of the rewrite table"
        );
    }

    let table = PermalinkResolver::new()
        .strict(settings.routing.strict_conflicts)
        .resolve(&scan.files)?;
    let mut json = serde_json::to_string_pretty(&table).map_err(InfraError::from)?;
    json.push('\n');

    write_stdout(&json)
}

fn write_stdout(contents: &str) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(contents.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|err| InfraError::io("<stdout>", err))?;
    Ok(())
}
