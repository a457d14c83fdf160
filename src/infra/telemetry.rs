use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const DOCUMENTS_RENDERED_TOTAL: &str = "leafpress_documents_rendered_total";
pub const DOCUMENTS_FAILED_TOTAL: &str = "leafpress_documents_failed_total";
pub const ROUTE_CONFLICTS_TOTAL: &str = "leafpress_route_conflicts_total";
pub const RENDER_MS: &str = "leafpress_render_ms";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so commands that print results keep stdout clean.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            DOCUMENTS_RENDERED_TOTAL,
            Unit::Count,
            "Total number of documents rendered and written."
        );
        describe_counter!(
            DOCUMENTS_FAILED_TOTAL,
            Unit::Count,
            "Total number of documents that failed to load or render, labelled by stage."
        );
        describe_counter!(
            ROUTE_CONFLICTS_TOTAL,
            Unit::Count,
            "Total number of served paths claimed by more than one document."
        );
        describe_histogram!(
            RENDER_MS,
            Unit::Milliseconds,
            "Per-document render latency in milliseconds."
        );
    });
}
