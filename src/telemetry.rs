use crate::config::LogFormat;
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured logging on stderr.
///
/// `RUST_LOG` takes precedence over the configured level. Operator-facing
/// summaries go to stdout through `println!` and are not affected.
pub fn init_telemetry(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    tracing::debug!("telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the commands of one workflow run
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping one lifecycle operation
pub fn create_workflow_span(operation: &str, qa: Option<&str>, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "workflow",
        operation = operation,
        qa = qa,
        correlation.id = correlation_id,
    )
}
