use opentelemetry::trace::TracerProvider as _;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber.
///
/// Spans additionally get exported to stdout through opentelemetry,
/// if `trace_stdout` is set.
pub fn init(level: &str, trace_stdout: bool) {
    let level = LevelFilter::from_str(level).unwrap_or(LevelFilter::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    let otel_layer = if trace_stdout {
        let provider = opentelemetry_sdk::trace::TracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("hydrowatch");
        // the tracer only holds a weak reference on its provider
        let _ = opentelemetry::global::set_tracer_provider(provider);
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let registry = tracing_subscriber::registry()
        .with(level)
        .with(fmt_layer)
        .with(otel_layer);
    if let Err(e) = registry.try_init() {
        eprintln!("Logging already initialized: {}", e);
    }
}
