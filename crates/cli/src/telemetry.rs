use opentelemetry::{KeyValue, trace::TracerProvider};
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::{SCHEMA_URL, resource::SERVICE_VERSION};
use tracing_log::LogTracer;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Build a resource with service name & version
fn resource() -> Resource {
    Resource::builder()
        .with_service_name(env!("CARGO_PKG_NAME"))
        .with_schema_url(
            [KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION"))],
            SCHEMA_URL,
        )
        .build()
}

/// OTLP tracer provider, only when an endpoint is configured
fn init_tracer_provider() -> Option<SdkTracerProvider> {
    std::env::var_os(OTLP_ENDPOINT_ENV)?;
    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            eprintln!("OTLP exporter init failed: {}", e);
            return None;
        }
    };

    Some(
        SdkTracerProvider::builder()
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource())
            .with_batch_exporter(exporter)
            .build(),
    )
}

/// Setup tracing + log integration. Output goes to stderr so command
/// output on stdout stays clean.
pub fn setup_logging() -> Option<SdkTracerProvider> {
    if let Err(e) = LogTracer::init() {
        eprintln!("log bridge init failed: {}", e);
    }
    let fmt_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
    let filter = EnvFilter::from_default_env();
    let tracer_provider = init_tracer_provider();
    let otel_layer = tracer_provider
        .as_ref()
        .map(|tp| OpenTelemetryLayer::new(tp.tracer("astra-tracer")));
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("tracing subscriber init failed: {}", e);
    }
    tracer_provider
}
