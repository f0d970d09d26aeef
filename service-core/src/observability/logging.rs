use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing stack: env-filtered JSON logs, plus OTLP span
/// export when an endpoint is configured. Services without a collector
/// (local runs, tests) pass `None` and get logs only.
pub fn init_tracing(service_name: &str, log_level: &str, otlp_endpoint: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match otlp_endpoint {
        Some(endpoint) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true);

            let otlp_exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint);

            let tracer = match opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(otlp_exporter)
                .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", service_name.to_string()),
                ])))
                .install_batch(runtime::Tokio)
            {
                Ok(t) => t,
                Err(e) => {
                    eprintln!(
                        "Failed to initialize OTLP tracer for service '{}' at endpoint '{}': {}",
                        service_name, endpoint, e
                    );
                    panic!("Failed to initialize OTLP tracer: {}", e);
                }
            };

            let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
            registry.with(telemetry).with(fmt_layer).init();
        }
        None => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true);
            registry.with(fmt_layer).init();
        }
    }
}
