use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

pub const SUBMISSIONS_TOTAL: &str = "hereiam_form_submissions_total";
pub const REMOTE_CALLS_TOTAL: &str = "hereiam_remote_calls_total";
pub const TILE_PROXY_TOTAL: &str = "hereiam_tile_proxy_requests_total";

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
    pub metrics_addr: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObservabilityHandle {
    pub service_name: String,
    pub metrics_enabled: bool,
}

pub fn init(config: &ObservabilityConfig) -> ObservabilityHandle {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);

    let metrics_enabled = init_metrics(config);

    ObservabilityHandle {
        service_name: config.service_name.clone(),
        metrics_enabled,
    }
}

pub fn log_startup(handle: &ObservabilityHandle, environment: &str) {
    tracing::info!(
        service = %handle.service_name,
        environment = %environment,
        metrics_enabled = handle.metrics_enabled,
        "hereIam service starting"
    );
}

/// Counts a login or registration attempt by its final outcome.
pub fn record_submission(kind: &'static str, outcome: &'static str) {
    metrics::counter!(SUBMISSIONS_TOTAL, "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_remote_call(operation: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    metrics::counter!(REMOTE_CALLS_TOTAL, "operation" => operation, "outcome" => outcome)
        .increment(1);
}

pub fn record_tile_request(provider: &str, status: u16) {
    metrics::counter!(
        TILE_PROXY_TOTAL,
        "provider" => provider.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

fn init_metrics(config: &ObservabilityConfig) -> bool {
    let Some(addr) = config.metrics_addr.as_ref() else {
        return false;
    };
    let addr: SocketAddr = match addr.parse() {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(
                service = %config.service_name,
                error = %err,
                "Invalid HEREIAM_METRICS_ADDR value"
            );
            return false;
        }
    };

    let builder = PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service", config.service_name.clone())
        .add_global_label("environment", config.environment.clone());

    match builder.install() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                service = %config.service_name,
                error = %err,
                "Failed to initialize Prometheus exporter"
            );
            false
        }
    }
}
