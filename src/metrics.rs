use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const CACHE_HITS: &str = "provider_cache_hits_total";
pub const CACHE_MISSES: &str = "provider_cache_misses_total";
pub const UPSTREAM_ATTEMPTS: &str = "provider_upstream_attempts_total";
pub const UPSTREAM_RETRIES: &str = "provider_upstream_retries_total";
pub const FAILURES: &str = "provider_failures_total";
pub const CIRCUIT_REJECTIONS: &str = "provider_circuit_rejections_total";
pub const CIRCUIT_OPENED: &str = "provider_circuit_opened_total";
pub const CACHE_TTL: &str = "provider_cache_ttl_seconds";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(describe_all);
}

/// Describe every series against the current recorder. Idempotent.
fn describe_all() {
    describe_counter!(CACHE_HITS, "Provider calls answered from the TTL cache.");
    describe_counter!(CACHE_MISSES, "Provider calls that had to run the operation.");
    describe_counter!(UPSTREAM_ATTEMPTS, "HTTP attempts made against the upstream.");
    describe_counter!(UPSTREAM_RETRIES, "Upstream attempts that were retried after backoff.");
    describe_counter!(FAILURES, "Terminal provider failures, labelled by error code.");
    describe_counter!(
        CIRCUIT_REJECTIONS,
        "Calls rejected immediately because the breaker was open."
    );
    describe_counter!(CIRCUIT_OPENED, "Closed -> Open breaker transitions.");
    describe_gauge!(CACHE_TTL, "Configured provider cache TTL in seconds.");
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the configured cache TTL.
    pub fn install(cache_ttl_secs: u64) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        // Providers built earlier described against the no-op recorder.
        describe_all();
        gauge!(CACHE_TTL).set(cache_ttl_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
