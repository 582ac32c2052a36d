//! Provider adapter service: binary entrypoint.
//! Composition root: settings → provider (own cache + breaker) → router.

use anyhow::Context;
use corealpha_adapter::{api, build_provider, metrics::Metrics, ProviderSettings};
use shuttle_axum::ShuttleAxum;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("corealpha_adapter=info,warn"));

    // Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = ProviderSettings::load().context("loading provider settings")?;
    let cache_ttl_secs = settings.executor_config().cache_ttl.as_secs();

    // Recorder first, so executors built below register against it.
    let metrics = Metrics::install(cache_ttl_secs)
        .map_err(|e| warn!(error = %e, "metrics recorder not installed"))
        .ok();

    let provider = build_provider(&settings);
    info!(
        provider = provider.name(),
        cache_ttl_secs,
        max_retries = settings.max_retries,
        "provider ready"
    );

    let mut router = api::router(provider);
    if let Some(metrics) = metrics {
        router = router.merge(metrics.router());
    }

    Ok(router.into())
}
