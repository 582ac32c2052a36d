// tests/metrics.rs
use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use once_cell::sync::Lazy;
use tower::ServiceExt;

use corealpha_adapter::api;
use corealpha_adapter::engine::WeightedSumEngine;
use corealpha_adapter::metrics::Metrics;
use corealpha_adapter::provider::{FinGptOptions, FinGptProvider};

// The Prometheus recorder is process-global: install it once per test binary.
static METRICS: Lazy<Metrics> =
    Lazy::new(|| Metrics::install(60).expect("install prometheus recorder"));

/// Builds the provider before touching the recorder, so descriptions must
/// survive an executor created against the no-op recorder.
fn build_app() -> Router {
    let provider = FinGptProvider::new(
        FinGptOptions {
            use_stub_summary: true,
            use_stub_sentiment: true,
            ..Default::default()
        },
        Arc::new(WeightedSumEngine),
    );
    api::router(Arc::new(provider)).merge(METRICS.router())
}

fn vote_payload() -> &'static str {
    r#"{"proposals":[{"agent":"Sentiment","vote":"BUY","weight":0.7,"confidence":0.9}]}"#
}

async fn scrape(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn cache_miss_then_hit_shows_up_in_exposition() {
    let app = build_app();

    for _ in 0..2 {
        let r = app
            .clone()
            .oneshot(
                Request::post("/vote")
                    .header("content-type", "application/json")
                    .body(Body::from(vote_payload()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(r.status(), StatusCode::OK);
    }

    let text = scrape(&app).await;
    for needle in [
        "provider_cache_misses_total",
        "provider_cache_hits_total",
        "provider_cache_ttl_seconds 60",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
    assert!(text.contains(r#"operation="vote""#), "{text}");
}

#[tokio::test]
async fn descriptions_are_exported_even_when_provider_came_first() {
    let app = build_app();
    let text = scrape(&app).await;
    assert!(
        text.contains("# HELP provider_cache_ttl_seconds"),
        "missing gauge description\n{text}"
    );
}
