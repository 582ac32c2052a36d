//! Thin HTTP surface: the three provider operations plus health.
//!
//! Handlers only validate, delegate to the injected provider and map
//! `ProviderError` kinds onto distinct statuses.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::DynProvider;
use crate::schemas::{
    SentimentRequest, SentimentResponse, SummarizeRequest, SummarizeResponse, VoteRequest,
    VoteResponse,
};

pub const SERVICE_NAME: &str = "corealpha-adapter";

#[derive(Clone)]
pub struct AppState {
    pub provider: DynProvider,
}

impl AppState {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/summarize", post(summarize))
        .route("/sentiment", post(sentiment))
        .route("/vote", post(vote))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Router over a single provider.
pub fn router(provider: DynProvider) -> Router {
    create_router(AppState::new(provider))
}

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Provider(ProviderError),
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        ApiError::Provider(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: "validation_error",
                    detail,
                },
            ),
            ApiError::Provider(e) => (
                StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                ErrorBody {
                    error: e.error_code(),
                    detail: e.to_string(),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct HealthOut {
    ok: bool,
    time: String,
    service: &'static str,
    provider: &'static str,
    circuit_open: bool,
    consecutive_failures: u32,
}

async fn health(State(state): State<AppState>) -> Json<HealthOut> {
    let h = state.provider.health();
    Json(HealthOut {
        ok: true,
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        service: SERVICE_NAME,
        provider: state.provider.name(),
        circuit_open: h.circuit_open,
        consecutive_failures: h.consecutive_failures,
    })
}

async fn summarize(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let out = state.provider.summarize(&req).await?;
    debug!(latency_ms = out.latency_ms, sources = out.sources.len(), "summarize served");
    Ok(Json(out))
}

async fn sentiment(
    State(state): State<AppState>,
    Json(req): Json<SentimentRequest>,
) -> Result<Json<SentimentResponse>, ApiError> {
    req.validate().map_err(ApiError::Validation)?;
    let out = state.provider.sentiment(&req).await?;
    Ok(Json(out))
}

async fn vote(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    req.validate().map_err(ApiError::Validation)?;
    let out = state.provider.vote(&req).await?;
    debug!(decision = out.decision.as_str(), "vote served");
    Ok(Json(out))
}
