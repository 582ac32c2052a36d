//! Provider capability and its concrete variants.
//!
//! - `FinGptProvider`: HTTP-backed, every operation runs through a `ResilientExecutor`.
//! - `StubProvider`: offline, deterministic apart from timestamps.
//! - `UnconfiguredProvider`: selectable placeholder that always reports a configuration error.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::{ProviderKind, ProviderSettings};
use crate::engine::engine_for;
use crate::error::{ProviderError, ProviderResult};
use crate::resilience::CircuitState;
use crate::schemas::{
    SentimentRequest, SentimentResponse, SummarizeRequest, SummarizeResponse, VoteRequest,
    VoteResponse,
};

pub mod fingpt;
pub mod stub;

pub use fingpt::{FinGptOptions, FinGptProvider};
pub use stub::StubProvider;

/// Breaker view reported on the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProviderHealth {
    pub circuit_open: bool,
    pub consecutive_failures: u32,
}

impl ProviderHealth {
    pub fn new(state: CircuitState, consecutive_failures: u32) -> Self {
        Self {
            circuit_open: state == CircuitState::Open,
            consecutive_failures,
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn summarize(&self, req: &SummarizeRequest) -> ProviderResult<SummarizeResponse>;
    async fn sentiment(&self, req: &SentimentRequest) -> ProviderResult<SentimentResponse>;
    async fn vote(&self, req: &VoteRequest) -> ProviderResult<VoteResponse>;

    fn name(&self) -> &'static str;

    fn health(&self) -> ProviderHealth {
        ProviderHealth::default()
    }
}

pub type DynProvider = Arc<dyn LlmProvider>;

/// Placeholder for providers that are selectable but have no client yet.
#[derive(Debug, Clone)]
pub struct UnconfiguredProvider {
    name: &'static str,
}

impl UnconfiguredProvider {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn fail<T>(&self) -> ProviderResult<T> {
        Err(ProviderError::Configuration(format!(
            "{} provider is not configured",
            self.name
        )))
    }
}

#[async_trait]
impl LlmProvider for UnconfiguredProvider {
    async fn summarize(&self, _req: &SummarizeRequest) -> ProviderResult<SummarizeResponse> {
        self.fail()
    }

    async fn sentiment(&self, _req: &SentimentRequest) -> ProviderResult<SentimentResponse> {
        self.fail()
    }

    async fn vote(&self, _req: &VoteRequest) -> ProviderResult<VoteResponse> {
        self.fail()
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Composition-root factory: one fresh provider (own cache and breaker) per call.
pub fn build_provider(settings: &ProviderSettings) -> DynProvider {
    let engine = engine_for(settings.voting_method);
    let provider: DynProvider = match settings.provider {
        ProviderKind::FinGpt => Arc::new(FinGptProvider::new(
            FinGptOptions {
                upstream: settings.upstream_config(),
                executor: settings.executor_config(),
                use_stub_summary: settings.use_stub_summary,
                use_stub_sentiment: settings.use_stub_sentiment,
            },
            engine,
        )),
        ProviderKind::Stub => Arc::new(StubProvider::new(engine)),
        ProviderKind::OpenAi => Arc::new(UnconfiguredProvider::new("openai")),
    };

    info!(
        provider = provider.name(),
        voting = %settings.voting_method,
        base_url = %settings.base_url,
        key_len = settings.api_key.len(),
        stub_summary = settings.use_stub_summary,
        stub_sentiment = settings.use_stub_sentiment,
        "provider constructed"
    );
    provider
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{Proposal, Verdict};

    #[tokio::test]
    async fn unconfigured_provider_fails_every_operation() {
        let p = UnconfiguredProvider::new("openai");
        let err = p.summarize(&SummarizeRequest::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert!(p
            .vote(&VoteRequest {
                proposals: vec![Proposal::new("A", Verdict::Buy, 1.0, 1.0)],
            })
            .await
            .is_err());
        assert_eq!(p.health(), ProviderHealth::default());
    }

    #[test]
    fn factory_honours_provider_kind() {
        let mut s = ProviderSettings::default();
        assert_eq!(build_provider(&s).name(), "fingpt");
        s.provider = ProviderKind::Stub;
        assert_eq!(build_provider(&s).name(), "stub");
        s.provider = ProviderKind::OpenAi;
        assert_eq!(build_provider(&s).name(), "openai");
    }
}
