//! HTTP-backed provider for a FinGPT-style upstream.
//!
//! Each operation is executed through the provider's own `ResilientExecutor`,
//! including the stub paths and voting, so cache and breaker semantics are
//! identical whichever branch produced the value.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::stub::{stub_sentiment, stub_summary};
use super::{LlmProvider, ProviderHealth};
use crate::engine::VotingEngine;
use crate::error::{ProviderError, ProviderResult};
use crate::normalize::{normalize_sentiment, normalize_summary};
use crate::resilience::{ExecutorConfig, ResilientExecutor};
use crate::schemas::{
    SentimentRequest, SentimentResponse, SummarizeRequest, SummarizeResponse, VoteRequest,
    VoteResponse,
};
use crate::upstream::{UpstreamClient, UpstreamConfig, SENTIMENT_PATH, SUMMARIZE_PATH};

#[derive(Debug, Clone, Default)]
pub struct FinGptOptions {
    pub upstream: UpstreamConfig,
    pub executor: ExecutorConfig,
    pub use_stub_summary: bool,
    pub use_stub_sentiment: bool,
}

pub struct FinGptProvider {
    executor: ResilientExecutor,
    /// Missing URL/key is kept as the error and reported on each live call.
    upstream: ProviderResult<UpstreamClient>,
    use_stub_summary: bool,
    use_stub_sentiment: bool,
    engine: Arc<dyn VotingEngine>,
}

impl FinGptProvider {
    pub fn new(opts: FinGptOptions, engine: Arc<dyn VotingEngine>) -> Self {
        Self {
            executor: ResilientExecutor::new(opts.executor),
            upstream: UpstreamClient::new(&opts.upstream),
            use_stub_summary: opts.use_stub_summary,
            use_stub_sentiment: opts.use_stub_sentiment,
            engine,
        }
    }

    pub fn executor(&self) -> &ResilientExecutor {
        &self.executor
    }

    fn upstream(&self) -> ProviderResult<&UpstreamClient> {
        self.upstream.as_ref().map_err(Clone::clone)
    }

    async fn summarize_uncached(
        &self,
        req: &SummarizeRequest,
        payload: &Value,
    ) -> anyhow::Result<SummarizeResponse> {
        let started = Instant::now();
        if self.use_stub_summary {
            return Ok(stub_summary(req, started));
        }
        let data = self.upstream()?.post_json(SUMMARIZE_PATH, payload).await?;
        Ok(normalize_summary(&data, started.elapsed().as_millis() as u64))
    }

    async fn sentiment_uncached(
        &self,
        req: &SentimentRequest,
        payload: &Value,
    ) -> anyhow::Result<SentimentResponse> {
        if self.use_stub_sentiment {
            return Ok(stub_sentiment(req));
        }
        let data = self.upstream()?.post_json(SENTIMENT_PATH, payload).await?;
        Ok(normalize_sentiment(&data))
    }
}

#[async_trait]
impl LlmProvider for FinGptProvider {
    async fn summarize(&self, req: &SummarizeRequest) -> ProviderResult<SummarizeResponse> {
        let payload = to_payload(req)?;
        self.executor
            .execute(
                "summarize",
                &payload,
                || self.summarize_uncached(req, &payload),
                true,
            )
            .await
    }

    async fn sentiment(&self, req: &SentimentRequest) -> ProviderResult<SentimentResponse> {
        let payload = to_payload(req)?;
        self.executor
            .execute(
                "sentiment",
                &payload,
                || self.sentiment_uncached(req, &payload),
                true,
            )
            .await
    }

    async fn vote(&self, req: &VoteRequest) -> ProviderResult<VoteResponse> {
        let payload = to_payload(req)?;
        let engine = Arc::clone(&self.engine);
        self.executor
            .execute(
                "vote",
                &payload,
                || async move { anyhow::Ok(engine.vote(&req.proposals)) },
                true,
            )
            .await
    }

    fn name(&self) -> &'static str {
        "fingpt"
    }

    fn health(&self) -> ProviderHealth {
        let snap = self.executor.breaker_snapshot();
        ProviderHealth::new(self.executor.circuit_state(), snap.consecutive_failures)
    }
}

fn to_payload<T: Serialize>(req: &T) -> ProviderResult<Value> {
    serde_json::to_value(req).map_err(|e| ProviderError::Unexpected(format!("payload: {e}")))
}
