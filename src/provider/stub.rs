//! Offline provider and the stub responses shared with the HTTP-backed one.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};

use super::LlmProvider;
use crate::engine::VotingEngine;
use crate::error::ProviderResult;
use crate::schemas::{
    SentimentRequest, SentimentResponse, Source, SummarizeRequest, SummarizeResponse,
    VoteRequest, VoteResponse,
};
use crate::sentiment::SentimentAnalyzer;

pub const SUMMARY_PREVIEW_CHARS: usize = 200;
pub const STUB_IMPACT: &str = "Unknown (stub)";
pub const STUB_RATIONALE: &str =
    "Lexicon-based stub counting positive/negative words, scored in [-1,1].";

/// Summary without an upstream: text preview, else a URL or ticker placeholder.
pub fn stub_summary(req: &SummarizeRequest, started: Instant) -> SummarizeResponse {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let text = req.text.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let summary = match (text, req.url.as_deref()) {
        (Some(t), _) if t.chars().count() > SUMMARY_PREVIEW_CHARS => {
            let head: String = t.chars().take(SUMMARY_PREVIEW_CHARS).collect();
            format!("{head}...")
        }
        (Some(t), _) => t.to_string(),
        (None, Some(url)) => format!("Summary of {url}: (stub) key points are extracted here."),
        (None, None) => format!(
            "Short summary for {} (stub) via upstream RAG in production.",
            req.ticker.as_deref().unwrap_or("unknown")
        ),
    };

    let mut sources = Vec::new();
    if let Some(url) = req.url.as_deref() {
        sources.push(Source::new("Source", url).at(now.clone()));
    }
    if let Some(ticker) = req.ticker.as_deref() {
        sources.push(Source::new(format!("{ticker} IR (stub)"), "http://example.com/ir").at(now));
    }

    SummarizeResponse {
        summary,
        impact: STUB_IMPACT.to_string(),
        sources,
        latency_ms: started.elapsed().as_millis() as u64,
    }
}

/// Lexicon score over all texts with placeholder news attribution.
pub fn stub_sentiment(req: &SentimentRequest) -> SentimentResponse {
    SentimentResponse {
        score: SentimentAnalyzer::new().score_texts(&req.texts),
        rationale: STUB_RATIONALE.to_string(),
        sources: vec![
            Source::new("News 1 (stub)", "http://example.com/news1"),
            Source::new("News 2 (stub)", "http://example.com/news2"),
        ],
    }
}

/// Pure in-memory provider for local development and CI.
pub struct StubProvider {
    engine: Arc<dyn VotingEngine>,
}

impl StubProvider {
    pub fn new(engine: Arc<dyn VotingEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    async fn summarize(&self, req: &SummarizeRequest) -> ProviderResult<SummarizeResponse> {
        Ok(stub_summary(req, Instant::now()))
    }

    async fn sentiment(&self, req: &SentimentRequest) -> ProviderResult<SentimentResponse> {
        Ok(stub_sentiment(req))
    }

    async fn vote(&self, req: &VoteRequest) -> ProviderResult<VoteResponse> {
        Ok(self.engine.vote(&req.proposals))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
