//! Request/response value objects for the three provider operations.
//!
//! Requests serialize without `None` fields so the cache fingerprint only sees
//! what the caller actually sent.

use serde::{Deserialize, Serialize};

use crate::decision::{Decision, Proposal};

/// Attribution record; order-preserving, duplicates allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl Source {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            time: None,
        }
    }

    pub fn at(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
    pub impact: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub texts: Vec<String>,
}

impl SentimentRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.texts.is_empty() {
            return Err("texts must contain at least one entry".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResponse {
    /// In [-1, 1].
    pub score: f64,
    pub rationale: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub proposals: Vec<Proposal>,
}

impl VoteRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.proposals.is_empty() {
            return Err("proposals must contain at least one entry".to_string());
        }
        Ok(())
    }
}

pub type VoteResponse = Decision;
