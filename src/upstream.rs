//! HTTP client for the upstream text-generation service.
//!
//! `post_json` is a bounded loop over attempts `0..=max_retries`. Timeouts,
//! transport failures and non-2xx statuses are retried after a capped
//! exponential backoff; a 2xx body that is not a JSON object is returned as
//! `ProviderError::Response` immediately.

use std::time::Duration;

use metrics::counter;
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::metrics::{UPSTREAM_ATTEMPTS, UPSTREAM_RETRIES};

pub const SUMMARIZE_PATH: &str = "/rag/summarize";
pub const SENTIMENT_PATH: &str = "/sentiment";

pub const MAX_BACKOFF: Duration = Duration::from_secs(2);
pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            backoff_base: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    backoff_base: Duration,
}

impl UpstreamClient {
    /// Fails with `Configuration` when the base URL or API key is missing.
    pub fn new(cfg: &UpstreamConfig) -> ProviderResult<Self> {
        let base_url = cfg.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ProviderError::Configuration(
                "upstream base URL is not configured".to_string(),
            ));
        }
        if cfg.api_key.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "upstream API key is not configured".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("corealpha-adapter/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(cfg.timeout.max(MIN_TIMEOUT))
            .timeout(cfg.timeout.max(MIN_TIMEOUT))
            .build()
            .map_err(|e| ProviderError::Configuration(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key: cfg.api_key.trim().to_string(),
            max_retries: cfg.max_retries,
            backoff_base: cfg.backoff_base,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `payload` to `path` and return the JSON object body.
    pub async fn post_json(
        &self,
        path: &str,
        payload: &Value,
    ) -> ProviderResult<Map<String, Value>> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        for attempt in 0..=self.max_retries {
            counter!(UPSTREAM_ATTEMPTS).increment(1);
            match self.attempt(&url, payload).await {
                Ok(body) => {
                    debug!(%url, attempt, "upstream call succeeded");
                    return Ok(body);
                }
                Err(e) if !e.is_retryable() || attempt == self.max_retries => return Err(e),
                Err(e) => {
                    let delay = backoff_delay(self.backoff_base, attempt);
                    warn!(
                        %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "upstream attempt failed, backing off"
                    );
                    counter!(UPSTREAM_RETRIES).increment(1);
                    tokio::time::sleep(delay).await;
                }
            }
        }
        Err(ProviderError::network("upstream request failed"))
    }

    async fn attempt(&self, url: &str, payload: &Value) -> ProviderResult<Map<String, Value>> {
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::http_status(status.as_u16()));
        }

        let bytes = resp.bytes().await.map_err(classify)?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ProviderError::Response(
                "JSON response must be an object".to_string(),
            )),
            Err(e) => Err(ProviderError::Response(format!("JSON decode error: {e}"))),
        }
    }
}

/// Delay before attempt `attempt + 1`: `min(2s, base * 2^attempt)`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_BACKOFF)
}

fn classify(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else if let Some(status) = err.status() {
        ProviderError::http_status(status.as_u16())
    } else {
        ProviderError::network(format!("transport error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_millis(200);
        let schedule: Vec<u128> = (0..5).map(|a| backoff_delay(base, a).as_millis()).collect();
        assert_eq!(schedule, vec![200, 400, 800, 1600, 2000]);
        assert_eq!(backoff_delay(base, 40), MAX_BACKOFF);
    }

    #[test]
    fn missing_base_url_or_key_is_configuration_error() {
        let no_url = UpstreamConfig {
            api_key: "secret".into(),
            ..Default::default()
        };
        assert!(matches!(
            UpstreamClient::new(&no_url),
            Err(ProviderError::Configuration(_))
        ));

        let no_key = UpstreamConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        };
        assert!(matches!(
            UpstreamClient::new(&no_key),
            Err(ProviderError::Configuration(_))
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let cfg = UpstreamConfig {
            base_url: "http://upstream.test/".into(),
            api_key: "k".into(),
            ..Default::default()
        };
        let client = UpstreamClient::new(&cfg).unwrap();
        assert_eq!(client.base_url(), "http://upstream.test");
    }
}
