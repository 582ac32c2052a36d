//! Resilient call executor: breaker gate → cache lookup → call → bookkeeping.
//!
//! All upstream operations of a provider flow through one `ResilientExecutor`.
//! Cache and breaker live behind a single mutex that is never held across an
//! `.await`, so concurrent calls only serialize on bookkeeping, not on I/O.
//!
//! Dropping an in-flight `execute` future (caller went away) records nothing:
//! no breaker failure and no cache write.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use metrics::counter;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
use super::cache::TtlCache;
use crate::error::{ProviderError, ProviderResult};
use crate::metrics::{
    ensure_metrics_described, CACHE_HITS, CACHE_MISSES, CIRCUIT_OPENED, CIRCUIT_REJECTIONS,
    FAILURES,
};
use crate::schemas::{SentimentResponse, SummarizeResponse, VoteResponse};

/// Typed cache payload. Each response type copies itself in and out explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Summarize(SummarizeResponse),
    Sentiment(SentimentResponse),
    Vote(VoteResponse),
}

pub trait Cacheable: Sized {
    fn to_cached(&self) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Self>;
}

impl Cacheable for SummarizeResponse {
    fn to_cached(&self) -> CachedValue {
        CachedValue::Summarize(self.clone())
    }
    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Summarize(v) => Some(v),
            _ => None,
        }
    }
}

impl Cacheable for SentimentResponse {
    fn to_cached(&self) -> CachedValue {
        CachedValue::Sentiment(self.clone())
    }
    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Sentiment(v) => Some(v),
            _ => None,
        }
    }
}

impl Cacheable for VoteResponse {
    fn to_cached(&self) -> CachedValue {
        CachedValue::Vote(self.clone())
    }
    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Vote(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Zero disables caching.
    pub cache_ttl: Duration,
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            breaker_threshold: super::breaker::DEFAULT_THRESHOLD,
            breaker_cooldown: super::breaker::DEFAULT_COOLDOWN,
        }
    }
}

#[derive(Debug)]
struct Shared {
    cache: TtlCache<CachedValue>,
    breaker: CircuitBreaker,
}

#[derive(Debug)]
pub struct ResilientExecutor {
    shared: Mutex<Shared>,
}

impl Default for ResilientExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl ResilientExecutor {
    pub fn new(cfg: ExecutorConfig) -> Self {
        ensure_metrics_described();
        Self {
            shared: Mutex::new(Shared {
                cache: TtlCache::new(cfg.cache_ttl),
                breaker: CircuitBreaker::new(cfg.breaker_threshold, cfg.breaker_cooldown),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // Poison is ignored: the guarded state is only ever plain field writes.
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `call` for `operation` with breaker, cache and failure accounting.
    ///
    /// `call` reports typed failures as `ProviderError` inside the `anyhow`
    /// error; anything else is wrapped into `ProviderError::Unexpected`.
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        payload: &Value,
        call: F,
        use_cache: bool,
    ) -> ProviderResult<T>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let key = use_cache.then(|| fingerprint(operation, payload));

        {
            let mut shared = self.lock();
            let now = Instant::now();
            if shared.breaker.state(now) == CircuitState::HalfOpen {
                info!(operation, "circuit cooldown elapsed, admitting probe");
            }
            if !shared.breaker.try_acquire(now) {
                counter!(CIRCUIT_REJECTIONS).increment(1);
                debug!(operation, "circuit open, failing fast");
                return Err(ProviderError::CircuitOpen);
            }
            if let Some(key) = key.as_deref() {
                if let Some(hit) = shared.cache.get(key, now).and_then(T::from_cached) {
                    counter!(CACHE_HITS, "operation" => operation.to_string()).increment(1);
                    debug!(operation, "cache hit");
                    return Ok(hit);
                }
                if shared.cache.is_enabled() {
                    counter!(CACHE_MISSES, "operation" => operation.to_string()).increment(1);
                }
            }
        }

        match call().await {
            Ok(value) => {
                let mut shared = self.lock();
                shared.breaker.record_success();
                if let Some(key) = key {
                    shared.cache.set(key, &value.to_cached(), Instant::now());
                }
                Ok(value)
            }
            Err(err) => {
                let err = into_provider_error(err);
                let tripped = self.lock().breaker.record_failure(Instant::now());
                counter!(FAILURES, "code" => err.error_code()).increment(1);
                if tripped {
                    counter!(CIRCUIT_OPENED).increment(1);
                    warn!(operation, error = %err, "circuit breaker opened");
                } else {
                    warn!(operation, error = %err, "provider call failed");
                }
                Err(err)
            }
        }
    }

    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.lock().breaker.snapshot()
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.lock().breaker.state(Instant::now())
    }

    pub fn clear_cache(&self) {
        self.lock().cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.lock().cache.len()
    }
}

fn into_provider_error(err: anyhow::Error) -> ProviderError {
    match err.downcast::<ProviderError>() {
        Ok(typed) => typed,
        Err(other) => ProviderError::Unexpected(format!("{other:#}")),
    }
}

/// SHA-256 over `operation:canonical_json(payload)`, hex encoded.
///
/// Canonical JSON: object keys sorted, no whitespace. Field order in the
/// incoming request therefore never changes the key.
pub fn fingerprint(operation: &str, payload: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(payload, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    hasher.update(b":");
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, k) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(&map[k], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
