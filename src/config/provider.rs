// src/config/provider.rs
//! Provider settings: optional file → environment overrides → sanitisation.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use std::{env, fmt, fs};

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::engine::VotingMethod;
use crate::resilience::ExecutorConfig;
use crate::upstream::UpstreamConfig;

pub const ENV_PROVIDER_CONFIG_PATH: &str = "PROVIDER_CONFIG_PATH";
pub const DEFAULT_PROVIDER_CONFIG_PATH: &str = "config/provider.toml";

/// `api_key = "ENV"` resolves from this variable.
pub const ENV_API_KEY: &str = "FINGPT_API_KEY";

const MIN_TIMEOUT_SECS: f64 = 0.1;
const MAX_TIMEOUT_SECS: f64 = 600.0;
const MAX_BACKOFF_SECS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    FinGpt,
    Stub,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::FinGpt => "fingpt",
            ProviderKind::Stub => "stub",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fingpt" => Ok(ProviderKind::FinGpt),
            "stub" => Ok(ProviderKind::Stub),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

fn default_timeout_secs() -> f64 {
    10.0
}
fn default_max_retries() -> u32 {
    2
}
fn default_backoff_secs() -> f64 {
    0.2
}
fn default_cache_ttl_secs() -> i64 {
    60
}
fn default_true() -> bool {
    true
}
fn default_breaker_threshold() -> u32 {
    3
}
fn default_breaker_cooldown_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default, deserialize_with = "lenient")]
    pub provider: ProviderKind,
    #[serde(default)]
    pub base_url: String,
    /// "ENV" means: read from FINGPT_API_KEY.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_secs")]
    pub backoff_base_secs: f64,
    /// 0 or less disables caching.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,
    #[serde(default = "default_true")]
    pub use_stub_summary: bool,
    #[serde(default = "default_true")]
    pub use_stub_sentiment: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub voting_method: VotingMethod,
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,
    #[serde(default = "default_breaker_cooldown_secs")]
    pub breaker_cooldown_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            use_stub_summary: true,
            use_stub_sentiment: true,
            voting_method: VotingMethod::default(),
            breaker_threshold: default_breaker_threshold(),
            breaker_cooldown_secs: default_breaker_cooldown_secs(),
        }
    }
}

impl ProviderSettings {
    /// File at `$PROVIDER_CONFIG_PATH` (or the default path, when present), then env.
    pub fn load() -> anyhow::Result<Self> {
        let explicit = env::var(ENV_PROVIDER_CONFIG_PATH).ok();
        let path = explicit
            .clone()
            .unwrap_or_else(|| DEFAULT_PROVIDER_CONFIG_PATH.to_string());

        let mut cfg = if explicit.is_some() || Path::new(&path).exists() {
            info!(path = %path, "loading provider settings file");
            Self::load_from_file(&path)?
        } else {
            Self::default()
        };

        cfg.apply_env();
        cfg.sanitize();
        Ok(cfg)
    }

    /// Defaults plus environment only.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg.sanitize();
        cfg
    }

    /// TOML, or JSON when the extension is `.json`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading provider settings from {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let mut cfg: ProviderSettings = if is_json {
            serde_json::from_str(&data)
                .with_context(|| format!("parsing JSON settings {}", path.display()))?
        } else {
            toml::from_str(&data)
                .with_context(|| format!("parsing TOML settings {}", path.display()))?
        };

        cfg.sanitize();
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        if let Some(v) = env_parsed::<ProviderKind>("LLM_PROVIDER") {
            self.provider = v;
        }
        if let Some(v) = env_string("FINGPT_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = env_string(ENV_API_KEY) {
            self.api_key = v;
        }
        if let Some(v) = env_parsed::<f64>("HTTP_TIMEOUT_SECONDS") {
            self.timeout_secs = v;
        }
        if let Some(v) = env_parsed::<u32>("HTTP_MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = env_parsed::<f64>("HTTP_BACKOFF_SECONDS") {
            self.backoff_base_secs = v;
        }
        if let Some(v) = env_parsed::<i64>("CACHE_TTL_SECONDS") {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = env_bool("USE_STUB_SUMMARY") {
            self.use_stub_summary = v;
        }
        if let Some(v) = env_bool("USE_STUB_SENTIMENT") {
            self.use_stub_sentiment = v;
        }
        if let Some(v) = env_parsed::<VotingMethod>("VOTING_METHOD") {
            self.voting_method = v;
        }
        if let Some(v) = env_parsed::<u32>("BREAKER_THRESHOLD") {
            self.breaker_threshold = v;
        }
        if let Some(v) = env_parsed::<u64>("BREAKER_COOLDOWN_SECONDS") {
            self.breaker_cooldown_secs = v;
        }
    }

    pub fn sanitize(&mut self) {
        self.base_url = self.base_url.trim().to_string();

        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_API_KEY).unwrap_or_default();
            if self.api_key.is_empty() {
                warn!("api_key is \"ENV\" but {ENV_API_KEY} is not set");
            }
        }
        self.api_key = self.api_key.trim().to_string();

        if !self.timeout_secs.is_finite() {
            self.timeout_secs = default_timeout_secs();
        }
        self.timeout_secs = self.timeout_secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);

        if !self.backoff_base_secs.is_finite() || self.backoff_base_secs < 0.0 {
            self.backoff_base_secs = default_backoff_secs();
        }
        self.backoff_base_secs = self.backoff_base_secs.min(MAX_BACKOFF_SECS);

        self.cache_ttl_secs = self.cache_ttl_secs.max(0);

        if self.breaker_threshold == 0 {
            self.breaker_threshold = 1;
        }
    }

    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: secs_or(self.timeout_secs, default_timeout_secs()),
            max_retries: self.max_retries,
            backoff_base: secs_or(self.backoff_base_secs, default_backoff_secs()),
        }
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs.max(0) as u64),
            breaker_threshold: self.breaker_threshold,
            breaker_cooldown: Duration::from_secs(self.breaker_cooldown_secs),
        }
    }
}

/// Out-of-range or negative seconds fall back to `default`.
fn secs_or(secs: f64, default: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_else(|_| Duration::from_secs_f64(default))
}

/// Unknown enum strings fall back to the default instead of failing the load.
fn lenient<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: Display,
{
    let raw = String::deserialize(d)?;
    Ok(raw.parse::<T>().unwrap_or_else(|e| {
        warn!(value = %raw, error = %e, "unrecognised setting, using default");
        T::default()
    }))
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string())
}

fn env_parsed<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env_string(key)?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring unparsable env override");
            None
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let raw = env_string(key)?;
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!(key, value = %raw, "ignoring non-boolean env override");
            None
        }
    }
}
