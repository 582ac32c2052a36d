//! Tolerant normalization of upstream JSON into the fixed response schema.
//!
//! Upstream payloads vary in key spelling and nesting. Every extractor scans a
//! priority-ordered key list, first match wins, and absence falls back to an
//! empty/default value instead of an error. Pure functions, no I/O.

use serde_json::{Map, Value};

use crate::schemas::{SentimentResponse, Source, SummarizeResponse};

pub const SUMMARY_KEYS: &[&str] = &["summary", "result", "text"];
pub const IMPACT_KEYS: &[&str] = &["impact", "insight", "sentiment"];
pub const RATIONALE_KEYS: &[&str] = &["rationale", "explanation", "reason"];
pub const SCORE_KEYS: &[&str] = &["score", "sentiment", "value"];

pub const DEFAULT_SOURCE_TITLE: &str = "Source";
pub const DEFAULT_IMPACT: &str = "Unknown";

/// First string found under `keys`. An object with a string `text` field is unwrapped.
pub fn extract_text(data: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match data.get(*k)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(inner) => inner.get("text")?.as_str().map(str::to_string),
        _ => None,
    })
}

/// First number found under `keys`, either bare or nested as `{score}` / `{value}`.
pub fn extract_f64(data: &Map<String, Value>, keys: &[&str], default: f64) -> f64 {
    keys.iter()
        .find_map(|k| match data.get(*k)? {
            Value::Number(n) => n.as_f64(),
            Value::Object(inner) => inner
                .get("score")
                .and_then(Value::as_f64)
                .or_else(|| inner.get("value").and_then(Value::as_f64)),
            _ => None,
        })
        .unwrap_or(default)
}

/// Map a list of loosely-shaped records to `Source`s.
///
/// Records without a URL are dropped; anything that is not a list yields `[]`.
pub fn extract_sources(raw: Option<&Value>) -> Vec<Source> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let url = non_empty_str(item, &["url"])?;
            let title = non_empty_str(item, &["title", "name"])
                .unwrap_or_else(|| DEFAULT_SOURCE_TITLE.to_string());
            let time = non_empty_str(item, &["time", "timestamp"]);
            Some(Source { title, url, time })
        })
        .collect()
}

pub fn normalize_summary(data: &Map<String, Value>, latency_ms: u64) -> SummarizeResponse {
    SummarizeResponse {
        summary: extract_text(data, SUMMARY_KEYS).unwrap_or_default(),
        impact: extract_text(data, IMPACT_KEYS).unwrap_or_else(|| DEFAULT_IMPACT.to_string()),
        sources: extract_sources(data.get("sources")),
        latency_ms,
    }
}

pub fn normalize_sentiment(data: &Map<String, Value>) -> SentimentResponse {
    SentimentResponse {
        score: extract_f64(data, SCORE_KEYS, 0.0).clamp(-1.0, 1.0),
        rationale: extract_text(data, RATIONALE_KEYS).unwrap_or_default(),
        sources: extract_sources(data.get("sources")),
    }
}

fn non_empty_str(item: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        item.get(*k)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn text_priority_and_unwrapping() {
        let d = obj(json!({"text": "third", "result": {"text": "second"}}));
        assert_eq!(extract_text(&d, SUMMARY_KEYS).as_deref(), Some("second"));

        let d = obj(json!({"summary": 42, "text": "fallback"}));
        assert_eq!(extract_text(&d, SUMMARY_KEYS).as_deref(), Some("fallback"));

        assert_eq!(extract_text(&obj(json!({})), SUMMARY_KEYS), None);
    }

    #[test]
    fn numbers_bare_nested_or_default() {
        assert_eq!(extract_f64(&obj(json!({"score": 1})), SCORE_KEYS, 0.0), 1.0);
        assert_eq!(
            extract_f64(&obj(json!({"sentiment": {"value": -0.25}})), SCORE_KEYS, 0.0),
            -0.25
        );
        assert_eq!(
            extract_f64(&obj(json!({"value": "high"})), SCORE_KEYS, 0.7),
            0.7
        );
    }

    #[test]
    fn nested_zero_score_is_kept() {
        let d = obj(json!({"score": {"score": 0.0, "value": 0.9}}));
        assert_eq!(extract_f64(&d, SCORE_KEYS, 0.5), 0.0);
    }

    #[test]
    fn sources_drop_records_without_url() {
        let raw = json!([{"title": "A"}, {"title": "B", "url": "http://x"}]);
        let out = extract_sources(Some(&raw));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "http://x");
        assert_eq!(out[0].title, "B");
    }

    #[test]
    fn sources_defaults_and_alternate_keys() {
        let raw = json!([
            {"url": "http://a"},
            {"name": "Wire", "url": "http://b", "timestamp": "2025-01-01T00:00:00Z"},
            "not-an-object",
            {"url": "http://a"}
        ]);
        let out = extract_sources(Some(&raw));
        assert_eq!(out.len(), 3, "duplicates are kept, junk dropped");
        assert_eq!(out[0].title, DEFAULT_SOURCE_TITLE);
        assert_eq!(out[1].title, "Wire");
        assert_eq!(out[1].time.as_deref(), Some("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn non_list_sources_yield_empty() {
        assert!(extract_sources(None).is_empty());
        assert!(extract_sources(Some(&json!({"url": "http://x"}))).is_empty());
        assert!(extract_sources(Some(&json!(null))).is_empty());
    }

    #[test]
    fn sentiment_is_clamped_and_defaults() {
        let r = normalize_sentiment(&obj(json!({"score": 3.5, "reason": {"text": "hot"}})));
        assert_eq!(r.score, 1.0);
        assert_eq!(r.rationale, "hot");

        let empty = normalize_sentiment(&obj(json!({})));
        assert_eq!(empty.score, 0.0);
        assert_eq!(empty.rationale, "");
        assert!(empty.sources.is_empty());
    }

    #[test]
    fn summary_defaults_impact() {
        let r = normalize_summary(&obj(json!({"result": "Margins expanded"})), 7);
        assert_eq!(r.summary, "Margins expanded");
        assert_eq!(r.impact, DEFAULT_IMPACT);
        assert_eq!(r.latency_ms, 7);
    }
}
