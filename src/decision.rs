//! decision.rs: verdict, proposals and the explainable vote outcome.
//!
//! A `Decision` is what the voting engines return and what `/vote` serializes:
//! BUY/HOLD/SELL, the per-agent weights that produced it, engine metadata and
//! a calibrated up/down probability pair.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trade verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Buy,
    Hold,
    Sell,
}

impl Verdict {
    /// Signal in [0,1] used by the weighted-sum engine.
    pub fn signal(self) -> f64 {
        match self {
            Verdict::Buy => 1.0,
            Verdict::Hold => 0.5,
            Verdict::Sell => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Buy => "BUY",
            Verdict::Hold => "HOLD",
            Verdict::Sell => "SELL",
        }
    }
}

/// One agent's independent opinion. Supplied by the caller, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub agent: String,
    pub vote: Verdict,
    /// Expected in [0,1]; engines clamp.
    pub weight: f64,
    /// Expected in [0,1]; informational for the current engines.
    pub confidence: f64,
}

impl Proposal {
    pub fn new(agent: impl Into<String>, vote: Verdict, weight: f64, confidence: f64) -> Self {
        Self {
            agent: agent.into(),
            vote,
            weight,
            confidence,
        }
    }
}

/// Explainability block: normalized weights per agent plus engine metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteExplain {
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibratedProbs {
    pub up: f64,
    pub down: f64,
}

impl CalibratedProbs {
    /// Rounded pair from an up-probability.
    pub fn from_up(p_up: f64) -> Self {
        Self {
            up: round_to(p_up, 3),
            down: round_to(1.0 - p_up, 3),
        }
    }

    pub fn neutral() -> Self {
        Self { up: 0.5, down: 0.5 }
    }
}

/// Full vote outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision: Verdict,
    pub explain: VoteExplain,
    pub calibrated_probs: CalibratedProbs,
}

impl Decision {
    pub fn new(verdict: Verdict, probs: CalibratedProbs) -> Self {
        Self {
            decision: verdict,
            explain: VoteExplain::default(),
            calibrated_probs: probs,
        }
    }

    /// Add a per-agent weight (builder style). Repeated agents accumulate.
    pub fn with_weight(mut self, agent: impl Into<String>, w: f64) -> Self {
        *self.explain.weights.entry(agent.into()).or_insert(0.0) += w;
        self
    }

    /// Add a metadata pair (builder style).
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.explain.meta.insert(key.into(), value.into());
        self
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialize_decision_shape() {
        let d = Decision::new(Verdict::Buy, CalibratedProbs::from_up(0.62246))
            .with_weight("Sentiment", 0.6)
            .with_weight("Macro", 0.4)
            .with_meta("method", "WSUM");

        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["decision"], json!("BUY"));
        assert_eq!(v["explain"]["meta"]["method"], json!("WSUM"));
        assert_eq!(v["calibrated_probs"]["up"], json!(0.622));
        assert_eq!(v["calibrated_probs"]["down"], json!(0.378));

        let w = v["explain"]["weights"]["Sentiment"].as_f64().unwrap();
        assert!((w - 0.6).abs() < 1e-9);
    }

    #[test]
    fn proposal_parses_uppercase_vote() {
        let p: Proposal = serde_json::from_value(json!({
            "agent": "Technical", "vote": "SELL", "weight": 0.3, "confidence": 0.7
        }))
        .unwrap();
        assert_eq!(p.vote, Verdict::Sell);
        assert_eq!(p.vote.signal(), 0.0);
    }

    #[test]
    fn repeated_agent_weights_accumulate() {
        let d = Decision::new(Verdict::Hold, CalibratedProbs::neutral())
            .with_weight("A", 0.25)
            .with_weight("A", 0.25);
        assert_eq!(d.explain.weights.len(), 1);
        assert!((d.explain.weights["A"] - 0.5).abs() < 1e-12);
    }
}
