//! # Voting Engine
//! Pure, testable logic that maps weighted agent proposals → `Decision`.
//! No I/O and no shared state: safe to call from any thread, and identical
//! input always yields identical output.
//!
//! Two strategies share the `VotingEngine` contract:
//! - `WeightedSumEngine` (WSUM): normalized weighted signal, logistic calibration.
//! - `TopsisEngine`: placeholder that always answers HOLD at 50/50.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::decision::{round_to, CalibratedProbs, Decision, Proposal, Verdict};

/// Logistic steepness around the neutral point.
pub const CALIBRATION_K: f64 = 5.0;
pub const NEUTRAL_SCORE: f64 = 0.5;
pub const BUY_ABOVE: f64 = 0.55;
pub const SELL_BELOW: f64 = 0.45;

pub trait VotingEngine: Send + Sync {
    fn vote(&self, proposals: &[Proposal]) -> Decision;
    fn method(&self) -> VotingMethod;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VotingMethod {
    #[default]
    Wsum,
    Topsis,
}

impl VotingMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            VotingMethod::Wsum => "WSUM",
            VotingMethod::Topsis => "TOPSIS",
        }
    }
}

impl fmt::Display for VotingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VotingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WSUM" => Ok(VotingMethod::Wsum),
            "TOPSIS" => Ok(VotingMethod::Topsis),
            other => Err(format!("unknown voting method: {other}")),
        }
    }
}

/// Factory: engine for the configured method.
pub fn engine_for(method: VotingMethod) -> Arc<dyn VotingEngine> {
    match method {
        VotingMethod::Wsum => Arc::new(WeightedSumEngine),
        VotingMethod::Topsis => Arc::new(TopsisEngine),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedSumEngine;

impl VotingEngine for WeightedSumEngine {
    fn vote(&self, proposals: &[Proposal]) -> Decision {
        let weights = normalized_weights(proposals);

        let score = if proposals.is_empty() {
            NEUTRAL_SCORE
        } else {
            proposals
                .iter()
                .zip(&weights)
                .map(|(p, w)| w * p.vote.signal())
                .sum()
        };

        let p_up = calibrate(score);
        let verdict = verdict_for(p_up);

        let mut per_agent: BTreeMap<String, f64> = BTreeMap::new();
        for (p, w) in proposals.iter().zip(&weights) {
            *per_agent.entry(p.agent.clone()).or_insert(0.0) += w;
        }

        let mut d = Decision::new(verdict, CalibratedProbs::from_up(p_up))
            .with_meta("method", VotingMethod::Wsum.as_str())
            .with_meta("calibration", format!("logit(k={CALIBRATION_K:.1})"))
            .with_meta(
                "decision_threshold",
                format!("{BUY_ABOVE:.2}/{SELL_BELOW:.2}"),
            );
        for (agent, w) in per_agent {
            d = d.with_weight(agent, round_to(w, 4));
        }
        d
    }

    fn method(&self) -> VotingMethod {
        VotingMethod::Wsum
    }
}

/// Not a real TOPSIS ranking: always HOLD at 50/50, echoing the raw weights.
/// Kept as a selectable strategy until an actual TOPSIS definition exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopsisEngine;

impl VotingEngine for TopsisEngine {
    fn vote(&self, proposals: &[Proposal]) -> Decision {
        let mut d = Decision::new(Verdict::Hold, CalibratedProbs::neutral())
            .with_meta("method", VotingMethod::Topsis.as_str())
            .with_meta("status", "stub");
        // Raw echo: a repeated agent keeps its last weight.
        for p in proposals {
            d.explain.weights.insert(p.agent.clone(), p.weight);
        }
        d
    }

    fn method(&self) -> VotingMethod {
        VotingMethod::Topsis
    }
}

/// Clamp each weight to [0,1] and divide by the sum; equal split when the sum is 0.
pub fn normalized_weights(proposals: &[Proposal]) -> Vec<f64> {
    let clamped: Vec<f64> = proposals.iter().map(|p| clamp01(p.weight)).collect();
    let total: f64 = clamped.iter().sum();
    if total > 0.0 {
        clamped.iter().map(|w| w / total).collect()
    } else {
        let n = proposals.len().max(1) as f64;
        vec![1.0 / n; proposals.len()]
    }
}

/// Logistic centred on the neutral score, clamped to [0,1].
pub fn calibrate(score: f64) -> f64 {
    let p = 1.0 / (1.0 + (-CALIBRATION_K * (score - NEUTRAL_SCORE)).exp());
    p.clamp(0.0, 1.0)
}

pub fn verdict_for(p_up: f64) -> Verdict {
    if p_up > BUY_ABOVE {
        Verdict::Buy
    } else if p_up < SELL_BELOW {
        Verdict::Sell
    } else {
        Verdict::Hold
    }
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
