// tests/voting.rs
//
// Voting engine properties through the public API only.

use corealpha_adapter::decision::{Proposal, Verdict};
use corealpha_adapter::engine::{calibrate, engine_for, normalized_weights, VotingMethod};

fn p(agent: &str, vote: Verdict, weight: f64) -> Proposal {
    Proposal::new(agent, vote, weight, 0.75)
}

#[test]
fn weighted_majority_buy() {
    let engine = engine_for(VotingMethod::Wsum);
    let d = engine.vote(&[p("Sentiment", Verdict::Buy, 0.6), p("Macro", Verdict::Sell, 0.4)]);

    let total: f64 = d.explain.weights.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!((calibrate(0.6) - 0.6224593).abs() < 1e-6);
    assert_eq!(d.decision, Verdict::Buy);
    assert_eq!(d.calibrated_probs.up, 0.622);
}

#[test]
fn probabilities_are_complementary_and_bounded() {
    let engine = engine_for(VotingMethod::Wsum);
    let mixes = [
        vec![p("A", Verdict::Sell, 1.0)],
        vec![p("A", Verdict::Buy, 0.2), p("B", Verdict::Hold, 0.9)],
        vec![p("A", Verdict::Buy, f64::NAN), p("B", Verdict::Sell, 0.3)],
        vec![p("A", Verdict::Hold, -1.0), p("B", Verdict::Hold, 0.0)],
    ];
    for props in mixes {
        let d = engine.vote(&props);
        let (up, down) = (d.calibrated_probs.up, d.calibrated_probs.down);
        assert!((0.0..=1.0).contains(&up) && (0.0..=1.0).contains(&down));
        assert!((up + down - 1.0).abs() <= 0.0011, "{up} + {down}");
    }
}

#[test]
fn strong_sell_crosses_lower_threshold() {
    let d = engine_for(VotingMethod::Wsum).vote(&[
        p("Technical", Verdict::Sell, 0.7),
        p("Risk", Verdict::Sell, 0.2),
        p("Sentiment", Verdict::Hold, 0.1),
    ]);
    assert_eq!(d.decision, Verdict::Sell);
    assert!(d.calibrated_probs.up < 0.45);
}

#[test]
fn repeated_agents_accumulate_weight() {
    let props = [p("Sentiment", Verdict::Buy, 0.5), p("Sentiment", Verdict::Buy, 0.5)];
    let w = normalized_weights(&props);
    assert_eq!(w, vec![0.5, 0.5]);
    let d = engine_for(VotingMethod::Wsum).vote(&props);
    assert_eq!(d.explain.weights.len(), 1);
    assert_eq!(d.explain.weights["Sentiment"], 1.0);
}

#[test]
fn topsis_placeholder_stays_neutral() {
    let d = engine_for(VotingMethod::Topsis).vote(&[p("A", Verdict::Sell, 1.0)]);
    assert_eq!(d.decision, Verdict::Hold);
    assert_eq!(d.calibrated_probs.up, 0.5);
    assert_eq!(d.calibrated_probs.down, 0.5);
    assert_eq!(d.explain.weights["A"], 1.0);
}
