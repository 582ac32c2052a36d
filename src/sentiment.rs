use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::decision::round_to;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).unwrap_or_default()
});

/// Offline scores are kept away from the extremes.
pub const STUB_SCORE_LIMIT: f64 = 0.9;

/// Positive/negative share of lexicon hits in one text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Polarity {
    pub pos: f64,
    pub neg: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Shares of positive and negative lexicon words; both 0 when nothing matched.
    pub fn polarity(&self, text: &str) -> Polarity {
        let (mut pos, mut neg) = (0u32, 0u32);
        for tok in tokenize(text) {
            match self.word_score(&tok) {
                s if s > 0 => pos += 1,
                s if s < 0 => neg += 1,
                _ => {}
            }
        }
        let total = (pos + neg).max(1) as f64;
        Polarity {
            pos: pos as f64 / total,
            neg: neg as f64 / total,
        }
    }

    /// Mean positive share minus mean negative share, clamped to ±0.9, 3 decimals.
    pub fn score_texts<S: AsRef<str>>(&self, texts: &[S]) -> f64 {
        if texts.is_empty() {
            return 0.0;
        }
        let n = texts.len() as f64;
        let (pos, neg) = texts
            .iter()
            .map(|t| self.polarity(t.as_ref()))
            .fold((0.0, 0.0), |(p, q), v| (p + v.pos, q + v.neg));
        let score = (pos / n - neg / n).clamp(-STUB_SCORE_LIMIT, STUB_SCORE_LIMIT);
        round_to(score, 3)
    }
}

/// Lower-cased word tokens; apostrophes and hyphens stay inside words.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '\'' || c == '-'))
        .map(|t| t.trim_matches(|c| c == '\'' || c == '-'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_shares_per_text() {
        let a = SentimentAnalyzer::new();
        let p = a.polarity("Strong growth, but recession RISK looms");
        assert!((p.pos - 0.5).abs() < 1e-12);
        assert!((p.neg - 0.5).abs() < 1e-12);
        assert_eq!(a.polarity("nothing to see"), Polarity::default());
    }

    #[test]
    fn score_is_clamped_and_rounded() {
        let a = SentimentAnalyzer::new();
        assert_eq!(a.score_texts(&["good up strong"]), 0.9);
        assert_eq!(a.score_texts(&["bad", "weak"]), -0.9);
        assert_eq!(
            a.score_texts(&["good bad bad", "flat"]),
            round_to((1.0 / 3.0 - 2.0 / 3.0) / 2.0, 3)
        );
        assert_eq!(a.score_texts::<&str>(&[]), 0.0);
    }

    #[test]
    fn tokenizer_keeps_inner_hyphens() {
        let toks: Vec<String> = tokenize("Up-trend 'bullish' -- DOWN").collect();
        assert_eq!(toks, vec!["up-trend", "bullish", "down"]);
    }
}
