//! Lexical risk scoring
//!
//! Two scorers are available. [`WeightedLexiconScorer`] sums the weights of
//! every lexicon term contained anywhere in the text and normalizes against
//! [`SEVERITY_BUDGET`]. [`KeywordDensityScorer`] measures how often whole-word
//! keywords occur relative to document length.
//!
//! Matching in the weighted scorer is plain substring containment on the
//! lowercased text, so "antitrustworthy" matches "antitrust".

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::lexicon::Lexicon;

/// Summed weight that maps to a risk score of 1.0
pub const SEVERITY_BUDGET: f64 = 100.0;

/// Multiplier applied to the keyword-per-word ratio by the density scorer
pub const DENSITY_SCALE: f64 = 10.0;

lazy_static! {
    static ref WORD_PATTERN: Regex = Regex::new(r"\w+").unwrap();
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScoreResult {
    /// Always within `[0.0, 1.0]`
    pub risk_score: f64,
    /// Matched terms in lexicon order, no duplicates
    pub flagged_terms: Vec<String>,
}

/// How a scorer decides that a term occurs in the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermMatch {
    /// Anywhere, including inside a longer word
    Substring,
    /// Only between word boundaries
    WholeWord,
}

impl TermMatch {
    /// Case-insensitive pattern finding `term` under this rule
    pub fn pattern(&self, term: &str) -> Result<Regex, regex::Error> {
        let escaped = regex::escape(term);
        let pattern = match self {
            TermMatch::Substring => escaped,
            TermMatch::WholeWord => format!(r"\b{}\b", escaped),
        };
        RegexBuilder::new(&pattern).case_insensitive(true).build()
    }
}

/// A pure function from `(text, lexicon)` to a score
pub trait RiskScorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rule used to find terms; flagged sections follow the same rule
    fn term_match(&self) -> TermMatch;

    fn score(&self, text: &str, lexicon: &Lexicon) -> ScoreResult;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedLexiconScorer;

impl RiskScorer for WeightedLexiconScorer {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn term_match(&self) -> TermMatch {
        TermMatch::Substring
    }

    fn score(&self, text: &str, lexicon: &Lexicon) -> ScoreResult {
        let lower = text.to_lowercase();
        let mut flagged_terms = Vec::new();
        let mut total_weight: u64 = 0;

        for entry in lexicon {
            if lower.contains(entry.term.as_str()) {
                flagged_terms.push(entry.term.clone());
                total_weight += u64::from(entry.weight);
            }
        }

        ScoreResult {
            risk_score: (total_weight as f64 / SEVERITY_BUDGET).min(1.0),
            flagged_terms,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordDensityScorer;

impl RiskScorer for KeywordDensityScorer {
    fn name(&self) -> &'static str {
        "density"
    }

    fn term_match(&self) -> TermMatch {
        TermMatch::WholeWord
    }

    fn score(&self, text: &str, lexicon: &Lexicon) -> ScoreResult {
        let total_words = WORD_PATTERN.find_iter(text).count().max(1);

        let mut flagged_terms = Vec::new();
        let mut occurrences = 0usize;

        for entry in lexicon {
            let Ok(keyword) = self.term_match().pattern(&entry.term) else {
                continue;
            };
            let count = keyword.find_iter(text).count();
            if count > 0 {
                flagged_terms.push(entry.term.clone());
                occurrences += count;
            }
        }

        let ratio = occurrences as f64 / total_words as f64;
        ScoreResult {
            risk_score: (ratio * DENSITY_SCALE).min(1.0),
            flagged_terms,
        }
    }
}

/// Selects a scorer together with the lexicon it is calibrated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringStrategy {
    #[default]
    Weighted,
    Density,
}

impl ScoringStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringStrategy::Weighted => "weighted",
            ScoringStrategy::Density => "density",
        }
    }

    pub fn scorer(&self) -> Box<dyn RiskScorer> {
        match self {
            ScoringStrategy::Weighted => Box::new(WeightedLexiconScorer),
            ScoringStrategy::Density => Box::new(KeywordDensityScorer),
        }
    }

    pub fn lexicon(&self) -> Lexicon {
        match self {
            ScoringStrategy::Weighted => Lexicon::standard(),
            ScoringStrategy::Density => Lexicon::keyword_watchlist(),
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weighted" => Ok(ScoringStrategy::Weighted),
            "density" => Ok(ScoringStrategy::Density),
            other => Err(format!(
                "Unknown scoring strategy '{}'. Must be 'weighted' or 'density'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn weighted(text: &str) -> ScoreResult {
        WeightedLexiconScorer.score(text, &Lexicon::standard())
    }

    #[test]
    fn test_single_term() {
        let result = weighted("We detected fraud in the Q3 filings. Revenue grew 5%.");
        assert_eq!(result.flagged_terms, vec!["fraud"]);
        assert_eq!(result.risk_score, 0.2);
    }

    #[test]
    fn test_flags_in_lexicon_order_not_text_order() {
        let result = weighted("An antitrust probe followed the bribery allegations.");
        assert_eq!(result.flagged_terms, vec!["bribery", "antitrust"]);
        assert_eq!(result.risk_score, 0.3);
    }

    #[test]
    fn test_case_insensitive_and_counted_once() {
        let result = weighted("FRAUD. Fraud. fraud everywhere.");
        assert_eq!(result.flagged_terms, vec!["fraud"]);
        assert_eq!(result.risk_score, 0.2);
    }

    #[test]
    fn test_multiword_terms() {
        let result = weighted("Evidence of Money Laundering and a data breach.");
        assert_eq!(result.flagged_terms, vec!["money laundering", "data breach"]);
        assert_eq!(result.risk_score, 0.5);
    }

    #[test]
    fn test_substring_match_without_word_boundary() {
        let result = weighted("An antitrustworthy partner.");
        assert_eq!(result.flagged_terms, vec!["antitrust"]);
    }

    #[test]
    fn test_score_is_capped() {
        let text = "fraud bribery sanctions bankruptcy money laundering litigation \
                    regulatory fines tax evasion data breach antitrust";
        let result = weighted(text);
        assert_eq!(result.flagged_terms.len(), 10);
        assert_eq!(result.risk_score, 1.0);
    }

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(weighted(""), ScoreResult::default());
        assert_eq!(weighted("All systems nominal."), ScoreResult::default());
    }

    #[test]
    fn test_density_counts_whole_words() {
        let lexicon = Lexicon::keyword_watchlist();
        // 2 keyword hits over 10 words
        let text = "The audit found one breach in ten reviewed vendor files";
        let result = KeywordDensityScorer.score(text, &lexicon);
        assert_eq!(result.flagged_terms, vec!["breach", "audit"]);
        assert_eq!(result.risk_score, 1.0);

        let long = format!("{} {}", "word ".repeat(98), "fine penalty");
        let result = KeywordDensityScorer.score(&long, &lexicon);
        assert_eq!(result.flagged_terms, vec!["penalty", "fine"]);
        assert!((result.risk_score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_density_ignores_partial_words() {
        let lexicon = Lexicon::keyword_watchlist();
        let result = KeywordDensityScorer.score("Riskless refinement.", &lexicon);
        assert!(result.flagged_terms.is_empty());
        assert_eq!(result.risk_score, 0.0);
    }

    #[test]
    fn test_term_match_patterns() {
        let whole = TermMatch::WholeWord.pattern("risk").unwrap();
        assert_eq!(whole.find_iter("Riskless RISK, risky risk.").count(), 2);

        let anywhere = TermMatch::Substring.pattern("risk").unwrap();
        assert_eq!(anywhere.find_iter("Riskless RISK, risky risk.").count(), 4);

        assert_eq!(WeightedLexiconScorer.term_match(), TermMatch::Substring);
        assert_eq!(KeywordDensityScorer.term_match(), TermMatch::WholeWord);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("weighted".parse(), Ok(ScoringStrategy::Weighted));
        assert_eq!("DENSITY".parse(), Ok(ScoringStrategy::Density));
        assert!("frequency".parse::<ScoringStrategy>().is_err());
        assert_eq!(ScoringStrategy::default().to_string(), "weighted");
        assert_eq!(ScoringStrategy::Density.scorer().name(), "density");
    }

    fn lexicon_strategy() -> impl Strategy<Value = Lexicon> {
        prop::collection::btree_map("[a-z]{1,6}( [a-z]{1,6})?", 1u32..200, 0..12).prop_map(
            |terms| Lexicon::new(terms).expect("generated lexicon is valid"),
        )
    }

    proptest! {
        /// Property: the score never leaves [0, 1] for either scorer
        #[test]
        fn score_is_bounded(text in "[a-zA-Z .!?]{0,300}", lexicon in lexicon_strategy()) {
            for scorer in [ScoringStrategy::Weighted.scorer(), ScoringStrategy::Density.scorer()] {
                let result = scorer.score(&text, &lexicon);
                prop_assert!((0.0..=1.0).contains(&result.risk_score));
            }
        }

        /// Property: flagged terms are unique, present, and follow lexicon order
        #[test]
        fn flagged_terms_are_an_ordered_subsequence(
            text in "[a-z ]{0,300}",
            lexicon in lexicon_strategy()
        ) {
            let result = WeightedLexiconScorer.score(&text, &lexicon);
            let mut cursor = lexicon.iter();
            for term in &result.flagged_terms {
                prop_assert!(text.contains(term.as_str()));
                prop_assert!(cursor.any(|entry| &entry.term == term));
            }
        }

        /// Property: scoring is a pure function of its inputs
        #[test]
        fn scoring_is_idempotent(text in ".{0,200}") {
            let lexicon = Lexicon::standard();
            prop_assert_eq!(
                WeightedLexiconScorer.score(&text, &lexicon),
                WeightedLexiconScorer.score(&text, &lexicon)
            );
        }
    }
}
