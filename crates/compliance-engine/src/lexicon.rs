//! Risk lexicon: the term → weight table driving every score

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

/// Weighted risk terms, in scoring order
pub const STANDARD_TERMS: &[(&str, u32)] = &[
    ("fraud", 20),
    ("bribery", 15),
    ("sanctions", 25),
    ("bankruptcy", 10),
    ("money laundering", 30),
    ("litigation", 10),
    ("regulatory fines", 20),
    ("tax evasion", 15),
    ("data breach", 20),
    ("antitrust", 15),
];

/// Single-word keywords used by the density scorer
pub const KEYWORD_WATCHLIST: &[&str] = &[
    "risk",
    "fraud",
    "penalty",
    "sanction",
    "compliance",
    "violation",
    "fine",
    "investigation",
    "legal",
    "lawsuit",
    "breach",
    "corruption",
    "bribery",
    "scandal",
    "regulatory",
    "audit",
    "failure",
    "misconduct",
    "whistleblower",
    "dispute",
    "conflict",
    "violate",
    "punish",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LexiconError {
    #[error("Lexicon term must not be empty")]
    EmptyTerm,

    #[error("Lexicon term '{0}' must be lowercase")]
    NotLowercase(String),

    #[error("Lexicon term '{0}' must have a positive weight")]
    ZeroWeight(String),

    #[error("Lexicon term '{0}' is defined more than once")]
    Duplicate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexiconEntry {
    pub term: String,
    pub weight: u32,
}

/// Ordered, duplicate-free set of weighted terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
}

impl Lexicon {
    /// Build a lexicon from `(term, weight)` pairs, keeping their order.
    pub fn new<I, S>(entries: I) -> Result<Self, LexiconError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut validated = Vec::new();

        for (term, weight) in entries {
            let term = term.into();
            if term.is_empty() {
                return Err(LexiconError::EmptyTerm);
            }
            if term != term.to_lowercase() {
                return Err(LexiconError::NotLowercase(term));
            }
            if weight == 0 {
                return Err(LexiconError::ZeroWeight(term));
            }
            if !seen.insert(term.clone()) {
                return Err(LexiconError::Duplicate(term));
            }
            validated.push(LexiconEntry { term, weight });
        }

        Ok(Self { entries: validated })
    }

    /// The weighted compliance lexicon
    pub fn standard() -> Self {
        Self::from_static(STANDARD_TERMS.iter().copied())
    }

    /// The keyword watchlist, every term weighted 1
    pub fn keyword_watchlist() -> Self {
        Self::from_static(KEYWORD_WATCHLIST.iter().map(|&term| (term, 1)))
    }

    // Static tables are checked by the tests below
    fn from_static(entries: impl Iterator<Item = (&'static str, u32)>) -> Self {
        Self {
            entries: entries
                .map(|(term, weight)| LexiconEntry {
                    term: term.to_string(),
                    weight,
                })
                .collect(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LexiconEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'a> IntoIterator for &'a Lexicon {
    type Item = &'a LexiconEntry;
    type IntoIter = std::slice::Iter<'a, LexiconEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
