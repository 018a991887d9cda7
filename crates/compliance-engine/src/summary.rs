//! Sentence segmentation and summary selection

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Sentence terminator followed by whitespace; the split happens after the terminator
    static ref SENTENCE_BOUNDARY: Regex = Regex::new(r"[.!?]\s+").unwrap();
}

const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Split text into trimmed, non-empty sentence-like units.
///
/// A boundary is a run of whitespace immediately after `.`, `!` or `?`; the
/// terminator stays with the sentence it ends.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // terminators are ASCII, so +1 stays on a char boundary
        let end = boundary.start() + 1;
        push_trimmed(&mut sentences, &text[start..end]);
        start = boundary.end();
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, unit: &'a str) {
    let unit = unit.trim();
    if !unit.is_empty() {
        sentences.push(unit);
    }
}

/// Build a summary from the sentences that mention a flagged term.
///
/// Falls back to the first sentence when none qualifies. Selected sentences
/// are joined with `". "` and the result ends in exactly one period, so a
/// sentence made only of terminators contributes nothing but that period.
/// Returns an empty string only when the text has no sentences at all.
pub fn summarize(text: &str, flagged_terms: &[String]) -> String {
    let sentences = split_sentences(text);
    let terms: Vec<String> = flagged_terms.iter().map(|t| t.to_lowercase()).collect();

    let mut selected: Vec<&str> = sentences
        .iter()
        .copied()
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            terms.iter().any(|term| lower.contains(term.as_str()))
        })
        .collect();

    if selected.is_empty() {
        match sentences.first() {
            Some(&first) => selected.push(first),
            None => return String::new(),
        }
    }

    let mut summary = selected
        .into_iter()
        .map(|sentence| sentence.trim_end_matches(TERMINATORS))
        .collect::<Vec<_>>()
        .join(". ");
    summary.push('.');
    summary
}
