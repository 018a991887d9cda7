//! Context snippets around flagged-term matches

use crate::scoring::TermMatch;

/// Most sections reported for one document
pub const MAX_SECTIONS: usize = 10;

/// Characters of context kept on each side of a match
pub const CONTEXT_CHARS: usize = 50;

/// Collect a snippet around every case-insensitive occurrence of each
/// flagged term, term by term, stopping at [`MAX_SECTIONS`]. Occurrences
/// are found with the same [`TermMatch`] rule the scorer used.
pub fn flagged_sections(
    text: &str,
    flagged_terms: &[String],
    term_match: TermMatch,
) -> Vec<String> {
    let mut sections = Vec::new();

    for term in flagged_terms {
        let Ok(pattern) = term_match.pattern(term) else {
            continue;
        };

        for found in pattern.find_iter(text) {
            if sections.len() == MAX_SECTIONS {
                return sections;
            }
            sections.push(extract_snippet(text, found.start(), found.end()));
        }
    }

    sections
}

/// Slice up to [`CONTEXT_CHARS`] characters either side of `start..end`.
/// Offsets must lie on char boundaries.
fn extract_snippet(text: &str, start: usize, end: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(CONTEXT_CHARS)
        .last()
        .map_or(start, |(idx, _)| idx);
    let to = text[end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map_or(text.len(), |(idx, _)| end + idx);

    text[from..to].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_short_text_is_whole_snippet() {
        let sections = flagged_sections(
            "  Possible fraud here.  ",
            &terms(&["fraud"]),
            TermMatch::Substring,
        );
        assert_eq!(sections, vec!["Possible fraud here."]);
    }

    #[test]
    fn test_window_is_fifty_chars_each_side() {
        let text = format!("{}fraud{}", "a".repeat(80), "b".repeat(80));
        let sections = flagged_sections(&text, &terms(&["fraud"]), TermMatch::Substring);
        assert_eq!(
            sections,
            vec![format!("{}fraud{}", "a".repeat(50), "b".repeat(50))]
        );
    }

    #[test]
    fn test_window_respects_multibyte_chars() {
        let text = format!("{}Fraud{}", "é".repeat(60), "ü".repeat(60));
        let sections = flagged_sections(&text, &terms(&["fraud"]), TermMatch::Substring);
        assert_eq!(
            sections,
            vec![format!("{}Fraud{}", "é".repeat(50), "ü".repeat(50))]
        );
    }

    #[test]
    fn test_term_then_position_order_and_cap() {
        let text = "litigation. fraud one. fraud two.";
        let sections =
            flagged_sections(text, &terms(&["fraud", "litigation"]), TermMatch::Substring);
        assert_eq!(sections.len(), 3);

        let many = "fraud ".repeat(25);
        let capped = flagged_sections(&many, &terms(&["fraud"]), TermMatch::Substring);
        assert_eq!(capped.len(), MAX_SECTIONS);
    }

    #[test]
    fn test_whole_word_matching_skips_partial_words() {
        let text = "Riskless risk.";
        let whole = flagged_sections(text, &terms(&["risk"]), TermMatch::WholeWord);
        assert_eq!(whole, vec!["Riskless risk."]);

        let anywhere = flagged_sections(text, &terms(&["risk"]), TermMatch::Substring);
        assert_eq!(anywhere.len(), 2);
    }

    #[test]
    fn test_no_terms_no_sections() {
        assert!(flagged_sections("fraud everywhere", &[], TermMatch::Substring).is_empty());
    }
}
