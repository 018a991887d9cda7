//! Document-to-risk-assessment pipeline
//!
//! bytes → [`TextExtractor`] → text → scorer + [`summarize`] →
//! [`assemble`] → [`AssessmentResult`].
//!
//! The engine holds no mutable state. The same `(bytes, configuration)`
//! always produces the same result, so one engine can be shared across
//! threads and concurrent analyses.

pub mod assemble;
pub mod extract;
pub mod lexicon;
pub mod scoring;
pub mod sections;
pub mod summary;

use std::sync::Arc;

use shared_pdf::PdfDecoder;
use shared_types::{AssessmentResult, DocumentId};
use tracing::debug;

pub use assemble::{assemble, DUE_DILIGENCE_RECOMMENDATION, REVIEW_RECOMMENDATION};
pub use extract::{preview, DocumentFormat, TextExtractor, PREVIEW_BYTES};
pub use lexicon::{Lexicon, LexiconEntry, LexiconError};
pub use scoring::{
    KeywordDensityScorer, RiskScorer, ScoreResult, ScoringStrategy, TermMatch,
    WeightedLexiconScorer, SEVERITY_BUDGET,
};
pub use sections::flagged_sections;
pub use summary::{split_sentences, summarize};

/// ComplianceEngine entry point
pub struct ComplianceEngine {
    extractor: TextExtractor,
    strategy: ScoringStrategy,
    scorer: Box<dyn RiskScorer>,
    lexicon: Lexicon,
}

impl ComplianceEngine {
    /// Weighted scoring over the standard lexicon, no PDF decoder
    pub fn new() -> Self {
        Self::with_strategy(ScoringStrategy::default())
    }

    pub fn with_strategy(strategy: ScoringStrategy) -> Self {
        Self {
            extractor: TextExtractor::default(),
            strategy,
            scorer: strategy.scorer(),
            lexicon: strategy.lexicon(),
        }
    }

    pub fn with_pdf_decoder(mut self, decoder: Arc<dyn PdfDecoder>) -> Self {
        self.extractor = TextExtractor::new(decoder);
        self
    }

    /// Replace the lexicon that came with the strategy
    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn pdf_backend(&self) -> &'static str {
        self.extractor.pdf_backend()
    }

    /// Run the full pipeline over a document's bytes.
    ///
    /// Callers reject empty uploads before getting here.
    pub fn analyze(&self, document_id: DocumentId, data: &[u8]) -> AssessmentResult {
        let text = self.extract_text(data);
        self.analyze_text(document_id, &text)
    }

    /// Extract text, substituting a raw preview when extraction yields nothing
    pub fn extract_text(&self, data: &[u8]) -> String {
        let text = self.extractor.extract(data);
        if text.is_empty() {
            debug!("Extraction produced no text, using {}-byte preview", PREVIEW_BYTES);
            return preview(data);
        }
        text
    }

    /// Score, summarize and assemble already-extracted text
    pub fn analyze_text(&self, document_id: DocumentId, text: &str) -> AssessmentResult {
        let score = self.scorer.score(text, &self.lexicon);
        let summary = summarize(text, &score.flagged_terms);
        let sections = flagged_sections(text, &score.flagged_terms, self.scorer.term_match());

        debug!(
            "Scored {} with {}: risk={:.2}, flagged={:?}",
            document_id,
            self.scorer.name(),
            score.risk_score,
            score.flagged_terms
        );

        assemble(document_id, score, summary, sections)
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}
