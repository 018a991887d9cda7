use shared_types::{AssessmentResult, DocumentId};

use crate::scoring::ScoreResult;

pub const REVIEW_RECOMMENDATION: &str =
    "Review the highlighted sentences for potential compliance issues.";

pub const DUE_DILIGENCE_RECOMMENDATION: &str =
    "No high-severity risk terms detected; continue standard due diligence.";

/// Combine scorer and summarizer output into the final record
pub fn assemble(
    document_id: DocumentId,
    score: ScoreResult,
    summary: String,
    flagged_sections: Vec<String>,
) -> AssessmentResult {
    let recommendation = if score.flagged_terms.is_empty() {
        DUE_DILIGENCE_RECOMMENDATION
    } else {
        REVIEW_RECOMMENDATION
    };

    AssessmentResult {
        document_id,
        summary,
        risk_score: score.risk_score,
        flagged_terms: score.flagged_terms,
        flagged_sections,
        recommendation: recommendation.to_string(),
    }
}
