//! API handlers for the compliance server
//!
//! Provides REST endpoints for:
//! - Document upload
//! - Risk analysis of an uploaded document
//! - Retrieval of the latest analysis
//! - Lexicon introspection

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shared_types::{AssessmentResult, DocumentId};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::state::AppState;

/// Multipart field carrying the document
const UPLOAD_FIELD: &str = "file";

/// Build the API router with CORS, tracing and the upload size limit applied
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/upload", post(handle_upload))
        .route("/analyze", post(handle_analyze))
        .route("/analysis/:file_id", get(handle_get_analysis))
        .route("/api/lexicon", get(handle_lexicon))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "compliance-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub filename: Option<String>,
}

/// Handler: POST /upload
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| {
        ServerError::InvalidRequest(format!("Missing '{}' field", UPLOAD_FIELD))
    })?;

    if bytes.is_empty() {
        return Err(ServerError::EmptyUpload);
    }

    let size = bytes.len();
    let file_id = state.documents.put(bytes.to_vec(), filename.clone());
    info!("Upload stored: file_id={}, bytes={}", file_id, size);

    Ok(Json(UploadResponse {
        file_id: file_id.to_string(),
        filename,
    }))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge
    } else {
        ServerError::InvalidRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}

/// Analysis request body
#[derive(Deserialize)]
pub struct AnalysisRequest {
    pub file_id: String,
}

/// Analysis result as returned to clients
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResponse {
    pub file_id: String,
    pub summary: String,
    pub risk_score: f64,
    pub details: AnalysisDetails,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisDetails {
    pub flagged_terms: Vec<String>,
    pub flagged_sections: Vec<String>,
    pub recommendations: String,
}

impl From<AssessmentResult> for AnalysisResponse {
    fn from(result: AssessmentResult) -> Self {
        Self {
            file_id: result.document_id.to_string(),
            summary: result.summary,
            risk_score: result.risk_score,
            details: AnalysisDetails {
                flagged_terms: result.flagged_terms,
                flagged_sections: result.flagged_sections,
                recommendations: result.recommendation,
            },
        }
    }
}

/// Handler: POST /analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ServerError> {
    let file_id = DocumentId::new(req.file_id);
    info!("Analysis request: file_id={}", file_id);

    let document = state.documents.get(&file_id)?;

    // Extraction can be CPU heavy for large PDFs
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        engine.analyze(document.id.clone(), &document.bytes)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Analysis task failed: {}", e)))?;

    info!(
        "Analysis complete: file_id={}, risk_score={:.2}, flagged={}",
        file_id,
        result.risk_score,
        result.flagged_terms.len()
    );

    state.results.put(file_id, result.clone());
    Ok(Json(result.into()))
}

/// Handler: GET /analysis/:file_id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<AnalysisResponse>, ServerError> {
    let result = state.results.get(&DocumentId::new(file_id))?;
    Ok(Json(result.into()))
}

/// Lexicon listing response
#[derive(Serialize)]
pub struct LexiconResponse {
    pub strategy: String,
    pub severity_budget: f64,
    pub terms: Vec<LexiconTerm>,
}

#[derive(Serialize)]
pub struct LexiconTerm {
    pub term: String,
    pub weight: u32,
}

/// Handler: GET /api/lexicon
pub async fn handle_lexicon(State(state): State<AppState>) -> Json<LexiconResponse> {
    let terms = state
        .engine
        .lexicon()
        .iter()
        .map(|entry| LexiconTerm {
            term: entry.term.clone(),
            weight: entry.weight,
        })
        .collect();

    Json(LexiconResponse {
        strategy: state.engine.strategy().to_string(),
        severity_budget: compliance_engine::SEVERITY_BUDGET,
        terms,
    })
}
