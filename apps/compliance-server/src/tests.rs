//! Tests for the compliance server API
//!
//! Test categories:
//! - Store and response-shape properties (proptest)
//! - HTTP endpoint integration (axum-test)

#[cfg(test)]
mod property_tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use shared_types::AssessmentResult;

    use crate::api::AnalysisResponse;
    use crate::store::{DocumentStore, InMemoryDocumentStore};

    proptest! {
        /// Property: every stored document gets a distinct identifier
        #[test]
        fn document_ids_are_unique(uploads in prop::collection::vec(
            prop::collection::vec(any::<u8>(), 1..64), 1..40
        )) {
            let store = InMemoryDocumentStore::new();
            let mut seen = HashSet::new();
            for bytes in uploads {
                let id = store.put(bytes.clone(), None);
                prop_assert!(seen.insert(id.clone()), "Duplicate id {}", id);
                prop_assert_eq!(&store.get(&id).unwrap().bytes, &bytes);
            }
        }

        /// Property: the wire response carries the assessment unchanged
        #[test]
        fn response_preserves_assessment(
            summary in ".{0,80}",
            risk_score in 0.0f64..=1.0,
            terms in prop::collection::vec("[a-z]{3,10}", 0..5)
        ) {
            let result = AssessmentResult {
                document_id: "file_1".into(),
                summary: summary.clone(),
                risk_score,
                flagged_terms: terms.clone(),
                flagged_sections: vec![],
                recommendation: "Review.".to_string(),
            };
            let response = AnalysisResponse::from(result);
            prop_assert_eq!(response.file_id, "file_1");
            prop_assert_eq!(response.summary, summary);
            prop_assert_eq!(response.risk_score, risk_score);
            prop_assert_eq!(response.details.flagged_terms, terms);
            prop_assert_eq!(response.details.recommendations, "Review.");
        }
    }
}

#[cfg(test)]
mod http_endpoint_tests {
    //! HTTP endpoint integration tests using axum-test

    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shared_pdf::fixtures::text_pdf;

    use crate::api::{self, AnalysisResponse, UploadResponse};
    use crate::config::EngineArgs;
    use crate::state::AppState;

    fn create_test_server_with_limit(max_upload_bytes: usize) -> TestServer {
        let state = AppState::in_memory(EngineArgs::default().build_engine());
        TestServer::new(api::router(state, max_upload_bytes)).unwrap()
    }

    /// Create a test server with the full router
    fn create_test_server() -> TestServer {
        create_test_server_with_limit(1024 * 1024)
    }

    fn file_form(filename: &str, bytes: Vec<u8>) -> MultipartForm {
        MultipartForm::new().add_part("file", Part::bytes(bytes).file_name(filename))
    }

    async fn upload(server: &TestServer, filename: &str, bytes: Vec<u8>) -> String {
        let response = server
            .post("/upload")
            .multipart(file_form(filename, bytes))
            .await;
        response.assert_status_ok();
        response.json::<UploadResponse>().file_id
    }

    async fn analyze(server: &TestServer, file_id: &str) -> AnalysisResponse {
        let response = server
            .post("/analyze")
            .json(&json!({ "file_id": file_id }))
            .await;
        response.assert_status_ok();
        response.json::<AnalysisResponse>()
    }

    #[tokio::test]
    async fn test_health_returns_200() {
        let server = create_test_server();
        let response = server.get("/health").await;
        response.assert_status_ok();

        let json = response.json::<serde_json::Value>();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "compliance-server");
    }

    #[tokio::test]
    async fn test_upload_returns_id_and_filename() {
        let server = create_test_server();
        let response = server
            .post("/upload")
            .multipart(file_form("q3.txt", b"Quarterly report".to_vec()))
            .await;
        response.assert_status_ok();

        let body = response.json::<UploadResponse>();
        assert_eq!(body.file_id, "file_1");
        assert_eq!(body.filename.as_deref(), Some("q3.txt"));

        let second = upload(&server, "q4.txt", b"Another report".to_vec()).await;
        assert_eq!(second, "file_2");
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let server = create_test_server();
        let response = server
            .post("/upload")
            .multipart(file_form("empty.txt", Vec::new()))
            .await;

        response.assert_status_bad_request();
        let json = response.json::<serde_json::Value>();
        assert_eq!(json["code"], "EMPTY_FILE");
        assert_eq!(json["error"], "Empty file");

        // Nothing was stored, so the next upload still gets the first id
        let file_id = upload(&server, "real.txt", b"content".to_vec()).await;
        assert_eq!(file_id, "file_1");
    }

    #[tokio::test]
    async fn test_upload_without_file_field_is_rejected() {
        let server = create_test_server();
        let form = MultipartForm::new().add_text("note", "no document here");
        let response = server.post("/upload").multipart(form).await;

        response.assert_status_bad_request();
        let json = response.json::<serde_json::Value>();
        assert_eq!(json["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let server = create_test_server_with_limit(256);
        let response = server
            .post("/upload")
            .multipart(file_form("big.txt", vec![b'a'; 4096]))
            .await;

        assert!(response.status_code().is_client_error());
    }

    #[tokio::test]
    async fn test_analyze_flags_fraud() {
        let server = create_test_server();
        let file_id = upload(
            &server,
            "filing.txt",
            b"We detected fraud in the Q3 filings. Revenue grew 5%.".to_vec(),
        )
        .await;

        let result = analyze(&server, &file_id).await;
        assert_eq!(result.file_id, file_id);
        assert_eq!(result.risk_score, 0.2);
        assert_eq!(result.summary, "We detected fraud in the Q3 filings.");
        assert_eq!(result.details.flagged_terms, vec!["fraud"]);
        assert_eq!(
            result.details.recommendations,
            compliance_engine::REVIEW_RECOMMENDATION
        );

        let stored = server.get(&format!("/analysis/{}", file_id)).await;
        stored.assert_status_ok();
        assert_eq!(stored.json::<AnalysisResponse>(), result);
    }

    #[tokio::test]
    async fn test_analyze_clean_document() {
        let server = create_test_server();
        let file_id = upload(&server, "status.txt", b"All systems nominal.".to_vec()).await;

        let result = analyze(&server, &file_id).await;
        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.summary, "All systems nominal.");
        assert!(result.details.flagged_terms.is_empty());
        assert!(result.details.flagged_sections.is_empty());
        assert_eq!(
            result.details.recommendations,
            compliance_engine::DUE_DILIGENCE_RECOMMENDATION
        );
    }

    #[tokio::test]
    async fn test_analyze_uploaded_pdf() {
        let server = create_test_server();
        let pdf = text_pdf(&["Annual report", "Sanctions screening found a data breach"]);
        let file_id = upload(&server, "report.pdf", pdf).await;

        let result = analyze(&server, &file_id).await;
        assert_eq!(result.details.flagged_terms, vec!["sanctions", "data breach"]);
        assert_eq!(result.risk_score, 0.45);
    }

    #[tokio::test]
    async fn test_analyze_unknown_file_is_not_found() {
        let server = create_test_server();
        let response = server
            .post("/analyze")
            .json(&json!({ "file_id": "file_404" }))
            .await;

        response.assert_status_not_found();
        let json = response.json::<serde_json::Value>();
        assert_eq!(json["code"], "FILE_NOT_FOUND");
        assert_eq!(json["error"], "File not found");

        // No assessment was stored for the unknown id
        let stored = server.get("/analysis/file_404").await;
        stored.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_analysis_before_analyze_is_not_found() {
        let server = create_test_server();
        let file_id = upload(&server, "pending.txt", b"Litigation pending.".to_vec()).await;

        let response = server.get(&format!("/analysis/{}", file_id)).await;
        response.assert_status_not_found();
        let json = response.json::<serde_json::Value>();
        assert_eq!(json["code"], "ANALYSIS_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_reanalysis_overwrites_latest() {
        let server = create_test_server();
        let file_id = upload(&server, "memo.txt", b"Bankruptcy filed. Tax evasion alleged.".to_vec()).await;

        let first = analyze(&server, &file_id).await;
        let second = analyze(&server, &file_id).await;
        assert_eq!(first, second);
        assert_eq!(second.risk_score, 0.25);

        let stored = server.get(&format!("/analysis/{}", file_id)).await;
        assert_eq!(stored.json::<AnalysisResponse>(), second);
    }

    #[tokio::test]
    async fn test_analyze_rejects_malformed_body() {
        let server = create_test_server();
        let response = server
            .post("/analyze")
            .json(&json!({ "document": "file_1" }))
            .await;

        assert!(response.status_code().is_client_error());
    }

    #[tokio::test]
    async fn test_lexicon_endpoint() {
        let server = create_test_server();
        let response = server.get("/api/lexicon").await;
        response.assert_status_ok();

        let json = response.json::<serde_json::Value>();
        assert_eq!(json["strategy"], "weighted");
        assert_eq!(json["severity_budget"], 100.0);
        assert_eq!(json["terms"][4]["term"], "money laundering");
        assert_eq!(json["terms"][4]["weight"], 30);
    }
}
