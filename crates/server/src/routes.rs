//! Request handlers for the analysis boundary.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use pagesift_core::{PageReport, SiftError, analyze};

use crate::app::AppState;

/// Batch analysis request.
///
/// The original clients sent either a JSON array of URLs or one
/// space-delimited string; both shapes are accepted and normalized.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub urls: Option<UrlsInput>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UrlsInput {
    List(Vec<String>),
    Spaced(String),
}

impl UrlsInput {
    /// Normalize either input shape into a URL list.
    fn into_list(self) -> Vec<String> {
        match self {
            UrlsInput::List(urls) => {
                urls.into_iter().map(|u| u.trim().to_string()).filter(|u| !u.is_empty()).collect()
            }
            UrlsInput::Spaced(raw) => raw.split_whitespace().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub results: Vec<PageReport>,
}

/// Handle `POST /analyze`: run the batch and return per-URL reports.
///
/// Individual URL failures still produce a 200 with their error entries in
/// `results`; only malformed input (400) or a systemic failure (500) map
/// to error statuses.
pub async fn analyze_handler(
    State(state): State<AppState>, Json(request): Json<AnalyzeRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Some(input) = request.urls else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "urls field is required" })));
    };

    let urls = input.into_list();
    if urls.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "urls must contain at least one URL" })),
        );
    }

    match analyze(&urls, state.pool.clone(), &state.analyzer).await {
        Ok(results) => {
            let body = serde_json::to_value(AnalyzeResponse { results })
                .unwrap_or_else(|_| json!({ "results": [] }));
            (StatusCode::OK, Json(body))
        }
        Err(SiftError::Validation(message)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
        }
        Err(error) => {
            tracing::error!("batch analysis failed: {}", error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to analyze the requested URLs" })),
            )
        }
    }
}

/// Handle `GET /health`: liveness probe.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_accepts_list() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{ "urls": ["https://a.example", " https://b.example "] }"#).unwrap();

        let urls = request.urls.unwrap().into_list();
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_urls_accepts_space_delimited_string() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{ "urls": "https://a.example  https://b.example" }"#).unwrap();

        let urls = request.urls.unwrap().into_list();
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_missing_urls_field() {
        let request: AnalyzeRequest = serde_json::from_str("{}").unwrap();
        assert!(request.urls.is_none());
    }

    #[test]
    fn test_empty_inputs_normalize_to_empty_list() {
        let request: AnalyzeRequest = serde_json::from_str(r#"{ "urls": "   " }"#).unwrap();
        assert!(request.urls.unwrap().into_list().is_empty());

        let request: AnalyzeRequest = serde_json::from_str(r#"{ "urls": ["", "  "] }"#).unwrap();
        assert!(request.urls.unwrap().into_list().is_empty());
    }
}
