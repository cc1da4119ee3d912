//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use voicenotes_common::summarizer::SummarizerHealth;
use crate::AppState;

#[derive(Serialize)]
pub struct ServiceBanner {
    pub message: String,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub store: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Service banner listing the routes
pub async fn root() -> Json<ServiceBanner> {
    Json(ServiceBanner {
        message: "Voice Notes API".to_string(),
        version: voicenotes_common::VERSION,
        endpoints: vec![
            "GET /api/health",
            "GET /api/ready",
            "GET /api/health/summarizer",
            "GET /api/notes",
            "GET /api/notes/{id}",
            "POST /api/notes",
            "PUT /api/notes/{id}",
            "DELETE /api/notes/{id}",
            "POST /api/notes/{id}/summary",
        ],
    })
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Voice Notes API is running",
    })
}

/// Readiness probe - checks the note store
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let start = std::time::Instant::now();

    let store_check = match state.notes.store().ping().await {
        Ok(_) => CheckResult {
            status: "up".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => CheckResult {
            status: "down".to_string(),
            latency_ms: None,
            error: Some(e.to_string()),
        },
    };

    let all_healthy = store_check.status == "up";
    let status = if all_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(ReadyResponse {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            checks: HealthChecks { store: store_check },
        }),
    )
}

/// Probe the summarizer chain with a fixed input
pub async fn summarizer_health(State(state): State<AppState>) -> Json<SummarizerHealth> {
    Json(state.notes.summarizer().health().await)
}
