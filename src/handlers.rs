use crate::enrichment::LeadEnrichmentService;
use crate::errors::AppError;
use crate::models::{BatchItemResult, BatchStats, EnrichedLead};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Enrichment pipeline, built once at startup.
    pub service: LeadEnrichmentService,
}

/// Body of `POST /enrich-lead`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichLeadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub data: Option<EnrichedLead>,
}

/// Body of `POST /enrich-batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub batch_stats: BatchStats,
    pub processed_at: String,
    pub results: Vec<BatchItemResult>,
}

/// Health check endpoint.
///
/// Served on both `/` and `/health`.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "lead-enrichment-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /enrich-lead
///
/// Enriches a single lead. Expects a lead object with at least
/// `company_name` (or the legacy `empresa` key).
///
/// # Returns
///
/// * `200` with the enriched lead.
/// * `400` when the body is not JSON or the company name is missing.
/// * `404` when the pipeline could not enrich the lead.
pub async fn enrich_lead(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<EnrichLeadResponse>), AppError> {
    let Json(payload) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    tracing::info!("POST /enrich-lead");

    match state.service.enrich_one(payload).await? {
        Some(enriched) => Ok((
            StatusCode::OK,
            Json(EnrichLeadResponse {
                success: true,
                error: None,
                data: Some(enriched),
            }),
        )),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(EnrichLeadResponse {
                success: false,
                error: Some("lead could not be enriched".to_string()),
                data: None,
            }),
        )),
    }
}

/// POST /enrich-batch
///
/// Expects `{"leads": [...]}`. Always answers 200 once the list itself is
/// valid; per-lead failures are reported inside `results`.
pub async fn enrich_batch(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BatchResponse>, AppError> {
    let Json(payload) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let leads = match payload.get("leads") {
        Some(Value::Array(leads)) if !leads.is_empty() => leads.clone(),
        _ => {
            return Err(AppError::BadRequest(
                "Field 'leads' must be a non-empty list".to_string(),
            ))
        }
    };

    tracing::info!("POST /enrich-batch - {} lead(s)", leads.len());

    let results = state.service.enrich_many(leads).await;
    let batch_stats = BatchStats::from_results(&results);

    Ok(Json(BatchResponse {
        success: true,
        batch_stats,
        processed_at: Utc::now().to_rfc3339(),
        results,
    }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("Endpoint not found".to_string())
}
