//! Lead Enrichment API Library
//!
//! Enriches business leads (company name plus optional phone/email) by
//! searching the web for the company and asking a language model to extract
//! structured facts: official website, extra contact channels, CNPJ, address
//! and social profiles, with an advisory confidence score.
//!
//! # Modules
//!
//! - `analyzer`: Prompt construction and the single model call per lead.
//! - `config`: Configuration management.
//! - `enrichment`: The enrichment pipeline (`LeadEnrichmentService`).
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `model_client`: Generative model client (Gemini).
//! - `models`: Lead, findings and result data models.
//! - `response_extractor`: Tolerant JSON recovery from model output.
//! - `search_client`: Web search client (Firecrawl).

pub mod analyzer;
pub mod config;
pub mod enrichment;
pub mod errors;
pub mod handlers;
pub mod model_client;
pub mod models;
pub mod response_extractor;
pub mod search_client;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

pub use enrichment::LeadEnrichmentService;
pub use errors::{AnalysisFailure, EnrichmentError, SearchFailure};
pub use models::{AnalysisFindings, BatchItemResult, EnrichedLead, LeadInput, SearchResult};

/// Request size limit: 5MB max payload.
const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Builds the HTTP router around an already-constructed state.
pub fn router(state: Arc<handlers::AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        .route("/enrich-lead", post(handlers::enrich_lead))
        .route("/enrich-batch", post(handlers::enrich_batch))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(CorsLayer::permissive()),
        )
}

/// Installs the tracing subscriber shared by the server and the CLI.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_enrichment_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
