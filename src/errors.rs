use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Why a search for a company produced no usable results.
///
/// Callers of the collapsed pipeline only ever see "no search data"; the
/// variants exist for logging and for batch callers using the typed API.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchFailure {
    /// Connection failure or timeout talking to the search backend.
    #[error("search request failed: {0}")]
    Transport(String),
    /// Backend answered with a non-success HTTP status.
    #[error("search backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// Backend answered 2xx but flagged the search as failed.
    #[error("search backend reported failure: {0}")]
    Backend(String),
    /// Search succeeded but returned no web results.
    #[error("no search results found")]
    NoResults,
    /// Response body could not be decoded.
    #[error("malformed search response: {0}")]
    Malformed(String),
}

/// Why the analysis stage produced no findings.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisFailure {
    /// Transport error or non-success answer from the model backend.
    #[error("model request failed: {0}")]
    Model(String),
    /// The model answered without any generated text.
    #[error("model returned no text")]
    EmptyResponse,
    /// The generated text did not contain a well-formed JSON object.
    #[error("malformed model output: {reason}")]
    MalformedModelOutput { raw: String, reason: String },
}

/// Typed outcome of a failed enrichment.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EnrichmentError {
    /// The lead was rejected before any remote call was made.
    #[error("invalid lead: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Search(#[from] SearchFailure),
    #[error(transparent)]
    Analysis(#[from] AnalysisFailure),
}

impl EnrichmentError {
    /// True when the lead itself was bad, as opposed to a remote stage failing.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, EnrichmentError::InvalidInput(_))
    }
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Resource not found, or a lead that could not be enriched.
    NotFound(String),
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Missing or invalid configuration.
    Configuration(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each variant to a status code and a `{"error": ...}` body.
    ///
    /// Server-side failures are logged here and replaced by a generic message
    /// so upstream details never reach the caller.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Service misconfigured".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<EnrichmentError> for AppError {
    fn from(err: EnrichmentError) -> Self {
        match err {
            EnrichmentError::InvalidInput(msg) => AppError::BadRequest(msg),
            other => AppError::NotFound(other.to_string()),
        }
    }
}
