use lead_enrichment_api::config::Config;
use lead_enrichment_api::handlers::AppState;
use lead_enrichment_api::LeadEnrichmentService;
use std::sync::Arc;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, builds the enrichment pipeline
/// and serves the HTTP API.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lead_enrichment_api::init_tracing();

    // Missing credentials abort startup here
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let service = LeadEnrichmentService::from_config(&config)?;
    tracing::info!(
        "✓ Enrichment service initialized (batch concurrency: {})",
        service.batch_concurrency()
    );

    let app_state = Arc::new(AppState { service });
    let app = lead_enrichment_api::router(app_state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);
    tracing::info!("  GET  /             - health check");
    tracing::info!("  POST /enrich-lead  - enrich a single lead");
    tracing::info!("  POST /enrich-batch - enrich a list of leads");

    axum::serve(listener, app).await?;

    Ok(())
}
