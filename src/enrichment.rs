/// Lead enrichment pipeline
///
/// Every lead goes through the same strictly sequential stages:
/// 1. Validate the lead (company name required)
/// 2. Search the web for the company
/// 3. Ask the model to extract findings from the search results
/// 4. Assemble the enriched record
///
/// A failure at any stage aborts that lead only. Batches run leads
/// concurrently but always report results in input order.
use crate::analyzer::EnrichmentAnalyzer;
use crate::config::Config;
use crate::errors::{AppError, EnrichmentError};
use crate::model_client::{GeminiClient, TextGenerator};
use crate::models::{BatchItemResult, EnrichedLead, LeadInput};
use crate::search_client::{FirecrawlSearchClient, SearchBackend};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;

/// Composes search and analysis into the end-to-end enrichment pipeline.
///
/// Holds no per-call state: each lead gets its own pipeline run and the
/// service can be shared freely across tasks.
#[derive(Clone)]
pub struct LeadEnrichmentService {
    search: Arc<dyn SearchBackend>,
    analyzer: EnrichmentAnalyzer,
    batch_concurrency: usize,
}

impl LeadEnrichmentService {
    pub fn new(
        search: Arc<dyn SearchBackend>,
        generator: Arc<dyn TextGenerator>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            search,
            analyzer: EnrichmentAnalyzer::new(generator, model),
            batch_concurrency: 1,
        }
    }

    /// Builds the service with the Firecrawl and Gemini clients.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let search = FirecrawlSearchClient::from_config(config)?;
        let generator = GeminiClient::from_config(config)?;

        Ok(Self::new(Arc::new(search), Arc::new(generator), config.gemini_model.clone())
            .with_batch_concurrency(config.batch_concurrency))
    }

    /// Caps how many leads of a batch are in flight at once (minimum 1).
    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    pub fn batch_concurrency(&self) -> usize {
        self.batch_concurrency
    }

    /// Runs the pipeline and reports why it stopped, if it did.
    pub async fn try_enrich(&self, lead: &LeadInput) -> Result<EnrichedLead, EnrichmentError> {
        lead.validate()?;
        let company = lead.company_name.as_str();

        tracing::info!(company, "Starting lead enrichment");

        tracing::info!(company, "Step 1: Searching");
        let results = self.search.search(company).await?;

        tracing::info!(company, results = results.len(), "Step 2: Analyzing");
        let findings = self.analyzer.analyze(&results, company).await?;

        tracing::info!(company, "Step 3: Assembling enriched lead");
        Ok(EnrichedLead::assemble(lead.clone(), findings))
    }

    /// Runs the pipeline, collapsing every failure into `None`.
    ///
    /// The reason is only logged. Callers that need to tell "company not
    /// found" apart from "model returned garbage" should use [`Self::try_enrich`].
    pub async fn enrich(&self, lead: &LeadInput) -> Option<EnrichedLead> {
        match self.try_enrich(lead).await {
            Ok(enriched) => {
                tracing::info!(
                    company = %lead.company_name,
                    confidence = enriched.confidence_score,
                    "Lead enriched"
                );
                Some(enriched)
            }
            Err(e) => {
                tracing::warn!(company = %lead.company_name, "Lead not enriched: {}", e);
                None
            }
        }
    }

    /// Enriches one untyped lead payload.
    ///
    /// Invalid payloads are rejected before any remote call. A lead that
    /// passes validation but cannot be enriched yields `Ok(None)`.
    pub async fn enrich_one(&self, payload: Value) -> Result<Option<EnrichedLead>, EnrichmentError> {
        let lead = LeadInput::from_json(payload).map_err(|e| {
            tracing::warn!("Rejected lead payload: {}", e);
            e
        })?;
        Ok(self.enrich(&lead).await)
    }

    /// Enriches many payloads, one result per input, in input order.
    ///
    /// Up to `batch_concurrency` leads run at once; a failing lead never
    /// affects the others.
    pub async fn enrich_many(&self, payloads: Vec<Value>) -> Vec<BatchItemResult> {
        let total = payloads.len();
        tracing::info!(total, concurrency = self.batch_concurrency, "Starting batch enrichment");

        let results: Vec<BatchItemResult> = stream::iter(payloads.into_iter().enumerate())
            .map(|(index, payload)| async move {
                let item = match self.enrich_one(payload).await {
                    Ok(Some(enriched)) => BatchItemResult {
                        index,
                        success: true,
                        error: None,
                        data: Some(enriched),
                    },
                    Ok(None) => BatchItemResult {
                        index,
                        success: false,
                        error: Some("lead could not be enriched".to_string()),
                        data: None,
                    },
                    Err(e) => BatchItemResult {
                        index,
                        success: false,
                        error: Some(e.to_string()),
                        data: None,
                    },
                };
                tracing::debug!(index, success = item.success, "Batch item finished");
                item
            })
            .buffered(self.batch_concurrency)
            .collect()
            .await;

        let successful = results.iter().filter(|r| r.success).count();
        tracing::info!(
            total,
            successful,
            failed = total - successful,
            "Batch enrichment complete"
        );
        results
    }
}
