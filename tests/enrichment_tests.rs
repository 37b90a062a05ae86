/// Pipeline tests with stubbed collaborators
/// Verifies stage ordering, the failure contract and batch ordering without any network
use async_trait::async_trait;
use lead_enrichment_api::errors::{AnalysisFailure, EnrichmentError, SearchFailure};
use lead_enrichment_api::model_client::TextGenerator;
use lead_enrichment_api::models::{LeadInput, SearchResult};
use lead_enrichment_api::search_client::SearchBackend;
use lead_enrichment_api::LeadEnrichmentService;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ACME_MODEL_OUTPUT: &str = "```json\n{\"website\":\"https://acme-pet.com.br\",\"additional_phones\":[],\"additional_emails\":[],\"cnpj\":null,\"endereco\":null,\"redes_sociais\":{},\"confidence_score\":70,\"search_results_used\":[\"https://acme-pet.com.br\"]}\n```";

struct StubSearch {
    outcome: Result<Vec<SearchResult>, SearchFailure>,
    calls: AtomicUsize,
    /// Companies whose search should be slowed down, to force out-of-order completion
    slow: Vec<String>,
}

impl StubSearch {
    fn returning(outcome: Result<Vec<SearchResult>, SearchFailure>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            slow: Vec::new(),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for StubSearch {
    async fn search(&self, company_name: &str) -> Result<Vec<SearchResult>, SearchFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.slow.iter().any(|c| c == company_name) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if company_name.contains("Unknown") {
            return Err(SearchFailure::NoResults);
        }
        self.outcome.clone()
    }
}

struct StubGenerator {
    outcome: Result<String, AnalysisFailure>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    fn returning(outcome: Result<String, AnalysisFailure>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, _model: &str, prompt: &str) -> Result<String, AnalysisFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.outcome.clone()
    }
}

fn acme_results() -> Vec<SearchResult> {
    vec![SearchResult::new(
        "https://acme-pet.com.br",
        "Acme",
        "Pet store",
    )]
}

fn service(search: Arc<StubSearch>, generator: Arc<StubGenerator>) -> LeadEnrichmentService {
    LeadEnrichmentService::new(search, generator, "test-model")
}

#[tokio::test]
async fn test_empty_company_name_skips_all_remote_calls() {
    let search = StubSearch::returning(Ok(acme_results()));
    let generator = StubGenerator::returning(Ok(ACME_MODEL_OUTPUT.to_string()));
    let service = service(search.clone(), generator.clone());

    for payload in [
        json!({"company_name": ""}),
        json!({"company_name": "   ", "phone": "4833655751"}),
        json!({"email": "someone@example.com"}),
    ] {
        let err = service.enrich_one(payload).await.unwrap_err();
        assert!(matches!(err, EnrichmentError::InvalidInput(_)));
    }

    assert_eq!(search.calls(), 0);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_no_search_results_aborts_before_analysis() {
    let search = StubSearch::returning(Err(SearchFailure::NoResults));
    let generator = StubGenerator::returning(Ok(ACME_MODEL_OUTPUT.to_string()));
    let service = service(search.clone(), generator.clone());

    let result = service
        .enrich_one(json!({"company_name": "Acme Pet Supplies"}))
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(search.calls(), 1);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_end_to_end_acme() {
    let search = StubSearch::returning(Ok(acme_results()));
    let generator = StubGenerator::returning(Ok(ACME_MODEL_OUTPUT.to_string()));
    let service = service(search.clone(), generator.clone());

    let enriched = service
        .enrich_one(json!({"company_name": "Acme Pet Supplies"}))
        .await
        .unwrap()
        .expect("lead should be enriched");

    assert_eq!(enriched.website.as_deref(), Some("https://acme-pet.com.br"));
    assert_eq!(enriched.confidence_score, 70.0);
    assert_eq!(enriched.original.company_name, "Acme Pet Supplies");
    assert_eq!(enriched.tax_id, None);
    assert_eq!(enriched.address, None);
    assert!(enriched.additional_phones.is_empty());
    assert!(enriched.social_profiles.is_empty());
    assert_eq!(enriched.search_results_used, vec!["https://acme-pet.com.br"]);

    assert_eq!(search.calls(), 1);
    assert_eq!(generator.calls(), 1);

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("Acme Pet Supplies"));
    assert!(prompts[0].contains("URL: https://acme-pet.com.br"));
}

#[tokio::test]
async fn test_original_lead_copied_verbatim() {
    let search = StubSearch::returning(Ok(acme_results()));
    let generator = StubGenerator::returning(Ok(ACME_MODEL_OUTPUT.to_string()));
    let service = service(search, generator);

    let lead = LeadInput::new("MARISTELA MODA PET")
        .with_phone("4833655751")
        .with_email("maristelamodapet@hotmail.com");
    let enriched = service.enrich(&lead).await.unwrap();

    assert_eq!(enriched.original, lead);
}

#[tokio::test]
async fn test_malformed_model_output_aborts_lead() {
    let search = StubSearch::returning(Ok(acme_results()));
    let generator = StubGenerator::returning(Ok("not json at all".to_string()));
    let service = service(search, generator.clone());

    let lead = LeadInput::new("Acme Pet Supplies");
    match service.try_enrich(&lead).await {
        Err(EnrichmentError::Analysis(AnalysisFailure::MalformedModelOutput { raw, .. })) => {
            assert_eq!(raw, "not json at all");
        }
        other => panic!("expected malformed output, got {:?}", other),
    }

    assert!(service.enrich(&lead).await.is_none());
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn test_model_failure_aborts_lead() {
    let search = StubSearch::returning(Ok(acme_results()));
    let generator = StubGenerator::returning(Err(AnalysisFailure::Model("quota".to_string())));
    let service = service(search, generator);

    let result = service
        .enrich_one(json!({"empresa": "Acme Pet Supplies"}))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_empty_model_object_gives_defaulted_record() {
    let search = StubSearch::returning(Ok(acme_results()));
    let generator = StubGenerator::returning(Ok("{}".to_string()));
    let service = service(search, generator);

    let enriched = service
        .enrich(&LeadInput::new("Acme"))
        .await
        .expect("empty findings are still a success");

    let value = serde_json::to_value(&enriched).unwrap();
    assert_eq!(value["website"], serde_json::Value::Null);
    assert_eq!(value["additional_emails"], json!([]));
    assert_eq!(value["social_profiles"], json!({}));
    assert_eq!(value["confidence_score"], json!(0));
}

#[tokio::test]
async fn test_identical_inputs_give_identical_output() {
    let search = StubSearch::returning(Ok(acme_results()));
    let generator = StubGenerator::returning(Ok(ACME_MODEL_OUTPUT.to_string()));
    let service = service(search, generator.clone());

    let payload = json!({"company_name": "Acme Pet Supplies", "phone": "4833655751"});
    let first = service.enrich_one(payload.clone()).await.unwrap();
    let second = service.enrich_one(payload).await.unwrap();

    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn test_enrich_many_preserves_order_and_count() {
    let search = StubSearch::returning(Ok(acme_results()));
    let generator = StubGenerator::returning(Ok(ACME_MODEL_OUTPUT.to_string()));
    let service = service(search.clone(), generator).with_batch_concurrency(3);

    let results = service
        .enrich_many(vec![
            json!({"company_name": "Acme Pet Supplies"}),
            json!({"company_name": "Unknown Company XYZ123"}),
            json!({"company_name": ""}),
        ])
        .await;

    assert_eq!(results.len(), 3);
    for (i, item) in results.iter().enumerate() {
        assert_eq!(item.index, i);
    }

    assert!(results[0].success);
    assert_eq!(
        results[0].data.as_ref().unwrap().original.company_name,
        "Acme Pet Supplies"
    );

    assert!(!results[1].success);
    assert!(results[1].data.is_none());

    assert!(!results[2].success);
    assert!(results[2].data.is_none());
    assert!(results[2]
        .error
        .as_deref()
        .unwrap()
        .contains("company_name is required"));

    // The invalid lead never reached the search backend
    assert_eq!(search.calls(), 2);
}

#[tokio::test]
async fn test_enrich_many_reports_in_input_order_when_completion_differs() {
    let search = Arc::new(StubSearch {
        outcome: Ok(acme_results()),
        calls: AtomicUsize::new(0),
        slow: vec!["First".to_string()],
    });
    let generator = StubGenerator::returning(Ok(ACME_MODEL_OUTPUT.to_string()));
    let service = service(search, generator).with_batch_concurrency(4);

    let names = ["First", "Second", "Third", "Fourth", "Fifth"];
    let payloads = names
        .iter()
        .map(|n| json!({"company_name": n}))
        .collect::<Vec<_>>();

    let results = service.enrich_many(payloads).await;

    let reported: Vec<&str> = results
        .iter()
        .map(|r| r.data.as_ref().unwrap().original.company_name.as_str())
        .collect();
    assert_eq!(reported, names);
}

#[tokio::test]
async fn test_batch_concurrency_never_below_one() {
    let search = StubSearch::returning(Ok(acme_results()));
    let generator = StubGenerator::returning(Ok(ACME_MODEL_OUTPUT.to_string()));
    let service = service(search, generator).with_batch_concurrency(0);

    assert_eq!(service.batch_concurrency(), 1);
    let results = service
        .enrich_many(vec![json!({"company_name": "Acme"})])
        .await;
    assert!(results[0].success);
}
