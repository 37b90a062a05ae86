use crate::errors::AnalysisFailure;
use crate::model_client::TextGenerator;
use crate::models::{AnalysisFindings, SearchResult};
use crate::response_extractor;
use std::sync::Arc;

const RESULT_DELIMITER: &str = "---";
const RAW_LOG_LIMIT: usize = 2_000;

const RESPONSE_SCHEMA_EXAMPLE: &str = r#"{
    "website": "https://example.com.br",
    "additional_phones": ["(48) 99999-9999", "(48) 3333-4444"],
    "additional_emails": ["contato@empresa.com.br", "vendas@empresa.com.br"],
    "cnpj": "00.000.000/0001-00",
    "endereco": "Rua Exemplo, 123, Bairro, Cidade - UF, CEP",
    "redes_sociais": {
        "instagram": "https://instagram.com/empresa",
        "facebook": "https://facebook.com/empresa",
        "linkedin": "https://linkedin.com/company/empresa"
    },
    "confidence_score": 85,
    "search_results_used": ["https://site1.com", "https://site2.com"]
}"#;

/// Renders search hits as text blocks, in ranking order.
pub fn format_search_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "URL: {}\nTitle: {}\nDescription: {}\n{}\n",
                r.url, r.title, r.description, RESULT_DELIMITER
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the extraction prompt. Identical inputs always give identical text.
pub fn build_prompt(results: &[SearchResult], company_name: &str) -> String {
    let search_content = format_search_results(results);

    format!(
        r#"You are an expert in lead enrichment and business data analysis.

Analyze the following web search results for the company "{company}" and extract the most relevant and reliable information.

SEARCH RESULTS:
{search_content}

TASK:
Find and extract the following information about the company "{company}":

1. Official website (the URL most likely to be the company's own site)
2. Additional phone numbers (different from the original, if any)
3. Additional corporate email addresses
4. CNPJ (if mentioned)
5. Full address
6. Social networks (Instagram, Facebook, LinkedIn, etc.)
7. Confidence score (0-100) based on the quality and consistency of the information

IMPORTANT RULES:
- Always prefer the company's official website on its own domain
- Never use a social network profile as the website, but include it under social networks
- Only extract information that looks reliable and consistent
- If a piece of information is not found, set it to null
- Phone numbers must use the Brazilian national format with area code (DDD)
- Prefer corporate-domain email addresses when possible

RESPONSE FORMAT:
Return ONLY a valid JSON object in the following format:

{schema}

Reply ONLY with the JSON, without any additional text.
"#,
        company = company_name,
        search_content = search_content,
        schema = RESPONSE_SCHEMA_EXAMPLE,
    )
}

/// Turns search results into findings with one model call.
#[derive(Clone)]
pub struct EnrichmentAnalyzer {
    generator: Arc<dyn TextGenerator>,
    model: String,
}

impl EnrichmentAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    /// Prompts the model once; no retry and no re-prompting on bad output.
    pub async fn analyze(
        &self,
        search_results: &[SearchResult],
        company_name: &str,
    ) -> Result<AnalysisFindings, AnalysisFailure> {
        let prompt = build_prompt(search_results, company_name);
        tracing::info!(
            company = company_name,
            model = %self.model,
            results = search_results.len(),
            "Analyzing search results"
        );

        let raw = self.generator.generate(&self.model, &prompt).await?;

        match response_extractor::extract(&raw) {
            Ok(findings) => {
                tracing::info!(
                    company = company_name,
                    confidence = findings.confidence_score,
                    "Analysis completed"
                );
                Ok(findings)
            }
            Err(e) => {
                tracing::debug!(
                    "Unparseable model output: {}",
                    truncate_to_char_boundary(&raw, RAW_LOG_LIMIT)
                );
                Err(e)
            }
        }
    }
}

fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
