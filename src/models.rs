use crate::errors::EnrichmentError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ============ Input ============

/// A business lead as supplied by the caller.
///
/// Only `company_name` is mandatory. Legacy automation payloads use
/// `empresa`/`telefone`; both spellings may appear in the same payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLeadInput")]
pub struct LeadInput {
    pub company_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub row_number: Option<i64>,
    /// Free-form flag forwarded untouched, `"false"` when absent.
    pub is_corporate_email: String,
    pub domain: String,
}

/// Wire shape of a lead before the legacy keys are merged in.
#[derive(Deserialize)]
struct RawLeadInput {
    #[serde(default, deserialize_with = "de::optional_string")]
    company_name: Option<String>,
    #[serde(default, deserialize_with = "de::optional_string")]
    empresa: Option<String>,
    #[serde(default, deserialize_with = "de::optional_string")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "de::optional_string")]
    telefone: Option<String>,
    #[serde(default, deserialize_with = "de::optional_string")]
    email: Option<String>,
    #[serde(default, deserialize_with = "de::optional_integer")]
    row_number: Option<i64>,
    #[serde(default = "default_corporate_flag", deserialize_with = "de::flag_string")]
    is_corporate_email: String,
    #[serde(default, deserialize_with = "de::string_or_empty")]
    domain: String,
}

impl From<RawLeadInput> for LeadInput {
    fn from(raw: RawLeadInput) -> Self {
        Self {
            company_name: coalesce(raw.company_name, raw.empresa).unwrap_or_default(),
            phone: coalesce(raw.phone, raw.telefone),
            email: raw.email,
            row_number: raw.row_number,
            is_corporate_email: raw.is_corporate_email,
            domain: raw.domain,
        }
    }
}

/// First non-blank of the two spellings, else whichever one is present.
fn coalesce(current: Option<String>, legacy: Option<String>) -> Option<String> {
    let non_blank = |v: &Option<String>| v.as_ref().is_some_and(|s| !s.trim().is_empty());
    if non_blank(&current) {
        current
    } else if non_blank(&legacy) {
        legacy
    } else {
        current.or(legacy)
    }
}

fn default_corporate_flag() -> String {
    "false".to_string()
}

impl LeadInput {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            phone: None,
            email: None,
            row_number: None,
            is_corporate_email: default_corporate_flag(),
            domain: String::new(),
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Decodes a lead from an untyped JSON payload and validates it.
    pub fn from_json(payload: Value) -> Result<Self, EnrichmentError> {
        let lead: LeadInput = serde_json::from_value(payload)
            .map_err(|e| EnrichmentError::InvalidInput(format!("malformed lead payload: {}", e)))?;
        lead.validate()?;
        Ok(lead)
    }

    /// The company name is the only hard precondition of the pipeline.
    pub fn validate(&self) -> Result<(), EnrichmentError> {
        if self.company_name.trim().is_empty() {
            return Err(EnrichmentError::InvalidInput(
                "company_name is required".to_string(),
            ));
        }
        Ok(())
    }
}

// ============ Search ============

/// One web hit, in backend ranking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "de::string_or_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "de::string_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "de::string_or_empty")]
    pub description: String,
}

impl SearchResult {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

// ============ Analysis ============

/// Facts the model extracted from the search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFindings {
    pub website: Option<String>,
    pub additional_phones: Vec<String>,
    pub additional_emails: Vec<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub social_profiles: BTreeMap<String, String>,
    /// Self-reported by the model, nominally 0-100; not clamped.
    #[serde(serialize_with = "serialize_score")]
    pub confidence_score: f64,
    pub search_results_used: Vec<String>,
}

impl AnalysisFindings {
    /// Maps a decoded model object onto findings.
    ///
    /// Never fails: fields with an unexpected shape fall back to their empty
    /// default instead of rejecting the whole answer.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let field = |keys: &[&str]| keys.iter().find_map(|k| object.get(*k));

        Self {
            website: field(&["website"]).and_then(loose_string),
            additional_phones: field(&["additional_phones"])
                .map(loose_string_list)
                .unwrap_or_default(),
            additional_emails: field(&["additional_emails"])
                .map(loose_string_list)
                .unwrap_or_default(),
            tax_id: field(&["cnpj", "tax_id"]).and_then(loose_string),
            address: field(&["endereco", "address"]).and_then(loose_string),
            social_profiles: field(&["redes_sociais", "social_profiles"])
                .and_then(Value::as_object)
                .map(|profiles| {
                    profiles
                        .iter()
                        .filter_map(|(network, url)| {
                            loose_string(url).map(|url| (network.clone(), url))
                        })
                        .collect()
                })
                .unwrap_or_default(),
            confidence_score: field(&["confidence_score"])
                .and_then(loose_number)
                .unwrap_or(0.0),
            search_results_used: field(&["search_results_used"])
                .map(loose_string_list)
                .unwrap_or_default(),
        }
    }
}

fn loose_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn loose_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(loose_string).collect(),
        other => loose_string(other).into_iter().collect(),
    }
}

fn loose_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Whole scores are written as integers, so a model's `70` stays `70`.
fn serialize_score<S>(score: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if score.is_finite() && score.fract() == 0.0 && score.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*score as i64)
    } else {
        serializer.serialize_f64(*score)
    }
}

// ============ Output ============

/// Final record: the caller's lead plus every finding.
///
/// Every key is always present so downstream workflows see a fixed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedLead {
    pub original: LeadInput,
    pub website: Option<String>,
    pub additional_phones: Vec<String>,
    pub additional_emails: Vec<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub social_profiles: BTreeMap<String, String>,
    #[serde(serialize_with = "serialize_score")]
    pub confidence_score: f64,
    pub search_results_used: Vec<String>,
}

impl EnrichedLead {
    pub fn assemble(original: LeadInput, findings: AnalysisFindings) -> Self {
        Self {
            original,
            website: findings.website,
            additional_phones: findings.additional_phones,
            additional_emails: findings.additional_emails,
            tax_id: findings.tax_id,
            address: findings.address,
            social_profiles: findings.social_profiles,
            confidence_score: findings.confidence_score,
            search_results_used: findings.search_results_used,
        }
    }
}

// ============ Batch ============

/// Outcome for one lead of a batch, reported at the lead's input position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub index: usize,
    pub success: bool,
    pub error: Option<String>,
    pub data: Option<EnrichedLead>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn from_results(results: &[BatchItemResult]) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        }
    }
}

// Lenient scalar decoding for caller payloads
mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_to_string(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(scalar_to_string(value).unwrap_or_default())
    }

    pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(scalar_to_string(value))
    }

    pub fn flag_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(scalar_to_string(value).unwrap_or_else(super::default_corporate_flag))
    }

    pub fn optional_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
            Value::String(s) => {
                let s = s.trim();
                s.parse().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
            _ => None,
        })
    }

    fn integral(f: f64) -> Option<i64> {
        (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
    }
}
