//! Recovery of a single JSON object from free-form model output.
//!
//! Models are told to answer with bare JSON but frequently wrap it in a
//! markdown fence anyway. Only that wrapper is removed; whatever remains must
//! be one strict JSON object or the answer is rejected outright.

use crate::errors::AnalysisFailure;
use crate::models::AnalysisFindings;
use serde_json::{Map, Value};

const FENCE: &str = "```";

/// Removes a surrounding markdown code fence, if the text starts with one.
///
/// The whole opening line is dropped (it may carry a language tag). The last
/// non-empty line is dropped too when it is a bare closing fence.
pub fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().skip(1).collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    if lines.last().is_some_and(|line| line.trim() == FENCE) {
        lines.pop();
    }
    lines.join("\n")
}

/// Parses model output into a JSON object, unchanged.
pub fn extract_object(raw: &str) -> Result<Map<String, Value>, AnalysisFailure> {
    let cleaned = strip_code_fence(raw);

    let malformed = |reason: String| AnalysisFailure::MalformedModelOutput {
        raw: raw.to_string(),
        reason,
    };

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(malformed(e.to_string())),
    }
}

/// Parses model output straight into findings.
pub fn extract(raw: &str) -> Result<AnalysisFindings, AnalysisFailure> {
    extract_object(raw).map(|object| AnalysisFindings::from_object(&object))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_json() {
        let object = extract_object(r#"  {"website": "https://acme.com"}  "#).unwrap();
        assert_eq!(object["website"], "https://acme.com");
    }

    #[test]
    fn test_fenced_with_language_tag() {
        let raw = "```json\n{\"confidence_score\": 70}\n```";
        let object = extract_object(raw).unwrap();
        assert_eq!(Value::Object(object), json!({"confidence_score": 70}));
    }

    #[test]
    fn test_fenced_without_tag_and_trailing_blank_lines() {
        let raw = "\n```\n{\"a\": [1, 2]}\n```\n\n";
        assert_eq!(strip_code_fence(raw), "{\"a\": [1, 2]}");
    }

    #[test]
    fn test_missing_closing_fence() {
        let raw = "```json\n{\"a\": null}";
        assert_eq!(strip_code_fence(raw), "{\"a\": null}");
        assert!(extract_object(raw).is_ok());
    }

    #[test]
    fn test_single_line_fence_is_rejected() {
        // The opening line is dropped whole, so nothing is left to parse
        let err = extract_object("```json {\"a\": 1}```").unwrap_err();
        assert!(matches!(err, AnalysisFailure::MalformedModelOutput { .. }));
    }

    #[test]
    fn test_not_json() {
        match extract_object("not json at all") {
            Err(AnalysisFailure::MalformedModelOutput { raw, .. }) => {
                assert_eq!(raw, "not json at all");
            }
            other => panic!("expected malformed output, got {:?}", other),
        }
    }

    #[test]
    fn test_strict_syntax() {
        assert!(extract_object("{\"a\": 1,}").is_err());
        assert!(extract_object("{'a': 1}").is_err());
        assert!(extract_object("{\"a\": 1} // done").is_err());
    }

    #[test]
    fn test_non_object_rejected() {
        let err = extract_object("[1, 2, 3]").unwrap_err();
        match err {
            AnalysisFailure::MalformedModelOutput { reason, .. } => {
                assert!(reason.contains("an array"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_extract_maps_findings() {
        let findings = extract("```json\n{\"website\":\"https://acme.com\",\"confidence_score\":55}\n```")
            .unwrap();
        assert_eq!(findings.website.as_deref(), Some("https://acme.com"));
        assert_eq!(findings.confidence_score, 55.0);
    }
}
