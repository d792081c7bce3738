use serde::Deserialize;

use super::LlmError;
use crate::models::Department;

/// Parsed routing decision from a model response.
#[derive(Debug, Clone)]
pub struct ClassificationResponse {
    pub department: Department,
    /// 0.0..=100.0
    pub confidence: f32,
    pub reasoning: Option<String>,
}

#[derive(Deserialize)]
struct RawClassification {
    department: String,
    confidence: Option<f32>,
    reasoning: Option<String>,
}

const DEFAULT_LLM_CONFIDENCE: f32 = 70.0;

/// Parse the model's answer tolerantly. Models wrap JSON in prose and
/// code fences, so take the span from the first `{` to the last `}`
/// rather than requiring a clean body.
pub fn parse_classification_response(
    response: &str,
) -> Result<ClassificationResponse, LlmError> {
    let start = response
        .find('{')
        .ok_or_else(|| LlmError::MalformedResponse("no JSON object in response".into()))?;
    let end = response
        .rfind('}')
        .ok_or_else(|| LlmError::MalformedResponse("unterminated JSON object".into()))?;

    if end < start {
        return Err(LlmError::MalformedResponse("unterminated JSON object".into()));
    }

    let raw: RawClassification = serde_json::from_str(&response[start..=end])
        .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

    Ok(ClassificationResponse {
        department: Department::normalize(&raw.department),
        confidence: normalize_confidence(raw.confidence),
        reasoning: raw.reasoning.filter(|r| !r.trim().is_empty()),
    })
}

/// Models report confidence on whatever scale they feel like. Values at
/// or below 1.0 are treated as fractions; everything is clamped to the
/// 0..=100 range.
fn normalize_confidence(raw: Option<f32>) -> f32 {
    let value = match raw {
        Some(v) if v.is_finite() => v,
        _ => return DEFAULT_LLM_CONFIDENCE,
    };

    let scaled = if value <= 1.0 { value * 100.0 } else { value };
    scaled.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_json_parses() {
        let response = r#"{"department": "Finance", "confidence": 0.85, "reasoning": "invoice terms"}"#;
        let parsed = parse_classification_response(response).unwrap();
        assert_eq!(parsed.department, Department::Finance);
        assert!((parsed.confidence - 85.0).abs() < 1e-3);
        assert_eq!(parsed.reasoning.as_deref(), Some("invoice terms"));
    }

    #[test]
    fn json_wrapped_in_prose_parses() {
        let response = "Sure! Here is my answer:\n```json\n{\"department\": \"Signalling\", \"confidence\": 92}\n```\nHope that helps.";
        let parsed = parse_classification_response(response).unwrap();
        assert_eq!(parsed.department, Department::Signalling);
        assert!((parsed.confidence - 92.0).abs() < 1e-3);
    }

    #[test]
    fn unknown_department_normalizes_to_fallback() {
        let response = r#"{"department": "Catering Services"}"#;
        let parsed = parse_classification_response(response).unwrap();
        assert_eq!(parsed.department, Department::Administration);
    }

    #[test]
    fn missing_confidence_gets_default() {
        let response = r#"{"department": "hr"}"#;
        let parsed = parse_classification_response(response).unwrap();
        assert_eq!(parsed.department, Department::HumanResources);
        assert_eq!(parsed.confidence, DEFAULT_LLM_CONFIDENCE);
    }

    #[test]
    fn out_of_range_confidence_clamped() {
        let response = r#"{"department": "Finance", "confidence": 250.0}"#;
        let parsed = parse_classification_response(response).unwrap();
        assert_eq!(parsed.confidence, 100.0);
    }

    #[test]
    fn no_json_is_malformed() {
        assert!(matches!(
            parse_classification_response("I think this belongs to Finance."),
            Err(LlmError::MalformedResponse(_))
        ));
    }

    #[test]
    fn reversed_braces_are_malformed() {
        assert!(parse_classification_response("} nothing {").is_err());
    }
}
