use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured sidecar attached to each document. Stored as a JSON column;
/// unknown keys survive round-trips through `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionDiagnostics>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisRecord>,

    /// Per-department actionable tasks from the cross-department pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_tasks: Option<BTreeMap<String, Vec<String>>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// How the text was pulled out of the source bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionDiagnostics {
    /// e.g. "plain_text", "csv_passthrough", "pdf_layout", "pdf_failed"
    pub method: String,
    pub format: String,
    pub word_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Which classification tier produced the routing decision, and what
/// supporting evidence it saw.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRecord {
    /// "retrieval_llm", "keyword", or "fallback"
    pub tier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retrieval_context: Vec<String>,
}

impl DocumentMetadata {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_metadata_serializes_compact() {
        let meta = DocumentMetadata::default();
        assert_eq!(meta.to_json().unwrap(), "{}");
    }

    #[test]
    fn unknown_keys_survive_roundtrip() {
        let raw = r#"{"analysis":{"tier":"keyword"},"legacy_flag":true}"#;
        let meta = DocumentMetadata::from_json(raw).unwrap();
        assert_eq!(meta.analysis.as_ref().unwrap().tier, "keyword");
        assert_eq!(
            meta.extra.get("legacy_flag"),
            Some(&serde_json::Value::Bool(true))
        );
        let back = meta.to_json().unwrap();
        let reparsed = DocumentMetadata::from_json(&back).unwrap();
        assert_eq!(meta, reparsed);
    }

    #[test]
    fn extraction_diagnostics_roundtrip() {
        let meta = DocumentMetadata {
            extraction: Some(ExtractionDiagnostics {
                method: "pdf_failed".into(),
                format: "pdf".into(),
                word_count: 0,
                warning: Some("encrypted stream".into()),
            }),
            ..Default::default()
        };
        let json = meta.to_json().unwrap();
        let back = DocumentMetadata::from_json(&json).unwrap();
        assert_eq!(back.extraction.unwrap().method, "pdf_failed");
    }
}
