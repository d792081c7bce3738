use tracing::{debug, info, warn};

use super::keywords::{classify_by_keywords, determine_priority};
use super::llm::TextGenerator;
use super::multi::{analyze_departments_with, MultiDepartmentAnalysis};
use super::parser::parse_classification_response;
use super::prompt::{build_classification_prompt, CLASSIFICATION_SYSTEM_PROMPT};
use super::retrieval::RetrievalIndex;
use crate::models::{AnalysisRecord, Department, Priority};

const LLM_MAX_TOKENS: u32 = 500;
const LLM_TEMPERATURE: f32 = 0.3;

/// Final routing decision for one document.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub department: Department,
    pub priority: Priority,
    /// 0.0..=100.0
    pub confidence: f32,
    pub analysis: AnalysisRecord,
}

/// Outcome of a single classification tier. `Unavailable` means the tier
/// could not run (no provider, no context, transient failure), not that
/// it ran and found nothing.
enum TierOutcome {
    Success(Resolution),
    Unavailable(String),
}

/// Three-tier department router. Tier 1 retrieves knowledge-base context
/// and asks an LLM; tier 2 scores keyword tables offline; tier 3 parks
/// the document in Administration. A document always gets routed.
pub struct DepartmentResolver {
    index: RetrievalIndex,
    generator: Option<Box<dyn TextGenerator>>,
}

impl DepartmentResolver {
    pub fn new(index: RetrievalIndex, generator: Option<Box<dyn TextGenerator>>) -> Self {
        Self { index, generator }
    }

    /// Offline-only resolver: keyword tier and fallback, no LLM.
    pub fn offline() -> Self {
        Self {
            index: RetrievalIndex::build(&[]),
            generator: None,
        }
    }

    /// Route a document. Never fails: each tier that cannot answer hands
    /// over to the next. Priority always comes from the keyword scan,
    /// regardless of which tier decided the department.
    pub fn resolve(&self, title: &str, content: &str) -> Resolution {
        let priority = determine_priority(&format!("{title} {content}"));

        match self.retrieval_llm_tier(title, content) {
            TierOutcome::Success(mut resolution) => {
                resolution.priority = priority;
                info!(
                    department = resolution.department.as_str(),
                    confidence = resolution.confidence,
                    "routed via retrieval tier"
                );
                return resolution;
            }
            TierOutcome::Unavailable(reason) => {
                debug!(reason, "retrieval tier unavailable, using keyword tier");
            }
        }

        let mut resolution = self.keyword_tier(content);
        resolution.priority = priority;
        info!(
            department = resolution.department.as_str(),
            tier = resolution.analysis.tier.as_str(),
            "routed via offline tier"
        );
        resolution
    }

    fn retrieval_llm_tier(&self, title: &str, content: &str) -> TierOutcome {
        let generator = match &self.generator {
            Some(g) => g,
            None => return TierOutcome::Unavailable("no text generator configured".into()),
        };

        if self.index.is_empty() {
            return TierOutcome::Unavailable("knowledge base is empty".into());
        }

        let context = self.index.search(&format!("{title} {content}"));
        if context.is_empty() {
            return TierOutcome::Unavailable("no knowledge sample above threshold".into());
        }

        let prompt = build_classification_prompt(title, content, &context);
        let response = match generator.complete(
            CLASSIFICATION_SYSTEM_PROMPT,
            &prompt,
            LLM_MAX_TOKENS,
            LLM_TEMPERATURE,
        ) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "text generation failed");
                return TierOutcome::Unavailable(e.to_string());
            }
        };

        let parsed = match parse_classification_response(&response) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "unparseable model response");
                return TierOutcome::Unavailable(e.to_string());
            }
        };

        TierOutcome::Success(Resolution {
            department: parsed.department,
            priority: Priority::Normal, // overwritten by the caller
            confidence: parsed.confidence,
            analysis: AnalysisRecord {
                tier: "retrieval_llm".into(),
                reasoning: parsed.reasoning,
                matched_keywords: Vec::new(),
                retrieval_context: context.into_iter().map(|s| s.text).collect(),
            },
        })
    }

    fn keyword_tier(&self, content: &str) -> Resolution {
        let result = classify_by_keywords(content);
        let (tier, reasoning) = if result.matched.is_empty() {
            ("fallback", Some("no keywords matched".to_string()))
        } else {
            ("keyword", None)
        };

        Resolution {
            department: result.department,
            priority: Priority::Normal,
            confidence: result.confidence,
            analysis: AnalysisRecord {
                tier: tier.into(),
                reasoning,
                matched_keywords: result.matched,
                retrieval_context: Vec::new(),
            },
        }
    }

    /// Cross-department pass, model-assisted when a generator is wired in.
    pub fn multi_analysis(&self, content: &str) -> MultiDepartmentAnalysis {
        analyze_departments_with(self.generator.as_deref(), content)
    }
}
