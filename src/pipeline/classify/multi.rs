//! Cross-department analysis. A single circular often carries work for
//! several departments at once; this pass finds all of them, extracts
//! per-department action items, and picks the primary owner.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::models::{Department, Priority};

use super::keywords::determine_priority;
use super::llm::TextGenerator;

/// One department's stake in a document.
#[derive(Debug, Clone)]
pub struct DepartmentInvolvement {
    pub department: Department,
    /// Keywords that tied the department to the text.
    pub evidence: Vec<String>,
    /// Actionable sentences addressed to this department, at most five.
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MultiDepartmentAnalysis {
    pub involved: Vec<DepartmentInvolvement>,
    pub primary: Department,
    pub requires_coordination: bool,
    pub urgency: Priority,
    /// 0.0..=1.0
    pub confidence: f32,
}

const MAX_TASKS_PER_DEPARTMENT: usize = 5;
const CONFIDENCE_CAP: f32 = 0.95;

const ACTION_VERBS: &[&str] = &[
    "submit", "inspect", "repair", "approve", "schedule", "review", "replace",
    "update", "train", "complete", "attend", "prepare", "verify", "report",
];

/// Multi-department analysis with an optional model assist: one LLM call
/// proposes the involvement map, validated against the closed vocabulary;
/// any failure falls back to the keyword scan.
pub fn analyze_departments_with(
    generator: Option<&dyn TextGenerator>,
    text: &str,
) -> MultiDepartmentAnalysis {
    if let Some(generator) = generator {
        if let Some(involved) = llm_involvement(generator, text) {
            return assemble(involved, text);
        }
        debug!("model involvement map unusable, using keyword scan");
    }
    analyze_departments(text)
}

/// Scan the text for every involved department. Departments with no
/// keyword evidence are dropped; the one with the most evidence becomes
/// the primary owner.
pub fn analyze_departments(text: &str) -> MultiDepartmentAnalysis {
    let lower = text.to_lowercase();
    let sentences = split_sentences(text);

    let mut involved: Vec<DepartmentInvolvement> = Vec::new();

    for (department, table) in super::keywords::department_tables() {
        let evidence: Vec<String> = table
            .iter()
            .filter(|k| lower.contains(*k))
            .map(|k| k.to_string())
            .collect();

        if evidence.is_empty() {
            continue;
        }

        let tasks = extract_tasks(&sentences, &evidence);
        involved.push(DepartmentInvolvement {
            department,
            evidence,
            tasks,
        });
    }

    assemble(involved, text)
}

fn assemble(mut involved: Vec<DepartmentInvolvement>, text: &str) -> MultiDepartmentAnalysis {
    // Most evidence wins; ties resolve to the earlier (more specific) entry
    involved.sort_by(|a, b| b.evidence.len().cmp(&a.evidence.len()));

    let primary = involved
        .first()
        .map(|i| i.department)
        .unwrap_or(Department::FALLBACK);
    let requires_coordination = involved.len() >= 2;
    let urgency = determine_priority(text);

    let evidence_total: usize = involved.iter().map(|i| i.evidence.len()).sum();
    let mut confidence = 0.5 + (evidence_total as f32 * 0.05).min(0.3);
    if requires_coordination {
        confidence += 0.15;
    }
    if matches!(urgency, Priority::Urgent | Priority::High) {
        confidence += 0.1;
    }

    MultiDepartmentAnalysis {
        involved,
        primary,
        requires_coordination,
        urgency,
        confidence: confidence.min(CONFIDENCE_CAP),
    }
}

const MULTI_SYSTEM_PROMPT: &str = "You analyze documents for a metro rail operator and identify \
every department with work in them. Respond with a single JSON object of the form \
{\"departments\": {\"<department name>\": {\"evidence\": [\"...\"], \"tasks\": [\"...\"]}}}. \
Use only department names from the provided list. No text outside the JSON object.";

#[derive(Deserialize)]
struct RawInvolvementMap {
    departments: BTreeMap<String, RawInvolvement>,
}

#[derive(Deserialize)]
struct RawInvolvement {
    #[serde(default)]
    evidence: Vec<String>,
    #[serde(default)]
    tasks: Vec<String>,
}

/// One model call proposing the involvement map. Department names that
/// are not in the closed vocabulary are dropped, not guessed at; an
/// empty or unparseable map yields None.
fn llm_involvement(
    generator: &dyn TextGenerator,
    text: &str,
) -> Option<Vec<DepartmentInvolvement>> {
    let mut prompt = String::from("Departments:\n");
    for dept in Department::ALL {
        prompt.push_str("- ");
        prompt.push_str(dept.as_str());
        prompt.push('\n');
    }
    prompt.push_str("\nDocument:\n");
    prompt.push_str(&text.chars().take(2000).collect::<String>());
    prompt.push_str("\n\nJSON answer:");

    let response = generator.complete(MULTI_SYSTEM_PROMPT, &prompt, 700, 0.2).ok()?;

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    let raw: RawInvolvementMap = serde_json::from_str(&response[start..=end]).ok()?;

    let mut involved = Vec::new();
    for (name, detail) in raw.departments {
        let Some(department) = Department::ALL
            .iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(name.trim()))
        else {
            debug!(name = %name, "dropping department outside the vocabulary");
            continue;
        };
        if detail.evidence.is_empty() {
            continue;
        }
        involved.push(DepartmentInvolvement {
            department: *department,
            evidence: detail.evidence,
            tasks: detail.tasks.into_iter().take(MAX_TASKS_PER_DEPARTMENT).collect(),
        });
    }

    if involved.is_empty() {
        None
    } else {
        Some(involved)
    }
}

impl MultiDepartmentAnalysis {
    /// Tasks keyed by department name, for the metadata sidecar.
    pub fn tasks_by_department(&self) -> BTreeMap<String, Vec<String>> {
        self.involved
            .iter()
            .filter(|i| !i.tasks.is_empty())
            .map(|i| (i.department.as_str().to_string(), i.tasks.clone()))
            .collect()
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?', '\n'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// A sentence becomes a task when it mentions one of the department's
/// evidence keywords and carries an action verb.
fn extract_tasks(sentences: &[String], evidence: &[String]) -> Vec<String> {
    sentences
        .iter()
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            let mentions_dept = evidence.iter().any(|k| lower.contains(k.as_str()));
            let has_action = ACTION_VERBS.iter().any(|v| lower.contains(v));
            mentions_dept && has_action
        })
        .take(MAX_TASKS_PER_DEPARTMENT)
        .cloned()
        .collect()
}
