//! Keyword-based routing. This is the offline tier: it never fails and
//! needs no network, so it is the safety net under the retrieval tier.
//!
//! Keyword tables are bilingual. Multi-word phrases score by their word
//! count, so "rolling stock" outweighs a lone "stock".

use crate::models::{Department, Priority};

const ENGINEERING_KEYWORDS: &[&str] = &[
    "track", "civil", "construction", "bridge", "tunnel", "alignment", "viaduct",
    "structural", "foundation", "concrete", "girder", "pier", "embankment",
    "survey", "drawing", "blueprint", "station building",
    "നിർമ്മാണം", "പാലം", "ട്രാക്ക്",
];

const ROLLING_STOCK_KEYWORDS: &[&str] = &[
    "rolling stock", "train set", "coach", "bogie", "brake", "wheel", "axle",
    "traction motor", "hvac", "door mechanism", "pantograph", "maintenance depot",
    "overhaul", "spare part", "ട്രെയിൻ", "കോച്ച്",
];

const ELECTRICAL_KEYWORDS: &[&str] = &[
    "electrical", "power supply", "substation", "transformer", "voltage",
    "cable", "traction power", "third rail", "overhead line", "ups", "generator",
    "earthing", "switchgear", "വൈദ്യുതി",
];

const SIGNALLING_KEYWORDS: &[&str] = &[
    "signalling", "signal failure", "interlocking", "telecom", "cbtc",
    "axle counter", "point machine", "train control", "scada", "communication",
    "radio", "fibre", "സിഗ്നൽ",
];

const OPERATIONS_KEYWORDS: &[&str] = &[
    "operations", "timetable", "schedule", "service frequency", "headway",
    "passenger", "ridership", "station controller", "train operator", "crew roster",
    "platform", "revenue service", "ഓപ്പറേഷൻ", "യാത്രക്കാർ",
];

const SAFETY_KEYWORDS: &[&str] = &[
    "safety", "security", "accident", "incident", "hazard", "fire", "evacuation",
    "cctv", "emergency drill", "first aid", "injury", "near miss", "violation",
    "സുരക്ഷ", "അപകടം",
];

const ENVIRONMENT_KEYWORDS: &[&str] = &[
    "environment", "pollution", "noise level", "waste disposal", "green energy",
    "solar", "water treatment", "emission", "tree planting", "sustainability",
    "പരിസ്ഥിതി",
];

const FINANCE_KEYWORDS: &[&str] = &[
    "finance", "budget", "invoice", "payment", "tender", "procurement", "audit",
    "expenditure", "fund", "cost estimate", "purchase order", "vendor", "billing",
    "salary", "reimbursement", "ബജറ്റ്", "പണം",
];

const HR_KEYWORDS: &[&str] = &[
    "human resources", "recruitment", "appointment letter", "transfer", "promotion",
    "leave application", "training program", "employee", "staff welfare",
    "disciplinary", "attendance", "retirement", "ജീവനക്കാർ", "നിയമനം",
];

const ADMIN_KEYWORDS: &[&str] = &[
    "administration", "circular", "office order", "meeting minutes", "correspondence",
    "rti", "policy", "notification", "stationery", "record keeping",
    "ഭരണം", "സർക്കുലർ",
];

const URGENT_KEYWORDS: &[&str] = &[
    "urgent", "emergency", "immediate", "critical", "asap", "breakdown",
    "accident", "fire", "derailment", "safety hazard", "service disruption",
    "അടിയന്തരം", "അപകടം", "ഉടൻ",
];

const HIGH_KEYWORDS: &[&str] = &[
    "important", "priority", "deadline", "today", "tomorrow", "escalation",
    "overdue", "compliance", "പ്രധാനം", "സമയപരിധി",
];

pub(crate) fn department_tables() -> [(Department, &'static [&'static str]); 10] {
    [
        (Department::Engineering, ENGINEERING_KEYWORDS),
        (Department::RollingStock, ROLLING_STOCK_KEYWORDS),
        (Department::Electrical, ELECTRICAL_KEYWORDS),
        (Department::Signalling, SIGNALLING_KEYWORDS),
        (Department::Operations, OPERATIONS_KEYWORDS),
        (Department::SafetySecurity, SAFETY_KEYWORDS),
        (Department::Environment, ENVIRONMENT_KEYWORDS),
        (Department::Finance, FINANCE_KEYWORDS),
        (Department::HumanResources, HR_KEYWORDS),
        (Department::Administration, ADMIN_KEYWORDS),
    ]
}

/// Result of the keyword tier.
#[derive(Debug, Clone)]
pub struct KeywordMatch {
    pub department: Department,
    /// 0.0..=100.0
    pub confidence: f32,
    pub matched: Vec<String>,
}

/// Confidence assigned when nothing matched and we fall back to
/// Administration.
pub const NO_MATCH_CONFIDENCE: f32 = 10.0;

/// Score each department by weighted keyword hits and pick the best.
/// Confidence scales with hit density: score over total word count,
/// capped at 100.
pub fn classify_by_keywords(text: &str) -> KeywordMatch {
    let lower = text.to_lowercase();
    let total_words = lower.split_whitespace().count().max(1);

    let mut best: Option<(Department, usize, Vec<String>)> = None;

    for (department, table) in department_tables() {
        let mut score = 0usize;
        let mut matched = Vec::new();
        for &keyword in table {
            if lower.contains(keyword) {
                // Phrase weight = number of words in the phrase
                score += keyword.split_whitespace().count().max(1);
                matched.push(keyword.to_string());
            }
        }
        if score > 0 {
            let better = match &best {
                Some((_, best_score, _)) => score > *best_score,
                None => true,
            };
            if better {
                best = Some((department, score, matched));
            }
        }
    }

    match best {
        Some((department, score, matched)) => KeywordMatch {
            department,
            confidence: ((score as f32 / total_words as f32) * 100.0).min(100.0),
            matched,
        },
        None => KeywordMatch {
            department: Department::FALLBACK,
            confidence: NO_MATCH_CONFIDENCE,
            matched: Vec::new(),
        },
    }
}

/// Scan for urgency markers. Urgent keywords win over high-priority
/// keywords; first table with a hit decides.
pub fn determine_priority(text: &str) -> Priority {
    let lower = text.to_lowercase();

    if URGENT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Priority::Urgent;
    }
    if HIGH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Priority::High;
    }
    Priority::Normal
}
