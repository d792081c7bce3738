use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(SourceChannel {
    Email => "email",
    Webhook => "webhook",
    Upload => "upload",
    Chat => "chat",
});

str_enum!(Priority {
    Urgent => "urgent",
    High => "high",
    Normal => "normal",
    Low => "low",
});

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Document lifecycle within the processing queue.
/// Transitions only move forward (pending → processing → processed/failed),
/// except failed → pending on a manual retry.
str_enum!(ProcessingStatus {
    Pending => "pending",
    Processing => "processing",
    Processed => "processed",
    Failed => "failed",
});

str_enum!(Language {
    English => "english",
    Malayalam => "malayalam",
    MixedEnMl => "mixed_en_ml",
    Mixed => "mixed",
    Unknown => "unknown",
});

/// Closed department vocabulary for routing. `Administration` is the
/// fallback when nothing better can be determined.
str_enum!(Department {
    Engineering => "Engineering",
    RollingStock => "Rolling Stock & Mechanical",
    Electrical => "Electrical",
    Signalling => "Signalling",
    Operations => "Operations",
    SafetySecurity => "Safety & Security",
    Environment => "Environment",
    Finance => "Finance",
    HumanResources => "Human Resources",
    Administration => "Administration",
});

impl Department {
    pub const ALL: &'static [Department] = &[
        Department::Engineering,
        Department::RollingStock,
        Department::Electrical,
        Department::Signalling,
        Department::Operations,
        Department::SafetySecurity,
        Department::Environment,
        Department::Finance,
        Department::HumanResources,
        Department::Administration,
    ];

    /// The department a document lands in when no signal points anywhere else.
    pub const FALLBACK: Department = Department::Administration;

    /// Normalize a free-form department name (e.g. from an LLM response)
    /// against the closed vocabulary. Case-insensitive, with an alias table
    /// for the short forms the upstream systems tend to emit. Unrecognized
    /// names fall back to `Administration`.
    pub fn normalize(raw: &str) -> Department {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "engineering" | "civil" => Department::Engineering,
            "rolling stock & mechanical" | "rolling stock" | "mechanical" => {
                Department::RollingStock
            }
            "electrical" => Department::Electrical,
            "signalling" | "signaling" => Department::Signalling,
            "operations" | "ops" => Department::Operations,
            "safety & security" | "safety" | "security" => Department::SafetySecurity,
            "environment" => Department::Environment,
            "finance" => Department::Finance,
            "human resources" | "hr" => Department::HumanResources,
            "administration" | "admin" => Department::Administration,
            _ => {
                // Substring match catches responses like "the Finance department"
                for dept in Self::ALL {
                    if lower.contains(&dept.as_str().to_lowercase()) {
                        return *dept;
                    }
                }
                Department::FALLBACK
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn enum_roundtrip_through_str() {
        for dept in Department::ALL {
            assert_eq!(Department::from_str(dept.as_str()).unwrap(), *dept);
        }
        assert_eq!(
            ProcessingStatus::from_str("pending").unwrap(),
            ProcessingStatus::Pending
        );
        assert_eq!(Priority::from_str("urgent").unwrap(), Priority::Urgent);
    }

    #[test]
    fn invalid_enum_value_rejected() {
        assert!(Priority::from_str("sometime").is_err());
        assert!(SourceChannel::from_str("carrier-pigeon").is_err());
    }

    #[test]
    fn normalize_exact_and_aliases() {
        assert_eq!(Department::normalize("Finance"), Department::Finance);
        assert_eq!(Department::normalize("hr"), Department::HumanResources);
        assert_eq!(Department::normalize("SAFETY"), Department::SafetySecurity);
        assert_eq!(Department::normalize("admin"), Department::Administration);
        assert_eq!(
            Department::normalize("rolling stock"),
            Department::RollingStock
        );
    }

    #[test]
    fn normalize_substring_match() {
        assert_eq!(
            Department::normalize("the Engineering department"),
            Department::Engineering
        );
    }

    #[test]
    fn normalize_unknown_falls_back() {
        assert_eq!(Department::normalize("Catering"), Department::Administration);
        assert_eq!(Department::normalize(""), Department::Administration);
    }

    #[test]
    fn priority_defaults_to_normal() {
        assert_eq!(Priority::default(), Priority::Normal);
    }
}
