pub mod classify;
pub mod dedupe;
pub mod extract;
pub mod intake;
pub mod queue;

use rusqlite::Connection;
use tracing::info;

use crate::config::LlmSettings;
use crate::db::{repository, DatabaseError};
use classify::{DepartmentResolver, OpenRouterClient, RetrievalIndex, TextGenerator};

/// Assemble a resolver from the knowledge base and the environment's LLM
/// settings. No API key means the retrieval tier stays dormant and the
/// keyword tier does all routing.
pub fn build_resolver(
    conn: &Connection,
    settings: &LlmSettings,
) -> Result<DepartmentResolver, DatabaseError> {
    let seeded = repository::seed_default_knowledge(conn)?;
    if seeded > 0 {
        info!(seeded, "seeded default knowledge base");
    }

    let entries = repository::list_knowledge_entries(conn)?;
    info!(samples = entries.len(), "building retrieval index");
    let index = RetrievalIndex::build(&entries);

    let generator: Option<Box<dyn TextGenerator>> = match &settings.api_key {
        Some(key) => {
            match OpenRouterClient::new(&settings.base_url, key, &settings.model, settings.timeout_secs)
            {
                Ok(client) => Some(Box::new(client)),
                Err(e) => {
                    tracing::warn!(error = %e, "LLM client unavailable, keyword routing only");
                    None
                }
            }
        }
        None => None,
    };

    Ok(DepartmentResolver::new(index, generator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::KnowledgeEntry;
    use crate::db::sqlite::open_memory_database;
    use crate::models::Department;

    #[test]
    fn resolver_builds_without_api_key() {
        let conn = open_memory_database().unwrap();
        repository::insert_knowledge_entry(
            &conn,
            &KnowledgeEntry {
                department: Department::Finance,
                sample_text: "invoice payment budget".into(),
            },
        )
        .unwrap();

        let settings = LlmSettings {
            base_url: "https://openrouter.ai/api/v1".into(),
            api_key: None,
            model: "meta-llama/llama-3.3-70b-instruct".into(),
            timeout_secs: 30,
        };

        let resolver = build_resolver(&conn, &settings).unwrap();
        let resolution = resolver.resolve("x", "invoice payment overdue");
        assert_eq!(resolution.department, Department::Finance);
        // No generator configured, so the offline tier answered
        assert_eq!(resolution.analysis.tier, "keyword");
    }
}
