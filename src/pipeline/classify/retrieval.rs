use std::collections::HashMap;

use crate::db::repository::KnowledgeEntry;
use crate::models::Department;

/// Minimum cosine similarity for a knowledge sample to count as context.
const MIN_SIMILARITY: f32 = 0.1;

/// How many scored samples the search returns at most.
pub const RETRIEVAL_TOP_K: usize = 5;

/// A knowledge sample scored against a query.
#[derive(Debug, Clone)]
pub struct ScoredSample {
    pub department: Department,
    pub text: String,
    pub score: f32,
}

/// Term-frequency index over the department knowledge base. Built once
/// from the knowledge entries, then queried per document. Pure in-memory;
/// no model downloads, no network.
pub struct RetrievalIndex {
    vocabulary: HashMap<String, usize>,
    entries: Vec<IndexedEntry>,
}

struct IndexedEntry {
    department: Department,
    text: String,
    vector: Vec<f32>,
}

impl RetrievalIndex {
    pub fn build(entries: &[KnowledgeEntry]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        for entry in entries {
            for token in tokenize(&entry.sample_text) {
                let next_id = vocabulary.len();
                vocabulary.entry(token).or_insert(next_id);
            }
        }

        let indexed = entries
            .iter()
            .map(|entry| IndexedEntry {
                department: entry.department,
                text: entry.sample_text.clone(),
                vector: vectorize(&entry.sample_text, &vocabulary),
            })
            .collect();

        Self {
            vocabulary,
            entries: indexed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-k knowledge samples by cosine similarity, filtered by the
    /// minimum-similarity threshold. Result is sorted best first.
    pub fn search(&self, query: &str) -> Vec<ScoredSample> {
        let query_vector = vectorize(query, &self.vocabulary);

        let mut scored: Vec<ScoredSample> = self
            .entries
            .iter()
            .map(|entry| ScoredSample {
                department: entry.department,
                text: entry.text.clone(),
                score: cosine_similarity(&query_vector, &entry.vector),
            })
            .filter(|s| s.score >= MIN_SIMILARITY)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(RETRIEVAL_TOP_K);
        scored
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(|t| t.to_string())
        .collect()
}

fn vectorize(text: &str, vocabulary: &HashMap<String, usize>) -> Vec<f32> {
    let mut vector = vec![0.0f32; vocabulary.len()];
    for token in tokenize(text) {
        if let Some(&idx) = vocabulary.get(&token) {
            vector[idx] += 1.0;
        }
    }
    vector
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
