use super::retrieval::ScoredSample;
use crate::models::Department;

/// How many retrieved samples are quoted in the prompt. The retrieval
/// tier returns up to five; only the strongest three are worth tokens.
const CONTEXT_SAMPLES_IN_PROMPT: usize = 3;

/// Document content is truncated before prompting to keep latency and
/// cost bounded. Routing signal lives in the opening paragraphs.
const MAX_CONTENT_CHARS: usize = 2000;

pub const CLASSIFICATION_SYSTEM_PROMPT: &str = "You are a document router for a metro rail operator. \
Assign each document to exactly one department from the provided list. \
Respond with a single JSON object: \
{\"department\": \"<name>\", \"confidence\": <0-100>, \"reasoning\": \"<one sentence>\"}. \
Use only department names from the list. Do not add any text outside the JSON object.";

/// Build the user prompt: department list, retrieved reference samples,
/// then the document itself.
pub fn build_classification_prompt(title: &str, content: &str, context: &[ScoredSample]) -> String {
    let mut prompt = String::from("Departments:\n");
    for dept in Department::ALL {
        prompt.push_str("- ");
        prompt.push_str(dept.as_str());
        prompt.push('\n');
    }

    if !context.is_empty() {
        prompt.push_str("\nReference examples of already-routed content:\n");
        for sample in context.iter().take(CONTEXT_SAMPLES_IN_PROMPT) {
            prompt.push_str(&format!(
                "[{}] {}\n",
                sample.department.as_str(),
                sample.text
            ));
        }
    }

    prompt.push_str("\nDocument title: ");
    prompt.push_str(title);
    prompt.push_str("\nDocument content:\n");
    prompt.push_str(&truncate_chars(content, MAX_CONTENT_CHARS));
    prompt.push_str("\n\nJSON answer:");
    prompt
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}
