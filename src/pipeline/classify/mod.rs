pub mod keywords;
pub mod llm;
pub mod multi;
pub mod parser;
pub mod prompt;
pub mod resolver;
pub mod retrieval;

pub use keywords::*;
pub use llm::*;
pub use multi::*;
pub use parser::*;
pub use prompt::*;
pub use resolver::*;
pub use retrieval::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Cannot reach LLM endpoint at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Provider requires payment or credits")]
    PaymentRequired,

    #[error("LLM returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("API key not configured")]
    MissingApiKey,
}
