use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "raildocs";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info")
}

/// Application data directory: ~/.raildocs/
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(".raildocs")
}

pub fn database_path() -> PathBuf {
    app_data_dir().join("raildocs.db")
}

/// Where original payloads are archived by the local object store.
pub fn archive_dir() -> PathBuf {
    app_data_dir().join("archive")
}

/// LLM provider settings, environment-driven. The service runs fine with
/// no key at all; classification then relies on the keyword tier.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl LlmSettings {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("RAILDOCS_LLM_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            api_key: std::env::var("RAILDOCS_LLM_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: std::env::var("RAILDOCS_LLM_MODEL")
                .unwrap_or_else(|_| "meta-llama/llama-3.3-70b-instruct".to_string()),
            timeout_secs: crate::pipeline::classify::LLM_TIMEOUT_SECS,
        }
    }
}
