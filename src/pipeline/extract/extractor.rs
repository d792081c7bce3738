use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use super::formats::{detect_format, DocumentFormat};
use super::sniff::looks_like_csv;
use crate::models::ExtractionDiagnostics;

/// Output of the extraction stage. Extraction never fails the pipeline:
/// formats we cannot parse produce a placeholder sentinel so the document
/// still gets registered, deduplicated, and routed by its title.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub text: String,
    pub format: DocumentFormat,
    /// Which strategy produced the text, e.g. "plain_text",
    /// "csv_passthrough", "pdf_failed".
    pub method: String,
    pub warning: Option<String>,
}

impl ExtractedContent {
    pub fn diagnostics(&self) -> ExtractionDiagnostics {
        ExtractionDiagnostics {
            method: self.method.clone(),
            format: self.format.as_str().to_string(),
            word_count: self.text.split_whitespace().count(),
            warning: self.warning.clone(),
        }
    }
}

/// A handler declining a payload hands it to the next strategy in the
/// chain. The extractor itself never surfaces these.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    #[error("no parser available for {0}")]
    ParserUnavailable(&'static str),
}

/// One extraction strategy. Formats with several strategies register them
/// highest fidelity first; the first Ok wins and its name lands in
/// `method`.
pub trait FormatHandler: Send + Sync {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<ExtractedContent, ExtractError>;
}

/// Dispatches payloads to a per-format handler chain. Chains are
/// swappable, so a real pdf/docx parser can replace the placeholder
/// without touching the pipeline.
pub struct ContentExtractor {
    chains: HashMap<DocumentFormat, Vec<Box<dyn FormatHandler>>>,
}

impl ContentExtractor {
    pub fn new() -> Self {
        let mut chains: HashMap<DocumentFormat, Vec<Box<dyn FormatHandler>>> = HashMap::new();
        chains.insert(
            DocumentFormat::PlainText,
            vec![Box::new(Utf8TextHandler), Box::new(LossyTextHandler)],
        );
        chains.insert(
            DocumentFormat::Json,
            vec![Box::new(Utf8TextHandler), Box::new(LossyTextHandler)],
        );
        chains.insert(DocumentFormat::Csv, vec![Box::new(CsvHandler)]);
        for format in [
            DocumentFormat::Pdf,
            DocumentFormat::Docx,
            DocumentFormat::Xlsx,
            DocumentFormat::Image,
        ] {
            chains.insert(format, vec![Box::new(PlaceholderHandler { format })]);
        }
        Self { chains }
    }

    /// Replace the handler chain for one format. Handlers run in order;
    /// the first that succeeds wins.
    pub fn with_chain(
        mut self,
        format: DocumentFormat,
        handlers: Vec<Box<dyn FormatHandler>>,
    ) -> Self {
        self.chains.insert(format, handlers);
        self
    }

    pub fn extract(&self, filename: &str, bytes: &[u8]) -> ExtractedContent {
        let format = detect_format(filename, bytes);
        debug!(filename, format = format.as_str(), "extracting content");

        if format == DocumentFormat::Unknown {
            return self.extract_unknown(filename, bytes);
        }

        if let Some(chain) = self.chains.get(&format) {
            for handler in chain {
                match handler.extract(filename, bytes) {
                    Ok(content) => return content,
                    Err(e) => {
                        debug!(filename, error = %e, "strategy declined, trying next");
                    }
                }
            }
        }

        // Every strategy declined (or the chain was emptied out). The
        // sentinel keeps the pipeline infallible.
        warn!(filename, format = format.as_str(), "all strategies declined");
        placeholder(format, filename)
    }

    /// No extension, no magic bytes. If it decodes as UTF-8 treat it as
    /// text (possibly CSV), otherwise emit the unsupported sentinel.
    fn extract_unknown(&self, filename: &str, bytes: &[u8]) -> ExtractedContent {
        match std::str::from_utf8(bytes) {
            Ok(text) if looks_like_csv(text) => ExtractedContent {
                text: text.to_string(),
                format: DocumentFormat::Csv,
                method: "csv_sniffed".into(),
                warning: None,
            },
            Ok(text) => ExtractedContent {
                text: text.to_string(),
                format: DocumentFormat::PlainText,
                method: "plain_text_sniffed".into(),
                warning: None,
            },
            Err(_) => {
                warn!(filename, "unsupported payload, storing placeholder");
                ExtractedContent {
                    text: placeholder_text("unsupported", filename),
                    format: DocumentFormat::Unknown,
                    method: "unsupported".into(),
                    warning: Some("payload is not valid UTF-8 and matched no known format".into()),
                }
            }
        }
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

struct Utf8TextHandler;

impl FormatHandler for Utf8TextHandler {
    fn extract(&self, _filename: &str, bytes: &[u8]) -> Result<ExtractedContent, ExtractError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ExtractError::NotUtf8)?;
        Ok(ExtractedContent {
            text: text.to_string(),
            format: DocumentFormat::PlainText,
            method: "plain_text".into(),
            warning: None,
        })
    }
}

/// Last resort for text payloads with broken encoding.
struct LossyTextHandler;

impl FormatHandler for LossyTextHandler {
    fn extract(&self, _filename: &str, bytes: &[u8]) -> Result<ExtractedContent, ExtractError> {
        Ok(ExtractedContent {
            text: String::from_utf8_lossy(bytes).into_owned(),
            format: DocumentFormat::PlainText,
            method: "plain_text_lossy".into(),
            warning: Some("invalid UTF-8 sequences replaced".into()),
        })
    }
}

/// CSV passes through untouched. Downstream keyword matching works fine
/// on raw rows, and preserving the bytes keeps the fingerprint stable.
struct CsvHandler;

impl FormatHandler for CsvHandler {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<ExtractedContent, ExtractError> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        let warning = if looks_like_csv(&text) {
            None
        } else {
            debug!(filename, "csv extension but content is not tabular");
            Some("content does not look tabular despite csv extension".into())
        };
        Ok(ExtractedContent {
            text,
            format: DocumentFormat::Csv,
            method: "csv_passthrough".into(),
            warning,
        })
    }
}

/// Default terminal for binary formats with no parser wired in. Emits a
/// titled placeholder so the document remains routable by its filename
/// and searchable in the registry.
pub struct PlaceholderHandler {
    pub format: DocumentFormat,
}

impl FormatHandler for PlaceholderHandler {
    fn extract(&self, filename: &str, _bytes: &[u8]) -> Result<ExtractedContent, ExtractError> {
        Ok(placeholder(self.format, filename))
    }
}

fn placeholder(format: DocumentFormat, filename: &str) -> ExtractedContent {
    let kind = format.as_str();
    ExtractedContent {
        text: placeholder_text(kind, filename),
        format,
        method: format!("{kind}_failed"),
        warning: Some(format!("no text extracted from {kind} payload")),
    }
}

fn placeholder_text(kind: &str, filename: &str) -> String {
    format!("[{kind} document: {filename}] Content could not be extracted.")
}
