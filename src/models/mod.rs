pub mod document;
pub mod enums;
pub mod metadata;

pub use document::Document;
pub use enums::{Department, Language, Priority, ProcessingStatus, SourceChannel};
pub use metadata::{AnalysisRecord, DocumentMetadata, ExtractionDiagnostics};
