use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Department, Language, Priority, ProcessingStatus, SourceChannel};
use super::metadata::DocumentMetadata;

/// A single intake record. One row in the `documents` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    /// Extracted text. May be a placeholder sentinel when extraction
    /// could not produce anything useful.
    pub content: String,
    /// Hex-encoded SHA-256 of the extracted content. Dedup key.
    pub fingerprint: String,
    pub source_channel: SourceChannel,
    /// Channel-specific sender identity (email address, webhook message id).
    pub origin_identity: Option<String>,
    pub department: Department,
    pub priority: Priority,
    /// Routing confidence, 0.0..=100.0.
    pub confidence: f32,
    pub status: ProcessingStatus,
    /// Number of times the same content was re-submitted.
    pub update_count: u32,
    pub language: Language,
    pub metadata: DocumentMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// New unclassified document awaiting queue processing.
    pub fn new_pending(
        title: impl Into<String>,
        content: impl Into<String>,
        fingerprint: impl Into<String>,
        source_channel: SourceChannel,
        origin_identity: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            fingerprint: fingerprint.into(),
            source_channel,
            origin_identity,
            department: Department::FALLBACK,
            priority: Priority::Normal,
            confidence: 0.0,
            status: ProcessingStatus::Pending,
            update_count: 0,
            language: Language::Unknown,
            metadata: DocumentMetadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pending_starts_unrouted() {
        let doc = Document::new_pending(
            "maintenance log",
            "brake pad wear report",
            "abc123",
            SourceChannel::Upload,
            None,
        );
        assert_eq!(doc.status, ProcessingStatus::Pending);
        assert_eq!(doc.department, Department::Administration);
        assert_eq!(doc.update_count, 0);
        assert_eq!(doc.confidence, 0.0);
        assert_eq!(doc.created_at, doc.updated_at);
    }
}
