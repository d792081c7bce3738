use rusqlite::Connection;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::classify::DepartmentResolver;
use super::dedupe::{check_duplicate, MatchKind};
use super::extract::{decode_inline_content, detect_language, ContentExtractor};
use crate::db::{repository, DatabaseError};
use crate::models::{Document, ProcessingStatus, SourceChannel};
use crate::storage::{ObjectStore, StorageError};

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Empty payload for {0}")]
    EmptyPayload(String),

    #[error("Insert conflict persisted after retry for fingerprint {0}")]
    InsertConflict(String),
}

/// When the routing work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Classify inline; the stored document is already `Processed`.
    Immediate,
    /// Register only; the document stays `Pending` for the queue drain.
    Deferred,
}

/// One incoming payload, any channel.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub title: String,
    pub payload: Vec<u8>,
    pub channel: SourceChannel,
    /// Upstream delivery id (webhook message id, mail message id).
    pub origin_identity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestStatus {
    Created,
    /// The content was already registered; the existing row was refreshed.
    Duplicate(MatchKind),
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub document: Document,
    pub status: IngestStatus,
    pub filename_collision: bool,
}

/// Front door of the pipeline: extract, dedupe, optionally classify,
/// persist. Resubmitting the same content never creates a second row.
pub struct IntakeCoordinator {
    extractor: ContentExtractor,
    resolver: DepartmentResolver,
    archive: Option<Box<dyn ObjectStore>>,
}

impl IntakeCoordinator {
    pub fn new(resolver: DepartmentResolver, archive: Option<Box<dyn ObjectStore>>) -> Self {
        Self {
            extractor: ContentExtractor::new(),
            resolver,
            archive,
        }
    }

    pub fn ingest(
        &self,
        conn: &Connection,
        request: &IngestRequest,
        mode: IngestMode,
    ) -> Result<IngestOutcome, IntakeError> {
        if request.payload.is_empty() {
            return Err(IntakeError::EmptyPayload(request.title.clone()));
        }

        info!(title = %request.title, channel = request.channel.as_str(), "ingesting document");

        // Extraction never fails; worst case is a placeholder sentinel.
        let extracted = self.extractor.extract(&request.title, &request.payload);
        let (content, was_decoded) = decode_inline_content(&extracted.text);

        let check = check_duplicate(
            conn,
            &request.title,
            &content,
            request.channel,
            request.origin_identity.as_deref(),
        )?;

        if let (Some(existing_id), Some(kind)) = (check.existing_document_id, check.match_kind) {
            let document = self.refresh_duplicate(conn, &existing_id, mode)?;
            return Ok(IngestOutcome {
                document,
                status: IngestStatus::Duplicate(kind),
                filename_collision: check.filename_collision,
            });
        }

        let mut document = Document::new_pending(
            request.title.clone(),
            content.clone(),
            check.fingerprint.clone(),
            request.channel,
            request.origin_identity.clone(),
        );
        document.language = detect_language(&content);
        document.metadata.extraction = Some(extracted.diagnostics());
        if was_decoded {
            document
                .metadata
                .extra
                .insert("decoded_base64".into(), serde_json::Value::Bool(true));
        }

        if mode == IngestMode::Immediate {
            self.classify(&mut document);
        }

        if let Some(archive) = &self.archive {
            let key = archive.put(&document.id, &request.title, &request.payload)?;
            document
                .metadata
                .extra
                .insert("object_key".into(), serde_json::Value::String(key));
        }

        self.insert_with_retry(conn, document, &check.fingerprint, mode)
            .map(|document| IngestOutcome {
                document,
                status: IngestStatus::Created,
                filename_collision: check.filename_collision,
            })
    }

    /// Run the routing tiers plus the cross-department pass and stamp the
    /// results onto the document.
    fn classify(&self, document: &mut Document) {
        self.stamp_routing(document);
        document.status = ProcessingStatus::Processed;
    }

    fn stamp_routing(&self, document: &mut Document) {
        let resolution = self.resolver.resolve(&document.title, &document.content);
        document.department = resolution.department;
        document.priority = resolution.priority;
        document.confidence = resolution.confidence;
        document.metadata.analysis = Some(resolution.analysis);

        // More than one department involved: the primary owner from the
        // cross-analysis takes over the routing.
        let multi = self.resolver.multi_analysis(&document.content);
        if multi.requires_coordination {
            document.department = multi.primary;
            document.confidence = multi.confidence * 100.0;
            let tasks = multi.tasks_by_department();
            if !tasks.is_empty() {
                document.metadata.department_tasks = Some(tasks);
            }
            document.metadata.extra.insert(
                "requires_coordination".into(),
                serde_json::Value::Bool(true),
            );
        }
    }

    /// Resubmission path: bump the counter, revive failed rows, touch the
    /// timestamp, and in Immediate mode re-run classification so the merged
    /// row carries fresh routing fields. Content, id, and created_at stay
    /// as they are.
    fn refresh_duplicate(
        &self,
        conn: &Connection,
        existing_id: &Uuid,
        mode: IngestMode,
    ) -> Result<Document, IntakeError> {
        let mut existing = repository::get_document(conn, existing_id)?.ok_or_else(|| {
            DatabaseError::NotFound {
                entity_type: "document".into(),
                id: existing_id.to_string(),
            }
        })?;

        existing.update_count += 1;
        if existing.status == ProcessingStatus::Failed {
            existing.status = ProcessingStatus::Pending;
        }
        if mode == IngestMode::Immediate {
            self.stamp_routing(&mut existing);
        }
        existing.touch();
        repository::update_document(conn, &existing)?;

        info!(
            document_id = %existing.id,
            update_count = existing.update_count,
            "duplicate resubmission merged"
        );
        Ok(existing)
    }

    /// A unique violation means one of two races: a concurrent request
    /// landed the same fingerprint first (merge into the winner), or the
    /// generated id collided (regenerate and retry exactly once). A second
    /// failure surfaces as the one hard intake error.
    fn insert_with_retry(
        &self,
        conn: &Connection,
        mut document: Document,
        fingerprint: &str,
        mode: IngestMode,
    ) -> Result<Document, IntakeError> {
        match repository::insert_document(conn, &document) {
            Ok(()) => Ok(document),
            Err(e) if e.is_unique_violation() => {
                warn!(fingerprint, "insert raced a concurrent duplicate");
                if let Some(winner) =
                    repository::get_document_by_fingerprint(conn, fingerprint)?
                {
                    return self.refresh_duplicate(conn, &winner.id, mode);
                }

                document.id = Uuid::new_v4();
                match repository::insert_document(conn, &document) {
                    Ok(()) => Ok(document),
                    Err(e) if e.is_unique_violation() => {
                        Err(IntakeError::InsertConflict(fingerprint.to_string()))
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}
