//! Deferred-processing queue. Documents registered with `Deferred` intake
//! sit in `pending` until a drain pass routes them. Runs sequentially;
//! one failing document never stops the rest of the batch.

use rusqlite::Connection;
use tracing::{error, info};
use uuid::Uuid;

use super::classify::DepartmentResolver;
use crate::db::{repository, DatabaseError};
use crate::models::{Document, ProcessingStatus};

/// Default batch size for one drain pass.
pub const DEFAULT_DRAIN_BATCH: usize = 10;

/// Summary of one drain pass.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub processed_count: usize,
    pub failed_count: usize,
    pub processed_ids: Vec<Uuid>,
    pub errors: Vec<(Uuid, String)>,
}

pub struct ProcessingQueueManager {
    resolver: DepartmentResolver,
}

impl ProcessingQueueManager {
    pub fn new(resolver: DepartmentResolver) -> Self {
        Self { resolver }
    }

    /// Route up to `batch_size` pending documents, oldest first. Each
    /// document moves pending → processing → processed; a failure parks
    /// it in `failed` with the error recorded in its metadata, and the
    /// pass continues with the next one.
    pub fn drain_pending(
        &self,
        conn: &Connection,
        batch_size: usize,
    ) -> Result<DrainReport, DatabaseError> {
        let pending = repository::list_pending_documents(conn, batch_size)?;
        info!(count = pending.len(), "draining pending documents");

        let mut report = DrainReport::default();

        for mut doc in pending {
            let id = doc.id;
            match self.process_one(conn, &mut doc) {
                Ok(()) => {
                    report.processed_count += 1;
                    report.processed_ids.push(id);
                }
                Err(e) => {
                    error!(document_id = %id, error = %e, "queue processing failed");
                    report.failed_count += 1;
                    report.errors.push((id, e.to_string()));
                    self.mark_failed(conn, &mut doc, &e);
                }
            }
        }

        info!(
            processed = report.processed_count,
            failed = report.failed_count,
            "drain pass complete"
        );
        Ok(report)
    }

    fn process_one(&self, conn: &Connection, doc: &mut Document) -> Result<(), DatabaseError> {
        repository::set_document_status(conn, &doc.id, ProcessingStatus::Processing)?;

        let resolution = self.resolver.resolve(&doc.title, &doc.content);
        doc.department = resolution.department;
        doc.priority = resolution.priority;
        doc.confidence = resolution.confidence;
        doc.metadata.analysis = Some(resolution.analysis);

        let multi = self.resolver.multi_analysis(&doc.content);
        if multi.requires_coordination {
            doc.department = multi.primary;
            doc.confidence = multi.confidence * 100.0;
            let tasks = multi.tasks_by_department();
            if !tasks.is_empty() {
                doc.metadata.department_tasks = Some(tasks);
            }
            doc.metadata.extra.insert(
                "requires_coordination".into(),
                serde_json::Value::Bool(true),
            );
        }

        doc.status = ProcessingStatus::Processed;
        doc.touch();
        repository::update_document(conn, doc)
    }

    /// Best effort: record the failure on the row itself. If even that
    /// write fails the row stays in `processing` and the next drain will
    /// not pick it up, which is the safer direction.
    fn mark_failed(&self, conn: &Connection, doc: &mut Document, cause: &DatabaseError) {
        doc.status = ProcessingStatus::Failed;
        doc.metadata.extra.insert(
            "processing_error".into(),
            serde_json::Value::String(cause.to_string()),
        );
        doc.touch();
        if let Err(e) = repository::update_document(conn, doc) {
            error!(document_id = %doc.id, error = %e, "could not record failure");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Department, Priority, SourceChannel};
    use crate::pipeline::dedupe::compute_fingerprint;

    fn seed_pending(conn: &Connection, title: &str, content: &str) -> Uuid {
        let doc = Document::new_pending(
            title,
            content,
            compute_fingerprint(content),
            SourceChannel::Webhook,
            Some(format!("msg-{title}")),
        );
        repository::insert_document(conn, &doc).unwrap();
        doc.id
    }

    #[test]
    fn drain_routes_pending_documents() {
        let conn = open_memory_database().unwrap();
        let id = seed_pending(&conn, "invoice.txt", "vendor invoice payment pending approval");

        let manager = ProcessingQueueManager::new(DepartmentResolver::offline());
        let report = manager.drain_pending(&conn, DEFAULT_DRAIN_BATCH).unwrap();

        assert_eq!(report.processed_count, 1);
        assert_eq!(report.failed_count, 0);
        assert_eq!(report.processed_ids, vec![id]);

        let doc = repository::get_document(&conn, &id).unwrap().unwrap();
        assert_eq!(doc.status, ProcessingStatus::Processed);
        assert_eq!(doc.department, Department::Finance);
        assert!(doc.metadata.analysis.is_some());
    }

    #[test]
    fn drain_respects_batch_size_and_order() {
        let conn = open_memory_database().unwrap();
        for i in 0..7 {
            let mut doc = Document::new_pending(
                format!("doc-{i}.txt"),
                format!("budget note number {i}"),
                compute_fingerprint(&format!("budget note number {i}")),
                SourceChannel::Upload,
                None,
            );
            doc.created_at = chrono::Utc::now() - chrono::Duration::seconds(100 - i);
            repository::insert_document(&conn, &doc).unwrap();
        }

        let manager = ProcessingQueueManager::new(DepartmentResolver::offline());
        let report = manager.drain_pending(&conn, 5).unwrap();

        assert_eq!(report.processed_count, 5);
        assert_eq!(
            repository::count_documents_by_status(&conn, ProcessingStatus::Pending).unwrap(),
            2
        );
    }

    #[test]
    fn empty_queue_is_a_noop() {
        let conn = open_memory_database().unwrap();
        let manager = ProcessingQueueManager::new(DepartmentResolver::offline());
        let report = manager.drain_pending(&conn, DEFAULT_DRAIN_BATCH).unwrap();
        assert_eq!(report.processed_count, 0);
        assert_eq!(report.failed_count, 0);
    }

    #[test]
    fn one_failure_does_not_stop_the_batch() {
        let conn = open_memory_database().unwrap();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(seed_pending(
                &conn,
                &format!("n-{i}.txt"),
                &format!("platform schedule update {i}"),
            ));
        }

        // Sabotage document #2: abort any attempt to move it to processing
        conn.execute_batch(&format!(
            "CREATE TRIGGER sabotage BEFORE UPDATE ON documents
             WHEN NEW.id = '{}' AND NEW.status = 'processing'
             BEGIN SELECT RAISE(ABORT, 'sabotaged'); END;",
            ids[1]
        ))
        .unwrap();

        let manager = ProcessingQueueManager::new(DepartmentResolver::offline());
        let report = manager.drain_pending(&conn, DEFAULT_DRAIN_BATCH).unwrap();

        assert_eq!(report.processed_count, 4);
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, ids[1]);

        let failed = repository::get_document(&conn, &ids[1]).unwrap().unwrap();
        assert_eq!(failed.status, ProcessingStatus::Failed);
        assert!(failed.metadata.extra.contains_key("processing_error"));

        // The other four all made it through
        for id in [ids[0], ids[2], ids[3], ids[4]] {
            let doc = repository::get_document(&conn, &id).unwrap().unwrap();
            assert_eq!(doc.status, ProcessingStatus::Processed);
        }
    }

    #[test]
    fn priority_survives_queue_processing() {
        let conn = open_memory_database().unwrap();
        let id = seed_pending(
            &conn,
            "alert.txt",
            "urgent: fire hazard near the substation, immediate evacuation drill",
        );

        let manager = ProcessingQueueManager::new(DepartmentResolver::offline());
        manager.drain_pending(&conn, DEFAULT_DRAIN_BATCH).unwrap();

        let doc = repository::get_document(&conn, &id).unwrap().unwrap();
        assert_eq!(doc.priority, Priority::Urgent);
    }
}
