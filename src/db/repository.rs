use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::enums::*;
use crate::models::metadata::DocumentMetadata;
use crate::models::Document;

const DOCUMENT_COLUMNS: &str = "id, title, content, fingerprint, source_channel, origin_identity,
         department, priority, confidence, status, update_count, language, metadata,
         created_at, updated_at";

// ═══════════════════════════════════════════
// Document Repository
// ═══════════════════════════════════════════

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, title, content, fingerprint, source_channel, origin_identity,
         department, priority, confidence, status, update_count, language, metadata,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            doc.id.to_string(),
            doc.title,
            doc.content,
            doc.fingerprint,
            doc.source_channel.as_str(),
            doc.origin_identity,
            doc.department.as_str(),
            doc.priority.as_str(),
            doc.confidence,
            doc.status.as_str(),
            doc.update_count,
            doc.language.as_str(),
            doc.metadata
                .to_json()
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            doc.created_at,
            doc.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_document(conn: &Connection, id: &Uuid) -> Result<Option<Document>, DatabaseError> {
    query_one(
        conn,
        &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
        params![id.to_string()],
    )
}

/// Fast dedup lookup by content fingerprint.
pub fn get_document_by_fingerprint(
    conn: &Connection,
    fingerprint: &str,
) -> Result<Option<Document>, DatabaseError> {
    query_one(
        conn,
        &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE fingerprint = ?1 LIMIT 1"),
        params![fingerprint],
    )
}

/// Secondary dedup lookup: same upstream message re-delivered by the
/// same channel (webhook retries, mail relays).
pub fn get_document_by_origin(
    conn: &Connection,
    channel: SourceChannel,
    origin_identity: &str,
) -> Result<Option<Document>, DatabaseError> {
    query_one(
        conn,
        &format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE source_channel = ?1 AND origin_identity = ?2 LIMIT 1"
        ),
        params![channel.as_str(), origin_identity],
    )
}

/// Documents with the same title but a different fingerprint. Used to
/// flag filename collisions without treating them as duplicates.
pub fn titles_with_other_fingerprint(
    conn: &Connection,
    title: &str,
    fingerprint: &str,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE title = ?1 AND fingerprint != ?2",
        params![title, fingerprint],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

/// Persist the full mutable state of an existing row.
pub fn update_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE documents SET title = ?2, content = ?3, source_channel = ?4,
         origin_identity = ?5, department = ?6, priority = ?7, confidence = ?8,
         status = ?9, update_count = ?10, language = ?11, metadata = ?12, updated_at = ?13
         WHERE id = ?1",
        params![
            doc.id.to_string(),
            doc.title,
            doc.content,
            doc.source_channel.as_str(),
            doc.origin_identity,
            doc.department.as_str(),
            doc.priority.as_str(),
            doc.confidence,
            doc.status.as_str(),
            doc.update_count,
            doc.language.as_str(),
            doc.metadata
                .to_json()
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            doc.updated_at,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "document".into(),
            id: doc.id.to_string(),
        });
    }
    Ok(())
}

pub fn set_document_status(
    conn: &Connection,
    id: &Uuid,
    status: ProcessingStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE documents SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), status.as_str(), Utc::now()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "document".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Oldest pending documents first, bounded by `limit`.
pub fn list_pending_documents(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents
         WHERE status = 'pending' ORDER BY created_at ASC LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit as i64], row_to_document_row)?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(document_from_row(row?)?);
    }
    Ok(docs)
}

pub fn count_documents_by_status(
    conn: &Connection,
    status: ProcessingStatus,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE status = ?1",
        params![status.as_str()],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

pub fn count_documents_by_department(
    conn: &Connection,
    department: Department,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE department = ?1",
        params![department.as_str()],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

// ═══════════════════════════════════════════
// Knowledge Base (classification reference samples)
// ═══════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct KnowledgeEntry {
    pub department: Department,
    pub sample_text: String,
}

pub fn insert_knowledge_entry(
    conn: &Connection,
    entry: &KnowledgeEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO knowledge_entries (department, sample_text) VALUES (?1, ?2)",
        params![entry.department.as_str(), entry.sample_text],
    )?;
    Ok(())
}

/// Built-in routing samples, one or two per department. Used to seed an
/// empty knowledge base so the retrieval tier has something to match
/// against before any operator-curated samples exist.
const DEFAULT_KNOWLEDGE: &[(Department, &str)] = &[
    (
        Department::Engineering,
        "civil work progress report track alignment viaduct pier construction station building structural drawing",
    ),
    (
        Department::RollingStock,
        "train set maintenance bogie overhaul brake pad wear coach door mechanism pantograph inspection spare parts",
    ),
    (
        Department::Electrical,
        "substation transformer trip voltage fluctuation traction power cable fault switchgear earthing test",
    ),
    (
        Department::Signalling,
        "signal failure interlocking telecom cbtc axle counter point machine train control scada alarm",
    ),
    (
        Department::Operations,
        "timetable revision service frequency headway passenger ridership station controller crew roster platform duty",
    ),
    (
        Department::SafetySecurity,
        "accident incident report hazard fire evacuation drill cctv coverage injury near miss investigation",
    ),
    (
        Department::Environment,
        "noise level monitoring waste disposal solar generation water treatment emission compliance tree planting",
    ),
    (
        Department::Finance,
        "invoice payment tender procurement budget sanction audit objection expenditure statement purchase order vendor bill",
    ),
    (
        Department::HumanResources,
        "recruitment notification transfer order promotion list leave application training program staff welfare disciplinary proceeding",
    ),
    (
        Department::Administration,
        "office circular meeting minutes correspondence rti reply policy notification record keeping general administration",
    ),
];

/// Insert the built-in samples if the knowledge base is empty.
pub fn seed_default_knowledge(conn: &Connection) -> Result<usize, DatabaseError> {
    let existing: i64 =
        conn.query_row("SELECT COUNT(*) FROM knowledge_entries", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(0);
    }

    for (department, sample_text) in DEFAULT_KNOWLEDGE {
        insert_knowledge_entry(
            conn,
            &KnowledgeEntry {
                department: *department,
                sample_text: sample_text.to_string(),
            },
        )?;
    }
    Ok(DEFAULT_KNOWLEDGE.len())
}

pub fn list_knowledge_entries(conn: &Connection) -> Result<Vec<KnowledgeEntry>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT department, sample_text FROM knowledge_entries ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (dept, text) = row?;
        entries.push(KnowledgeEntry {
            department: Department::from_str(&dept)?,
            sample_text: text,
        });
    }
    Ok(entries)
}

// Internal row type for Document mapping
struct DocumentRow {
    id: String,
    title: String,
    content: String,
    fingerprint: String,
    source_channel: String,
    origin_identity: Option<String>,
    department: String,
    priority: String,
    confidence: f32,
    status: String,
    update_count: u32,
    language: String,
    metadata: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn row_to_document_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        fingerprint: row.get(3)?,
        source_channel: row.get(4)?,
        origin_identity: row.get(5)?,
        department: row.get(6)?,
        priority: row.get(7)?,
        confidence: row.get(8)?,
        status: row.get(9)?,
        update_count: row.get(10)?,
        language: row.get(11)?,
        metadata: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

fn query_one(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Option<Document>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    match stmt.query_row(params, row_to_document_row) {
        Ok(row) => Ok(Some(document_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn document_from_row(row: DocumentRow) -> Result<Document, DatabaseError> {
    Ok(Document {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        title: row.title,
        content: row.content,
        fingerprint: row.fingerprint,
        source_channel: SourceChannel::from_str(&row.source_channel)?,
        origin_identity: row.origin_identity,
        department: Department::from_str(&row.department)?,
        priority: Priority::from_str(&row.priority)?,
        confidence: row.confidence,
        status: ProcessingStatus::from_str(&row.status)?,
        update_count: row.update_count,
        language: Language::from_str(&row.language)?,
        metadata: DocumentMetadata::from_json(&row.metadata)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn sample_doc(title: &str, fingerprint: &str) -> Document {
        Document::new_pending(
            title,
            "track inspection notes",
            fingerprint,
            SourceChannel::Email,
            Some("msg-001".into()),
        )
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let conn = open_memory_database().unwrap();
        let doc = sample_doc("inspection.txt", "fp-1");
        insert_document(&conn, &doc).unwrap();

        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(loaded.title, "inspection.txt");
        assert_eq!(loaded.fingerprint, "fp-1");
        assert_eq!(loaded.status, ProcessingStatus::Pending);
        assert_eq!(loaded.source_channel, SourceChannel::Email);
        assert_eq!(loaded.origin_identity.as_deref(), Some("msg-001"));
    }

    #[test]
    fn timestamps_roundtrip_through_sqlite() {
        let conn = open_memory_database().unwrap();
        let doc = sample_doc("ts.txt", "fp-ts");
        insert_document(&conn, &doc).unwrap();

        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(loaded.created_at, doc.created_at);
        assert_eq!(loaded.updated_at, doc.updated_at);
    }

    #[test]
    fn lookup_by_fingerprint_and_origin() {
        let conn = open_memory_database().unwrap();
        let doc = sample_doc("a.txt", "fp-2");
        insert_document(&conn, &doc).unwrap();

        assert!(get_document_by_fingerprint(&conn, "fp-2")
            .unwrap()
            .is_some());
        assert!(get_document_by_fingerprint(&conn, "other")
            .unwrap()
            .is_none());

        let by_origin = get_document_by_origin(&conn, SourceChannel::Email, "msg-001").unwrap();
        assert_eq!(by_origin.unwrap().id, doc.id);
        assert!(
            get_document_by_origin(&conn, SourceChannel::Webhook, "msg-001")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn update_persists_routing_and_counters() {
        let conn = open_memory_database().unwrap();
        let mut doc = sample_doc("b.txt", "fp-3");
        insert_document(&conn, &doc).unwrap();

        doc.department = Department::Finance;
        doc.priority = Priority::High;
        doc.confidence = 82.5;
        doc.status = ProcessingStatus::Processed;
        doc.update_count = 2;
        doc.touch();
        update_document(&conn, &doc).unwrap();

        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(loaded.department, Department::Finance);
        assert_eq!(loaded.priority, Priority::High);
        assert_eq!(loaded.update_count, 2);
        assert_eq!(loaded.status, ProcessingStatus::Processed);
    }

    #[test]
    fn update_missing_document_is_not_found() {
        let conn = open_memory_database().unwrap();
        let doc = sample_doc("c.txt", "fp-4");
        let err = update_document(&conn, &doc).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn pending_list_is_oldest_first_and_bounded() {
        let conn = open_memory_database().unwrap();
        for i in 0..5 {
            let mut doc = sample_doc(&format!("doc-{i}.txt"), &format!("fp-list-{i}"));
            doc.origin_identity = Some(format!("msg-list-{i}"));
            doc.created_at = Utc::now() - chrono::Duration::seconds(100 - i);
            insert_document(&conn, &doc).unwrap();
        }

        let pending = list_pending_documents(&conn, 3).unwrap();
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[0].title, "doc-0.txt");
        assert_eq!(pending[2].title, "doc-2.txt");
    }

    #[test]
    fn counts_by_status_and_department() {
        let conn = open_memory_database().unwrap();
        for i in 0..3 {
            let mut doc = sample_doc(&format!("count-{i}.txt"), &format!("fp-count-{i}"));
            doc.origin_identity = Some(format!("msg-count-{i}"));
            if i < 2 {
                doc.department = Department::Finance;
                doc.status = ProcessingStatus::Processed;
            }
            insert_document(&conn, &doc).unwrap();
        }

        assert_eq!(
            count_documents_by_status(&conn, ProcessingStatus::Processed).unwrap(),
            2
        );
        assert_eq!(
            count_documents_by_status(&conn, ProcessingStatus::Pending).unwrap(),
            1
        );
        assert_eq!(
            count_documents_by_department(&conn, Department::Finance).unwrap(),
            2
        );
        assert_eq!(
            count_documents_by_department(&conn, Department::Electrical).unwrap(),
            0
        );
    }

    #[test]
    fn title_collision_count() {
        let conn = open_memory_database().unwrap();
        let mut a = sample_doc("report.pdf", "fp-5");
        a.origin_identity = Some("msg-a".into());
        insert_document(&conn, &a).unwrap();

        assert_eq!(
            titles_with_other_fingerprint(&conn, "report.pdf", "fp-other").unwrap(),
            1
        );
        assert_eq!(
            titles_with_other_fingerprint(&conn, "report.pdf", "fp-5").unwrap(),
            0
        );
    }

    #[test]
    fn knowledge_entries_roundtrip() {
        let conn = open_memory_database().unwrap();
        insert_knowledge_entry(
            &conn,
            &KnowledgeEntry {
                department: Department::Finance,
                sample_text: "invoice payment budget".into(),
            },
        )
        .unwrap();

        let entries = list_knowledge_entries(&conn).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].department, Department::Finance);
    }

    #[test]
    fn seed_populates_empty_knowledge_base_once() {
        let conn = open_memory_database().unwrap();
        let seeded = seed_default_knowledge(&conn).unwrap();
        assert_eq!(seeded, DEFAULT_KNOWLEDGE.len());

        // Second run is a no-op
        assert_eq!(seed_default_knowledge(&conn).unwrap(), 0);

        let entries = list_knowledge_entries(&conn).unwrap();
        assert_eq!(entries.len(), DEFAULT_KNOWLEDGE.len());
    }
}
