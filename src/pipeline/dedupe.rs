use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use crate::db::{repository, DatabaseError};
use crate::models::SourceChannel;

/// Compute the hex SHA-256 fingerprint of extracted content.
/// Content is trimmed first so trailing-whitespace variants of the same
/// message collapse to one fingerprint.
pub fn compute_fingerprint(content: &str) -> String {
    let hash = Sha256::digest(content.trim().as_bytes());
    hex_encode(&hash)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// How an existing row was matched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchKind {
    /// Identical content bytes, regardless of channel or filename.
    Fingerprint,
    /// Same upstream message id on the same channel (delivery retry).
    Origin,
}

/// Duplicate detection result
#[derive(Debug, Clone)]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    pub existing_document_id: Option<Uuid>,
    pub match_kind: Option<MatchKind>,
    pub fingerprint: String,
    /// Another document already carries this title with different
    /// content. Informational only; never blocks intake.
    pub filename_collision: bool,
}

/// Check whether this content has been seen before. Fingerprint match is
/// checked first (cheapest and strongest), then the channel-level origin
/// identity for redelivered messages.
pub fn check_duplicate(
    conn: &Connection,
    title: &str,
    content: &str,
    channel: SourceChannel,
    origin_identity: Option<&str>,
) -> Result<DuplicateCheck, DatabaseError> {
    let fingerprint = compute_fingerprint(content);

    let filename_collision =
        repository::titles_with_other_fingerprint(conn, title, &fingerprint)? > 0;
    if filename_collision {
        warn!(title, "same title already registered with different content");
    }

    if let Some(existing) = repository::get_document_by_fingerprint(conn, &fingerprint)? {
        return Ok(DuplicateCheck {
            is_duplicate: true,
            existing_document_id: Some(existing.id),
            match_kind: Some(MatchKind::Fingerprint),
            fingerprint,
            filename_collision,
        });
    }

    if let Some(origin) = origin_identity {
        if let Some(existing) = repository::get_document_by_origin(conn, channel, origin)? {
            return Ok(DuplicateCheck {
                is_duplicate: true,
                existing_document_id: Some(existing.id),
                match_kind: Some(MatchKind::Origin),
                fingerprint,
                filename_collision,
            });
        }
    }

    Ok(DuplicateCheck {
        is_duplicate: false,
        existing_document_id: None,
        match_kind: None,
        fingerprint,
        filename_collision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::Document;

    #[test]
    fn fingerprint_is_deterministic_and_hex() {
        let a = compute_fingerprint("track fault at Aluva");
        let b = compute_fingerprint("track fault at Aluva");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_ignores_surrounding_whitespace() {
        assert_eq!(
            compute_fingerprint("  report body \n"),
            compute_fingerprint("report body")
        );
    }

    #[test]
    fn different_content_different_fingerprint() {
        assert_ne!(compute_fingerprint("alpha"), compute_fingerprint("beta"));
    }

    #[test]
    fn fresh_content_is_not_duplicate() {
        let conn = open_memory_database().unwrap();
        let check = check_duplicate(
            &conn,
            "new.txt",
            "unseen content",
            SourceChannel::Upload,
            None,
        )
        .unwrap();
        assert!(!check.is_duplicate);
        assert!(check.existing_document_id.is_none());
        assert!(!check.filename_collision);
    }

    #[test]
    fn fingerprint_match_detected_across_channels() {
        let conn = open_memory_database().unwrap();
        let content = "monthly safety audit findings";
        let doc = Document::new_pending(
            "audit.txt",
            content,
            compute_fingerprint(content),
            SourceChannel::Email,
            Some("msg-9".into()),
        );
        repository::insert_document(&conn, &doc).unwrap();

        // Same bytes arriving on a different channel still dedupe
        let check = check_duplicate(&conn, "audit.txt", content, SourceChannel::Webhook, None)
            .unwrap();
        assert!(check.is_duplicate);
        assert_eq!(check.match_kind, Some(MatchKind::Fingerprint));
        assert_eq!(check.existing_document_id, Some(doc.id));
    }

    #[test]
    fn origin_match_detected_for_redelivery() {
        let conn = open_memory_database().unwrap();
        let doc = Document::new_pending(
            "note.txt",
            "original body",
            compute_fingerprint("original body"),
            SourceChannel::Webhook,
            Some("delivery-42".into()),
        );
        repository::insert_document(&conn, &doc).unwrap();

        // Redelivered message with edited body: origin identity still matches
        let check = check_duplicate(
            &conn,
            "note.txt",
            "edited body",
            SourceChannel::Webhook,
            Some("delivery-42"),
        )
        .unwrap();
        assert!(check.is_duplicate);
        assert_eq!(check.match_kind, Some(MatchKind::Origin));
    }

    #[test]
    fn same_title_different_content_flags_collision_only() {
        let conn = open_memory_database().unwrap();
        let doc = Document::new_pending(
            "report.pdf",
            "version one",
            compute_fingerprint("version one"),
            SourceChannel::Upload,
            None,
        );
        repository::insert_document(&conn, &doc).unwrap();

        let check = check_duplicate(
            &conn,
            "report.pdf",
            "version two",
            SourceChannel::Upload,
            None,
        )
        .unwrap();
        assert!(!check.is_duplicate);
        assert!(check.filename_collision);
    }
}
