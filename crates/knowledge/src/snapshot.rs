//! SQLite index snapshots.
//!
//! A snapshot holds two tables: `snapshot_meta` (key/value header) and
//! `entries` (one row per document with its vector as a little-endian f32
//! blob). Snapshots are written to a temporary file and renamed into place.

use crate::types::{Document, DocumentMetadata, EmbedderFingerprint, IndexEntry, SnapshotInfo};
use chrono::{DateTime, Utc};
use cropwise_core::{AppError, AppResult};
use rusqlite::{params, Connection, OpenFlags};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Current on-disk format. Bump on any schema change.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE snapshot_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE entries (
    position INTEGER PRIMARY KEY,
    id TEXT NOT NULL,
    content TEXT NOT NULL,
    topic TEXT NOT NULL,
    source TEXT NOT NULL,
    url TEXT NOT NULL,
    embedding BLOB NOT NULL
);
"#;

fn sqlite_err(context: &str, e: rusqlite::Error) -> AppError {
    AppError::Knowledge(format!("{}: {}", context, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `entries` and their header to `path`, replacing any existing file.
pub(crate) fn write_snapshot(
    path: &Path,
    embedder: &EmbedderFingerprint,
    corpus_fingerprint: &str,
    entries: &[IndexEntry],
) -> AppResult<SnapshotInfo> {
    let info = SnapshotInfo {
        format_version: SNAPSHOT_FORMAT_VERSION,
        embedder: embedder.clone(),
        corpus_fingerprint: corpus_fingerprint.to_string(),
        entry_count: entries.len(),
        created_at: Utc::now(),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path);
    if tmp.exists() {
        std::fs::remove_file(&tmp)?;
    }

    {
        let mut conn = Connection::open(&tmp)
            .map_err(|e| sqlite_err("Failed to create snapshot file", e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| sqlite_err("Failed to create snapshot tables", e))?;

        let tx = conn
            .transaction()
            .map_err(|e| sqlite_err("Failed to begin snapshot transaction", e))?;

        let meta = [
            ("format_version", info.format_version.to_string()),
            ("dimensions", info.embedder.dimensions.to_string()),
            ("embedder_provider", info.embedder.provider.clone()),
            ("embedder_model", info.embedder.model.clone()),
            ("corpus_fingerprint", info.corpus_fingerprint.clone()),
            ("entry_count", info.entry_count.to_string()),
            ("created_at", info.created_at.to_rfc3339()),
        ];
        for (key, value) in &meta {
            tx.execute(
                "INSERT INTO snapshot_meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| sqlite_err("Failed to write snapshot header", e))?;
        }

        for (position, entry) in entries.iter().enumerate() {
            let doc = &entry.document;
            tx.execute(
                "INSERT INTO entries (position, id, content, topic, source, url, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    position as i64,
                    doc.id,
                    doc.content,
                    doc.metadata.topic,
                    doc.metadata.source,
                    doc.metadata.url,
                    embedding_to_bytes(&entry.embedding),
                ],
            )
            .map_err(|e| sqlite_err("Failed to write snapshot entry", e))?;
        }

        tx.commit()
            .map_err(|e| sqlite_err("Failed to commit snapshot", e))?;
    }

    std::fs::rename(&tmp, path)?;

    tracing::debug!("Wrote snapshot with {} entries to {:?}", entries.len(), path);
    Ok(info)
}

fn open_read_only(path: &Path) -> AppResult<Connection> {
    if !path.exists() {
        return Err(AppError::Knowledge(format!(
            "No index snapshot at {:?}. Run 'cropwise index build' first.",
            path
        )));
    }

    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| sqlite_err("Failed to open snapshot", e))
}

fn meta_field<'a>(meta: &'a HashMap<String, String>, key: &str) -> AppResult<&'a str> {
    meta.get(key).map(String::as_str).ok_or_else(|| {
        AppError::IncompatibleIndex(format!("Snapshot header is missing '{}'", key))
    })
}

fn meta_number<T: FromStr>(meta: &HashMap<String, String>, key: &str) -> AppResult<T> {
    meta_field(meta, key)?.parse().map_err(|_| {
        AppError::IncompatibleIndex(format!("Snapshot header '{}' is not a valid number", key))
    })
}

fn read_info(conn: &Connection) -> AppResult<SnapshotInfo> {
    let mut stmt = conn
        .prepare("SELECT key, value FROM snapshot_meta")
        .map_err(|_| {
            AppError::IncompatibleIndex("File is not a Cropwise index snapshot".to_string())
        })?;

    let meta: HashMap<String, String> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(|e| sqlite_err("Failed to read snapshot header", e))?
        .collect::<Result<_, _>>()
        .map_err(|e| sqlite_err("Failed to read snapshot header", e))?;

    let format_version: u32 = meta_number(&meta, "format_version")?;
    if format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(AppError::IncompatibleIndex(format!(
            "Snapshot format version {} is not supported (expected {})",
            format_version, SNAPSHOT_FORMAT_VERSION
        )));
    }

    let created_at = DateTime::parse_from_rfc3339(meta_field(&meta, "created_at")?)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::IncompatibleIndex(format!("Invalid snapshot timestamp: {}", e)))?;

    Ok(SnapshotInfo {
        format_version,
        embedder: EmbedderFingerprint {
            provider: meta_field(&meta, "embedder_provider")?.to_string(),
            model: meta_field(&meta, "embedder_model")?.to_string(),
            dimensions: meta_number(&meta, "dimensions")?,
        },
        corpus_fingerprint: meta_field(&meta, "corpus_fingerprint")?.to_string(),
        entry_count: meta_number(&meta, "entry_count")?,
        created_at,
    })
}

/// Read only the snapshot header.
pub fn read_snapshot_info(path: &Path) -> AppResult<SnapshotInfo> {
    let conn = open_read_only(path)?;
    read_info(&conn)
}

/// Read the header and every entry, validating vector lengths.
pub(crate) fn read_snapshot(path: &Path) -> AppResult<(SnapshotInfo, Vec<IndexEntry>)> {
    let conn = open_read_only(path)?;
    let info = read_info(&conn)?;
    let dimensions = info.embedder.dimensions;

    let mut stmt = conn
        .prepare(
            "SELECT id, content, topic, source, url, embedding FROM entries ORDER BY position",
        )
        .map_err(|e| sqlite_err("Failed to prepare snapshot query", e))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                Document {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    metadata: DocumentMetadata {
                        topic: row.get(2)?,
                        source: row.get(3)?,
                        url: row.get(4)?,
                    },
                },
                row.get::<_, Vec<u8>>(5)?,
            ))
        })
        .map_err(|e| sqlite_err("Failed to read snapshot entries", e))?;

    let mut entries = Vec::with_capacity(info.entry_count);
    for row in rows {
        let (document, blob) = row.map_err(|e| sqlite_err("Failed to read snapshot entry", e))?;

        if blob.len() != dimensions * 4 {
            return Err(AppError::IncompatibleIndex(format!(
                "Entry '{}' has a {}-byte vector, expected {} bytes",
                document.id,
                blob.len(),
                dimensions * 4
            )));
        }

        let embedding = bytes_to_embedding(&blob);
        if !embedding.iter().all(|x| x.is_finite()) {
            return Err(AppError::IncompatibleIndex(format!(
                "Entry '{}' has non-finite vector components",
                document.id
            )));
        }

        entries.push(IndexEntry {
            embedding,
            document: Arc::new(document),
        });
    }

    if entries.len() != info.entry_count {
        return Err(AppError::IncompatibleIndex(format!(
            "Snapshot header declares {} entries but {} were found",
            info.entry_count,
            entries.len()
        )));
    }

    Ok((info, entries))
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
