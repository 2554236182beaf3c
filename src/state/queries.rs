// Database CRUD operations
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::db::{DbConnection, DbResult};
use super::models::BeatmapRecord;
use super::storage::StoredBeatmap;
use crate::beatmap::Beatmap;
use crate::config::Difficulty;

const BEATMAP_COLUMNS: &str =
    "id, created_at, source_name, tempo, lanes, event_count, difficulty, path, sha256";

// ==================== BEATMAP QUERIES ====================

/// Catalog a beatmap that was written to the store
pub fn create_beatmap(
    db: &DbConnection,
    source_name: String,
    difficulty: Difficulty,
    beatmap: &Beatmap,
    stored: &StoredBeatmap,
) -> DbResult<BeatmapRecord> {
    let record = BeatmapRecord {
        id: stored.id,
        created_at: Utc::now(),
        source_name,
        tempo: beatmap.tempo(),
        lanes: beatmap.lanes() as i64,
        event_count: beatmap.events().len() as i64,
        difficulty,
        path: stored.path.to_string_lossy().into_owned(),
        sha256: stored.sha256.clone(),
    };

    let conn = db.lock();
    conn.execute(
        "INSERT INTO beatmaps (id, created_at, source_name, tempo, lanes, event_count, difficulty, path, sha256)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.id.to_string(),
            // fixed-width so text order matches time order
            record.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            record.source_name,
            record.tempo,
            record.lanes,
            record.event_count,
            record.difficulty.as_str(),
            record.path,
            record.sha256,
        ],
    )?;

    Ok(record)
}

/// Get a beatmap record by ID
pub fn get_beatmap(db: &DbConnection, id: &Uuid) -> DbResult<Option<BeatmapRecord>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!("SELECT {} FROM beatmaps WHERE id = ?1", BEATMAP_COLUMNS))?;

    match stmt.query_row([id.to_string()], record_from_row) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List all beatmap records, newest first
pub fn list_beatmaps(db: &DbConnection) -> DbResult<Vec<BeatmapRecord>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM beatmaps ORDER BY created_at DESC, rowid DESC",
        BEATMAP_COLUMNS
    ))?;

    let records = stmt
        .query_map([], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Delete a beatmap record; returns whether a row was removed
pub fn delete_beatmap(db: &DbConnection, id: &Uuid) -> DbResult<bool> {
    let conn = db.lock();
    let affected = conn.execute("DELETE FROM beatmaps WHERE id = ?1", params![id.to_string()])?;
    Ok(affected > 0)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<BeatmapRecord> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(1)?;
    let difficulty: String = row.get(6)?;

    Ok(BeatmapRecord {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| conversion_error(1, e))?
            .with_timezone(&Utc),
        source_name: row.get(2)?,
        tempo: row.get(3)?,
        lanes: row.get(4)?,
        event_count: row.get(5)?,
        difficulty: Difficulty::parse(&difficulty).ok_or_else(|| {
            conversion_error(6, format!("unknown difficulty '{}'", difficulty))
        })?,
        path: row.get(7)?,
        sha256: row.get(8)?,
    })
}

fn conversion_error(column: usize, error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, error.into())
}
