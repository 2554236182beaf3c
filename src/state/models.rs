// Data models for the beatmap catalog
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Difficulty;

/// One catalogued beatmap document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatmapRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,

    /// Input the beatmap was generated from (usually a file name)
    pub source_name: String,

    pub tempo: f64,
    pub lanes: i64,
    pub event_count: i64,
    pub difficulty: Difficulty,

    /// Location of the stored JSON document
    pub path: String,
    pub sha256: String,
}
