// State management module
// Beatmap document store and SQLite catalog

pub mod db;
pub mod models;
pub mod queries;
pub mod storage;

pub use db::{init_db, open_db, open_in_memory, DbConnection, DbError};
pub use models::BeatmapRecord;
pub use queries::{create_beatmap, delete_beatmap, get_beatmap, list_beatmaps};
pub use storage::{calculate_sha256, BeatmapStore, StorageError, StoredBeatmap};
