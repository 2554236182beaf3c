// File system operations for storing generated beatmaps
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::beatmap::Beatmap;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to get app data directory")]
    NoAppDataDir,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Get the app data directory for Beatlane
pub fn get_app_data_dir() -> StorageResult<PathBuf> {
    let data_dir = dirs::data_dir().ok_or(StorageError::NoAppDataDir)?;
    let app_dir = data_dir.join("com.beatlane.app");
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Location and fingerprint of a stored beatmap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBeatmap {
    pub id: Uuid,
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: u64,
}

/// Beatmap documents under `<root>/beatmaps/<uuid>.json`
#[derive(Debug, Clone)]
pub struct BeatmapStore {
    root: PathBuf,
}

impl BeatmapStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BeatmapStore { root: root.into() }
    }

    /// Store rooted at the platform data directory
    pub fn open_default() -> StorageResult<Self> {
        Ok(BeatmapStore::new(get_app_data_dir()?))
    }

    fn beatmap_dir(&self) -> StorageResult<PathBuf> {
        let dir = self.root.join("beatmaps");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Path a beatmap with `id` is (or would be) stored at
    pub fn path_for(&self, id: &Uuid) -> PathBuf {
        self.root.join("beatmaps").join(format!("{}.json", id))
    }

    /// Write a beatmap under a fresh id
    pub fn save(&self, beatmap: &Beatmap) -> StorageResult<StoredBeatmap> {
        self.save_as(Uuid::new_v4(), beatmap)
    }

    /// Write a beatmap under a caller-assigned id, replacing any previous one
    pub fn save_as(&self, id: Uuid, beatmap: &Beatmap) -> StorageResult<StoredBeatmap> {
        self.beatmap_dir()?;
        let data = beatmap.to_json()?.into_bytes();
        let path = self.path_for(&id);

        let mut file = fs::File::create(&path)?;
        file.write_all(&data)?;

        log::debug!("Stored beatmap {} ({} bytes)", id, data.len());
        Ok(StoredBeatmap {
            id,
            path,
            sha256: calculate_sha256(&data),
            bytes: data.len() as u64,
        })
    }

    pub fn load(&self, id: &Uuid) -> StorageResult<Beatmap> {
        let data = fs::read(self.path_for(id))?;
        Ok(Beatmap::from_json_bytes(&data)?)
    }

    /// Remove a stored beatmap; returns whether a file was deleted
    pub fn delete(&self, id: &Uuid) -> StorageResult<bool> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
