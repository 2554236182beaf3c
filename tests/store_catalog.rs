// Store and catalog round trip against a temporary data directory

use beatlane::state::{self, BeatmapStore};
use beatlane::{Difficulty, FeatureInput, Pipeline, PipelineConfig};
use tempfile::TempDir;

fn small_track() -> FeatureInput {
    FeatureInput {
        envelope: vec![0.2, 0.8, 0.4, 0.9, 0.3, 0.7, 0.5, 0.6],
        frame_hop_seconds: 0.5,
        beat_times: vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5],
        onset_times: vec![0.26, 1.24, 2.76],
        peak_times: vec![1.5],
        brightness: vec![0.1, 0.5, 0.9, 0.3],
        brightness_hop_seconds: Some(1.0),
        tempo_bpm: 120.0,
        duration_seconds: Some(4.0),
        sample_count: Some(4 * 44_100),
    }
}

#[test]
fn test_store_and_catalog_round_trip() {
    let dir = TempDir::new().unwrap();
    let beatmap = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run_input(&small_track())
        .unwrap();
    assert!(!beatmap.is_empty());

    let store = BeatmapStore::new(dir.path());
    let db = state::open_db(&dir.path().join("beatlane.db")).unwrap();

    let stored = store.save(&beatmap).unwrap();
    let bytes = std::fs::read(&stored.path).unwrap();
    assert_eq!(state::calculate_sha256(&bytes), stored.sha256);
    assert_eq!(bytes.len() as u64, stored.bytes);

    let record =
        state::create_beatmap(&db, "song.json".to_string(), Difficulty::Normal, &beatmap, &stored)
            .unwrap();
    assert_eq!(record.event_count as usize, beatmap.events().len());
    assert_eq!(record.lanes, 4);

    let fetched = state::get_beatmap(&db, &stored.id).unwrap().unwrap();
    assert_eq!(fetched.id, stored.id);
    assert_eq!(fetched.source_name, "song.json");
    assert_eq!(fetched.difficulty, Difficulty::Normal);
    assert_eq!(fetched.sha256, stored.sha256);

    let loaded = store.load(&stored.id).unwrap();
    assert_eq!(loaded, beatmap);

    assert!(state::delete_beatmap(&db, &stored.id).unwrap());
    assert!(store.delete(&stored.id).unwrap());
    assert!(state::get_beatmap(&db, &stored.id).unwrap().is_none());
    assert!(state::list_beatmaps(&db).unwrap().is_empty());
}

#[test]
fn test_catalog_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("beatlane.db");
    let beatmap = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run_input(&small_track())
        .unwrap();
    let store = BeatmapStore::new(dir.path());

    let first = {
        let db = state::open_db(&db_path).unwrap();
        let stored = store.save(&beatmap).unwrap();
        state::create_beatmap(&db, "a.json".to_string(), Difficulty::Easy, &beatmap, &stored).unwrap()
    };
    let second = {
        let db = state::open_db(&db_path).unwrap();
        let stored = store.save(&beatmap).unwrap();
        state::create_beatmap(&db, "b.json".to_string(), Difficulty::Hard, &beatmap, &stored).unwrap()
    };

    let db = state::open_db(&db_path).unwrap();
    let ids: Vec<_> = state::list_beatmaps(&db).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}
