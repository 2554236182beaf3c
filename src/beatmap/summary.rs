// Beatmap summary statistics
// Note counts and a 0-10 difficulty rating for a finished beatmap

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::assemble::Beatmap;
use crate::events::NoteKind;

/// Read-only statistics over a beatmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatmapSummary {
    pub note_count: usize,
    pub strong_count: usize,
    pub normal_count: usize,
    pub hold_count: usize,

    /// Notes per lane, indexed by lane
    pub lane_counts: Vec<usize>,

    /// Seconds between the first and last note
    pub span_seconds: f64,

    /// Notes per second over the span (span taken as 1 s below two notes)
    pub notes_per_second: f64,

    /// Difficulty estimate in [0, 10]
    pub difficulty_rating: f64,
}

impl BeatmapSummary {
    pub fn from_beatmap(beatmap: &Beatmap) -> Self {
        let events = beatmap.events();
        let mut lane_counts = vec![0; beatmap.lanes()];
        let (mut strong_count, mut normal_count, mut hold_count) = (0, 0, 0);

        for event in events {
            match event.kind {
                NoteKind::Strong => strong_count += 1,
                NoteKind::Normal => normal_count += 1,
                NoteKind::Hold { .. } => hold_count += 1,
            }
            if let Some(count) = lane_counts.get_mut(event.lane) {
                *count += 1;
            }
        }

        let span_seconds = match (events.first(), events.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        };
        let rating_span = if events.len() > 1 && span_seconds > 0.0 { span_seconds } else { 1.0 };
        let notes_per_second = events.len() as f64 / rating_span;

        let difficulty_rating = if events.is_empty() {
            0.0
        } else {
            let type_complexity = hold_count as f64 / events.len() as f64;
            let simultaneity = (largest_simultaneous_group(beatmap) as f64 / 4.0).min(1.0);
            let score = notes_per_second * 0.4 + type_complexity * 0.3 + simultaneity * 0.3;
            (score * 10.0).min(10.0)
        };

        BeatmapSummary {
            note_count: events.len(),
            strong_count,
            normal_count,
            hold_count,
            lane_counts,
            span_seconds,
            notes_per_second,
            difficulty_rating,
        }
    }
}

/// Largest number of notes sharing a time at centisecond resolution
fn largest_simultaneous_group(beatmap: &Beatmap) -> usize {
    let mut groups: BTreeMap<i64, usize> = BTreeMap::new();
    for event in beatmap.events() {
        *groups.entry((event.time * 100.0).round() as i64).or_insert(0) += 1;
    }
    groups.values().copied().max().unwrap_or(0)
}
