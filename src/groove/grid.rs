// Musical Grid - Beat subdivisions used for snapping
// Finds the closest subdivision point of the tracked beat grid

use serde::{Deserialize, Serialize};

use crate::features::BeatGrid;

/// Grid division - defines the resolution of one snapping candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridDivision {
    /// Quarter notes (1 per beat)
    Quarter,

    /// Eighth notes (2 per beat)
    Eighth,

    /// Sixteenth notes (4 per beat)
    Sixteenth,

    /// Thirty-second notes (8 per beat)
    ThirtySecond,
}

/// Divisions tried when snapping, coarsest first
///
/// Order matters: a finer division only wins on a strictly smaller distance.
pub const SNAP_DIVISIONS: [GridDivision; 4] = [
    GridDivision::Quarter,
    GridDivision::Eighth,
    GridDivision::Sixteenth,
    GridDivision::ThirtySecond,
];

impl GridDivision {
    /// Get number of subdivisions per beat
    pub fn subdivisions_per_beat(&self) -> u32 {
        match self {
            GridDivision::Quarter => 1,
            GridDivision::Eighth => 2,
            GridDivision::Sixteenth => 4,
            GridDivision::ThirtySecond => 8,
        }
    }
}

/// Closest grid point for a timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    /// Grid-aligned time in seconds
    pub time: f64,

    /// Division that produced the point
    pub division: GridDivision,

    /// |time - original| in seconds
    pub distance: f64,
}

/// Find the closest subdivision point to `t`
///
/// The grid is anchored on the latest beat at or before `t` (the first beat
/// when none precedes it) and extends with the tempo's beat duration, so
/// drifting beat trackers re-anchor on every beat. Points before zero are
/// never proposed. Returns `None` for a degenerate grid.
pub fn nearest_grid_point(grid: &BeatGrid, t: f64) -> Option<GridPoint> {
    let beat_duration = grid.beat_duration()?;
    let base = grid.base_beat(t)?;

    let mut best: Option<GridPoint> = None;
    for division in SNAP_DIVISIONS {
        let step = beat_duration / division.subdivisions_per_beat() as f64;
        let time = base + ((t - base) / step).round() * step;
        if time < 0.0 {
            continue;
        }

        let distance = (time - t).abs();
        let closer = match best {
            Some(ref current) => distance < current.distance,
            None => true,
        };
        if closer {
            best = Some(GridPoint {
                time,
                division,
                distance,
            });
        }
    }

    best
}
