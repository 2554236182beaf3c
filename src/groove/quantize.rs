// Grid snapping - Quantizes candidate timestamps onto the beat grid
// Events too far from any grid point stay free to preserve syncopation

use serde::{Deserialize, Serialize};

use super::grid::{nearest_grid_point, GridDivision};
use crate::features::BeatGrid;

/// How a candidate ended up at its snapped time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapKind {
    /// Replaced by a grid point of this division
    Aligned(GridDivision),

    /// Kept at its detected time
    Free,
}

/// A candidate after grid snapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnappedEvent {
    /// Detected timestamp before snapping
    pub original_time: f64,

    /// Timestamp after snapping (equal to `original_time` when free)
    pub time: f64,

    pub kind: SnapKind,
}

impl SnappedEvent {
    pub fn is_aligned(&self) -> bool {
        matches!(self.kind, SnapKind::Aligned(_))
    }

    fn free(t: f64) -> Self {
        SnappedEvent {
            original_time: t,
            time: t,
            kind: SnapKind::Free,
        }
    }
}

/// Snap every candidate onto the grid within `tolerance` seconds
///
/// A degenerate grid makes this a pass-through. Output is sorted by snapped
/// time; snapping can move neighbours onto the same point or swap their
/// order around a drifting beat, so the caller must not assume input order.
pub fn snap_candidates(candidates: &[f64], grid: &BeatGrid, tolerance: f64) -> Vec<SnappedEvent> {
    if grid.is_degenerate() {
        if !candidates.is_empty() {
            log::warn!(
                "Degenerate beat grid ({} beats, {} bpm), skipping snapping",
                grid.beats().len(),
                grid.bpm()
            );
        }
        return candidates.iter().map(|&t| SnappedEvent::free(t)).collect();
    }

    let mut snapped: Vec<SnappedEvent> = candidates
        .iter()
        .map(|&t| match nearest_grid_point(grid, t) {
            Some(point) if point.distance <= tolerance => SnappedEvent {
                original_time: t,
                time: point.time,
                kind: SnapKind::Aligned(point.division),
            },
            _ => SnappedEvent::free(t),
        })
        .collect();

    snapped.sort_by(|a, b| a.time.total_cmp(&b.time));

    log::debug!(
        "Snapped {} of {} candidates to the grid",
        snapped.iter().filter(|e| e.is_aligned()).count(),
        snapped.len()
    );

    snapped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_120() -> BeatGrid {
        BeatGrid::new(vec![0.0, 0.5, 1.0, 1.5], 120.0)
    }

    #[test]
    fn test_onsets_snap_to_nearby_beats() {
        let snapped = snap_candidates(&[0.02, 0.52], &grid_120(), 0.04);

        assert_eq!(snapped[0].time, 0.0);
        assert_eq!(snapped[0].original_time, 0.02);
        assert_eq!(snapped[0].kind, SnapKind::Aligned(GridDivision::Quarter));
        assert_eq!(snapped[1].time, 0.5);
    }

    #[test]
    fn test_far_candidates_stay_free() {
        // nearest points are 0.0 and 0.0625, both more than 0.02 away
        let snapped = snap_candidates(&[0.03], &grid_120(), 0.02);
        assert_eq!(snapped[0].kind, SnapKind::Free);
        assert_eq!(snapped[0].time, 0.03);
    }

    #[test]
    fn test_degenerate_grid_is_identity() {
        let grid = BeatGrid::new(vec![0.5], 120.0);
        let candidates = [0.02, 0.52, 0.9];
        let snapped = snap_candidates(&candidates, &grid, 0.04);

        let times: Vec<f64> = snapped.iter().map(|e| e.time).collect();
        assert_eq!(times, candidates.to_vec());
        assert!(snapped.iter().all(|e| e.kind == SnapKind::Free));

        let no_tempo = BeatGrid::new(vec![0.0, 0.5], f64::INFINITY);
        assert!(snap_candidates(&candidates, &no_tempo, 0.04)
            .iter()
            .all(|e| !e.is_aligned()));
    }

    #[test]
    fn test_output_is_sorted_by_snapped_time() {
        // third beat drifts off the 120 bpm grid
        let grid = BeatGrid::new(vec![0.0, 0.5, 1.03], 120.0);
        let snapped = snap_candidates(&[0.99, 1.01], &grid, 0.04);
        assert!(snapped.windows(2).all(|w| w[0].time <= w[1].time));
    }
}
