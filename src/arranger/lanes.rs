// Lane assignment - Maps classified events to playfield lanes
// Strong events alternate a fixed pair; the rest follow spectral brightness

use serde::{Deserialize, Serialize};

use crate::events::{ClassifiedEvent, PlacedEvent};
use crate::features::BrightnessCurve;

/// Number of equal-width brightness ranges over [0, 1]
pub const BRIGHTNESS_BUCKETS: usize = 4;

/// Fixed lane tables for a playfield width
///
/// The lower half of the playfield takes dark content and the upper half
/// bright content; the two middle lanes take strong events. With four lanes
/// that is `low = [0, 1]`, `high = [2, 3]`, `strong = [1, 2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneLayout {
    pub lanes: usize,

    /// Strong lane for even / odd sequence positions
    pub strong: [usize; 2],

    /// Alternation table per brightness bucket, darkest first
    pub buckets: [[usize; 2]; BRIGHTNESS_BUCKETS],
}

impl LaneLayout {
    /// Layout for `lanes` lanes; a single lane collapses everything onto 0
    pub fn for_lanes(lanes: usize) -> Self {
        if lanes <= 1 {
            return LaneLayout {
                lanes: 1,
                strong: [0, 0],
                buckets: [[0, 0]; BRIGHTNESS_BUCKETS],
            };
        }

        let half = lanes / 2;
        let low = [0, 1.min(half - 1)];
        let high = [(lanes - 2).max(half), lanes - 1];

        LaneLayout {
            lanes,
            strong: [half - 1, half],
            buckets: [
                [low[0], low[1]],
                [low[1], low[0]],
                [high[0], high[1]],
                [high[1], high[0]],
            ],
        }
    }
}

/// Per-bucket round-robin counters, owned by one assigner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketCounters {
    counts: [usize; BRIGHTNESS_BUCKETS],
}

impl BucketCounters {
    /// Current count for `bucket`, then advance it
    pub fn next(&mut self, bucket: usize) -> usize {
        let count = self.counts[bucket];
        self.counts[bucket] += 1;
        count
    }

    pub fn get(&self, bucket: usize) -> usize {
        self.counts[bucket]
    }
}

/// Bucket index for a brightness sample
///
/// The square root spreads the typically bottom-heavy centroid distribution
/// before splitting [0, 1] into equal ranges.
pub fn brightness_bucket(brightness: f64) -> usize {
    let compressed = brightness.clamp(0.0, 1.0).sqrt();
    ((compressed * BRIGHTNESS_BUCKETS as f64).floor() as usize).min(BRIGHTNESS_BUCKETS - 1)
}

/// Deterministic lane assigner for one pipeline invocation
pub struct LaneAssigner<'a> {
    layout: LaneLayout,
    brightness: &'a BrightnessCurve,
    counters: BucketCounters,
}

impl<'a> LaneAssigner<'a> {
    pub fn new(lanes: usize, brightness: &'a BrightnessCurve) -> Self {
        LaneAssigner {
            layout: LaneLayout::for_lanes(lanes),
            brightness,
            counters: BucketCounters::default(),
        }
    }

    pub fn layout(&self) -> &LaneLayout {
        &self.layout
    }

    pub fn counters(&self) -> &BucketCounters {
        &self.counters
    }

    /// Lane for the event at position `index` in the surviving sequence
    pub fn lane_for(&mut self, index: usize, event: &ClassifiedEvent) -> usize {
        if event.kind.is_strong() {
            return self.layout.strong[index % 2];
        }

        let bucket = brightness_bucket(self.brightness.sample(event.time));
        let table = &self.layout.buckets[bucket];
        table[self.counters.next(bucket) % table.len()]
    }

    /// Assign lanes to a whole classified sequence
    pub fn arrange(&mut self, events: &[ClassifiedEvent]) -> Vec<PlacedEvent> {
        events
            .iter()
            .enumerate()
            .map(|(index, event)| PlacedEvent {
                time: event.time,
                kind: event.kind,
                lane: self.lane_for(index, event),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoteKind;
    use crate::features::FrameCurve;

    fn event(time: f64, kind: NoteKind) -> ClassifiedEvent {
        ClassifiedEvent {
            time,
            strength: 0.5,
            is_beat: kind.is_strong(),
            kind,
        }
    }

    #[test]
    fn test_four_lane_layout() {
        let layout = LaneLayout::for_lanes(4);
        assert_eq!(layout.strong, [1, 2]);
        assert_eq!(layout.buckets, [[0, 1], [1, 0], [2, 3], [3, 2]]);
    }

    #[test]
    fn test_layouts_stay_in_range() {
        for lanes in 1..=16 {
            let layout = LaneLayout::for_lanes(lanes);
            let all = layout.strong.iter().chain(layout.buckets.iter().flatten());
            for &lane in all {
                assert!(lane < lanes, "lane {} out of range for {}", lane, lanes);
            }
        }
    }

    #[test]
    fn test_low_and_high_buckets_never_share_lanes() {
        for lanes in 4..=16 {
            let layout = LaneLayout::for_lanes(lanes);
            for low in layout.buckets[0] {
                assert!(!layout.buckets[2].contains(&low));
            }
        }
    }

    #[test]
    fn test_brightness_buckets() {
        assert_eq!(brightness_bucket(0.0), 0);
        // sqrt(0.05) ~ 0.22
        assert_eq!(brightness_bucket(0.05), 0);
        // sqrt(0.1) ~ 0.32
        assert_eq!(brightness_bucket(0.1), 1);
        assert_eq!(brightness_bucket(0.25), 2);
        assert_eq!(brightness_bucket(0.7), 3);
        assert_eq!(brightness_bucket(1.0), 3);
        assert_eq!(brightness_bucket(4.0), 3);
    }

    #[test]
    fn test_strong_lanes_alternate_by_sequence_parity() {
        let brightness = FrameCurve::new(vec![0.0], 0.1);
        let mut assigner = LaneAssigner::new(4, &brightness);

        let events = vec![
            event(0.0, NoteKind::Strong),
            event(0.5, NoteKind::Normal),
            event(1.0, NoteKind::Strong),
            event(1.5, NoteKind::Strong),
        ];
        let lanes: Vec<usize> = assigner.arrange(&events).iter().map(|e| e.lane).collect();
        assert_eq!(lanes, vec![1, 0, 1, 2]);
    }

    #[test]
    fn test_buckets_keep_independent_counters() {
        // dark first second, bright second second
        let brightness = FrameCurve::new(vec![0.0, 0.0, 1.0, 1.0], 0.5);
        let mut assigner = LaneAssigner::new(4, &brightness);

        let events = vec![
            event(0.1, NoteKind::Normal),
            event(1.2, NoteKind::Normal),
            event(0.3, NoteKind::Normal),
            event(1.4, NoteKind::Hold { duration: 0.6 }),
            event(0.4, NoteKind::Normal),
        ];
        let lanes: Vec<usize> = assigner.arrange(&events).iter().map(|e| e.lane).collect();
        assert_eq!(lanes, vec![0, 3, 1, 2, 0]);
        assert_eq!(assigner.counters().get(0), 3);
        assert_eq!(assigner.counters().get(3), 2);
    }

    #[test]
    fn test_single_lane() {
        let brightness = FrameCurve::new(vec![0.9], 0.1);
        let mut assigner = LaneAssigner::new(1, &brightness);
        let events = vec![event(0.0, NoteKind::Strong), event(0.5, NoteKind::Normal)];
        assert!(assigner.arrange(&events).iter().all(|e| e.lane == 0));
    }
}
