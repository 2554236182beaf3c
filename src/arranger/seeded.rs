// Seeded arranger - Probabilistic note generation from an explicit RNG
// Thins the timeline, scatters lanes, and sprinkles holds per difficulty

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::lanes::LaneAssigner;
use crate::config::Difficulty;
use crate::events::{round_to, ClassifiedEvent, NoteKind, PlacedEvent};

/// Minimum spacing between kept notes, and between two uses of one lane
pub const MIN_NOTE_INTERVAL: f64 = 0.1;

/// Shortest random hold in seconds
pub const MIN_HOLD_SECONDS: f64 = 0.5;

/// Upper bound (exclusive) of a random hold in seconds
pub const MAX_HOLD_SECONDS: f64 = 2.0;

/// Probabilistic arranger driven by a caller-supplied RNG
///
/// Every random decision draws from `rng`, so the same seed over the same
/// timeline always yields the same notes.
pub struct SeededArranger<R: Rng> {
    rng: R,
    keep_probability: f64,
    hold_ratio: f64,
}

impl SeededArranger<ChaCha8Rng> {
    /// ChaCha8 arranger using the difficulty's keep probability and hold ratio
    pub fn from_seed(seed: u64, difficulty: Difficulty) -> Self {
        SeededArranger::new(
            ChaCha8Rng::seed_from_u64(seed),
            difficulty.keep_probability(),
            difficulty.hold_ratio(),
        )
    }
}

impl<R: Rng> SeededArranger<R> {
    pub fn new(rng: R, keep_probability: f64, hold_ratio: f64) -> Self {
        SeededArranger {
            rng,
            keep_probability: keep_probability.clamp(0.0, 1.0),
            hold_ratio: hold_ratio.clamp(0.0, 1.0),
        }
    }

    /// Keep each event with the keep probability, never closer than
    /// `MIN_NOTE_INTERVAL` to the previously kept one
    pub fn thin(&mut self, times: &[f64]) -> Vec<f64> {
        let mut kept: Vec<f64> = Vec::with_capacity(times.len());

        for &t in times {
            if !self.rng.gen_bool(self.keep_probability) {
                continue;
            }
            if let Some(&last) = kept.last() {
                if t - last < MIN_NOTE_INTERVAL {
                    continue;
                }
            }
            kept.push(t);
        }

        log::debug!("Seeded thinning kept {} of {} events", kept.len(), times.len());
        kept
    }

    /// Place classified events on random free lanes
    ///
    /// A lane is free once `MIN_NOTE_INTERVAL` has passed since its last note
    /// ended (holds occupy their lane for their duration). When no lane is
    /// free the deterministic assigner's lane is used. The assigner runs for
    /// every event so its bucket counters advance exactly as in curated mode.
    pub fn arrange(&mut self, events: &[ClassifiedEvent], assigner: &mut LaneAssigner<'_>) -> Vec<PlacedEvent> {
        let lanes = assigner.layout().lanes;
        let mut busy_until: Vec<Option<f64>> = vec![None; lanes];
        let mut placed = Vec::with_capacity(events.len());

        for (index, event) in events.iter().enumerate() {
            let fallback = assigner.lane_for(index, event);

            let free: Vec<usize> = (0..lanes)
                .filter(|&lane| match busy_until[lane] {
                    Some(end) => event.time - end >= MIN_NOTE_INTERVAL,
                    None => true,
                })
                .collect();
            let lane = if free.is_empty() {
                fallback
            } else {
                free[self.rng.gen_range(0..free.len())]
            };

            let kind = match event.kind {
                NoteKind::Normal if self.rng.gen_bool(self.hold_ratio) => NoteKind::Hold {
                    duration: round_to(self.rng.gen_range(MIN_HOLD_SECONDS..MAX_HOLD_SECONDS), 3),
                },
                kind => kind,
            };

            busy_until[lane] = Some(event.time + kind.duration());
            placed.push(PlacedEvent {
                time: event.time,
                kind,
                lane,
            });
        }

        placed
    }
}
