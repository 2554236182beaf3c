// Adaptive density governing
// Bounds events per time window, allowing more events where the track is loud

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::Envelope;

/// Guards `floor` against products like 9.999999999 that should be 10
const BUDGET_EPSILON: f64 = 1e-9;

/// Per-window accounting from one governor pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityWindow {
    /// Position of the window on the timeline, `start / window_seconds`
    pub index: u64,
    pub start: f64,
    pub end: f64,

    /// Envelope sampled at the window midpoint
    pub energy: f64,

    /// `energy` normalized across all windows to [0, 1]
    pub normalized_energy: f64,

    /// Budget multiplier in [1, max_factor]
    pub multiplier: f64,

    pub budget: usize,

    /// Events that fell into the window before governing
    pub offered: usize,

    /// Events kept after governing
    pub kept: usize,
}

/// Result of governing a timeline
#[derive(Debug, Clone, Default)]
pub struct GovernedTimeline {
    pub times: Vec<f64>,

    /// Accounting for the windows that received events, in timeline order
    pub windows: Vec<DensityWindow>,

    /// Windows tiling the timeline, occupied or not
    pub window_count: u64,
}

/// Smallest and largest midpoint energy over a set of windows
#[derive(Debug, Clone, Copy)]
struct EnergyRange {
    min: f64,
    max: f64,
}

impl EnergyRange {
    fn normalize(&self, energy: f64) -> f64 {
        let range = self.max - self.min;
        if range > f64::EPSILON {
            (energy - self.min) / range
        } else {
            0.0
        }
    }
}

/// Energy-scaled event budget over fixed half-open windows
#[derive(Debug, Clone)]
pub struct DensityGovernor {
    window_seconds: f64,
    target_density: f64,
    max_factor: f64,
}

impl DensityGovernor {
    pub fn new(window_seconds: f64, target_density: f64, max_factor: f64) -> Self {
        DensityGovernor {
            window_seconds,
            target_density,
            max_factor,
        }
    }

    /// Budget of the loudest possible window
    pub fn max_events_per_window(&self) -> usize {
        self.budget_for(self.max_factor)
    }

    fn budget_for(&self, multiplier: f64) -> usize {
        (self.window_seconds * self.target_density * multiplier + BUDGET_EPSILON).floor() as usize
    }

    /// Window holding `t`; saturates for timestamps far past any real track
    fn window_index(&self, t: f64) -> u64 {
        (t / self.window_seconds).floor() as u64
    }

    fn midpoint(&self, index: u64) -> f64 {
        (index as f64 + 0.5) * self.window_seconds
    }

    /// Govern an ascending timeline
    ///
    /// Windows tile `[0, max(duration, last event))`. Each window's budget is
    /// `floor(window * density * multiplier)` where the multiplier grows
    /// linearly from 1 (quietest window) to `max_factor` (loudest). A window
    /// over budget keeps evenly spaced events across its whole span rather
    /// than its first or last ones. A track with uniform energy uses the
    /// base budget everywhere.
    ///
    /// Only windows that received events are materialized, so a stray
    /// timestamp far past the end of the track costs one window, not millions.
    pub fn govern(&self, times: &[f64], envelope: &Envelope, duration_seconds: f64) -> GovernedTimeline {
        let window_count = self.window_count(times, duration_seconds);
        if window_count == 0 {
            return GovernedTimeline::default();
        }

        let mut buckets: BTreeMap<u64, Vec<f64>> = BTreeMap::new();
        for &t in times {
            let index = self.window_index(t).min(window_count - 1);
            buckets.entry(index).or_default().push(t);
        }

        let energy_range = self.energy_range(envelope, window_count);
        let mut governed = GovernedTimeline {
            times: Vec::with_capacity(times.len()),
            windows: Vec::with_capacity(buckets.len()),
            window_count,
        };

        for (index, bucket) in buckets {
            let energy = envelope.sample(self.midpoint(index));
            let normalized_energy = energy_range.normalize(energy);
            let multiplier = 1.0 + normalized_energy * (self.max_factor - 1.0);
            let budget = self.budget_for(multiplier);

            let offered = bucket.len();
            let kept = spread_subsample(&bucket, budget);
            if kept.len() < offered {
                log::debug!(
                    "Window {} over budget: kept {} of {} (multiplier {:.2})",
                    index,
                    kept.len(),
                    offered,
                    multiplier
                );
            }

            governed.windows.push(DensityWindow {
                index,
                start: index as f64 * self.window_seconds,
                end: (index as f64 + 1.0) * self.window_seconds,
                energy,
                normalized_energy,
                multiplier,
                budget,
                offered,
                kept: kept.len(),
            });
            governed.times.extend(kept);
        }

        governed
    }

    fn window_count(&self, times: &[f64], duration_seconds: f64) -> u64 {
        let by_duration = if duration_seconds > 0.0 {
            (duration_seconds / self.window_seconds).ceil() as u64
        } else {
            0
        };
        let by_events = times
            .last()
            .map(|&t| self.window_index(t).saturating_add(1))
            .unwrap_or(0);
        by_duration.max(by_events)
    }

    /// Midpoint energy range over all `window_count` windows
    ///
    /// Midpoints past the envelope's last frame all sample the last value, so
    /// only windows up to the end of the envelope are visited.
    fn energy_range(&self, envelope: &Envelope, window_count: u64) -> EnergyRange {
        let mut range = EnergyRange {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        };
        let mut include = |energy: f64| {
            range.min = range.min.min(energy);
            range.max = range.max.max(energy);
        };

        let envelope_end = envelope.duration_seconds();
        let mut index = 0;
        while index < window_count && self.midpoint(index) < envelope_end {
            include(envelope.sample(self.midpoint(index)));
            index += 1;
        }
        if index < window_count {
            include(envelope.sample(self.midpoint(window_count - 1)));
        }

        range
    }
}

/// Keep `budget` items at evenly spaced positions across the slice
fn spread_subsample(items: &[f64], budget: usize) -> Vec<f64> {
    let n = items.len();
    if n <= budget {
        return items.to_vec();
    }

    (0..budget)
        .map(|i| {
            let index = ((i as f64 + 0.5) * n as f64 / budget as f64).floor() as usize;
            items[index.min(n - 1)]
        })
        .collect()
}
