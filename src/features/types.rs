// Feature value types
// Frame-indexed curves and the beat grid consumed by the placement pipeline

use serde::{Deserialize, Serialize};

/// A frame-indexed curve with a uniform frame -> seconds mapping
///
/// Frame `i` sits at `i * hop_seconds`. Values are clamped to [0, 1] by the
/// adapter; `hop_seconds` is strictly positive whenever `values` is
/// non-empty, which keeps the mapping strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameCurve {
    values: Vec<f64>,
    hop_seconds: f64,
}

impl FrameCurve {
    pub(crate) fn new(values: Vec<f64>, hop_seconds: f64) -> Self {
        FrameCurve { values, hop_seconds }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn hop_seconds(&self) -> f64 {
        self.hop_seconds
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Seconds covered by the curve (frame count times hop)
    pub fn duration_seconds(&self) -> f64 {
        self.values.len() as f64 * self.hop_seconds
    }

    /// Linear interpolation at `t`, clamped to the first/last frame outside
    /// the curve's domain. An empty curve samples as 0.
    pub fn sample(&self, t: f64) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return 0.0;
        }
        if n == 1 || t <= 0.0 {
            return self.values[0];
        }

        let position = t / self.hop_seconds;
        let last = (n - 1) as f64;
        if position >= last {
            return self.values[n - 1];
        }

        let lower = position.floor() as usize;
        let frac = position - lower as f64;
        let a = self.values[lower];
        let b = self.values[lower + 1];
        a + (b - a) * frac
    }

    /// Percentile over all frames with linear interpolation between ranks
    /// (`p` in [0, 100]). An empty curve yields 0.
    pub fn percentile(&self, p: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }

        let mut sorted = self.values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = rank.ceil() as usize;
        let frac = rank - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

/// Per-frame energy/onset strength over the whole track
pub type Envelope = FrameCurve;

/// Per-frame normalized spectral brightness (centroid)
pub type BrightnessCurve = FrameCurve;

/// Beat timestamps plus the estimated tempo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatGrid {
    /// Strictly increasing beat times in seconds
    beats: Vec<f64>,

    /// Beats per minute as reported upstream (may be non-positive)
    bpm: f64,
}

impl BeatGrid {
    pub(crate) fn new(beats: Vec<f64>, bpm: f64) -> Self {
        BeatGrid { beats, bpm }
    }

    pub fn beats(&self) -> &[f64] {
        &self.beats
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// A grid needs at least two beats and a finite, positive tempo
    pub fn is_degenerate(&self) -> bool {
        self.beats.len() < 2 || !self.bpm.is_finite() || self.bpm <= 0.0
    }

    /// Seconds per beat, `None` for a degenerate grid
    pub fn beat_duration(&self) -> Option<f64> {
        if self.is_degenerate() {
            None
        } else {
            Some(60.0 / self.bpm)
        }
    }

    /// Latest beat at or before `t`, or the first beat when none precedes it
    pub fn base_beat(&self, t: f64) -> Option<f64> {
        let first = *self.beats.first()?;
        let idx = self.beats.partition_point(|&b| b <= t);
        if idx == 0 {
            Some(first)
        } else {
            Some(self.beats[idx - 1])
        }
    }

    /// Whether some beat lies strictly closer than `tolerance` to `t`
    pub fn has_beat_near(&self, t: f64, tolerance: f64) -> bool {
        let idx = self.beats.partition_point(|&b| b < t);
        let after = self.beats.get(idx).map(|&b| (b - t).abs());
        let before = idx
            .checked_sub(1)
            .and_then(|i| self.beats.get(i))
            .map(|&b| (t - b).abs());

        after.into_iter().chain(before).any(|d| d < tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_interpolates_between_frames() {
        let curve = FrameCurve::new(vec![0.0, 1.0, 0.5], 0.5);
        assert!((curve.sample(0.25) - 0.5).abs() < 1e-12);
        assert!((curve.sample(0.75) - 0.75).abs() < 1e-12);
        assert!((curve.sample(0.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_clamps_outside_domain() {
        let curve = FrameCurve::new(vec![0.2, 0.4, 0.9], 0.1);
        assert_eq!(curve.sample(-3.0), 0.2);
        assert_eq!(curve.sample(0.2), 0.9);
        assert_eq!(curve.sample(100.0), 0.9);
        assert_eq!(FrameCurve::new(Vec::new(), 0.1).sample(1.0), 0.0);
    }

    #[test]
    fn test_percentile_matches_linear_ranks() {
        let curve = FrameCurve::new(vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0], 0.01);
        assert!((curve.percentile(70.0) - 0.7).abs() < 1e-12);
        assert!((curve.percentile(0.0) - 0.0).abs() < 1e-12);
        assert!((curve.percentile(100.0) - 1.0).abs() < 1e-12);

        let uneven = FrameCurve::new(vec![1.0, 0.0, 0.5, 0.25], 0.01);
        // sorted [0, 0.25, 0.5, 1.0], rank 0.7 * 3 = 2.1
        assert!((uneven.percentile(70.0) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_grids() {
        assert!(BeatGrid::new(vec![0.5], 120.0).is_degenerate());
        assert!(BeatGrid::new(vec![0.0, 0.5], 0.0).is_degenerate());
        assert!(BeatGrid::new(vec![0.0, 0.5], f64::NAN).is_degenerate());
        assert!(!BeatGrid::new(vec![0.0, 0.5], 120.0).is_degenerate());
        assert_eq!(BeatGrid::new(vec![0.0, 0.5], 120.0).beat_duration(), Some(0.5));
    }

    #[test]
    fn test_base_beat() {
        let grid = BeatGrid::new(vec![0.5, 1.0, 1.5], 120.0);
        assert_eq!(grid.base_beat(0.1), Some(0.5));
        assert_eq!(grid.base_beat(1.0), Some(1.0));
        assert_eq!(grid.base_beat(1.2), Some(1.0));
        assert_eq!(grid.base_beat(9.0), Some(1.5));
        assert_eq!(BeatGrid::new(Vec::new(), 120.0).base_beat(1.0), None);
    }

    #[test]
    fn test_has_beat_near() {
        let grid = BeatGrid::new(vec![0.0, 0.5, 1.0], 120.0);
        assert!(grid.has_beat_near(0.52, 0.05));
        assert!(grid.has_beat_near(0.47, 0.05));
        assert!(!grid.has_beat_near(0.25, 0.05));
        assert!(!grid.has_beat_near(0.55, 0.05));
        assert!(grid.has_beat_near(1.04, 0.05));
    }
}
