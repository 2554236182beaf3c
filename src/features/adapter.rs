// Feature adapter
// Normalizes upstream analysis output into the pipeline's value types

use serde::{Deserialize, Serialize};

use super::types::{BeatGrid, BrightnessCurve, Envelope, FrameCurve};
use crate::error::{BeatmapError, BeatmapResult};

/// Analysis output handed over by the external feature extractors
///
/// This is the input contract of the generator. Timestamps are seconds from
/// the start of the track; curves are frame-indexed with their own hop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureInput {
    /// Onset-strength envelope, one value per frame in [0, 1]
    #[serde(default)]
    pub envelope: Vec<f64>,

    /// Seconds between envelope frames
    #[serde(default)]
    pub frame_hop_seconds: f64,

    #[serde(default)]
    pub beat_times: Vec<f64>,

    /// Backtracked onset times
    #[serde(default)]
    pub onset_times: Vec<f64>,

    /// Energy peak times
    #[serde(default)]
    pub peak_times: Vec<f64>,

    /// Normalized spectral centroid, one value per brightness frame
    #[serde(default)]
    pub brightness: Vec<f64>,

    /// Seconds between brightness frames (defaults to `frame_hop_seconds`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness_hop_seconds: Option<f64>,

    #[serde(default)]
    pub tempo_bpm: f64,

    /// Track length in seconds, if the decoder reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,

    /// Number of decoded samples, if the decoder reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<u64>,
}

impl FeatureInput {
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Validated, normalized features for one track
#[derive(Debug, Clone)]
pub struct TrackFeatures {
    pub envelope: Envelope,
    pub brightness: BrightnessCurve,
    pub grid: BeatGrid,
    pub onsets: Vec<f64>,
    pub peaks: Vec<f64>,

    /// Tempo carried into the beatmap; 0 when upstream reported a non-finite value
    pub tempo_bpm: f64,

    /// Track length used to lay out density windows
    pub duration_seconds: f64,
}

impl TrackFeatures {
    /// Normalize raw analysis output
    ///
    /// Fails with `InvalidAudio` when the decoder produced no samples or a
    /// curve cannot be mapped onto time. Recoverable defects (out-of-range
    /// curve values, non-finite or negative timestamps, unsorted input) are
    /// repaired and logged.
    pub fn from_input(input: &FeatureInput) -> BeatmapResult<Self> {
        if input.sample_count == Some(0) {
            return Err(BeatmapError::InvalidAudio(
                "decoder produced no samples".to_string(),
            ));
        }

        let envelope = build_curve("envelope", &input.envelope, input.frame_hop_seconds)?;
        let brightness_hop = input
            .brightness_hop_seconds
            .unwrap_or(input.frame_hop_seconds);
        let brightness = build_curve("brightness", &input.brightness, brightness_hop)?;

        let beats = clean_timestamps("beat", &input.beat_times);
        let onsets = clean_timestamps("onset", &input.onset_times);
        let peaks = clean_timestamps("peak", &input.peak_times);

        let tempo_bpm = if input.tempo_bpm.is_finite() {
            input.tempo_bpm
        } else {
            log::warn!("Non-finite tempo reported, recording 0 bpm");
            0.0
        };

        let duration_seconds = match input.duration_seconds {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => envelope.duration_seconds(),
        };

        Ok(TrackFeatures {
            envelope,
            brightness,
            grid: BeatGrid::new(beats, tempo_bpm),
            onsets,
            peaks,
            tempo_bpm,
            duration_seconds,
        })
    }
}

fn build_curve(name: &str, values: &[f64], hop_seconds: f64) -> BeatmapResult<FrameCurve> {
    if values.is_empty() {
        return Ok(FrameCurve::new(Vec::new(), hop_seconds.max(0.0)));
    }

    if !hop_seconds.is_finite() || hop_seconds <= 0.0 {
        return Err(BeatmapError::InvalidAudio(format!(
            "{} frame hop must be positive, got {}",
            name, hop_seconds
        )));
    }

    if let Some(frame) = values.iter().position(|v| !v.is_finite()) {
        return Err(BeatmapError::InvalidAudio(format!(
            "{} has a non-finite value at frame {}",
            name, frame
        )));
    }

    let out_of_range = values.iter().filter(|v| !(0.0..=1.0).contains(*v)).count();
    if out_of_range > 0 {
        log::warn!("Clamped {} {} values into [0, 1]", out_of_range, name);
    }

    let clamped = values.iter().map(|v| v.clamp(0.0, 1.0)).collect();
    Ok(FrameCurve::new(clamped, hop_seconds))
}

/// Drop unusable timestamps and return the rest sorted without duplicates
fn clean_timestamps(kind: &str, times: &[f64]) -> Vec<f64> {
    let mut cleaned: Vec<f64> = times
        .iter()
        .copied()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .collect();

    let dropped = times.len() - cleaned.len();
    if dropped > 0 {
        log::warn!("Dropped {} non-finite or negative {} timestamps", dropped, kind);
    }

    cleaned.sort_by(|a, b| a.total_cmp(b));
    cleaned.dedup();
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> FeatureInput {
        FeatureInput {
            envelope: vec![0.1, 0.5, 0.9, 0.3],
            frame_hop_seconds: 0.5,
            beat_times: vec![0.0, 0.5, 1.0, 1.5],
            onset_times: vec![0.02, 0.52],
            peak_times: vec![1.0],
            brightness: vec![0.2, 0.8],
            tempo_bpm: 120.0,
            ..FeatureInput::default()
        }
    }

    #[test]
    fn test_from_input_builds_grid_and_curves() {
        let features = TrackFeatures::from_input(&sample_input()).unwrap();

        assert_eq!(features.grid.beats(), &[0.0, 0.5, 1.0, 1.5]);
        assert_eq!(features.grid.bpm(), 120.0);
        assert_eq!(features.envelope.len(), 4);
        // brightness inherits the envelope hop
        assert_eq!(features.brightness.hop_seconds(), 0.5);
        assert_eq!(features.duration_seconds, 2.0);
    }

    #[test]
    fn test_zero_samples_is_invalid_audio() {
        let input = FeatureInput {
            sample_count: Some(0),
            ..sample_input()
        };
        assert!(matches!(
            TrackFeatures::from_input(&input),
            Err(BeatmapError::InvalidAudio(_))
        ));
    }

    #[test]
    fn test_bad_hop_is_invalid_audio() {
        let input = FeatureInput {
            frame_hop_seconds: 0.0,
            ..sample_input()
        };
        assert!(matches!(
            TrackFeatures::from_input(&input),
            Err(BeatmapError::InvalidAudio(_))
        ));
    }

    #[test]
    fn test_nan_envelope_is_invalid_audio() {
        let input = FeatureInput {
            envelope: vec![0.1, f64::NAN],
            ..sample_input()
        };
        assert!(TrackFeatures::from_input(&input).is_err());
    }

    #[test]
    fn test_empty_input_is_accepted() {
        let features = TrackFeatures::from_input(&FeatureInput::default()).unwrap();
        assert!(features.envelope.is_empty());
        assert!(features.grid.is_degenerate());
        assert_eq!(features.duration_seconds, 0.0);
    }

    #[test]
    fn test_timestamps_are_cleaned() {
        let input = FeatureInput {
            onset_times: vec![1.0, -0.5, f64::INFINITY, 0.25, 1.0],
            ..sample_input()
        };
        let features = TrackFeatures::from_input(&input).unwrap();
        assert_eq!(features.onsets, vec![0.25, 1.0]);
    }

    #[test]
    fn test_envelope_values_are_clamped() {
        let input = FeatureInput {
            envelope: vec![-0.2, 1.4],
            ..sample_input()
        };
        let features = TrackFeatures::from_input(&input).unwrap();
        assert_eq!(features.envelope.values(), &[0.0, 1.0]);
    }

    #[test]
    fn test_json_contract() {
        let json = br#"{
            "envelope": [0.0, 0.4],
            "frame_hop_seconds": 0.023,
            "beat_times": [0.5, 1.0],
            "onset_times": [0.52],
            "peak_times": [],
            "brightness": [0.3],
            "tempo_bpm": 120.0
        }"#;
        let input = FeatureInput::from_json_bytes(json).unwrap();
        assert_eq!(input.beat_times, vec![0.5, 1.0]);
        assert_eq!(input.duration_seconds, None);
    }
}
