// Feature collection from independent extractors
// Gathers every signal and reports all extractor failures at once

use std::fmt::Display;

use super::adapter::FeatureInput;
use crate::error::{BeatmapError, BeatmapResult, Signal, SignalFailure};

/// Builder that accepts each extractor's result and defers failure
/// reporting until every signal has been offered.
///
/// ```ignore
/// let input = FeatureCollector::new()
///     .envelope(onset_strength(&audio))
///     .beats(track_beats(&audio))
///     .onsets(detect_onsets(&audio))
///     .peaks(pick_peaks(&audio))
///     .brightness(spectral_centroid(&audio))
///     .tempo(estimate_tempo(&audio))
///     .finish()?;
/// ```
#[derive(Debug, Default)]
pub struct FeatureCollector {
    input: FeatureInput,
    provided: Vec<Signal>,
    failures: Vec<SignalFailure>,
}

impl FeatureCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Envelope values and their frame hop in seconds
    pub fn envelope<E: Display>(mut self, result: Result<(Vec<f64>, f64), E>) -> Self {
        if let Some((values, hop)) = self.record(Signal::Envelope, result) {
            self.input.envelope = values;
            self.input.frame_hop_seconds = hop;
        }
        self
    }

    pub fn beats<E: Display>(mut self, result: Result<Vec<f64>, E>) -> Self {
        if let Some(times) = self.record(Signal::Beats, result) {
            self.input.beat_times = times;
        }
        self
    }

    pub fn onsets<E: Display>(mut self, result: Result<Vec<f64>, E>) -> Self {
        if let Some(times) = self.record(Signal::Onsets, result) {
            self.input.onset_times = times;
        }
        self
    }

    pub fn peaks<E: Display>(mut self, result: Result<Vec<f64>, E>) -> Self {
        if let Some(times) = self.record(Signal::Peaks, result) {
            self.input.peak_times = times;
        }
        self
    }

    /// Brightness values and their own frame hop in seconds
    pub fn brightness<E: Display>(mut self, result: Result<(Vec<f64>, f64), E>) -> Self {
        if let Some((values, hop)) = self.record(Signal::Brightness, result) {
            self.input.brightness = values;
            self.input.brightness_hop_seconds = Some(hop);
        }
        self
    }

    pub fn tempo<E: Display>(mut self, result: Result<f64, E>) -> Self {
        if let Some(bpm) = self.record(Signal::Tempo, result) {
            self.input.tempo_bpm = bpm;
        }
        self
    }

    /// Decoder metadata, optional
    pub fn decoded(mut self, sample_count: u64, duration_seconds: f64) -> Self {
        self.input.sample_count = Some(sample_count);
        self.input.duration_seconds = Some(duration_seconds);
        self
    }

    /// Finish collection; any failed or missing signal fails the whole set
    pub fn finish(mut self) -> BeatmapResult<FeatureInput> {
        for signal in [
            Signal::Envelope,
            Signal::Beats,
            Signal::Onsets,
            Signal::Peaks,
            Signal::Brightness,
            Signal::Tempo,
        ] {
            let failed = self.failures.iter().any(|f| f.signal == signal);
            if !failed && !self.provided.contains(&signal) {
                self.failures.push(SignalFailure {
                    signal,
                    message: "not provided".to_string(),
                });
            }
        }

        if self.failures.is_empty() {
            Ok(self.input)
        } else {
            log::error!("{} feature extractors failed", self.failures.len());
            Err(BeatmapError::FeatureExtraction(self.failures))
        }
    }

    fn record<T, E: Display>(&mut self, signal: Signal, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => {
                self.provided.push(signal);
                Some(value)
            }
            Err(e) => {
                self.failures.push(SignalFailure {
                    signal,
                    message: e.to_string(),
                });
                None
            }
        }
    }
}
