// Beatmap generation errors
// Fatal failures of a single pipeline invocation

use std::fmt;

use thiserror::Error;

/// External signal that feeds the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Envelope,
    Beats,
    Onsets,
    Peaks,
    Brightness,
    Tempo,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Envelope => "envelope",
            Signal::Beats => "beats",
            Signal::Onsets => "onsets",
            Signal::Peaks => "peaks",
            Signal::Brightness => "brightness",
            Signal::Tempo => "tempo",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One external extractor that failed to produce its signal
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFailure {
    pub signal: Signal,
    pub message: String,
}

impl fmt::Display for SignalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.signal, self.message)
    }
}

/// Errors that abort a beatmap invocation
///
/// A degenerate beat grid or an empty candidate set are not errors; the
/// pipeline degrades and still returns a valid beatmap.
#[derive(Debug, Error)]
pub enum BeatmapError {
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Feature extraction failed: {}", join_failures(.0))]
    FeatureExtraction(Vec<SignalFailure>),

    #[error("Worker failed: {0}")]
    Worker(String),
}

fn join_failures(failures: &[SignalFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type BeatmapResult<T> = Result<T, BeatmapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregated_failure_message() {
        let err = BeatmapError::FeatureExtraction(vec![
            SignalFailure {
                signal: Signal::Beats,
                message: "tracker crashed".to_string(),
            },
            SignalFailure {
                signal: Signal::Brightness,
                message: "not provided".to_string(),
            },
        ]);

        assert_eq!(
            err.to_string(),
            "Feature extraction failed: beats: tracker crashed; brightness: not provided"
        );
    }
}
