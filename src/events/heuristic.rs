// Heuristic (rule-based) strength classifier
// Labels each surviving event strong, normal, or hold from envelope and beats

use crate::config::ClassifySettings;
use crate::events::types::{round_to, ClassifiedEvent, NoteKind};
use crate::features::{BeatGrid, Envelope};

/// Hold-note rule, active only when enabled in the settings
#[derive(Debug, Clone, Copy)]
struct HoldRule {
    /// Strength below this envelope percentile value may hold
    threshold: f64,

    /// Minimum gap to the next event, also the last event's duration
    min_seconds: f64,
}

/// Rule-based classifier over one track's envelope and beat grid
///
/// An event is strong iff a beat lies within the beat tolerance AND its
/// envelope strength reaches the configured percentile of the whole
/// envelope. Percentiles are computed once per track.
pub struct StrengthClassifier<'a> {
    envelope: &'a Envelope,
    grid: &'a BeatGrid,
    beat_tolerance: f64,

    /// Envelope value at the strong percentile
    strong_threshold: f64,

    hold: Option<HoldRule>,
}

impl<'a> StrengthClassifier<'a> {
    pub fn new(envelope: &'a Envelope, grid: &'a BeatGrid, settings: &ClassifySettings) -> Self {
        let hold = settings.hold.enabled.then(|| HoldRule {
            threshold: envelope.percentile(settings.hold.percentile),
            min_seconds: settings.hold.min_seconds,
        });

        StrengthClassifier {
            envelope,
            grid,
            beat_tolerance: settings.beat_tolerance_seconds,
            strong_threshold: envelope.percentile(settings.strong_percentile),
            hold,
        }
    }

    pub fn strong_threshold(&self) -> f64 {
        self.strong_threshold
    }

    /// Classify a single event as strong or normal
    pub fn classify(&self, time: f64) -> ClassifiedEvent {
        let strength = self.envelope.sample(time);
        let is_beat = self.grid.has_beat_near(time, self.beat_tolerance);

        let kind = if is_beat && strength >= self.strong_threshold {
            NoteKind::Strong
        } else {
            NoteKind::Normal
        };

        ClassifiedEvent {
            time,
            strength,
            is_beat,
            kind,
        }
    }

    /// Classify an ascending timeline, promoting quiet normals to holds
    ///
    /// A hold needs the gap to the next event, so this works on the whole
    /// sequence rather than event by event.
    pub fn classify_all(&self, times: &[f64]) -> Vec<ClassifiedEvent> {
        let mut classified: Vec<ClassifiedEvent> = times.iter().map(|&t| self.classify(t)).collect();

        if let Some(rule) = self.hold {
            let next_times: Vec<Option<f64>> = times.iter().skip(1).map(|&t| Some(t)).chain([None]).collect();

            for (event, next) in classified.iter_mut().zip(next_times) {
                if event.kind.is_strong() || event.strength >= rule.threshold {
                    continue;
                }

                let duration = match next {
                    Some(next) if next - event.time >= rule.min_seconds => round_to(next - event.time, 3),
                    Some(_) => continue,
                    None => rule.min_seconds,
                };
                event.kind = NoteKind::Hold { duration };
            }
        }

        log::debug!(
            "Classified {} events ({} strong, threshold {:.3})",
            classified.len(),
            classified.iter().filter(|e| e.kind.is_strong()).count(),
            self.strong_threshold
        );

        classified
    }
}
