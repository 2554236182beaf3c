// Game event types
// Note kinds, classified events, and the final lane-assigned gameplay event

use serde::{Deserialize, Serialize};

/// Gameplay note type
///
/// Serialized as an internally tagged `type` field so a hold carries its
/// `duration` next to it: `{"type":"hold","duration":1.25}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NoteKind {
    /// On-beat and loud; alternates between the two strong lanes
    Strong,

    /// Everything else; lane follows spectral brightness
    Normal,

    /// Sustained note held for `duration` seconds
    Hold { duration: f64 },
}

impl NoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Strong => "strong",
            NoteKind::Normal => "normal",
            NoteKind::Hold { .. } => "hold",
        }
    }

    pub fn is_strong(&self) -> bool {
        matches!(self, NoteKind::Strong)
    }

    /// Hold duration in seconds, 0 for tap notes
    pub fn duration(&self) -> f64 {
        match self {
            NoteKind::Hold { duration } => *duration,
            NoteKind::Strong | NoteKind::Normal => 0.0,
        }
    }
}

/// An event after strength classification, before lane assignment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEvent {
    /// Seconds from the start of the track
    pub time: f64,

    /// Envelope strength at `time`
    pub strength: f64,

    /// A beat lies within the beat tolerance of `time`
    pub is_beat: bool,

    pub kind: NoteKind,
}

/// An event with its lane, ready for assembly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedEvent {
    pub time: f64,
    pub kind: NoteKind,
    pub lane: usize,
}

/// Final gameplay event as it appears in a beatmap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// 1-based rank in time order
    pub id: u32,

    /// Seconds rounded to 4 decimals
    pub time: f64,

    #[serde(flatten)]
    pub kind: NoteKind,

    pub lane: usize,
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 4), 1.2346);
        assert_eq!(round_to(0.6004, 3), 0.6);
        assert_eq!(round_to(2.0, 4), 2.0);
    }

    #[test]
    fn test_note_kind_names() {
        assert_eq!(NoteKind::Strong.as_str(), "strong");
        assert_eq!(NoteKind::Normal.as_str(), "normal");
        assert_eq!(NoteKind::Hold { duration: 1.0 }.as_str(), "hold");
        assert!(NoteKind::Strong.is_strong());
        assert_eq!(NoteKind::Normal.duration(), 0.0);
    }

    #[test]
    fn test_game_event_json_shape() {
        let tap = GameEvent {
            id: 1,
            time: 0.5,
            kind: NoteKind::Strong,
            lane: 1,
        };
        assert_eq!(
            serde_json::to_string(&tap).unwrap(),
            r#"{"id":1,"time":0.5,"type":"strong","lane":1}"#
        );

        let hold = GameEvent {
            id: 2,
            time: 1.25,
            kind: NoteKind::Hold { duration: 0.75 },
            lane: 3,
        };
        assert_eq!(
            serde_json::to_string(&hold).unwrap(),
            r#"{"id":2,"time":1.25,"type":"hold","duration":0.75,"lane":3}"#
        );
    }

    #[test]
    fn test_game_event_parses_back() {
        let json = r#"{"id":7,"time":2.0,"type":"hold","duration":0.6,"lane":0}"#;
        let event: GameEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, NoteKind::Hold { duration: 0.6 });
        assert_eq!(event.lane, 0);
    }
}
