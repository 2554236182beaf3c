// Beatmap assembly
// Packages placed events with tempo and lane count into the output artifact

use serde::{Deserialize, Serialize};

use crate::events::{round_to, GameEvent, PlacedEvent};

/// Decimal places kept for event times
pub const TIME_DECIMALS: i32 = 4;

/// The output artifact of one invocation
///
/// Serialized as `{"tempo": .., "lanes": .., "events": [..]}`; this document
/// is the compatibility contract with players and stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beatmap {
    /// Tempo in beats per minute as reported upstream
    tempo: f64,

    /// Playfield width
    lanes: usize,

    /// Events in strictly increasing time order
    events: Vec<GameEvent>,
}

impl Beatmap {
    /// Assign ids 1..=N in the given (time) order and round times
    pub fn assemble(tempo: f64, lanes: usize, placed: &[PlacedEvent]) -> Self {
        let events = placed
            .iter()
            .enumerate()
            .map(|(i, event)| GameEvent {
                id: (i + 1) as u32,
                time: round_to(event.time, TIME_DECIMALS),
                kind: event.kind,
                lane: event.lane,
            })
            .collect();

        Beatmap {
            tempo: if tempo.is_finite() { tempo } else { 0.0 },
            lanes,
            events,
        }
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
