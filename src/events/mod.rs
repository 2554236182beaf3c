// Event classification module
// Game event types and the strength classifier

pub mod heuristic;
pub mod types;

pub use heuristic::StrengthClassifier;
pub use types::{round_to, ClassifiedEvent, GameEvent, NoteKind, PlacedEvent};
