// Arranger - Lane assignment for classified events
// Deterministic brightness-driven lanes and the seeded probabilistic mode

pub mod lanes;
pub mod seeded;

// Re-export main types
pub use lanes::{brightness_bucket, BucketCounters, LaneAssigner, LaneLayout, BRIGHTNESS_BUCKETS};
pub use seeded::{SeededArranger, MIN_NOTE_INTERVAL};
