// Beatmap module
// Final artifact assembly and summary statistics

pub mod assemble;
pub mod summary;

pub use assemble::{Beatmap, TIME_DECIMALS};
pub use summary::BeatmapSummary;
