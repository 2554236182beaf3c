// Beatlane - Beat timeline to rhythm game beatmap generator
// Module declarations

pub mod arranger;
pub mod beatmap;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod features;
pub mod groove;
pub mod pipeline;
pub mod state;

use clap::Parser;

pub use beatmap::{Beatmap, BeatmapSummary};
pub use config::{Difficulty, GenerationMode, PipelineConfig};
pub use error::{BeatmapError, BeatmapResult};
pub use events::{GameEvent, NoteKind};
pub use features::{FeatureCollector, FeatureInput, TrackFeatures};
pub use pipeline::Pipeline;

/// CLI entry point; returns the process exit code
pub fn run() -> i32 {
    let cli = cli::Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    match cli::execute(cli) {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{}", e.message());
            1
        }
    }
}
