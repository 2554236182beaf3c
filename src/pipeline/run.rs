// Pipeline execution
// Single pass from normalized features to an assembled beatmap

use serde_json::json;

use super::trace::{Stage, TraceBuilder, TraceEntry, TraceWriter};
use crate::arranger::{LaneAssigner, SeededArranger};
use crate::beatmap::Beatmap;
use crate::config::{GenerationMode, PipelineConfig};
use crate::error::BeatmapResult;
use crate::events::StrengthClassifier;
use crate::features::{FeatureInput, TrackFeatures};
use crate::groove::{aggregate_candidates, merge_close, snap_candidates, DensityGovernor};

/// A validated, reusable beatmap generator
///
/// Holds no per-run state: every invocation owns its intermediates, so one
/// pipeline can be cloned onto any number of workers.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    trace: Option<TraceWriter>,
}

impl Pipeline {
    /// Validate the configuration; nothing runs with a bad config
    pub fn new(config: PipelineConfig) -> BeatmapResult<Self> {
        config.validate()?;
        Ok(Pipeline { config, trace: None })
    }

    /// Append a JSONL entry per stage to `writer`
    pub fn with_trace(mut self, writer: TraceWriter) -> Self {
        self.trace = Some(writer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Normalize raw analysis output and run the pipeline on it
    pub fn run_input(&self, input: &FeatureInput) -> BeatmapResult<Beatmap> {
        let features = TrackFeatures::from_input(input)?;
        self.trace(vec![TraceBuilder::stage(Stage::Adapt).complete(
            "Normalized features",
            json!({
                "beats": features.grid.beats().len(),
                "onsets": features.onsets.len(),
                "peaks": features.peaks.len(),
                "envelope_frames": features.envelope.len(),
                "duration_seconds": features.duration_seconds,
            }),
        )]);

        Ok(self.run(&features))
    }

    /// Run every stage once, in order
    pub fn run(&self, features: &TrackFeatures) -> Beatmap {
        let config = &self.config;
        let mut entries: Vec<TraceEntry> = Vec::new();

        let candidates = aggregate_candidates(features.grid.beats(), &features.onsets, &features.peaks);
        if candidates.is_empty() {
            log::info!("No beat, onset, or peak timestamps; producing an empty beatmap");
            entries.push(TraceBuilder::stage(Stage::Aggregate).note("Empty candidate set"));
        }
        entries.push(TraceBuilder::stage(Stage::Aggregate).complete(
            "Aggregated candidates",
            json!({ "candidates": candidates.len() }),
        ));

        if features.grid.is_degenerate() {
            entries.push(TraceBuilder::stage(Stage::Snap).note("Degenerate beat grid, snapping skipped"));
        }
        let snapped = snap_candidates(&candidates, &features.grid, config.snap.tolerance_seconds);
        let aligned = snapped.iter().filter(|e| e.is_aligned()).count();
        entries.push(TraceBuilder::stage(Stage::Snap).complete(
            "Snapped to grid",
            json!({
                "aligned": aligned,
                "free": snapped.len() - aligned,
                "degenerate_grid": features.grid.is_degenerate(),
            }),
        ));

        let snapped_times: Vec<f64> = snapped.iter().map(|e| e.time).collect();
        let merged = merge_close(&snapped_times, config.merge.threshold_seconds);
        log::debug!("Merged {} snapped events into {}", snapped_times.len(), merged.len());
        entries.push(TraceBuilder::stage(Stage::Merge).complete(
            "Merged near-duplicates",
            json!({ "input": snapped_times.len(), "output": merged.len() }),
        ));

        let governor = DensityGovernor::new(
            config.density.window_seconds,
            config.target_density(),
            config.density.max_factor,
        );
        let governed = governor.govern(&merged, &features.envelope, features.duration_seconds);
        log::debug!(
            "Density governor kept {} of {} events over {} windows",
            governed.times.len(),
            merged.len(),
            governed.window_count
        );
        entries.push(TraceBuilder::stage(Stage::Govern).complete(
            "Bounded density",
            json!({
                "input": merged.len(),
                "output": governed.times.len(),
                "windows": governed.window_count,
                "occupied_windows": governed.windows.len(),
                "max_per_window": governor.max_events_per_window(),
            }),
        ));

        let mut arranger = match config.mode {
            GenerationMode::Curated => None,
            GenerationMode::Seeded(seed) => Some(SeededArranger::from_seed(seed, config.difficulty)),
        };

        let times = match arranger.as_mut() {
            Some(arranger) => {
                let kept = arranger.thin(&governed.times);
                entries.push(TraceBuilder::stage(Stage::Thin).complete(
                    "Seeded thinning",
                    json!({ "input": governed.times.len(), "output": kept.len() }),
                ));
                kept
            }
            None => governed.times,
        };

        let classifier = StrengthClassifier::new(&features.envelope, &features.grid, &config.classify);
        let classified = classifier.classify_all(&times);
        entries.push(TraceBuilder::stage(Stage::Classify).complete(
            "Classified strength",
            json!({
                "events": classified.len(),
                "strong": classified.iter().filter(|e| e.kind.is_strong()).count(),
                "strong_threshold": classifier.strong_threshold(),
            }),
        ));

        let mut assigner = LaneAssigner::new(config.lanes, &features.brightness);
        let placed = match arranger.as_mut() {
            Some(arranger) => arranger.arrange(&classified, &mut assigner),
            None => assigner.arrange(&classified),
        };
        entries.push(TraceBuilder::stage(Stage::Arrange).complete(
            "Assigned lanes",
            json!({ "lanes": config.lanes, "seeded": arranger.is_some() }),
        ));

        let beatmap = Beatmap::assemble(features.tempo_bpm, config.lanes, &placed);
        entries.push(TraceBuilder::stage(Stage::Assemble).complete(
            "Assembled beatmap",
            json!({ "events": beatmap.events().len(), "tempo": beatmap.tempo() }),
        ));
        self.trace(entries);

        log::info!(
            "Generated beatmap: {} events on {} lanes ({} candidates)",
            beatmap.events().len(),
            config.lanes,
            candidates.len()
        );

        beatmap
    }

    fn trace(&self, entries: Vec<TraceEntry>) {
        if let Some(writer) = &self.trace {
            writer.record(&entries);
        }
    }
}
