// Pipeline configuration
// Thresholds, difficulty presets, and generation mode, loadable from TOML

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{BeatmapError, BeatmapResult};

/// Largest lane count a beatmap may declare
pub const MAX_LANES: usize = 16;

/// Shortest density window; shorter windows cannot hold even one note at
/// the lowest preset density
pub const MIN_WINDOW_SECONDS: f64 = 0.1;

/// Difficulty preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Expert,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Normal
    }
}

impl Difficulty {
    /// Base events per second before energy scaling
    pub fn target_density(&self) -> f64 {
        match self {
            Difficulty::Easy => 1.5,
            Difficulty::Normal => 2.5,
            Difficulty::Hard => 3.5,
            Difficulty::Expert => 4.5,
        }
    }

    /// Probability that the seeded arranger keeps a candidate note
    pub fn keep_probability(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.3,
            Difficulty::Normal => 0.5,
            Difficulty::Hard => 0.7,
            Difficulty::Expert => 0.9,
        }
    }

    /// Probability that the seeded arranger turns a note into a hold
    pub fn hold_ratio(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.10,
            Difficulty::Normal => 0.15,
            Difficulty::Hard => 0.20,
            Difficulty::Expert => 0.25,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            "expert" => Some(Difficulty::Expert),
            _ => None,
        }
    }
}

/// How notes are chosen and placed after density governing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Fully deterministic curation (default)
    Curated,

    /// Probabilistic generation driven by a caller-supplied seed
    Seeded(u64),
}

impl Default for GenerationMode {
    fn default() -> Self {
        GenerationMode::Curated
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapSettings {
    /// Max distance to a grid point that still snaps (seconds)
    #[serde(default = "SnapSettings::default_tolerance")]
    pub tolerance_seconds: f64,
}

impl SnapSettings {
    fn default_tolerance() -> f64 {
        0.04
    }
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            tolerance_seconds: Self::default_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Neighbours closer than this collapse to their midpoint (seconds)
    #[serde(default = "MergeSettings::default_threshold")]
    pub threshold_seconds: f64,
}

impl MergeSettings {
    fn default_threshold() -> f64 {
        0.02
    }
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            threshold_seconds: Self::default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensitySettings {
    #[serde(default = "DensitySettings::default_window")]
    pub window_seconds: f64,

    /// Events per second in the quietest window; difficulty preset when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_density: Option<f64>,

    /// Budget multiplier applied to the loudest window
    #[serde(default = "DensitySettings::default_max_factor")]
    pub max_factor: f64,
}

impl DensitySettings {
    fn default_window() -> f64 {
        2.5
    }
    fn default_max_factor() -> f64 {
        2.0
    }
}

impl Default for DensitySettings {
    fn default() -> Self {
        Self {
            window_seconds: Self::default_window(),
            target_density: None,
            max_factor: Self::default_max_factor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Envelope percentile below which a note may become a hold
    #[serde(default = "HoldSettings::default_percentile")]
    pub percentile: f64,

    /// Minimum gap to the next note, also the duration of a trailing hold
    #[serde(default = "HoldSettings::default_min_seconds")]
    pub min_seconds: f64,
}

impl HoldSettings {
    fn default_percentile() -> f64 {
        30.0
    }
    fn default_min_seconds() -> f64 {
        0.6
    }
}

impl Default for HoldSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            percentile: Self::default_percentile(),
            min_seconds: Self::default_min_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifySettings {
    /// Max distance to a beat for an event to count as on-beat (seconds)
    #[serde(default = "ClassifySettings::default_beat_tolerance")]
    pub beat_tolerance_seconds: f64,

    /// Envelope percentile an on-beat event must reach to be strong
    #[serde(default = "ClassifySettings::default_strong_percentile")]
    pub strong_percentile: f64,

    #[serde(default)]
    pub hold: HoldSettings,
}

impl ClassifySettings {
    fn default_beat_tolerance() -> f64 {
        0.05
    }
    fn default_strong_percentile() -> f64 {
        70.0
    }
}

impl Default for ClassifySettings {
    fn default() -> Self {
        Self {
            beat_tolerance_seconds: Self::default_beat_tolerance(),
            strong_percentile: Self::default_strong_percentile(),
            hold: HoldSettings::default(),
        }
    }
}

/// Complete configuration for one pipeline invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "PipelineConfig::default_lanes")]
    pub lanes: usize,

    #[serde(default)]
    pub difficulty: Difficulty,

    #[serde(default)]
    pub snap: SnapSettings,

    #[serde(default)]
    pub merge: MergeSettings,

    #[serde(default)]
    pub density: DensitySettings,

    #[serde(default)]
    pub classify: ClassifySettings,

    #[serde(default)]
    pub mode: GenerationMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lanes: Self::default_lanes(),
            difficulty: Difficulty::default(),
            snap: SnapSettings::default(),
            merge: MergeSettings::default(),
            density: DensitySettings::default(),
            classify: ClassifySettings::default(),
            mode: GenerationMode::default(),
        }
    }
}

impl PipelineConfig {
    fn default_lanes() -> usize {
        4
    }

    /// Default configuration for a difficulty preset
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Effective base density: explicit override or difficulty preset
    pub fn target_density(&self) -> f64 {
        self.density
            .target_density
            .unwrap_or_else(|| self.difficulty.target_density())
    }

    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> BeatmapResult<Self> {
        toml::from_str(text)
            .map_err(|e| BeatmapError::Configuration(format!("malformed config: {}", e)))
    }

    /// Load from a TOML file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> BeatmapResult<Self> {
        if !path.exists() {
            log::info!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|e| {
            BeatmapError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject lane counts and thresholds the pipeline cannot honour
    pub fn validate(&self) -> BeatmapResult<()> {
        if self.lanes == 0 || self.lanes > MAX_LANES {
            return Err(BeatmapError::Configuration(format!(
                "lanes must be in 1..={}, got {}",
                MAX_LANES, self.lanes
            )));
        }

        check_range("snap.tolerance_seconds", self.snap.tolerance_seconds, 0.0, 0.25, false)?;
        check_range("merge.threshold_seconds", self.merge.threshold_seconds, 0.001, 1.0, true)?;
        check_range(
            "density.window_seconds",
            self.density.window_seconds,
            MIN_WINDOW_SECONDS,
            60.0,
            true,
        )?;
        if let Some(density) = self.density.target_density {
            check_range("density.target_density", density, 0.0, 50.0, false)?;
        }
        check_range("density.max_factor", self.density.max_factor, 1.0, 8.0, true)?;
        check_range(
            "classify.beat_tolerance_seconds",
            self.classify.beat_tolerance_seconds,
            0.0,
            0.5,
            false,
        )?;
        check_range("classify.strong_percentile", self.classify.strong_percentile, 0.0, 100.0, true)?;
        check_range("classify.hold.percentile", self.classify.hold.percentile, 0.0, 100.0, true)?;
        check_range("classify.hold.min_seconds", self.classify.hold.min_seconds, 0.0, 10.0, false)?;

        Ok(())
    }
}

/// `min` is exclusive unless `min_inclusive`; `max` is always inclusive
fn check_range(name: &str, value: f64, min: f64, max: f64, min_inclusive: bool) -> BeatmapResult<()> {
    let above_min = if min_inclusive { value >= min } else { value > min };
    if value.is_finite() && above_min && value <= max {
        Ok(())
    } else {
        let open = if min_inclusive { '[' } else { '(' };
        Err(BeatmapError::Configuration(format!(
            "{} must be in {}{}, {}], got {}",
            name, open, min, max, value
        )))
    }
}
