// Feature adapter module
// Input contract, curve/grid value types, and extractor failure aggregation

pub mod adapter;
pub mod collector;
pub mod types;

pub use adapter::{FeatureInput, TrackFeatures};
pub use collector::FeatureCollector;
pub use types::{BeatGrid, BrightnessCurve, Envelope, FrameCurve};
