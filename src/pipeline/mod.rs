// Pipeline execution and monitoring module
// Orchestrates the beat-timeline-to-beatmap pipeline

pub mod run;
pub mod trace;
pub mod worker;

pub use run::Pipeline;
pub use trace::{read_trace_file, Stage, TraceBuilder, TraceEntry, TraceError, TraceWriter};
pub use worker::{run_batch, run_on_worker};
