// Worker dispatch
// Runs CPU-bound invocations on the tokio blocking pool

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::run::Pipeline;
use crate::beatmap::Beatmap;
use crate::error::{BeatmapError, BeatmapResult};
use crate::features::FeatureInput;

/// Run one invocation off the async executor
///
/// `cancel` is checked once, right before the pipeline starts; there is no
/// point inside a run where it could stop.
pub async fn run_on_worker(
    pipeline: Pipeline,
    input: FeatureInput,
    cancel: Arc<AtomicBool>,
) -> BeatmapResult<Beatmap> {
    let handle = tokio::task::spawn_blocking(move || {
        if cancel.load(Ordering::SeqCst) {
            return Err(BeatmapError::Worker("cancelled".to_string()));
        }
        pipeline.run_input(&input)
    });

    handle
        .await
        .map_err(|e| BeatmapError::Worker(e.to_string()))?
}

/// Run many invocations concurrently; results keep the input order
pub async fn run_batch(
    pipeline: &Pipeline,
    inputs: Vec<FeatureInput>,
    cancel: Arc<AtomicBool>,
) -> Vec<BeatmapResult<Beatmap>> {
    let handles: Vec<_> = inputs
        .into_iter()
        .map(|input| tokio::spawn(run_on_worker(pipeline.clone(), input, Arc::clone(&cancel))))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(match handle.await {
            Ok(result) => result,
            Err(e) => Err(BeatmapError::Worker(e.to_string())),
        });
    }

    log::debug!(
        "Batch finished: {} of {} invocations succeeded",
        results.iter().filter(|r| r.is_ok()).count(),
        results.len()
    );
    results
}
