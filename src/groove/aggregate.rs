// Candidate aggregation
// Union of beat, onset, and peak timestamps into a single candidate timeline

/// Merge three ascending timestamp lists into one ascending list without
/// exact duplicates. No tolerance merging happens here.
pub fn aggregate_candidates(beats: &[f64], onsets: &[f64], peaks: &[f64]) -> Vec<f64> {
    let mut candidates = Vec::with_capacity(beats.len() + onsets.len() + peaks.len());
    candidates.extend_from_slice(beats);
    candidates.extend_from_slice(onsets);
    candidates.extend_from_slice(peaks);

    candidates.sort_by(|a, b| a.total_cmp(b));
    candidates.dedup();
    candidates
}
