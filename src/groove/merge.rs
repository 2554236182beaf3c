// Proximity merging
// Collapses near-duplicate timestamps into their midpoint

/// Merge neighbours closer than `threshold` seconds
///
/// Walks the sorted timeline keeping one pending timestamp. A neighbour
/// within the threshold replaces it with the midpoint of the two instead of
/// being dropped, so a cluster settles near its centre. Output is strictly
/// increasing with adjacent gaps of at least `threshold`; running it again
/// on its own output is a no-op.
pub fn merge_close(times: &[f64], threshold: f64) -> Vec<f64> {
    let mut merged = Vec::with_capacity(times.len());
    let mut iter = times.iter().copied();

    let Some(mut pending) = iter.next() else {
        return merged;
    };

    for t in iter {
        if t - pending < threshold {
            pending = (pending + t) / 2.0;
        } else {
            merged.push(pending);
            pending = t;
        }
    }
    merged.push(pending);

    merged
}
