//! Time alignment of sampled waves.
//!
//! Both helpers assume their inputs are ordered ascending by `t`, which is
//! an invariant of every wave sequence the crate produces.

use crate::types::WavePoint;

/// The time window covered by both waves, or `None` when they are empty or
/// do not overlap for a positive duration.
pub fn overlap(a: &[WavePoint], b: &[WavePoint]) -> Option<(f32, f32)> {
    let start = a.first()?.t.max(b.first()?.t);
    let end = a.last()?.t.min(b.last()?.t);
    (end > start).then_some((start, end))
}

/// Value of the sample nearest to `t`, found by binary search.
pub fn value_at(points: &[WavePoint], t: f32) -> Option<f32> {
    if points.is_empty() {
        return None;
    }

    match points.binary_search_by(|p| p.t.total_cmp(&t)) {
        Ok(i) => Some(points[i].value),
        Err(i) => {
            // `i` is the insertion point; the nearest sample is one of its
            // neighbors
            if i == 0 {
                Some(points[0].value)
            } else if i >= points.len() {
                Some(points[points.len() - 1].value)
            } else {
                let before = &points[i - 1];
                let after = &points[i];
                if (t - before.t).abs() <= (after.t - t).abs() {
                    Some(before.value)
                } else {
                    Some(after.value)
                }
            }
        }
    }
}
