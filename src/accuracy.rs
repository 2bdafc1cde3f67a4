//! Reconstruction-accuracy metric.

use log::debug;

use crate::align;
use crate::types::{AccuracyResult, WavePoint};

/// Number of evenly spaced comparison points across the overlap window.
const RESAMPLE_POINTS: usize = 1000;

/// Compare a reconstructed wave against its original.
///
/// Both waves are resampled onto a common time grid spanning their overlap
/// (nearest-sample lookup), then scored by mean squared error normalized by
/// the original's power. Empty inputs or a non-overlapping pair degrade to
/// `{ mse: +inf, accuracy_percent: 0 }`.
pub fn evaluate(original: &[WavePoint], reconstructed: &[WavePoint]) -> AccuracyResult {
    let Some((start, end)) = align::overlap(original, reconstructed) else {
        debug!("no overlapping window, reporting zero accuracy");
        return AccuracyResult {
            mse: f32::INFINITY,
            accuracy_percent: 0.0,
        };
    };

    let step = (end - start) / (RESAMPLE_POINTS - 1) as f32;
    let mut squared_error = 0.0f64;
    let mut power = 0.0f64;

    for i in 0..RESAMPLE_POINTS {
        let t = start + step * i as f32;
        // Overlap implies both waves are non-empty
        let Some(orig) = align::value_at(original, t) else {
            break;
        };
        let Some(rec) = align::value_at(reconstructed, t) else {
            break;
        };

        let diff = (orig - rec) as f64;
        squared_error += diff * diff;
        power += (orig as f64) * (orig as f64);
    }

    let mse = (squared_error / RESAMPLE_POINTS as f64) as f32;
    let original_power = (power / RESAMPLE_POINTS as f64) as f32;

    let error_ratio = if original_power > 0.0 {
        (mse / original_power).min(1.0)
    } else if mse == 0.0 {
        0.0
    } else {
        1.0
    };

    AccuracyResult {
        mse,
        accuracy_percent: (100.0 * (1.0 - error_ratio)).clamp(0.0, 100.0),
    }
}
