use anyhow::{bail, Result};
use log::debug;

use super::refine_parabolic;
use crate::types::PitchReading;

/// Minimum samples an octave-confirmation window must cover to be trusted.
const MIN_CHECK_WINDOW: usize = 32;

/// Time-domain pitch detector based on the Average Magnitude Difference
/// Function.
///
/// For each candidate period the detector averages `|x[i] - x[i + p]|`; a
/// truly periodic signal scores near zero at its period. Scores are
/// normalized by twice the mean absolute amplitude, so the acceptance
/// threshold is independent of input gain.
pub struct AmdfPitchDetector {
    sample_rate: f32,
    range_hz: (f32, f32),
    threshold: f32,
    min_period: usize,
    max_period: usize,
}

impl AmdfPitchDetector {
    pub fn new(sample_rate: f32, range_hz: (f32, f32), threshold: f32) -> Result<Self> {
        if sample_rate <= 0.0 || !sample_rate.is_finite() {
            bail!("sample_rate must be positive, got {}", sample_rate);
        }
        if range_hz.0 <= 0.0 || range_hz.1 <= range_hz.0 {
            bail!(
                "frequency range must be increasing and positive, got ({}, {})",
                range_hz.0,
                range_hz.1
            );
        }
        if threshold <= 0.0 || threshold >= 1.0 {
            bail!("threshold must be in (0, 1), got {}", threshold);
        }

        let min_period = ((sample_rate / range_hz.1).floor() as usize).max(2);
        let max_period = (sample_rate / range_hz.0).ceil() as usize;
        if max_period <= min_period {
            bail!(
                "search range ({}, {}) Hz collapses at {} Hz sample rate",
                range_hz.0,
                range_hz.1,
                sample_rate
            );
        }

        Ok(Self {
            sample_rate,
            range_hz,
            threshold,
            min_period,
            max_period,
        })
    }

    /// Detect the fundamental period of a buffer.
    ///
    /// Returns `None` for buffers that are too short, silent, or not
    /// periodic enough to clear the acceptance threshold.
    pub fn detect(&self, samples: &[f32]) -> Option<PitchReading> {
        // One extra lag on each side so the winner can be refined
        let lo = self.min_period - 1;
        let hi = self.max_period + 1;
        if samples.len() <= hi + 1 {
            return None;
        }
        let window = samples.len() - hi;

        // DC removal
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        let centered: Vec<f32> = samples.iter().map(|&s| s - mean).collect();

        let mean_abs = centered.iter().map(|s| s.abs()).sum::<f32>() / centered.len() as f32;
        if mean_abs < 1e-8 {
            return None; // silence
        }
        let scale = 2.0 * mean_abs;

        let amdf = |period: usize, window: usize| -> f32 {
            let mut sum = 0.0f64;
            for i in 0..window {
                sum += (centered[i] - centered[i + period]).abs() as f64;
            }
            (sum / window as f64) as f32 / scale
        };

        let scores: Vec<f32> = (lo..=hi).map(|p| amdf(p, window)).collect();

        // First local minimum that clears the threshold, scanning short
        // periods first. A global argmin is unsafe here: integer lags can
        // land closer to a multiple of the true period than to the period
        // itself, and the sub-harmonic dip then scores lower. The padding
        // lags at both ends only feed the interpolation.
        let mut best = None;
        let mut idx = 1;
        while idx < scores.len() - 1 {
            if scores[idx] <= self.threshold {
                while idx + 1 < scores.len() - 1 && scores[idx + 1] < scores[idx] {
                    idx += 1;
                }
                best = Some(idx);
                break;
            }
            idx += 1;
        }

        let Some(best) = best else {
            debug!(
                "no AMDF dip under threshold {:.3} in [{}, {}], no pitch",
                self.threshold, self.min_period, self.max_period
            );
            return None;
        };
        let best_score = scores[best];

        let refined_period = lo as f32 + refine_parabolic(&scores, best);
        let frequency = self.sample_rate / refined_period;
        if !(self.range_hz.0..=self.range_hz.1).contains(&frequency) {
            return None;
        }

        let mut confidence = (1.0 - best_score / self.threshold).clamp(0.0, 1.0);
        if !self.confirms_octave(lo + best, samples.len(), &amdf) {
            // A missing dip at the doubled period hints at a sub-harmonic;
            // surface the reading anyway but flag it
            confidence *= 0.5;
        }

        debug!(
            "AMDF pitch {:.2} Hz (period {:.2}, score {:.3}, confidence {:.2})",
            frequency, refined_period, best_score, confidence
        );

        Some(PitchReading {
            frequency,
            confidence,
        })
    }

    /// A true period shows a second minimum near twice the winning lag.
    /// When the buffer is too short to evaluate that region the check is
    /// skipped rather than failed.
    fn confirms_octave<F>(&self, period: usize, len: usize, amdf: &F) -> bool
    where
        F: Fn(usize, usize) -> f32,
    {
        let target = period * 2;
        let mut evaluated = false;

        for lag in target.saturating_sub(2)..=target + 2 {
            if lag + MIN_CHECK_WINDOW >= len {
                continue;
            }
            evaluated = true;
            if amdf(lag, len - lag - 1) < self.threshold * 1.5 {
                return true;
            }
        }

        // Nothing evaluable counts as confirmed, not failed
        !evaluated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_sine(frequency: f32, sample_rate: f32, duration: f32) -> Vec<f32> {
        let num_samples = (sample_rate * duration) as usize;
        (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate;
                (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_detect_sine_440() {
        let detector = AmdfPitchDetector::new(44100.0, (50.0, 1500.0), 0.2).unwrap();
        let samples = generate_sine(440.0, 44100.0, 0.1);

        let reading = detector.detect(&samples).expect("440 Hz sine is periodic");
        assert!(
            (reading.frequency - 440.0).abs() < 1.0,
            "expected ~440 Hz, got {}",
            reading.frequency
        );
        assert!(reading.confidence > 0.5);
    }

    #[test]
    fn test_detect_low_frequency() {
        let detector = AmdfPitchDetector::new(44100.0, (50.0, 1500.0), 0.2).unwrap();
        let samples = generate_sine(82.41, 44100.0, 0.2); // E2

        let reading = detector.detect(&samples).expect("E2 should be detected");
        assert!((reading.frequency - 82.41).abs() < 1.0);
    }

    #[test]
    fn test_detect_ignores_dc_offset() {
        let detector = AmdfPitchDetector::new(44100.0, (50.0, 1500.0), 0.2).unwrap();
        let samples: Vec<f32> = generate_sine(440.0, 44100.0, 0.1)
            .into_iter()
            .map(|s| s + 0.75)
            .collect();

        let reading = detector.detect(&samples).expect("offset sine still periodic");
        assert!((reading.frequency - 440.0).abs() < 1.0);
    }

    #[test]
    fn test_detect_scale_invariant() {
        let detector = AmdfPitchDetector::new(44100.0, (50.0, 1500.0), 0.2).unwrap();
        let quiet: Vec<f32> = generate_sine(440.0, 44100.0, 0.1)
            .into_iter()
            .map(|s| s * 0.01)
            .collect();

        let reading = detector.detect(&quiet).expect("gain must not matter");
        assert!((reading.frequency - 440.0).abs() < 1.0);
    }

    #[test]
    fn test_silence_not_detected() {
        let detector = AmdfPitchDetector::new(44100.0, (50.0, 1500.0), 0.2).unwrap();
        assert!(detector.detect(&vec![0.0; 4096]).is_none());
    }

    #[test]
    fn test_noise_not_detected() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let noise: Vec<f32> = (0..4096).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let detector = AmdfPitchDetector::new(44100.0, (50.0, 1500.0), 0.2).unwrap();
        assert!(detector.detect(&noise).is_none());
    }

    #[test]
    fn test_short_buffer_not_detected() {
        let detector = AmdfPitchDetector::new(44100.0, (50.0, 1500.0), 0.2).unwrap();
        let samples = generate_sine(440.0, 44100.0, 0.005); // ~220 samples
        assert!(detector.detect(&samples).is_none());
    }

    #[test]
    fn test_constructor_rejects_bad_arguments() {
        assert!(AmdfPitchDetector::new(0.0, (50.0, 1500.0), 0.2).is_err());
        assert!(AmdfPitchDetector::new(44100.0, (1500.0, 50.0), 0.2).is_err());
        assert!(AmdfPitchDetector::new(44100.0, (0.0, 1500.0), 0.2).is_err());
        assert!(AmdfPitchDetector::new(44100.0, (50.0, 1500.0), 0.0).is_err());
        assert!(AmdfPitchDetector::new(44100.0, (50.0, 1500.0), 1.0).is_err());
    }
}
