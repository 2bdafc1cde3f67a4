use anyhow::{bail, Result};
use log::debug;

use super::refine_parabolic;
use crate::spectrum::from_db;
use crate::types::PitchReading;

/// Frequency-domain pitch detector: strongest FFT bin in a target range,
/// refined to sub-bin precision.
///
/// The peak is located on linear amplitudes but refined on the dB values,
/// where the main lobe of a windowed tone is close to parabolic and the
/// interpolation bias is far smaller.
pub struct SpectralPitchDetector {
    bin_width: f32,
    range_hz: (f32, f32),
    noise_floor: f32,
}

impl SpectralPitchDetector {
    pub fn new(
        sample_rate: f32,
        fft_size: usize,
        range_hz: (f32, f32),
        noise_floor: f32,
    ) -> Result<Self> {
        if sample_rate <= 0.0 || !sample_rate.is_finite() {
            bail!("sample_rate must be positive, got {}", sample_rate);
        }
        if fft_size < 2 {
            bail!("fft_size must be at least 2, got {}", fft_size);
        }
        if range_hz.0 <= 0.0 || range_hz.1 <= range_hz.0 {
            bail!(
                "frequency range must be increasing and positive, got ({}, {})",
                range_hz.0,
                range_hz.1
            );
        }
        if noise_floor < 0.0 {
            bail!("noise_floor must be non-negative, got {}", noise_floor);
        }

        Ok(Self {
            bin_width: sample_rate / fft_size as f32,
            range_hz,
            noise_floor,
        })
    }

    /// Detect the dominant frequency in a dB-scaled magnitude spectrum.
    ///
    /// Returns `None` when the search range has no bins or the strongest
    /// in-range component sits below the noise floor.
    pub fn detect_db(&self, db_magnitudes: &[f32]) -> Option<PitchReading> {
        if db_magnitudes.is_empty() {
            return None;
        }

        let lo_bin = ((self.range_hz.0 / self.bin_width).ceil() as usize).max(1);
        let hi_bin = ((self.range_hz.1 / self.bin_width).floor() as usize)
            .min(db_magnitudes.len() - 1);
        if lo_bin > hi_bin {
            return None;
        }

        let linear: Vec<f32> = db_magnitudes[lo_bin..=hi_bin]
            .iter()
            .map(|&db| from_db(db))
            .collect();

        let (offset, &peak_amplitude) = linear
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))?;
        if peak_amplitude < self.noise_floor {
            debug!(
                "spectral peak {:.5} below noise floor {:.5}, no pitch",
                peak_amplitude, self.noise_floor
            );
            return None;
        }

        let peak_bin = lo_bin + offset;
        let refined_bin = refine_parabolic(db_magnitudes, peak_bin);
        let frequency = refined_bin * self.bin_width;
        if !(self.range_hz.0..=self.range_hz.1).contains(&frequency) {
            return None;
        }

        let mean = linear.iter().sum::<f32>() / linear.len() as f32;
        let confidence = (1.0 - mean / peak_amplitude).clamp(0.0, 1.0);

        debug!(
            "spectral pitch {:.2} Hz (bin {:.2}, confidence {:.2})",
            frequency, refined_bin, confidence
        );

        Some(PitchReading {
            frequency,
            confidence,
        })
    }

    pub fn bin_width(&self) -> f32 {
        self.bin_width
    }
}
