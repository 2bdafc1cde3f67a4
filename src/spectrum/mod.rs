use anyhow::{bail, Result};
use rustfft::{num_complex::Complex, FftPlanner};

use crate::types::SpectralPoint;

/// Value reported for the dB conversion of a zero magnitude.
pub const DB_FLOOR: f32 = -120.0;

/// Windowed FFT front-end producing magnitude spectra from time buffers.
///
/// The FFT planner caches plans across calls, so one analyzer should be
/// reused for a stream of equally sized frames.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f32>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Compute the half-spectrum of a frame: DC removal, Hann window,
    /// forward FFT, then per-bin magnitude, frequency, and phase.
    pub fn magnitude_spectrum(
        &mut self,
        samples: &[f32],
        sample_rate: f32,
    ) -> Result<Vec<SpectralPoint>> {
        if sample_rate <= 0.0 || !sample_rate.is_finite() {
            bail!("sample_rate must be positive, got {}", sample_rate);
        }
        if samples.len() < 2 {
            return Ok(Vec::new());
        }

        let n = samples.len();
        let mean = samples.iter().sum::<f32>() / n as f32;

        // Hann window to reduce spectral leakage
        let mut buffer: Vec<Complex<f32>> = samples
            .iter()
            .enumerate()
            .map(|(i, &sample)| {
                let window = 0.5
                    * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (n - 1) as f32).cos());
                Complex::new((sample - mean) * window, 0.0)
            })
            .collect();

        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let bin_width = sample_rate / n as f32;
        Ok(buffer
            .iter()
            .take(n / 2)
            .enumerate()
            .map(|(bin, c)| SpectralPoint {
                harmonic: bin,
                frequency: Some(bin as f32 * bin_width),
                amplitude: c.norm(),
                phase: Some(c.arg()),
            })
            .collect())
    }
}

/// Linear amplitude to decibels, with a floor for silence.
pub fn to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        DB_FLOOR
    } else {
        (20.0 * linear.log10()).max(DB_FLOOR)
    }
}

/// Decibels back to linear amplitude.
pub fn from_db(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}
