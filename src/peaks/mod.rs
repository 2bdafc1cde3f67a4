use anyhow::{bail, Result};
use log::debug;

use crate::note::{NoteMapper, NoteTable};
use crate::types::{DetectedNote, SpectralPoint};

/// Spectra longer than this use the tighter noise-floor factor.
const LARGE_SPECTRUM_LEN: usize = 1000;
const THRESHOLD_FACTOR_LARGE: f32 = 0.05;
const THRESHOLD_FACTOR_SMALL: f32 = 0.10;

/// Extracts prominent peaks from a magnitude spectrum and labels each with
/// its nearest note from a host-supplied table.
pub struct SpectralPeakDetector {
    bin_width: f32,
    min_separation_hz: f32,
    max_peaks: usize,
    mapper: NoteMapper,
}

impl SpectralPeakDetector {
    pub fn new(
        sample_rate: f32,
        fft_size: usize,
        min_separation_hz: f32,
        max_peaks: usize,
        mapper: NoteMapper,
    ) -> Result<Self> {
        if sample_rate <= 0.0 || !sample_rate.is_finite() {
            bail!("sample_rate must be positive, got {}", sample_rate);
        }
        if fft_size < 2 {
            bail!("fft_size must be at least 2, got {}", fft_size);
        }
        if min_separation_hz < 0.0 {
            bail!(
                "min_separation_hz must be non-negative, got {}",
                min_separation_hz
            );
        }
        if max_peaks == 0 {
            bail!("max_peaks must be at least 1");
        }

        Ok(Self {
            bin_width: sample_rate / fft_size as f32,
            min_separation_hz,
            max_peaks,
            mapper,
        })
    }

    /// Find the strongest spectral peaks and label them as notes.
    ///
    /// Candidates must exceed an adaptive noise threshold and be strict
    /// local maxima. De-duplication is a streaming rule: a candidate within
    /// `min_separation_hz` of the last *accepted* peak is dropped, in
    /// ascending-frequency scan order. Survivors are ranked by amplitude,
    /// truncated to `max_peaks`, then re-sorted by frequency for stable
    /// display ordering.
    pub fn find_peaks(
        &self,
        spectrum: &[SpectralPoint],
        table: &NoteTable,
    ) -> Result<Vec<DetectedNote>> {
        if spectrum.len() < 3 {
            return Ok(Vec::new());
        }

        let max_amplitude = spectrum
            .iter()
            .map(|p| p.amplitude)
            .fold(0.0f32, f32::max);
        if max_amplitude <= 0.0 {
            return Ok(Vec::new());
        }

        let factor = if spectrum.len() > LARGE_SPECTRUM_LEN {
            THRESHOLD_FACTOR_LARGE
        } else {
            THRESHOLD_FACTOR_SMALL
        };
        let threshold = max_amplitude * factor;

        let mut accepted: Vec<(f32, f32)> = Vec::new();
        let mut last_accepted_freq: Option<f32> = None;

        for i in 1..spectrum.len() - 1 {
            let current = spectrum[i].amplitude;
            if current <= threshold
                || current <= spectrum[i - 1].amplitude
                || current <= spectrum[i + 1].amplitude
            {
                continue;
            }

            let frequency = self.frequency_of(&spectrum[i]);
            if let Some(last) = last_accepted_freq {
                if (frequency - last).abs() < self.min_separation_hz {
                    continue;
                }
            }

            accepted.push((frequency, current));
            last_accepted_freq = Some(frequency);
        }

        // Strongest first, cap the count, then back to frequency order
        accepted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        accepted.truncate(self.max_peaks);
        accepted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        debug!(
            "{} spectral peaks above threshold {:.4}",
            accepted.len(),
            threshold
        );

        accepted
            .into_iter()
            .map(|(frequency, amplitude)| {
                let named = self.mapper.nearest_in_table(frequency, table)?;
                Ok(DetectedNote {
                    note_name: named.note_name,
                    cents: named.cents,
                    frequency,
                    amplitude: Some(amplitude),
                })
            })
            .collect()
    }

    fn frequency_of(&self, point: &SpectralPoint) -> f32 {
        point
            .frequency
            .unwrap_or(point.harmonic as f32 * self.bin_width)
    }
}
