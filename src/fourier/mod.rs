//! Fourier series decomposition and reconstruction.
//!
//! Decomposition approximates the continuous Fourier integrals with discrete
//! Riemann sums over the sampled wave. This is exact only when the sampled
//! window spans an integer number of periods of the fundamental; shorter or
//! misaligned windows introduce leakage, which is a documented limitation
//! and is not corrected here.

mod cache;

use anyhow::{bail, Result};
use log::debug;
use std::f32::consts::PI;

use crate::types::{FourierCoefficients, WavePoint};
use cache::{ReconstructionCache, ReconstructionKey};

pub struct FourierAnalyzer {
    cache: ReconstructionCache,
}

impl FourierAnalyzer {
    /// Create an analyzer with a bounded reconstruction cache.
    pub fn new(cache_capacity: usize) -> Result<Self> {
        if cache_capacity == 0 {
            bail!("cache_capacity must be at least 1");
        }
        Ok(Self {
            cache: ReconstructionCache::new(cache_capacity),
        })
    }

    /// Decompose a sampled periodic wave into harmonic coefficients.
    ///
    /// An empty wave degrades to all-zero coefficients; an invalid
    /// fundamental or a zero harmonic count is caller misuse and errors.
    pub fn decompose(
        &self,
        wave: &[WavePoint],
        fundamental: f32,
        max_harmonics: usize,
    ) -> Result<FourierCoefficients> {
        if fundamental <= 0.0 || !fundamental.is_finite() {
            bail!("fundamental frequency must be positive, got {}", fundamental);
        }
        if max_harmonics == 0 {
            bail!("max_harmonics must be at least 1");
        }

        if wave.is_empty() {
            return Ok(FourierCoefficients::zeros(max_harmonics));
        }

        let n = wave.len() as f64;
        let a0 = wave.iter().map(|p| p.value as f64).sum::<f64>() / n;

        let omega = 2.0 * std::f64::consts::PI * fundamental as f64;
        let mut a = Vec::with_capacity(max_harmonics);
        let mut b = Vec::with_capacity(max_harmonics);

        for harmonic in 1..=max_harmonics {
            let mut cos_sum = 0.0f64;
            let mut sin_sum = 0.0f64;
            for point in wave {
                let angle = omega * harmonic as f64 * point.t as f64;
                cos_sum += point.value as f64 * angle.cos();
                sin_sum += point.value as f64 * angle.sin();
            }
            a.push((2.0 * cos_sum / n) as f32);
            b.push((2.0 * sin_sum / n) as f32);
        }

        Ok(FourierCoefficients {
            a0: a0 as f32,
            a,
            b,
        })
    }

    /// Reconstruct a wave from a (possibly truncated) coefficient set.
    ///
    /// Repeated requests with the same parameters and the same used
    /// coefficients are served from the cache.
    pub fn reconstruct(
        &mut self,
        coeffs: &FourierCoefficients,
        duration: f32,
        frequency: f32,
        num_harmonics: usize,
        sample_rate: f32,
    ) -> Result<Vec<WavePoint>> {
        if duration <= 0.0 || !duration.is_finite() {
            bail!("duration must be positive, got {}", duration);
        }
        if frequency <= 0.0 || !frequency.is_finite() {
            bail!("frequency must be positive, got {}", frequency);
        }
        if sample_rate <= 0.0 || !sample_rate.is_finite() {
            bail!("sample_rate must be positive, got {}", sample_rate);
        }

        let key = ReconstructionKey::new(coeffs, duration, frequency, num_harmonics, sample_rate);
        if self.cache.contains(&key) {
            debug!(
                "reconstruction cache hit: {} harmonics at {} Hz",
                num_harmonics, frequency
            );
        }

        let wave = self.cache.get_or_compute(key, || {
            synthesize(coeffs, duration, frequency, num_harmonics, sample_rate)
        });
        Ok(wave.clone())
    }

    /// Drop all cached reconstructions, e.g. on session end or when the
    /// harmonic-count range changes.
    pub fn clear_cache(&mut self) {
        debug!("clearing {} cached reconstructions", self.cache.len());
        self.cache.clear();
    }
}

fn synthesize(
    coeffs: &FourierCoefficients,
    duration: f32,
    frequency: f32,
    num_harmonics: usize,
    sample_rate: f32,
) -> Vec<WavePoint> {
    let samples = (sample_rate * duration).floor() as usize;
    let used = num_harmonics.min(coeffs.a.len()).min(coeffs.b.len());
    let omega = 2.0 * PI * frequency;

    (0..samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            let mut value = coeffs.a0;
            for n in 1..=used {
                let angle = omega * n as f32 * t;
                value += coeffs.a[n - 1] * angle.cos() + coeffs.b[n - 1] * angle.sin();
            }
            WavePoint::with_frequency(t, value, frequency)
        })
        .collect()
}
