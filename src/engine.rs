use anyhow::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::AnalysisConfig;
use crate::note::NoteMapper;
use crate::pitch::{AmdfPitchDetector, NoteStability, SpectralPitchDetector};
use crate::types::{DetectedNote, PitchReading};

/// One frame of host-supplied input: either raw samples or a precomputed
/// dB-scaled magnitude spectrum.
#[derive(Debug, Clone, Copy)]
pub enum FrameInput<'a> {
    Samples {
        samples: &'a [f32],
        sample_rate: f32,
    },
    Spectrum {
        db_magnitudes: &'a [f32],
        sample_rate: f32,
        fft_size: usize,
    },
}

/// Result of one analysis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Raw pitch estimate for this frame, if any
    pub pitch: Option<PitchReading>,
    /// Stability-filtered note, surfaced only after enough consecutive
    /// frames agree
    pub note: Option<DetectedNote>,
    /// RMS level of the frame (0 for spectrum input)
    pub rms: f32,
}

/// Per-frame analysis driven by an external tick.
///
/// `analyze_once` is one synchronous, non-blocking step; it never sleeps or
/// schedules. The host owns the loop and decides whether to schedule the
/// next step, typically by checking a [`Generation`].
pub struct AnalysisEngine {
    config: AnalysisConfig,
    mapper: NoteMapper,
    stability: NoteStability,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let mapper = NoteMapper::new(config.reference_a4)?;
        let stability = NoteStability::new(config.stability_cycles)?;

        info!(
            "analysis engine ready: pitch range {:?} Hz, {} stability cycles",
            config.pitch_range_hz, config.stability_cycles
        );

        Ok(Self {
            config,
            mapper,
            stability,
        })
    }

    /// Run one analysis step over a single frame.
    ///
    /// Time-domain input goes through the AMDF strategy, spectral input
    /// through the FFT-bin strategy; both feed the same stability filter.
    pub fn analyze_once(&mut self, input: FrameInput<'_>) -> Result<FrameAnalysis> {
        let (pitch, rms) = match input {
            FrameInput::Samples {
                samples,
                sample_rate,
            } => {
                let detector = AmdfPitchDetector::new(
                    sample_rate,
                    self.config.pitch_range_hz,
                    self.config.amdf_threshold,
                )?;
                (detector.detect(samples), rms_level(samples))
            }
            FrameInput::Spectrum {
                db_magnitudes,
                sample_rate,
                fft_size,
            } => {
                let detector = SpectralPitchDetector::new(
                    sample_rate,
                    fft_size,
                    self.config.spectral_range_hz,
                    self.config.noise_floor,
                )?;
                (detector.detect_db(db_magnitudes), 0.0)
            }
        };

        let note = self.stability.observe(pitch.as_ref(), &self.mapper);
        if let Some(ref note) = note {
            debug!("stable note {} ({:.2} Hz)", note.note_name, note.frequency);
        }

        Ok(FrameAnalysis { pitch, note, rms })
    }

    /// Drop debounce state, e.g. when the host starts a new session.
    pub fn reset(&mut self) {
        self.stability.reset();
    }
}

/// RMS level of a sample buffer.
pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

/// Monotonically increasing run counter for cancelling scheduled analysis.
///
/// The host begins a run, captures the returned generation in whatever it
/// schedules, and checks `is_current` once per tick: a stale generation
/// means "do not schedule the next step". Stopping is `cancel()`, a
/// synchronous bump that orphans every outstanding generation. The counter
/// is atomic so a host may observe it from another thread; the analysis
/// state itself stays on one.
#[derive(Debug, Default)]
pub struct Generation {
    current: AtomicU64,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run, invalidating all previous generations.
    pub fn begin(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `generation` is still the active run.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current.load(Ordering::SeqCst) == generation
    }

    /// Invalidate the active run without starting a new one.
    pub fn cancel(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}
