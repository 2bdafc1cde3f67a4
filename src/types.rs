use serde::{Deserialize, Serialize};

/// One sample of a time-domain signal.
///
/// Sequences of wave points are always ordered ascending by `t` and treated
/// as immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavePoint {
    /// Time in seconds
    pub t: f32,
    /// Amplitude at `t`
    pub value: f32,
    /// Fundamental frequency of the signal this point belongs to, if known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub frequency: Option<f32>,
}

impl WavePoint {
    pub fn new(t: f32, value: f32) -> Self {
        Self {
            t,
            value,
            frequency: None,
        }
    }

    pub fn with_frequency(t: f32, value: f32, frequency: f32) -> Self {
        Self {
            t,
            value,
            frequency: Some(frequency),
        }
    }
}

/// Fourier series coefficients of a periodic signal.
///
/// `a` holds the cosine terms and `b` the sine terms; index `i` (0-based)
/// represents harmonic `i + 1`. `a.len() == b.len()` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FourierCoefficients {
    /// DC offset (mean of the signal)
    pub a0: f32,
    /// Cosine coefficients, one per harmonic
    pub a: Vec<f32>,
    /// Sine coefficients, one per harmonic
    pub b: Vec<f32>,
}

impl FourierCoefficients {
    /// All-zero coefficient set for `max_harmonics` harmonics.
    pub fn zeros(max_harmonics: usize) -> Self {
        Self {
            a0: 0.0,
            a: vec![0.0; max_harmonics],
            b: vec![0.0; max_harmonics],
        }
    }

    /// Number of harmonics represented.
    pub fn harmonics(&self) -> usize {
        self.a.len()
    }
}

/// One bin of a magnitude spectrum, ordered ascending by `harmonic`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPoint {
    /// Bin index
    pub harmonic: usize,
    /// Center frequency of the bin, if known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub frequency: Option<f32>,
    /// Linear amplitude, non-negative
    pub amplitude: f32,
    /// Phase in radians
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub phase: Option<f32>,
}

/// A musical note identified from a frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedNote {
    /// Note name with octave, e.g. "A4"
    pub note_name: String,
    /// Deviation from the note's reference frequency in cents
    pub cents: i32,
    /// The measured frequency in Hz
    pub frequency: f32,
    /// Amplitude of the component this note was derived from, if any
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub amplitude: Option<f32>,
}

/// Outcome of comparing a reconstructed signal against its original.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyResult {
    /// Mean squared error over the resampled overlap window
    pub mse: f32,
    /// Power-normalized accuracy in [0, 100]
    pub accuracy_percent: f32,
}

/// A raw pitch estimate from a single analysis cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchReading {
    /// Detected fundamental frequency in Hz
    pub frequency: f32,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_coefficients() {
        let coeffs = FourierCoefficients::zeros(8);
        assert_eq!(coeffs.a0, 0.0);
        assert_eq!(coeffs.a.len(), 8);
        assert_eq!(coeffs.b.len(), 8);
        assert_eq!(coeffs.harmonics(), 8);
        assert!(coeffs.a.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_wave_point_serialization() {
        let point = WavePoint::with_frequency(0.5, -0.25, 440.0);
        let json = serde_json::to_string(&point).unwrap();
        let back: WavePoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, point);

        // Absent frequency is omitted from the wire format
        let plain = WavePoint::new(0.0, 1.0);
        let json = serde_json::to_string(&plain).unwrap();
        assert!(!json.contains("frequency"));
    }

    #[test]
    fn test_detected_note_serialization() {
        let note = DetectedNote {
            note_name: "A4".to_string(),
            cents: -3,
            frequency: 439.2,
            amplitude: Some(0.8),
        };
        let json = serde_json::to_string(&note).unwrap();
        let back: DetectedNote = serde_json::from_str(&json).unwrap();
        assert_eq!(back, note);
    }
}
