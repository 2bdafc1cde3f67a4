use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Frequency search range for time-domain pitch detection (Hz)
    #[serde(default = "default_pitch_range")]
    pub pitch_range_hz: (f32, f32),

    /// Frequency search range for spectral pitch detection (Hz)
    #[serde(default = "default_spectral_range")]
    pub spectral_range_hz: (f32, f32),

    /// Normalized AMDF value above which a period candidate is rejected
    #[serde(default = "default_amdf_threshold")]
    pub amdf_threshold: f32,

    /// Linear amplitude below which a spectral peak is treated as noise
    #[serde(default = "default_noise_floor")]
    pub noise_floor: f32,

    /// Minimum distance between accepted spectral peaks (Hz)
    #[serde(default = "default_min_separation")]
    pub min_separation_hz: f32,

    /// Maximum number of spectral peaks to report
    #[serde(default = "default_max_peaks")]
    pub max_peaks: usize,

    /// Consecutive cycles a note must repeat before it is surfaced
    #[serde(default = "default_stability_cycles")]
    pub stability_cycles: usize,

    /// Reference frequency for A4 (Hz)
    #[serde(default = "default_reference_a4")]
    pub reference_a4: f32,

    /// Capacity of the reconstruction cache (entries)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_pitch_range() -> (f32, f32) {
    (50.0, 1500.0)
}

fn default_spectral_range() -> (f32, f32) {
    (20.0, 2000.0)
}

fn default_amdf_threshold() -> f32 {
    0.2
}

fn default_noise_floor() -> f32 {
    1e-3
}

fn default_min_separation() -> f32 {
    5.0
}

fn default_max_peaks() -> usize {
    5
}

fn default_stability_cycles() -> usize {
    3
}

fn default_reference_a4() -> f32 {
    440.0
}

fn default_cache_capacity() -> usize {
    32
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pitch_range_hz: default_pitch_range(),
            spectral_range_hz: default_spectral_range(),
            amdf_threshold: default_amdf_threshold(),
            noise_floor: default_noise_floor(),
            min_separation_hz: default_min_separation(),
            max_peaks: default_max_peaks(),
            stability_cycles: default_stability_cycles(),
            reference_a4: default_reference_a4(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        for (label, (lo, hi)) in [
            ("pitch_range_hz", self.pitch_range_hz),
            ("spectral_range_hz", self.spectral_range_hz),
        ] {
            if lo <= 0.0 || !lo.is_finite() || !hi.is_finite() {
                anyhow::bail!("{} must be positive and finite, got ({}, {})", label, lo, hi);
            }
            if hi <= lo {
                anyhow::bail!("{} must be an increasing range, got ({}, {})", label, lo, hi);
            }
        }

        if self.amdf_threshold <= 0.0 || self.amdf_threshold >= 1.0 {
            anyhow::bail!(
                "amdf_threshold must be in (0, 1), got {}",
                self.amdf_threshold
            );
        }

        if self.noise_floor < 0.0 {
            anyhow::bail!("noise_floor must be non-negative, got {}", self.noise_floor);
        }

        if self.min_separation_hz < 0.0 {
            anyhow::bail!(
                "min_separation_hz must be non-negative, got {}",
                self.min_separation_hz
            );
        }

        if self.max_peaks == 0 {
            anyhow::bail!("max_peaks must be at least 1");
        }

        if self.stability_cycles == 0 {
            anyhow::bail!("stability_cycles must be at least 1");
        }

        if self.reference_a4 <= 0.0 {
            anyhow::bail!("reference_a4 must be positive, got {}", self.reference_a4);
        }

        if self.cache_capacity == 0 {
            anyhow::bail!("cache_capacity must be at least 1");
        }

        Ok(())
    }
}
