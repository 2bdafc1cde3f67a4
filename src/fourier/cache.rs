use lru::LruCache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;

use crate::types::{FourierCoefficients, WavePoint};

/// Cache key fingerprinting one reconstruction request.
///
/// The digest covers `a0` and every coefficient that participates in the
/// reconstruction (`a[..used]`, `b[..used]`), never a shorter prefix, so two
/// coefficient sets that differ in any used harmonic cannot alias. Sets that
/// differ only beyond `used` reconstruct identically and intentionally share
/// an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ReconstructionKey {
    duration_bits: u32,
    frequency_bits: u32,
    sample_rate_bits: u32,
    num_harmonics: usize,
    coefficient_digest: u64,
}

impl ReconstructionKey {
    pub fn new(
        coeffs: &FourierCoefficients,
        duration: f32,
        frequency: f32,
        num_harmonics: usize,
        sample_rate: f32,
    ) -> Self {
        // Mirrors the truncation rule used during synthesis
        let used = num_harmonics.min(coeffs.a.len()).min(coeffs.b.len());

        let mut hasher = DefaultHasher::new();
        coeffs.a0.to_bits().hash(&mut hasher);
        for &value in &coeffs.a[..used] {
            value.to_bits().hash(&mut hasher);
        }
        for &value in &coeffs.b[..used] {
            value.to_bits().hash(&mut hasher);
        }

        Self {
            duration_bits: duration.to_bits(),
            frequency_bits: frequency.to_bits(),
            sample_rate_bits: sample_rate.to_bits(),
            num_harmonics,
            coefficient_digest: hasher.finish(),
        }
    }
}

/// Bounded LRU store for reconstructed waves.
pub(crate) struct ReconstructionCache {
    entries: LruCache<ReconstructionKey, Vec<WavePoint>>,
}

impl ReconstructionCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("max(1) is non-zero");
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Returns the cached wave for `key`, computing and inserting it on miss.
    pub fn get_or_compute<F>(&mut self, key: ReconstructionKey, compute: F) -> &Vec<WavePoint>
    where
        F: FnOnce() -> Vec<WavePoint>,
    {
        if !self.entries.contains(&key) {
            self.entries.put(key, compute());
        }
        self.entries
            .get(&key)
            .expect("entry exists: just checked or inserted")
    }

    pub fn contains(&self, key: &ReconstructionKey) -> bool {
        self.entries.contains(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coeffs(a: Vec<f32>, b: Vec<f32>) -> FourierCoefficients {
        FourierCoefficients { a0: 0.0, a, b }
    }

    #[test]
    fn test_key_ignores_unused_harmonics() {
        let short = coeffs(vec![1.0, 2.0], vec![0.5, 0.5]);
        let long = coeffs(vec![1.0, 2.0, 99.0], vec![0.5, 0.5, 42.0]);

        // Only the first 2 harmonics are used; the extra ones don't matter
        let k1 = ReconstructionKey::new(&short, 0.01, 440.0, 2, 44100.0);
        let k2 = ReconstructionKey::new(&long, 0.01, 440.0, 2, 44100.0);
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_key_sensitive_to_used_harmonics() {
        let a = coeffs(vec![1.0, 2.0, 3.0], vec![0.0, 0.0, 0.0]);
        let b = coeffs(vec![1.0, 2.0, 3.5], vec![0.0, 0.0, 0.0]);

        // Harmonic 3 is used, so a differing third coefficient must split keys
        let ka = ReconstructionKey::new(&a, 0.01, 440.0, 3, 44100.0);
        let kb = ReconstructionKey::new(&b, 0.01, 440.0, 3, 44100.0);
        assert_ne!(ka, kb);
    }

    #[test]
    fn test_key_sensitive_to_request_parameters() {
        let c = coeffs(vec![1.0], vec![1.0]);
        let base = ReconstructionKey::new(&c, 0.01, 440.0, 1, 44100.0);

        assert_ne!(base, ReconstructionKey::new(&c, 0.02, 440.0, 1, 44100.0));
        assert_ne!(base, ReconstructionKey::new(&c, 0.01, 441.0, 1, 44100.0));
        assert_ne!(base, ReconstructionKey::new(&c, 0.01, 440.0, 1, 48000.0));
    }

    #[test]
    fn test_get_or_compute_memoizes() {
        let mut cache = ReconstructionCache::new(4);
        let c = coeffs(vec![1.0], vec![0.0]);
        let key = ReconstructionKey::new(&c, 0.01, 440.0, 1, 44100.0);

        let mut computes = 0;
        cache.get_or_compute(key, || {
            computes += 1;
            vec![WavePoint::new(0.0, 1.0)]
        });
        cache.get_or_compute(key, || {
            computes += 1;
            vec![WavePoint::new(0.0, 2.0)]
        });

        assert_eq!(computes, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = ReconstructionCache::new(2);
        let c = coeffs(vec![1.0], vec![0.0]);

        let keys: Vec<_> = (1..=3)
            .map(|n| ReconstructionKey::new(&c, 0.01 * n as f32, 440.0, 1, 44100.0))
            .collect();

        for &key in &keys {
            cache.get_or_compute(key, Vec::new);
        }

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&keys[0]));
        assert!(cache.contains(&keys[1]));
        assert!(cache.contains(&keys[2]));
    }

    #[test]
    fn test_clear() {
        let mut cache = ReconstructionCache::new(4);
        let c = coeffs(vec![1.0], vec![0.0]);
        let key = ReconstructionKey::new(&c, 0.01, 440.0, 1, 44100.0);

        cache.get_or_compute(key, Vec::new);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
