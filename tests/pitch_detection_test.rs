
use signal_generator::{composite_samples, db_spectrum, noise_samples, sine_samples};
use sound_analysis::note::NoteMapper;
use sound_analysis::pitch::{AmdfPitchDetector, SpectralPitchDetector};

const SAMPLE_RATE: f32 = 44100.0;

#[test]
fn test_amdf_precision_on_a440() {
    let _ = env_logger::builder().is_test(true).try_init();

    let detector = AmdfPitchDetector::new(SAMPLE_RATE, (50.0, 1500.0), 0.2).unwrap();
    let samples = sine_samples(440.0, SAMPLE_RATE, 0.1);

    let reading = detector.detect(&samples).expect("clean sine");
    assert!(
        (reading.frequency - 440.0).abs() <= 1.0,
        "AMDF frequency {} out of ±1 Hz",
        reading.frequency
    );

    let mapper = NoteMapper::new(440.0).unwrap();
    let named = mapper.identify_note(reading.frequency).unwrap();
    assert_eq!(named.note_name, "A4");
    assert!(named.cents.abs() <= 5, "cents {}", named.cents);
}

#[test]
fn test_spectral_precision_on_a440() {
    let fft_size = 8192;
    let detector =
        SpectralPitchDetector::new(SAMPLE_RATE, fft_size, (20.0, 2000.0), 1e-3).unwrap();
    let samples = sine_samples(440.0, SAMPLE_RATE, 0.2);
    let spectrum = db_spectrum(&samples[..fft_size], SAMPLE_RATE);

    let reading = detector.detect_db(&spectrum).expect("clean sine");
    assert!(
        (reading.frequency - 440.0).abs() <= 1.0,
        "spectral frequency {} out of ±1 Hz",
        reading.frequency
    );

    let mapper = NoteMapper::new(440.0).unwrap();
    let named = mapper.identify_note(reading.frequency).unwrap();
    assert_eq!(named.note_name, "A4");
    assert!(named.cents.abs() <= 5, "cents {}", named.cents);
}

#[test]
fn test_strategies_agree_across_frequencies() {
    let fft_size = 8192;
    let amdf = AmdfPitchDetector::new(SAMPLE_RATE, (50.0, 1500.0), 0.2).unwrap();
    let spectral =
        SpectralPitchDetector::new(SAMPLE_RATE, fft_size, (20.0, 2000.0), 1e-3).unwrap();

    for target in [110.0f32, 220.0, 329.63, 523.25, 880.0] {
        let samples = sine_samples(target, SAMPLE_RATE, 0.2);

        let time_reading = amdf.detect(&samples).expect("time-domain detection");
        let freq_reading = spectral
            .detect_db(&db_spectrum(&samples[..fft_size], SAMPLE_RATE))
            .expect("frequency-domain detection");

        assert!(
            (time_reading.frequency - target).abs() <= target * 0.01,
            "AMDF {} for target {}",
            time_reading.frequency,
            target
        );
        assert!(
            (freq_reading.frequency - target).abs() <= target * 0.01,
            "spectral {} for target {}",
            freq_reading.frequency,
            target
        );
    }
}

#[test]
fn test_fundamental_found_despite_strong_harmonics() {
    // Plucked-string-like spectrum: fundamental plus strong overtones
    let detector = AmdfPitchDetector::new(SAMPLE_RATE, (50.0, 1500.0), 0.2).unwrap();
    let samples = composite_samples(
        &[(220.0, 1.0), (440.0, 0.6), (660.0, 0.4), (880.0, 0.2)],
        SAMPLE_RATE,
        0.2,
    );

    let reading = detector.detect(&samples).expect("harmonic-rich tone");
    assert!(
        (reading.frequency - 220.0).abs() < 2.0,
        "expected the 220 Hz fundamental, got {}",
        reading.frequency
    );
}

#[test]
fn test_silence_is_not_detected() {
    let amdf = AmdfPitchDetector::new(SAMPLE_RATE, (50.0, 1500.0), 0.2).unwrap();
    let spectral =
        SpectralPitchDetector::new(SAMPLE_RATE, 8192, (20.0, 2000.0), 1e-3).unwrap();

    let silence = vec![0.0f32; 8192];
    assert!(amdf.detect(&silence).is_none());
    assert!(spectral.detect_db(&db_spectrum(&silence, SAMPLE_RATE)).is_none());
}

#[test]
fn test_noise_is_not_detected_by_amdf() {
    let detector = AmdfPitchDetector::new(SAMPLE_RATE, (50.0, 1500.0), 0.2).unwrap();

    for seed in [1, 2, 3] {
        let noise = noise_samples(8192, seed);
        assert!(
            detector.detect(&noise).is_none(),
            "uncorrelated noise must not yield a pitch (seed {})",
            seed
        );
    }
}
