//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;
use std::time::Duration;

use dhwani::Error;
use dhwani::voice::{
    SAMPLE_RATE, UtteranceDetector, UtteranceState, samples_to_wav, wait_for_utterance,
};

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

#[test]
fn test_detector_starts_idle() {
    let detector = UtteranceDetector::new();

    assert_eq!(detector.state(), UtteranceState::Idle);
    assert!(!detector.has_speech());
    assert!(!detector.is_complete());
}

#[test]
fn test_leading_silence_not_buffered() {
    let mut detector = UtteranceDetector::new();

    assert!(!detector.process(&generate_silence(1.0)));
    assert_eq!(detector.state(), UtteranceState::Idle);
    assert!(detector.buffer().is_empty());
}

#[test]
fn test_utterance_completes_after_pause() {
    let mut detector = UtteranceDetector::with_pause(Duration::from_millis(500));

    let speech = generate_sine_samples(440.0, 0.5, 0.3);
    assert!(!detector.process(&speech));
    assert_eq!(detector.state(), UtteranceState::Speaking);

    // Short pause keeps the utterance open
    assert!(!detector.process(&generate_silence(0.2)));

    let more_speech = generate_sine_samples(440.0, 0.3, 0.3);
    assert!(!detector.process(&more_speech));

    assert!(detector.process(&generate_silence(0.6)));
    assert_eq!(detector.state(), UtteranceState::Complete);
}

#[test]
fn test_short_burst_discarded() {
    let mut detector = UtteranceDetector::with_pause(Duration::from_millis(500));

    // 0.1s click is shorter than the minimum question length
    detector.process(&generate_sine_samples(440.0, 0.1, 0.5));
    assert_eq!(detector.state(), UtteranceState::Speaking);

    assert!(!detector.process(&generate_silence(0.6)));
    assert_eq!(detector.state(), UtteranceState::Idle);
    assert!(detector.buffer().is_empty());
}

#[test]
fn test_take_utterance_resets() {
    let mut detector = UtteranceDetector::with_pause(Duration::from_millis(500));

    let speech = generate_sine_samples(440.0, 0.5, 0.3);
    let silence = generate_silence(0.6);
    detector.process(&speech);
    detector.process(&silence);

    let taken = detector.take_utterance();
    assert_eq!(taken.len(), speech.len() + silence.len());

    assert_eq!(detector.state(), UtteranceState::Idle);
    assert!(detector.buffer().is_empty());
}

#[test]
fn test_complete_ignores_further_audio() {
    let mut detector = UtteranceDetector::with_pause(Duration::from_millis(500));

    detector.process(&generate_sine_samples(440.0, 0.5, 0.3));
    detector.process(&generate_silence(0.6));
    let len = detector.buffer().len();

    assert!(detector.process(&generate_sine_samples(440.0, 0.5, 0.3)));
    assert_eq!(detector.buffer().len(), len);
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    assert!(wav_data.len() > 44); // WAV header is 44 bytes
}

#[test]
fn test_wav_clamps_out_of_range() {
    let wav_data = samples_to_wav(&[2.0, -2.0, 0.0], SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read, vec![i16::MAX, i16::MIN, 0]);
}

/// One 100ms poll worth of samples at a constant level
fn poll_batch(level: f32) -> Vec<f32> {
    vec![level; SAMPLE_RATE as usize / 10]
}

#[tokio::test(start_paused = true)]
async fn test_wait_gives_up_on_silence() {
    let mut detector = UtteranceDetector::new();
    let mut polls = 0;

    let outcome = wait_for_utterance(&mut detector, Duration::from_secs(2), || {
        polls += 1;
        Ok(poll_batch(0.0))
    })
    .await
    .unwrap();

    assert!(outcome.is_none());
    assert!((20..=21).contains(&polls), "polled {polls} times");
}

#[tokio::test(start_paused = true)]
async fn test_wait_returns_early_on_complete_utterance() {
    let mut detector = UtteranceDetector::new();
    let mut polls = 0;

    // 0.5s of speech, then silence until the 0.8s pause closes it
    let outcome = wait_for_utterance(&mut detector, Duration::from_secs(15), || {
        polls += 1;
        Ok(poll_batch(if polls <= 5 { 0.5 } else { 0.0 }))
    })
    .await
    .unwrap();

    assert_eq!(polls, 13);
    let utterance = outcome.unwrap();
    assert_eq!(utterance.len(), 13 * poll_batch(0.0).len());
    assert_eq!(detector.state(), UtteranceState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_wait_keeps_speech_cut_off_by_timeout() {
    let mut detector = UtteranceDetector::new();
    let mut polls = 0;

    let outcome = wait_for_utterance(&mut detector, Duration::from_secs(1), || {
        polls += 1;
        Ok(poll_batch(0.5))
    })
    .await
    .unwrap();

    let utterance = outcome.unwrap();
    assert_eq!(utterance.len(), polls * poll_batch(0.5).len());
    assert!(utterance.iter().all(|&s| (s - 0.5).abs() < f32::EPSILON));
}

#[tokio::test(start_paused = true)]
async fn test_wait_propagates_source_error() {
    let mut detector = UtteranceDetector::new();

    let result = wait_for_utterance(&mut detector, Duration::from_secs(5), || {
        Err(Error::Audio("device unplugged".to_string()))
    })
    .await;

    assert!(matches!(result, Err(Error::Audio(_))));
}

#[tokio::test(start_paused = true)]
async fn test_wait_discards_earlier_state() {
    let mut detector = UtteranceDetector::new();
    detector.process(&poll_batch(0.5));
    assert!(detector.has_speech());

    let outcome = wait_for_utterance(&mut detector, Duration::from_millis(500), || {
        Ok(poll_batch(0.0))
    })
    .await
    .unwrap();

    assert!(outcome.is_none());
}
