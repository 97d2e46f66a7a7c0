//! The shared test tone.

use std::f64::consts::TAU;

use thiserror::Error;
use tracing::{debug, error};

use crate::backend::{AlError, AudioBackend, BufferFormat, BufferId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaveformError {
    #[error("backend did not allocate a buffer")]
    NoBuffer,
    #[error("OpenAL error: {0}")]
    Backend(#[from] AlError),
}

/// Full-scale 16-bit sine: `sin(i / sample_rate * frequency * 2π) * 32767`,
/// truncated toward zero.
pub fn sine_samples(length: usize, sample_rate: u32, frequency: f64) -> Vec<i16> {
    (0..length)
        .map(|i| {
            let phase = i as f64 / f64::from(sample_rate) * frequency * TAU;
            (phase.sin() * 32767.0) as i16
        })
        .collect()
}

/// Generate the tone and upload it into a new mono 16-bit buffer.
///
/// If the backend flags an error after the upload, the buffer is deleted
/// before the error is returned.
pub fn create_sine_wave<B: AudioBackend + ?Sized>(
    backend: &mut B,
    length: usize,
    sample_rate: u32,
    frequency: f64,
) -> Result<BufferId, WaveformError> {
    let data = sine_samples(length, sample_rate, frequency);

    let buffer = backend
        .gen_buffers(1)
        .first()
        .copied()
        .unwrap_or(BufferId::NONE);
    backend.buffer_data(buffer, BufferFormat::Mono16, &data, sample_rate);

    if let Some(err) = backend.get_error() {
        error!("OpenAL Error: {err}");
        if buffer != BufferId::NONE && backend.is_buffer(buffer) {
            backend.delete_buffers(&[buffer]);
        }
        return Err(err.into());
    }
    if buffer == BufferId::NONE {
        return Err(WaveformError::NoBuffer);
    }

    debug!(?buffer, length, sample_rate, frequency, "uploaded sine buffer");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_crossing() {
        let samples = sine_samples(4, 44_100, 1_000.0);
        assert_eq!(samples[0], 0);
        assert!(samples[1] > 0);
    }

    #[test]
    fn matches_truncated_formula() {
        let samples = sine_samples(22_050, 44_100, 1_000.0);
        assert_eq!(samples.len(), 22_050);
        for (i, &s) in samples.iter().enumerate() {
            let expected = ((i as f64 / 44_100.0 * 1_000.0 * TAU).sin() * 32767.0).trunc() as i16;
            assert_eq!(s, expected, "sample {i}");
        }
    }

    #[test]
    fn quarter_period_peaks_near_full_scale() {
        // 44.1 samples per period at 1 kHz, so sample 11 sits just past the peak.
        let samples = sine_samples(12, 44_100, 1_000.0);
        assert!(samples[11] > 32_700);
    }

    #[test]
    fn stays_within_signed_range() {
        let samples = sine_samples(44_100, 44_100, 1_000.0);
        assert!(samples.iter().all(|&s| (-32767..=32767).contains(&s)));
    }

    #[test]
    fn spectrum_peaks_at_tone_frequency() {
        use rustfft::{num_complex::Complex, FftPlanner};

        // 4410 samples hold exactly 100 periods of 1 kHz.
        let mut spectrum: Vec<Complex<f64>> = sine_samples(4_410, 44_100, 1_000.0)
            .into_iter()
            .map(|s| Complex::new(f64::from(s), 0.0))
            .collect();
        FftPlanner::<f64>::new()
            .plan_fft_forward(spectrum.len())
            .process(&mut spectrum);

        let peak = spectrum[1..spectrum.len() / 2]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .map(|(i, _)| i + 1)
            .unwrap();
        assert_eq!(peak, 100);
    }
}
