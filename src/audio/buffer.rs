//! Audio buffer implementation
//!
//! AudioBuffer holds one channel of samples together with its sample rate.
//! Buffers are treated as immutable once a stage hands them on; stages
//! allocate new buffers rather than writing into their inputs.

use crate::error::{MixError, Result};

/// Mono audio sample data with its sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Samples, nominally in -1.0..1.0
    samples: Vec<f32>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new audio buffer, rejecting empty data and a zero sample rate
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(MixError::invalid("sample_rate", sample_rate, "> 0 Hz"));
        }
        if samples.is_empty() {
            return Err(MixError::invalid("buffer", "0 samples", "at least one sample"));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Wrap already-validated output of a processing stage.
    /// Stage outputs may legitimately be empty (e.g. a splice of two empty tails).
    pub(crate) fn from_stage(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a silent buffer with the given duration
    pub fn silence(duration_secs: f64, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f64) as usize;
        Self {
            samples: vec![0.0; num_samples],
            sample_rate,
        }
    }

    /// Create a sine wave test tone
    pub fn sine_wave(frequency: f64, amplitude: f32, duration_secs: f64, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f64) as usize;
        let samples = (0..num_samples)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
            })
            .collect();

        Self {
            samples,
            sample_rate,
        }
    }

    /// Get a reference to the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Consume the buffer, returning its samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Convert a time in seconds to a sample index (`floor(t * sr)`), clamped to the buffer
    pub fn index_at(&self, time_secs: f64) -> usize {
        seconds_to_samples(time_secs, self.sample_rate).min(self.samples.len())
    }

    /// Whether every sample is exactly zero
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }

    /// Check that no sample is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.samples.iter().all(|s| s.is_finite())
    }

    /// Fail with `InvalidParameter` if the buffer cannot enter a processing stage
    pub fn ensure_processable(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(MixError::invalid("sample_rate", self.sample_rate, "> 0 Hz"));
        }
        if self.samples.is_empty() {
            return Err(MixError::invalid("buffer", "0 samples", "at least one sample"));
        }
        Ok(())
    }

    /// Fail with `SampleRateMismatch` unless both buffers share a sample rate
    pub fn ensure_same_rate(&self, other: &AudioBuffer) -> Result<()> {
        if self.sample_rate != other.sample_rate {
            return Err(MixError::SampleRateMismatch {
                expected: self.sample_rate,
                actual: other.sample_rate,
            });
        }
        Ok(())
    }

    /// Check if buffers are approximately equal within tolerance
    pub fn is_approx_equal(&self, other: &AudioBuffer, tolerance: f32) -> bool {
        self.sample_rate == other.sample_rate
            && self.samples.len() == other.samples.len()
            && self
                .samples
                .iter()
                .zip(other.samples.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

/// `floor(t * sr)` for non-negative times; negative times map to 0
pub fn seconds_to_samples(time_secs: f64, sample_rate: u32) -> usize {
    if time_secs <= 0.0 {
        0
    } else {
        (time_secs * sample_rate as f64).floor() as usize
    }
}
