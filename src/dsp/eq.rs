//! Two-band shelving EQ
//!
//! Converts a linear (low, high) gain pair to dB, runs a 500 Hz low shelf and
//! then a 2 kHz high shelf over the block, and rescales the result to unit peak.

use super::shelf::{ShelfFilter, ShelfKind};
use crate::audio::levels::{calculate_peak, SILENCE_FLOOR_DB};
use crate::audio::AudioBuffer;
use crate::error::{MixError, Result};
use serde::{Deserialize, Serialize};

/// Low-shelf corner frequency in Hz
pub const LOW_SHELF_HZ: f64 = 500.0;

/// High-shelf corner frequency in Hz
pub const HIGH_SHELF_HZ: f64 = 2000.0;

/// Q factor shared by both shelves
pub const SHELF_Q: f64 = 1.0;

/// Smallest gain an automated band may reach
pub const GAIN_FLOOR: f64 = 0.01;

/// Linear gains for the low and high shelving bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainPair {
    pub low: f64,
    pub high: f64,
}

impl GainPair {
    /// Unity gain on both bands
    pub const UNITY: GainPair = GainPair {
        low: 1.0,
        high: 1.0,
    };

    /// Create a gain pair; both gains must be finite and non-negative
    pub fn new(low: f64, high: f64) -> Result<Self> {
        let pair = Self { low, high };
        pair.validate()?;
        Ok(pair)
    }

    pub fn validate(&self) -> Result<()> {
        for (param, value) in [("low_gain", self.low), ("high_gain", self.high)] {
            if !value.is_finite() || value < 0.0 {
                return Err(MixError::invalid(param, value, "finite and >= 0"));
            }
        }
        Ok(())
    }

    /// Clamp both bands to [`GAIN_FLOOR`]
    pub fn floored(self) -> Self {
        Self {
            low: self.low.max(GAIN_FLOOR),
            high: self.high.max(GAIN_FLOOR),
        }
    }

    /// Per-band `self + (to - self) * amount`
    pub fn lerp(self, to: GainPair, amount: f64) -> Self {
        Self {
            low: self.low + (to.low - self.low) * amount,
            high: self.high + (to.high - self.high) * amount,
        }
    }
}

impl From<(f64, f64)> for GainPair {
    fn from((low, high): (f64, f64)) -> Self {
        Self { low, high }
    }
}

/// Linear gain to dB; zero (or less) maps to the -100 dB attenuation floor
pub fn gain_to_db(gain: f64) -> f64 {
    if gain > 0.0 {
        20.0 * gain.log10()
    } else {
        SILENCE_FLOOR_DB
    }
}

/// Fixed-corner two-band EQ
#[derive(Debug, Clone, PartialEq)]
pub struct EqEngine {
    low_corner_hz: f64,
    high_corner_hz: f64,
    q: f64,
}

impl Default for EqEngine {
    fn default() -> Self {
        Self {
            low_corner_hz: LOW_SHELF_HZ,
            high_corner_hz: HIGH_SHELF_HZ,
            q: SHELF_Q,
        }
    }
}

impl EqEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a gain pair to a whole buffer, returning a new peak-normalised buffer
    pub fn apply_gains(&self, buffer: &AudioBuffer, gains: GainPair) -> Result<AudioBuffer> {
        buffer.ensure_processable()?;
        let samples = self.process_block(buffer.samples(), buffer.sample_rate(), gains)?;
        Ok(AudioBuffer::from_stage(samples, buffer.sample_rate()))
    }

    /// Filter one block of samples: low shelf, then high shelf, then peak rescale.
    ///
    /// An all-zero result is returned as-is instead of being rescaled.
    pub fn process_block(&self, block: &[f32], sample_rate: u32, gains: GainPair) -> Result<Vec<f32>> {
        gains.validate()?;

        let low = ShelfFilter::configure(
            sample_rate,
            self.low_corner_hz,
            self.q,
            gain_to_db(gains.low),
            ShelfKind::Low,
        )?;
        let high = ShelfFilter::configure(
            sample_rate,
            self.high_corner_hz,
            self.q,
            gain_to_db(gains.high),
            ShelfKind::High,
        )?;

        let mut output = high.process(&low.process(block));

        let peak = calculate_peak(&output);
        if peak > 0.0 && peak.is_finite() {
            for sample in &mut output {
                *sample /= peak;
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::levels::calculate_rms;
    use approx::assert_relative_eq;

    #[test]
    fn test_gain_to_db() {
        assert_relative_eq!(gain_to_db(1.0), 0.0);
        assert_relative_eq!(gain_to_db(0.1), -20.0, epsilon = 1e-12);
        assert_eq!(gain_to_db(0.0), -100.0);
    }

    #[test]
    fn test_gain_pair_validation() {
        assert!(GainPair::new(1.0, 0.0).is_ok());
        assert!(GainPair::new(-0.5, 1.0).is_err());
        assert!(GainPair::new(1.0, f64::NAN).is_err());
        assert!(GainPair::new(f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_gain_pair_floor_and_lerp() {
        let floored = GainPair { low: 0.0, high: 0.5 }.floored();
        assert_eq!(floored, GainPair { low: 0.01, high: 0.5 });

        let mid = GainPair::UNITY.lerp(GainPair { low: 0.2, high: 0.0 }, 0.5);
        assert_relative_eq!(mid.low, 0.6);
        assert_relative_eq!(mid.high, 0.5);
    }

    #[test]
    fn test_apply_gains_preserves_length_and_normalises_peak() {
        let engine = EqEngine::new();
        let buffer = AudioBuffer::sine_wave(100.0, 0.3, 1.0, 44100);

        let out = engine
            .apply_gains(&buffer, GainPair { low: 0.2, high: 1.0 })
            .unwrap();

        assert_eq!(out.len(), buffer.len());
        assert_eq!(out.sample_rate(), 44100);
        assert_relative_eq!(calculate_peak(out.samples()), 1.0, epsilon = 1e-6);
        assert!(out.samples().iter().all(|s| s.abs() <= 1.0 + 1e-6));
    }

    #[test]
    fn test_zero_gain_does_not_produce_nan() {
        let engine = EqEngine::new();
        let buffer = AudioBuffer::sine_wave(1000.0, 0.5, 0.5, 44100);

        let out = engine
            .apply_gains(&buffer, GainPair { low: 0.0, high: 0.0 })
            .unwrap();
        assert!(out.is_finite());
    }

    #[test]
    fn test_silence_stays_silent() {
        let engine = EqEngine::new();
        let buffer = AudioBuffer::silence(0.5, 44100);
        let out = engine
            .apply_gains(&buffer, GainPair { low: 0.2, high: 3.0 })
            .unwrap();
        assert!(out.is_silent());
        assert_eq!(out.len(), buffer.len());
    }

    #[test]
    fn test_bass_cut_shifts_balance_towards_highs() {
        let engine = EqEngine::new();
        let sr = 44100;
        let low = AudioBuffer::sine_wave(80.0, 0.5, 1.0, sr);
        let high = AudioBuffer::sine_wave(6000.0, 0.5, 1.0, sr);
        let mixed: Vec<f32> = low
            .samples()
            .iter()
            .zip(high.samples())
            .map(|(a, b)| a + b)
            .collect();

        let out = engine
            .process_block(&mixed, sr, GainPair { low: 0.1, high: 1.0 })
            .unwrap();

        // Isolate the 80 Hz component by averaging over one 6 kHz period
        let period = sr as usize / 6000 + 1;
        let smoothed: Vec<f32> = out
            .windows(period)
            .map(|w| w.iter().sum::<f32>() / period as f32)
            .collect();
        let low_level = calculate_rms(&smoothed[4410..]);
        let total_level = calculate_rms(&out[4410..]);
        assert!(
            low_level < 0.5 * total_level,
            "Bass should be attenuated relative to highs: {} vs {}",
            low_level,
            total_level
        );
    }

    #[test]
    fn test_empty_buffer_is_rejected() {
        let engine = EqEngine::new();
        let empty = AudioBuffer::silence(0.0, 44100);
        assert!(matches!(
            engine.apply_gains(&empty, GainPair::UNITY),
            Err(MixError::InvalidParameter { .. })
        ));
    }
}
