//! Shelving filter
//!
//! Single-stage low/high shelf biquad using the Audio EQ Cookbook formulas.
//! Each call to [`ShelfFilter::process`] starts from a cleared delay line, so
//! a filter applied chunk-by-chunk behaves as a block-constant gain
//! approximation: no state is carried across chunk boundaries.

use crate::error::{MixError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Which side of the corner frequency the shelf acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShelfKind {
    /// Boost/cut below the corner frequency
    Low,
    /// Boost/cut above the corner frequency
    High,
}

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// Reference: https://www.w3.org/2011/audio/audio-eq-cookbook.html
    fn shelf(kind: ShelfKind, sample_rate: f64, frequency: f64, q: f64, gain_db: f64) -> Self {
        // Keep the corner strictly below Nyquist
        let freq = frequency.min(sample_rate * 0.499);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a = 10.0_f64.powf(gain_db / 40.0);
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        let (b0, b1, b2, a0, a1, a2) = match kind {
            ShelfKind::Low => (
                a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
            ),
            ShelfKind::High => (
                a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
            ),
        };

        // Normalize by a0
        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Biquad delay line (Direct Form I)
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// A configured low or high shelving filter
#[derive(Debug, Clone, PartialEq)]
pub struct ShelfFilter {
    kind: ShelfKind,
    sample_rate: u32,
    corner_hz: f64,
    q: f64,
    gain_db: f64,
    coeffs: BiquadCoeffs,
}

impl ShelfFilter {
    /// Compute coefficients for a shelf at `corner_hz` with `gain_db` of boost/cut.
    ///
    /// Fails with `InvalidParameter` for a zero sample rate, a non-positive
    /// corner or Q, or a gain that is not a finite number of dB.
    pub fn configure(
        sample_rate: u32,
        corner_hz: f64,
        q: f64,
        gain_db: f64,
        kind: ShelfKind,
    ) -> Result<Self> {
        if sample_rate == 0 {
            return Err(MixError::invalid("sample_rate", sample_rate, "> 0 Hz"));
        }
        if !(corner_hz > 0.0) || !corner_hz.is_finite() {
            return Err(MixError::invalid("corner_hz", corner_hz, "finite and > 0 Hz"));
        }
        if !(q > 0.0) || !q.is_finite() {
            return Err(MixError::invalid("q", q, "finite and > 0"));
        }
        if !gain_db.is_finite() {
            return Err(MixError::invalid("gain_db", gain_db, "a finite gain in dB"));
        }

        Ok(Self {
            kind,
            sample_rate,
            corner_hz,
            q,
            gain_db,
            coeffs: BiquadCoeffs::shelf(kind, sample_rate as f64, corner_hz, q, gain_db),
        })
    }

    /// Filter a whole block, starting from a cleared delay line.
    /// Output length always equals input length.
    pub fn process(&self, input: &[f32]) -> Vec<f32> {
        let mut state = BiquadState::default();
        input
            .iter()
            .map(|&x| state.process(x as f64, &self.coeffs) as f32)
            .collect()
    }

    pub fn kind(&self) -> ShelfKind {
        self.kind
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn corner_hz(&self) -> f64 {
        self.corner_hz
    }

    pub fn q(&self) -> f64 {
        self.q
    }

    pub fn gain_db(&self) -> f64 {
        self.gain_db
    }
}
