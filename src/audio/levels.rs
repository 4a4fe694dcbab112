//! Level measurements
//!
//! Objective loudness and peak measurements used by normalisation and by
//! the test-suite in place of listening.

/// Floor used wherever a level in dB would otherwise be -inf
pub const SILENCE_FLOOR_DB: f64 = -100.0;

/// Convert linear amplitude to decibels
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Convert decibels to linear amplitude
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Mean of the squared samples (energy per sample)
pub fn mean_square(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    sum_squares / samples.len() as f64
}

/// Loudness as `10 * log10(mean(x^2))`; -inf for silence
pub fn mean_square_db(samples: &[f32]) -> f64 {
    let ms = mean_square(samples);
    if ms > 0.0 {
        10.0 * ms.log10()
    } else {
        f64::NEG_INFINITY
    }
}

/// Calculate RMS (Root Mean Square) of samples
pub fn calculate_rms(samples: &[f32]) -> f64 {
    mean_square(samples).sqrt()
}

/// Calculate peak (maximum absolute value) of samples
pub fn calculate_peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_db_conversions() {
        assert_relative_eq!(linear_to_db(1.0), 0.0);
        assert_relative_eq!(linear_to_db(0.1), -20.0, epsilon = 1e-9);
        assert_relative_eq!(db_to_linear(-20.0), 0.1, epsilon = 1e-12);
        assert_eq!(linear_to_db(0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_mean_square_db_of_constant() {
        let samples = vec![0.1_f32; 1000];
        assert_relative_eq!(mean_square_db(&samples), -20.0, epsilon = 1e-4);
        assert_relative_eq!(calculate_rms(&samples), 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_silence_levels() {
        let samples = vec![0.0_f32; 64];
        assert_eq!(mean_square_db(&samples), f64::NEG_INFINITY);
        assert_eq!(calculate_peak(&samples), 0.0);
        assert_eq!(mean_square(&[]), 0.0);
    }
}
