//! Framed RMS energy and percentile helpers

use crate::error::{MixError, Result};

/// Short-term RMS energy, one value per hop.
///
/// Frames are centred on `t * hop_size`: the signal is zero-padded by
/// `frame_size / 2` on both sides, giving `1 + len / hop_size` frames.
pub fn framed_rms(samples: &[f32], frame_size: usize, hop_size: usize) -> Result<Vec<f64>> {
    if frame_size == 0 {
        return Err(MixError::invalid("frame_size", frame_size, "> 0 samples"));
    }
    if hop_size == 0 {
        return Err(MixError::invalid("hop_size", hop_size, "> 0 samples"));
    }

    let pad = frame_size / 2;
    let padded_len = samples.len() + 2 * pad;
    if padded_len < frame_size {
        return Ok(vec![0.0]);
    }
    let num_frames = 1 + (padded_len - frame_size) / hop_size;

    let rms = (0..num_frames)
        .map(|frame| {
            // Window [frame * hop - pad, frame * hop - pad + frame_size) in signal coordinates
            let start = (frame * hop_size) as isize - pad as isize;
            let lo = start.max(0) as usize;
            let hi = ((start + frame_size as isize).max(0) as usize).min(samples.len());
            let energy: f64 = samples
                .get(lo..hi)
                .unwrap_or(&[])
                .iter()
                .map(|&s| (s as f64) * (s as f64))
                .sum();
            (energy / frame_size as f64).sqrt()
        })
        .collect();

    Ok(rms)
}

/// Percentile with linear interpolation between closest ranks.
///
/// `percentile` is in [0, 100]; rank `p / 100 * (n - 1)` is interpolated
/// between its neighbouring order statistics.
pub fn percentile(values: &[f64], percentile: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MixError::invalid("values", 0, "at least one value"));
    }
    if !(0.0..=100.0).contains(&percentile) {
        return Err(MixError::invalid("percentile", percentile, "0 to 100"));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = percentile / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
