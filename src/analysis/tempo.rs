//! Tempo estimation from downbeat spacing

use super::beats::Downbeat;
use crate::error::{MixError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Beats in one bar (4/4)
pub const BEATS_PER_BAR: f64 = 4.0;

/// Downbeat-derived tempo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Tempo in beats per minute, rounded to a whole number
    pub bpm: f64,
    /// Most common bar length in seconds
    pub bar_secs: f64,
    /// Spacing between consecutive downbeats, rounded to microseconds
    pub differences: Vec<f64>,
}

/// Estimate tempo from the modal spacing of consecutive downbeats.
///
/// Differences are rounded to six decimals before taking the mode; ties go to
/// the shortest bar. `bpm = round(4 * 60 / bar_secs)`.
pub fn estimate_tempo_from_downbeats(downbeats: &[Downbeat]) -> Result<TempoEstimate> {
    if downbeats.len() < 2 {
        return Err(MixError::DegenerateInput {
            reason: format!(
                "need at least 2 downbeats to estimate tempo, got {}",
                downbeats.len()
            ),
        });
    }

    let micros: Vec<i64> = downbeats
        .windows(2)
        .map(|w| ((w[1].time_secs - w[0].time_secs) * 1e6).round() as i64)
        .collect();

    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &m in &micros {
        *counts.entry(m).or_default() += 1;
    }
    // BTreeMap iterates ascending, so the first maximum is the smallest value
    let (modal, _) = counts
        .iter()
        .fold((0_i64, 0_usize), |best, (&value, &count)| {
            if count > best.1 {
                (value, count)
            } else {
                best
            }
        });

    if modal <= 0 {
        return Err(MixError::DegenerateInput {
            reason: format!("modal downbeat spacing is {} us", modal),
        });
    }

    let bar_secs = modal as f64 / 1e6;
    Ok(TempoEstimate {
        bpm: (BEATS_PER_BAR * 60.0 / bar_secs).round(),
        bar_secs,
        differences: micros.iter().map(|&m| m as f64 / 1e6).collect(),
    })
}

/// Duration of `beats` beats at `bpm`
pub fn beats_to_seconds(bpm: f64, beats: f64) -> f64 {
    beats * 60.0 / bpm
}

/// Stretch ratio that brings `slave_bpm` to `master_bpm`
pub fn tempo_ratio(master_bpm: f64, slave_bpm: f64) -> Result<f64> {
    if !(master_bpm > 0.0) || !(slave_bpm > 0.0) {
        return Err(MixError::invalid(
            "tempo",
            format!("{} / {}", master_bpm, slave_bpm),
            "positive tempos",
        ));
    }
    Ok(master_bpm / slave_bpm)
}
