//! Cue point extraction
//!
//! Every beat is scored by how sharply the short-term RMS energy changes
//! against its neighbouring beats. The top-scoring beats (plus the first
//! beat) become cue candidates; runs of neighbouring candidates collapse to
//! their strongest member, and the survivors map back to timestamps.

use super::beats::{downbeat_times, Downbeat};
use super::rms::{framed_rms, percentile};
use crate::audio::{seconds_to_samples, AudioBuffer};
use crate::error::{MixError, Result};
use serde::{Deserialize, Serialize};

/// Candidate lists this short are returned without merging
const MERGE_MIN_CANDIDATES: usize = 4;

/// Tuning for [`CuePointExtractor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueOptions {
    /// RMS frame length in samples
    pub frame_size: usize,
    /// RMS hop length in samples
    pub hop_size: usize,
    /// Beats scoring at or above this percentile become candidates
    pub top_percentile: f64,
    /// Candidates whose beat indices differ by at most this much form one run
    pub merge_gap: usize,
}

impl Default for CueOptions {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            hop_size: 512,
            top_percentile: 97.5,
            merge_gap: 1,
        }
    }
}

impl CueOptions {
    pub fn validate(&self) -> Result<()> {
        if self.frame_size == 0 {
            return Err(MixError::invalid("frame_size", self.frame_size, "> 0 samples"));
        }
        if self.hop_size == 0 {
            return Err(MixError::invalid("hop_size", self.hop_size, "> 0 samples"));
        }
        if !(0.0..=100.0).contains(&self.top_percentile) {
            return Err(MixError::invalid("top_percentile", self.top_percentile, "0 to 100"));
        }
        if self.merge_gap == 0 {
            return Err(MixError::invalid("merge_gap", self.merge_gap, ">= 1"));
        }
        Ok(())
    }
}

/// Output of one extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueExtraction {
    /// Surviving beat indices, ascending
    pub indices: Vec<usize>,
    /// Timestamps of the surviving beats, in seconds
    pub cue_points: Vec<f64>,
    /// Transition score of every beat
    pub scores: Vec<f64>,
}

impl CueExtraction {
    /// How many cues fall on each of the four beat positions of a 4/4 bar
    pub fn beat_series_counts(&self) -> [usize; 4] {
        beat_series_counts(&self.indices)
    }
}

/// Count indices by `index % 4`
pub fn beat_series_counts(indices: &[usize]) -> [usize; 4] {
    let mut counts = [0; 4];
    for index in indices {
        counts[index % 4] += 1;
    }
    counts
}

/// Finds structurally significant beats from RMS-energy transitions
#[derive(Debug, Clone, Default)]
pub struct CuePointExtractor {
    options: CueOptions,
}

impl CuePointExtractor {
    pub fn new(options: CueOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &CueOptions {
        &self.options
    }

    /// Extract cue points from a beat timeline
    pub fn extract(&self, buffer: &AudioBuffer, beats: &[f64]) -> Result<CueExtraction> {
        buffer.ensure_processable()?;
        validate_beats(beats)?;

        let rms = framed_rms(buffer.samples(), self.options.frame_size, self.options.hop_size)?;
        let frames: Vec<usize> = beats
            .iter()
            .map(|&t| {
                let frame = seconds_to_samples(t, buffer.sample_rate()) / self.options.hop_size;
                frame.min(rms.len() - 1)
            })
            .collect();

        let scores = transition_scores(&rms, &frames);
        let threshold = percentile(&scores, self.options.top_percentile)?;

        let mut candidates: Vec<usize> = (0..scores.len())
            .filter(|&i| scores[i] >= threshold)
            .collect();
        if candidates.first() != Some(&0) {
            candidates.insert(0, 0);
        }

        let mut indices = merge_runs(&candidates, &scores, self.options.merge_gap);
        // The first beat survives even when a stronger neighbour wins its run
        if indices.first() != Some(&0) {
            indices.insert(0, 0);
        }
        let cue_points = indices.iter().map(|&i| beats[i]).collect();

        log::debug!(
            "{} beats -> {} candidates (threshold {:.5}) -> {} cue points",
            beats.len(),
            candidates.len(),
            threshold,
            indices.len()
        );

        Ok(CueExtraction {
            indices,
            cue_points,
            scores,
        })
    }

    /// Extract cue points from `(time, bar_position)` beats, using the time column
    pub fn extract_from_downbeats(
        &self,
        buffer: &AudioBuffer,
        downbeats: &[Downbeat],
    ) -> Result<CueExtraction> {
        self.extract(buffer, &downbeat_times(downbeats))
    }
}

fn validate_beats(beats: &[f64]) -> Result<()> {
    if beats.is_empty() {
        return Err(MixError::invalid("beats", 0, "at least one beat timestamp"));
    }
    if let Some(bad) = beats.iter().find(|t| !t.is_finite() || **t < 0.0) {
        return Err(MixError::invalid("beats", bad, "finite, non-negative timestamps"));
    }
    Ok(())
}

/// `max(|rms(i) - rms(i-1)|, |rms(i) - rms(i+1)|)`, one-sided at the ends
fn transition_scores(rms: &[f64], frames: &[usize]) -> Vec<f64> {
    let n = frames.len();
    (0..n)
        .map(|i| {
            let current = rms[frames[i]];
            let prev = (i > 0).then(|| (current - rms[frames[i - 1]]).abs());
            let next = (i + 1 < n).then(|| (current - rms[frames[i + 1]]).abs());
            match (prev, next) {
                (Some(p), Some(q)) => p.max(q),
                (Some(p), None) => p,
                (None, Some(q)) => q,
                (None, None) => 0.0,
            }
        })
        .collect()
}

/// Collapse runs of neighbouring indices to their highest-scoring member
/// (earliest on ties). Short candidate lists pass through untouched.
fn merge_runs(candidates: &[usize], scores: &[f64], merge_gap: usize) -> Vec<usize> {
    if candidates.len() <= MERGE_MIN_CANDIDATES {
        return candidates.to_vec();
    }

    let mut merged = Vec::new();
    let mut best = candidates[0];
    let mut previous = candidates[0];

    for &index in &candidates[1..] {
        if index - previous > merge_gap {
            merged.push(best);
            best = index;
        } else if scores[index] > scores[best] {
            best = index;
        }
        previous = index;
    }
    merged.push(best);

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scores_use_one_sided_differences_at_ends() {
        let rms = [0.0, 1.0, 0.5, 0.5];
        let scores = transition_scores(&rms, &[0, 1, 2, 3]);
        assert_eq!(scores, vec![1.0, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_single_beat_scores_zero() {
        assert_eq!(transition_scores(&[0.3], &[0]), vec![0.0]);
    }

    #[test]
    fn test_merge_picks_strongest_of_each_run() {
        let scores = [0.0, 0.1, 0.9, 0.3, 0.0, 0.0, 0.5, 0.5, 0.0, 0.2];
        let merged = merge_runs(&[0, 2, 3, 6, 7, 9], &scores, 1);
        assert_eq!(merged, vec![0, 2, 6, 9]);
    }

    #[test]
    fn test_merge_skips_short_lists() {
        let scores = [0.0, 0.5, 0.9, 0.1];
        assert_eq!(merge_runs(&[0, 1, 2, 3], &scores, 1), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_wider_merge_gap() {
        let scores = [0.0, 0.0, 0.0, 0.4, 0.0, 0.8, 0.0, 0.0, 0.0, 0.0, 0.3];
        let merged = merge_runs(&[0, 3, 5, 8, 10], &scores, 2);
        assert_eq!(merged, vec![0, 5, 10]);
    }

    #[test]
    fn test_beat_series_counts() {
        assert_eq!(beat_series_counts(&[0, 4, 5, 10, 15, 19]), [2, 1, 1, 2]);
    }

    #[test]
    fn test_options_validation() {
        assert!(CuePointExtractor::new(CueOptions::default()).is_ok());
        let bad = CueOptions {
            top_percentile: 120.0,
            ..Default::default()
        };
        assert!(CuePointExtractor::new(bad).is_err());
        let bad = CueOptions {
            merge_gap: 0,
            ..Default::default()
        };
        assert!(CuePointExtractor::new(bad).is_err());
    }

    #[test]
    fn test_extract_rejects_bad_beats() {
        let extractor = CuePointExtractor::default();
        let buffer = AudioBuffer::sine_wave(100.0, 0.5, 1.0, 8000);
        assert!(extractor.extract(&buffer, &[]).is_err());
        assert!(extractor.extract(&buffer, &[0.1, f64::NAN]).is_err());
        assert!(extractor.extract(&buffer, &[-0.5]).is_err());
    }
}
