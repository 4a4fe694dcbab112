//! External collaborators
//!
//! Decoding, beat tracking, tempo estimation and time-stretching live behind
//! these traits. The defaults here are file-backed: WAV decoding via hound,
//! beat timelines from a JSON analysis file written by an external tracker,
//! tempo from downbeat spacing, and a varispeed resampler.

use crate::analysis::{bar_starts, estimate_tempo_from_downbeats, Downbeat, TempoEstimate};
use crate::audio::{load_wav, AudioBuffer};
use crate::error::{MixError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Decodes a file into a mono buffer
pub trait AudioLoader {
    fn load_audio(&self, path: &Path) -> Result<AudioBuffer>;
}

/// Produces beat timestamps (seconds) for a track
pub trait BeatTracker {
    fn detect_beats(&self, track_path: &Path) -> Result<Vec<f64>>;
}

/// Produces the downbeats of a track as `(time, bar_position)` pairs
pub trait DownbeatTracker {
    fn detect_downbeats(&self, track_path: &Path) -> Result<Vec<Downbeat>>;
}

/// Derives a tempo from downbeats
pub trait TempoEstimator {
    fn estimate_tempo(&self, downbeats: &[Downbeat]) -> Result<TempoEstimate>;
}

/// Changes the duration of a buffer by `ratio` (> 1 is faster/shorter)
pub trait TimeStretcher {
    fn time_stretch(&self, buffer: &AudioBuffer, ratio: f64) -> Result<AudioBuffer>;
}

/// Loads WAV files, downmixing to mono
#[derive(Debug, Clone, Copy, Default)]
pub struct WavLoader;

impl AudioLoader for WavLoader {
    fn load_audio(&self, path: &Path) -> Result<AudioBuffer> {
        load_wav(path)
    }
}

/// Beat-tracker output stored as JSON:
/// `{ "beats": [t, ...], "downbeats": [[t, bar_position], ...] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFile {
    #[serde(default)]
    pub beats: Vec<f64>,
    #[serde(default)]
    pub downbeats: Vec<Downbeat>,
}

impl AnalysisFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| MixError::AnalysisFileError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Analysis file conventionally stored next to `audio_path`: `track.wav` -> `track.beats.json`
    pub fn sidecar_path(audio_path: &Path) -> PathBuf {
        audio_path.with_extension("beats.json")
    }

    /// Timeline of the same track after a time-stretch by `ratio`
    pub fn stretched(&self, ratio: f64) -> Result<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(MixError::invalid("ratio", ratio, "finite and > 0"));
        }
        Ok(Self {
            beats: self.beats.iter().map(|t| t / ratio).collect(),
            downbeats: self
                .downbeats
                .iter()
                .map(|b| Downbeat::new(b.time_secs / ratio, b.bar_position))
                .collect(),
        })
    }

    fn require_beats(&self) -> Result<Vec<f64>> {
        if self.beats.is_empty() {
            return Err(MixError::DegenerateInput {
                reason: "analysis contains no beats".to_string(),
            });
        }
        Ok(self.beats.clone())
    }
}

/// An in-memory analysis answers for any track path
impl BeatTracker for AnalysisFile {
    fn detect_beats(&self, _track_path: &Path) -> Result<Vec<f64>> {
        self.require_beats()
    }
}

impl DownbeatTracker for AnalysisFile {
    fn detect_downbeats(&self, _track_path: &Path) -> Result<Vec<Downbeat>> {
        Ok(bar_starts(&self.downbeats))
    }
}

/// Reads `<track>.beats.json` next to each track
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarAnalysis;

impl BeatTracker for SidecarAnalysis {
    fn detect_beats(&self, track_path: &Path) -> Result<Vec<f64>> {
        AnalysisFile::load(&AnalysisFile::sidecar_path(track_path))?.require_beats()
    }
}

impl DownbeatTracker for SidecarAnalysis {
    fn detect_downbeats(&self, track_path: &Path) -> Result<Vec<Downbeat>> {
        let analysis = AnalysisFile::load(&AnalysisFile::sidecar_path(track_path))?;
        Ok(bar_starts(&analysis.downbeats))
    }
}

/// Tempo from the modal downbeat spacing
#[derive(Debug, Clone, Copy, Default)]
pub struct DownbeatTempo;

impl TempoEstimator for DownbeatTempo {
    fn estimate_tempo(&self, downbeats: &[Downbeat]) -> Result<TempoEstimate> {
        estimate_tempo_from_downbeats(downbeats)
    }
}

/// Turntable-style stretch: linear-interpolation resampling.
/// Pitch moves with tempo.
#[derive(Debug, Clone, Copy, Default)]
pub struct Varispeed;

impl TimeStretcher for Varispeed {
    fn time_stretch(&self, buffer: &AudioBuffer, ratio: f64) -> Result<AudioBuffer> {
        buffer.ensure_processable()?;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(MixError::invalid("ratio", ratio, "finite and > 0"));
        }

        let input = buffer.samples();
        let out_len = ((input.len() as f64 / ratio).round() as usize).max(1);
        let last = input.len() - 1;

        let samples = (0..out_len)
            .map(|i| {
                let pos = i as f64 * ratio;
                let idx = (pos.floor() as usize).min(last);
                let next = (idx + 1).min(last);
                let frac = (pos - idx as f64).clamp(0.0, 1.0) as f32;
                input[idx] + (input[next] - input[idx]) * frac
            })
            .collect();

        Ok(AudioBuffer::from_stage(samples, buffer.sample_rate()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    #[test]
    fn test_analysis_file_round_trip_and_sidecar() {
        let dir = tempdir().unwrap();
        let audio_path = dir.path().join("Bours - Track.wav");
        let analysis = AnalysisFile {
            beats: vec![0.5, 1.0, 1.5],
            downbeats: vec![Downbeat::new(0.5, 1), Downbeat::new(1.0, 2), Downbeat::new(2.5, 1)],
        };
        analysis.save(&AnalysisFile::sidecar_path(&audio_path)).unwrap();

        assert_eq!(
            SidecarAnalysis.detect_beats(&audio_path).unwrap(),
            vec![0.5, 1.0, 1.5]
        );
        let downbeats = SidecarAnalysis.detect_downbeats(&audio_path).unwrap();
        assert_eq!(downbeats, vec![Downbeat::new(0.5, 1), Downbeat::new(2.5, 1)]);
    }

    #[test]
    fn test_malformed_analysis_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.beats.json");
        std::fs::write(&path, "{ \"beats\": \"oops\" }").unwrap();
        assert!(matches!(
            AnalysisFile::load(&path),
            Err(MixError::AnalysisFileError { .. })
        ));
    }

    #[test]
    fn test_empty_beats_are_degenerate() {
        let analysis = AnalysisFile::default();
        assert!(matches!(
            analysis.detect_beats(Path::new("x.wav")),
            Err(MixError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn test_stretched_timeline() {
        let analysis = AnalysisFile {
            beats: vec![0.0, 0.6, 1.2],
            downbeats: vec![Downbeat::new(0.0, 1), Downbeat::new(2.4, 1)],
        };
        let faster = analysis.stretched(1.2).unwrap();
        assert_relative_eq!(faster.beats[1], 0.5);
        assert_relative_eq!(faster.downbeats[1].time_secs, 2.0);
        assert_eq!(faster.downbeats[1].bar_position, 1);
        assert!(analysis.stretched(-1.0).is_err());
    }

    #[test]
    fn test_varispeed_length_and_values() {
        let buffer = AudioBuffer::new((0..100).map(|i| i as f32).collect(), 100).unwrap();

        let faster = Varispeed.time_stretch(&buffer, 2.0).unwrap();
        assert_eq!(faster.len(), 50);
        assert_eq!(faster.samples()[10], 20.0);

        let slower = Varispeed.time_stretch(&buffer, 0.5).unwrap();
        assert_eq!(slower.len(), 200);
        assert_relative_eq!(slower.samples()[21], 10.5);
        assert_eq!(slower.sample_rate(), 100);

        assert!(Varispeed.time_stretch(&buffer, 0.0).is_err());
    }
}
