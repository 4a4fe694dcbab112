//! Track model
//!
//! A `Track` owns its decoded audio plus whatever analysis has been run on it.
//! Analysis fields start empty and are filled by the explicit `detect_*`,
//! `estimate_tempo` and `extract_cue_points` calls.

use crate::analysis::{downbeat_times, CuePointExtractor, Downbeat};
use crate::audio::AudioBuffer;
use crate::error::{MixError, Result};
use crate::providers::{AudioLoader, BeatTracker, DownbeatTracker, TempoEstimator};
use std::path::{Path, PathBuf};

/// A named audio track and its analysis results
#[derive(Debug, Clone)]
pub struct Track {
    name: String,
    path: PathBuf,
    audio: AudioBuffer,
    tempo: Option<f64>,
    beats: Option<Vec<f64>>,
    downbeats: Option<Vec<Downbeat>>,
    downbeat_differences: Option<Vec<f64>>,
    cue_indices: Option<Vec<usize>>,
    cue_points: Option<Vec<f64>>,
    beat_series_counts: Option<[usize; 4]>,
}

impl Track {
    /// Wrap already-decoded audio. `path` identifies the track to beat trackers.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, audio: AudioBuffer) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            audio,
            tempo: None,
            beats: None,
            downbeats: None,
            downbeat_differences: None,
            cue_indices: None,
            cue_points: None,
            beat_series_counts: None,
        }
    }

    /// Decode `path` with `loader`
    pub fn load(name: impl Into<String>, path: &Path, loader: &dyn AudioLoader) -> Result<Self> {
        let audio = loader.load_audio(path)?;
        audio.ensure_processable()?;
        Ok(Self::new(name, path, audio))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn audio(&self) -> &AudioBuffer {
        &self.audio
    }

    pub fn tempo(&self) -> Option<f64> {
        self.tempo
    }

    pub fn beats(&self) -> Option<&[f64]> {
        self.beats.as_deref()
    }

    pub fn downbeats(&self) -> Option<&[Downbeat]> {
        self.downbeats.as_deref()
    }

    pub fn downbeat_differences(&self) -> Option<&[f64]> {
        self.downbeat_differences.as_deref()
    }

    pub fn cue_indices(&self) -> Option<&[usize]> {
        self.cue_indices.as_deref()
    }

    pub fn cue_points(&self) -> Option<&[f64]> {
        self.cue_points.as_deref()
    }

    pub fn beat_series_counts(&self) -> Option<[usize; 4]> {
        self.beat_series_counts
    }

    pub fn detect_beats(&mut self, tracker: &dyn BeatTracker) -> Result<()> {
        let beats = tracker.detect_beats(&self.path)?;
        log::debug!("{}: {} beats", self.name, beats.len());
        self.beats = Some(beats);
        Ok(())
    }

    pub fn detect_downbeats(&mut self, tracker: &dyn DownbeatTracker) -> Result<()> {
        let downbeats = tracker.detect_downbeats(&self.path)?;
        log::debug!("{}: {} downbeats", self.name, downbeats.len());
        self.downbeats = Some(downbeats);
        Ok(())
    }

    /// Requires downbeats
    pub fn estimate_tempo(&mut self, estimator: &dyn TempoEstimator) -> Result<f64> {
        let downbeats = self.downbeats.as_deref().ok_or_else(|| self.missing("downbeats"))?;
        let estimate = estimator.estimate_tempo(downbeats)?;
        log::debug!("{}: {} BPM ({:.3} s bars)", self.name, estimate.bpm, estimate.bar_secs);
        self.tempo = Some(estimate.bpm);
        self.downbeat_differences = Some(estimate.differences);
        Ok(estimate.bpm)
    }

    /// Requires beats
    pub fn extract_cue_points(&mut self, extractor: &CuePointExtractor) -> Result<&[f64]> {
        let beats = self.beats.as_deref().ok_or_else(|| self.missing("beats"))?;
        let extraction = extractor.extract(&self.audio, beats)?;
        self.beat_series_counts = Some(extraction.beat_series_counts());
        self.cue_indices = Some(extraction.indices);
        Ok(self.cue_points.insert(extraction.cue_points).as_slice())
    }

    /// Beats, downbeats, tempo and cue points, in that order
    pub fn preprocess<A>(
        &mut self,
        analysis: &A,
        estimator: &dyn TempoEstimator,
        extractor: &CuePointExtractor,
    ) -> Result<()>
    where
        A: BeatTracker + DownbeatTracker,
    {
        self.detect_beats(analysis)?;
        self.detect_downbeats(analysis)?;
        self.estimate_tempo(estimator)?;
        self.extract_cue_points(extractor)?;
        log::info!(
            "Preprocessed {}: {} BPM, {} cue points",
            self.name,
            self.tempo.unwrap_or_default(),
            self.cue_points.as_ref().map_or(0, Vec::len)
        );
        Ok(())
    }

    /// Tempo, or an error naming the missing analysis
    pub fn require_tempo(&self) -> Result<f64> {
        self.tempo.ok_or_else(|| self.missing("tempo"))
    }

    /// The `index`-th surviving cue point
    pub fn cue_point(&self, index: usize) -> Result<f64> {
        let cues = self.cue_points.as_deref().ok_or_else(|| self.missing("cue points"))?;
        cues.get(index).copied().ok_or_else(|| MixError::OutOfRange {
            what: format!("cue point of '{}'", self.name),
            requested: index.to_string(),
            available: cues.len().to_string(),
        })
    }

    /// Downbeat times in seconds
    pub fn downbeat_times(&self) -> Option<Vec<f64>> {
        self.downbeats.as_deref().map(downbeat_times)
    }

    /// Replace the audio with `audio` under a new name, keeping the source path.
    /// All analysis is cleared.
    pub fn with_audio(&self, name: impl Into<String>, audio: AudioBuffer) -> Self {
        Self::new(name, self.path.clone(), audio)
    }

    fn missing(&self, what: &'static str) -> MixError {
        MixError::TrackNotAnalyzed {
            name: self.name.clone(),
            missing: what,
        }
    }
}
