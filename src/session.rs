//! Mixing session
//!
//! [`MixContext`] is the registry of loaded tracks. [`MixOrchestrator`] turns
//! two analysed tracks into one mix: a bass swap, a treble hand-off, a splice
//! (or crossfade) at the cue points and a loudness pass.

use crate::analysis::{beats_to_seconds, tempo_ratio, CuePointExtractor};
use crate::audio::AudioBuffer;
use crate::config::MixConfig;
use crate::dsp::{EqEngine, GainPair, InterpolationMode, Keyframe, TransitionScheduler};
use crate::error::{MixError, Result};
use crate::mix::normalize;
use crate::providers::{AudioLoader, BeatTracker, DownbeatTracker, TempoEstimator, TimeStretcher};
use crate::track::Track;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Tracks available for mixing, keyed by name
#[derive(Debug, Default)]
pub struct MixContext {
    tracks: BTreeMap<String, Track>,
}

impl MixContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tracks.contains_key(name)
    }

    /// Register `track` under its own name, replacing any track of that name
    pub fn insert(&mut self, track: Track) {
        self.tracks.insert(track.name().to_string(), track);
    }

    pub fn get(&self, name: &str) -> Result<&Track> {
        self.tracks.get(name).ok_or_else(|| MixError::TrackNotFound {
            name: name.to_string(),
        })
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Track> {
        self.tracks.get_mut(name).ok_or_else(|| MixError::TrackNotFound {
            name: name.to_string(),
        })
    }

    /// Load every `.wav` file directly inside `dir`.
    ///
    /// Tracks are named by the first word of the file stem; a repeated name
    /// gets a counter (`Name`, `Name2`, `Name3`, ...). Returns the new names
    /// in file-name order.
    pub fn load_directory(&mut self, dir: &Path, loader: &dyn AudioLoader) -> Result<Vec<String>> {
        let mut paths: Vec<_> = WalkDir::new(dir)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
            })
            .map(|entry| entry.path().to_path_buf())
            .collect();
        paths.sort();

        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let base = stem.split_whitespace().next().unwrap_or("track").to_string();
            let name = self.unique_name(&base);

            let track = Track::load(name.clone(), &path, loader)?;
            info!("Loaded {} from {}", name, path.display());
            self.insert(track);
            loaded.push(name);
        }

        Ok(loaded)
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{}{}", base, n))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Run the full analysis of one registered track
    pub fn preprocess<A>(
        &mut self,
        name: &str,
        analysis: &A,
        estimator: &dyn TempoEstimator,
        extractor: &CuePointExtractor,
    ) -> Result<()>
    where
        A: BeatTracker + DownbeatTracker,
    {
        self.get_mut(name)?.preprocess(analysis, estimator, extractor)
    }

    /// Stretch `slave` to the tempo of `master` and register the result as
    /// `"{slave}_AT_{bpm}bpm"`. The new track carries no analysis.
    pub fn match_tempo(&mut self, master: &str, slave: &str, stretcher: &dyn TimeStretcher) -> Result<String> {
        let master_bpm = self.get(master)?.require_tempo()?;
        let slave_track = self.get(slave)?;
        let ratio = tempo_ratio(master_bpm, slave_track.require_tempo()?)?;

        let stretched = stretcher.time_stretch(slave_track.audio(), ratio)?;
        let name = format!("{}_AT_{}bpm", slave, master_bpm);
        info!(
            "Stretched {} by {:.4} to {} BPM as {}",
            slave, ratio, master_bpm, name
        );

        let track = slave_track.with_audio(name.clone(), stretched);
        self.insert(track);
        Ok(name)
    }
}

/// Cue times and EQ automation derived for one master/slave pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixPlan {
    /// Master cue where the treble hand-off starts and the master is cut
    pub a_cue: f64,
    /// Slave cue where the slave enters
    pub b_cue: f64,
    /// Master time at which its bass is fully cut
    pub a_bass: f64,
    /// Slave cue at which its bass is fully restored
    pub b_bass: f64,
    pub lead_secs: f64,
    pub master_bass: Vec<Keyframe>,
    pub slave_bass: Vec<Keyframe>,
    pub master_treble: Vec<Keyframe>,
    pub slave_treble: Vec<Keyframe>,
}

/// Keyframes starting from `initial` at t = 0, followed by `rest`.
///
/// Negative times are clamped to 0. The t = 0 keyframe is dropped when the
/// first of `rest` is already at or before 0.
fn anchored(initial: GainPair, rest: &[(f64, GainPair)]) -> Vec<Keyframe> {
    let mut keyframes = Vec::with_capacity(rest.len() + 1);
    if rest.first().map_or(true, |&(t, _)| t > 0.0) {
        keyframes.push(Keyframe {
            time_secs: 0.0,
            gains: initial,
        });
    }
    for &(time_secs, gains) in rest {
        let time_secs = time_secs.max(0.0);
        // Clamped keyframes can collide at 0; the later one wins
        if keyframes.last().is_some_and(|k: &Keyframe| k.time_secs >= time_secs) {
            keyframes.pop();
        }
        keyframes.push(Keyframe { time_secs, gains });
    }
    keyframes
}

/// Mixes a master track into a slave track
#[derive(Debug, Clone)]
pub struct MixOrchestrator {
    config: MixConfig,
    scheduler: TransitionScheduler,
}

impl MixOrchestrator {
    pub fn new(config: MixConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scheduler: TransitionScheduler::new(EqEngine::default()),
        })
    }

    pub fn config(&self) -> &MixConfig {
        &self.config
    }

    /// Work out cue times and keyframes for mixing `master` into `slave`
    pub fn plan(&self, master: &Track, slave: &Track) -> Result<MixPlan> {
        let cfg = &self.config;
        let lead_secs = beats_to_seconds(master.require_tempo()?, cfg.lead_beats);

        let a_cue = master.cue_point(cfg.master_cue_index)?;
        let b_cue = slave.cue_point(cfg.slave_cue_index)?;
        let b_bass = slave.cue_point(cfg.slave_bass_cue_index)?;
        let a_bass = a_cue + (b_bass - b_cue - lead_secs);

        let full = GainPair::UNITY;
        let bass_cut = GainPair::new(cfg.bass_cut_gain, 1.0)?;
        let d = cfg.treble_duration_secs;

        Ok(MixPlan {
            a_cue,
            b_cue,
            a_bass,
            b_bass,
            lead_secs,
            master_bass: anchored(full, &[(a_bass, bass_cut)]),
            slave_bass: anchored(bass_cut, &[(b_bass, full)]),
            master_treble: anchored(
                full,
                &[
                    (a_cue, full),
                    (a_cue + 0.8 * d, GainPair { low: 1.0, high: 0.7 }),
                    (a_cue + d, GainPair { low: 1.0, high: 0.1 }),
                ],
            ),
            slave_treble: anchored(
                GainPair { low: 1.0, high: 0.1 },
                &[
                    (b_cue, GainPair { low: 1.0, high: 0.1 }),
                    (b_cue + 0.5 * d, GainPair { low: 1.0, high: 0.7 }),
                    (b_cue + d, full),
                ],
            ),
        })
    }

    /// Mix `master` (outgoing) into `slave` (incoming).
    ///
    /// Both tracks must have a tempo and enough cue points for the configured
    /// cue indices.
    pub fn mix(&self, master: &Track, slave: &Track) -> Result<AudioBuffer> {
        master.audio().ensure_same_rate(slave.audio())?;
        let plan = self.plan(master, slave)?;
        info!(
            "Mixing {} -> {}: master cue {:.3}s, slave cue {:.3}s, bass swap {:.3}s/{:.3}s",
            master.name(),
            slave.name(),
            plan.a_cue,
            plan.b_cue,
            plan.a_bass,
            plan.b_bass
        );
        self.render(master.audio(), slave.audio(), &plan)
    }

    /// Apply a plan to two buffers
    pub fn render(&self, master: &AudioBuffer, slave: &AudioBuffer, plan: &MixPlan) -> Result<AudioBuffer> {
        master.ensure_same_rate(slave)?;
        let chunk = self.config.chunk_size;

        info!("Bass swap");
        let a = self
            .scheduler
            .schedule(master, &plan.master_bass, chunk, InterpolationMode::Linear)?;
        let b = self
            .scheduler
            .schedule(slave, &plan.slave_bass, chunk, InterpolationMode::Linear)?;

        info!("Treble hand-off over {:.1}s", self.config.treble_duration_secs);
        let a = self
            .scheduler
            .schedule(&a, &plan.master_treble, chunk, InterpolationMode::Sigmoid)?;
        let b = self
            .scheduler
            .schedule(&b, &plan.slave_treble, chunk, InterpolationMode::Sigmoid)?;

        info!("Compositing ({:?})", self.config.composite);
        let joined = self.config.composite.combine(&a, &b, plan.a_cue, plan.b_cue)?;

        let mixed = normalize(&joined, self.config.target_db)?;
        info!(
            "Mix ready: {:.2}s at {} Hz",
            mixed.duration(),
            mixed.sample_rate()
        );
        Ok(mixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Downbeat;
    use crate::providers::{AnalysisFile, DownbeatTempo, Varispeed};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn gains(keyframes: &[Keyframe]) -> Vec<(f64, f64, f64)> {
        keyframes
            .iter()
            .map(|k| (k.time_secs, k.gains.low, k.gains.high))
            .collect()
    }

    #[test]
    fn test_anchored_keeps_or_drops_leading_keyframe() {
        let cut = GainPair { low: 0.2, high: 1.0 };
        let kept = anchored(GainPair::UNITY, &[(3.0, cut)]);
        assert_eq!(gains(&kept), vec![(0.0, 1.0, 1.0), (3.0, 0.2, 1.0)]);

        let dropped = anchored(GainPair::UNITY, &[(0.0, cut)]);
        assert_eq!(gains(&dropped), vec![(0.0, 0.2, 1.0)]);

        let negative = anchored(GainPair::UNITY, &[(-2.0, cut), (4.0, GainPair::UNITY)]);
        assert_eq!(gains(&negative), vec![(0.0, 0.2, 1.0), (4.0, 1.0, 1.0)]);
    }

    fn analysed(name: &str, bpm: f64, seconds: f64) -> Track {
        let beat = 60.0 / bpm;
        let count = (seconds / beat) as usize;
        let beats: Vec<f64> = (0..count).map(|i| i as f64 * beat).collect();
        let downbeats = beats
            .iter()
            .enumerate()
            .map(|(i, &t)| Downbeat::new(t, (i % 4) as u32 + 1))
            .collect();
        let analysis = AnalysisFile { beats, downbeats };

        // Volume steps every 4 bars give the cue extractor something to find
        let sr = 4000;
        let samples = (0..(seconds * sr as f64) as usize)
            .map(|n| {
                let t = n as f64 / sr as f64;
                let level = if ((t / (16.0 * beat)) as usize) % 2 == 0 { 0.2 } else { 0.8 };
                (level * (2.0 * std::f64::consts::PI * 110.0 * t).sin()) as f32
            })
            .collect();
        let mut track = Track::new(name, format!("{}.wav", name), AudioBuffer::new(samples, sr).unwrap());
        track
            .preprocess(&analysis, &DownbeatTempo, &CuePointExtractor::default())
            .unwrap();
        track
    }

    #[test]
    fn test_plan_follows_cue_arithmetic() {
        let master = analysed("A", 120.0, 120.0);
        let slave = analysed("B", 120.0, 120.0);
        let config = MixConfig {
            master_cue_index: 1,
            slave_cue_index: 1,
            slave_bass_cue_index: 2,
            treble_duration_secs: 10.0,
            ..Default::default()
        };
        let orchestrator = MixOrchestrator::new(config).unwrap();
        let plan = orchestrator.plan(&master, &slave).unwrap();

        assert_relative_eq!(plan.lead_secs, 4.0);
        assert_relative_eq!(plan.a_bass, plan.a_cue + plan.b_bass - plan.b_cue - 4.0);
        assert_eq!(plan.master_treble.len(), 4);
        assert_relative_eq!(plan.master_treble[3].time_secs, plan.a_cue + 10.0);
        assert_relative_eq!(plan.slave_treble[2].time_secs, plan.b_cue + 5.0);
        assert_eq!(plan.slave_bass[0].gains, GainPair { low: 0.2, high: 1.0 });
    }

    #[test]
    fn test_mix_requires_enough_cues() {
        let master = analysed("A", 120.0, 60.0);
        let slave = analysed("B", 120.0, 60.0);
        let config = MixConfig {
            master_cue_index: 500,
            ..Default::default()
        };
        let orchestrator = MixOrchestrator::new(config).unwrap();
        assert!(matches!(
            orchestrator.mix(&master, &slave),
            Err(MixError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_mix_rejects_rate_mismatch() {
        let master = analysed("A", 120.0, 30.0);
        let slave = Track::new("B", "b.wav", AudioBuffer::silence(30.0, 8000));
        let orchestrator = MixOrchestrator::new(MixConfig::default()).unwrap();
        assert!(matches!(
            orchestrator.mix(&master, &slave),
            Err(MixError::SampleRateMismatch { .. })
        ));
    }

    #[test]
    fn test_context_registry_and_match_tempo() {
        let mut context = MixContext::new();
        context.insert(analysed("A", 120.0, 20.0));
        context.insert(analysed("B", 100.0, 24.0));
        assert_eq!(context.names().collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(matches!(
            context.get("C"),
            Err(MixError::TrackNotFound { .. })
        ));

        let name = context.match_tempo("A", "B", &Varispeed).unwrap();
        assert_eq!(name, "B_AT_120bpm");
        let stretched = context.get(&name).unwrap();
        assert_eq!(stretched.audio().len(), 80_000);
        assert!(stretched.tempo().is_none());
    }
}
