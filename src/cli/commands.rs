//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::{info, warn};

use crate::analysis::{bar_starts, tempo_ratio, CueOptions, CuePointExtractor};
use crate::audio::levels::{calculate_peak, calculate_rms, mean_square_db};
use crate::audio::{load_wav, save_wav_with_depth, AudioBuffer};
use crate::config::MixConfig;
use crate::dsp::{EqEngine, GainPair, InterpolationMode, Keyframe, TransitionScheduler};
use crate::error::Result;
use crate::mix::normalize;
use crate::providers::{
    AnalysisFile, DownbeatTempo, SidecarAnalysis, TempoEstimator, Varispeed, WavLoader,
};
use crate::session::{MixContext, MixOrchestrator};
use crate::track::Track;

/// List tracks in a folder, with tempo and cue counts where a sidecar analysis exists.
pub fn scan(dir: &Path) -> Result<()> {
    info!("Scanning {}", dir.display());

    let mut context = MixContext::new();
    let names = context.load_directory(dir, &WavLoader)?;
    if names.is_empty() {
        println!("No WAV files in {}", dir.display());
        return Ok(());
    }

    let extractor = CuePointExtractor::default();
    println!("{:<24} {:>10} {:>8} {:>6}", "Track", "Duration", "BPM", "Cues");
    println!("{:-<51}", "");
    for name in &names {
        let path = context.get(name)?.path().to_path_buf();
        if AnalysisFile::sidecar_path(&path).exists() {
            if let Err(e) = context.preprocess(name, &SidecarAnalysis, &DownbeatTempo, &extractor) {
                warn!("Could not analyse {}: {}", name, e);
            }
        }

        let track = context.get(name)?;
        println!(
            "{:<24} {:>9.1}s {:>8} {:>6}",
            name,
            track.audio().duration(),
            track.tempo().map_or_else(|| "-".to_string(), |bpm| bpm.to_string()),
            track.cue_points().map_or_else(|| "-".to_string(), |c| c.len().to_string())
        );
    }

    Ok(())
}

/// Print the cue points of one track.
pub fn cues(audio: &Path, analysis: &Path) -> Result<()> {
    info!("Extracting cue points: {}", audio.display());

    let analysis = AnalysisFile::load(analysis)?;
    let mut track = Track::load("track", audio, &WavLoader)?;
    track.detect_beats(&analysis)?;
    track.extract_cue_points(&CuePointExtractor::new(CueOptions::default())?)?;

    let indices = track.cue_indices().unwrap_or_default();
    let points = track.cue_points().unwrap_or_default();
    println!("Cue points ({}):", points.len());
    for (i, (index, time)) in indices.iter().zip(points).enumerate() {
        println!("  [{}] beat {:>5}  {:>9.3}s", i, index, time);
    }
    if let Some(counts) = track.beat_series_counts() {
        println!("Beat series counts: {:?}", counts);
    }

    Ok(())
}

/// Print the downbeat tempo of an analysis file.
pub fn tempo(analysis: &Path) -> Result<()> {
    let analysis = AnalysisFile::load(analysis)?;
    let downbeats = bar_starts(&analysis.downbeats);
    let estimate = DownbeatTempo.estimate_tempo(&downbeats)?;

    println!("Tempo: {} BPM", estimate.bpm);
    println!("Bar length: {:.6}s over {} bars", estimate.bar_secs, estimate.differences.len());

    Ok(())
}

/// Apply a static EQ.
pub fn eq(input: &Path, output: &Path, low: f64, high: f64, bits: u16) -> Result<()> {
    info!("EQ {} (low {}, high {})", input.display(), low, high);

    let buffer = load_wav(input)?;
    let gains = GainPair::new(low, high)?;
    let processed = EqEngine::default().apply_gains(&buffer, gains)?;
    save_wav_with_depth(&processed, output, bits)?;

    print_levels(output, &processed);
    Ok(())
}

/// Render EQ automation.
pub fn transition(
    input: &Path,
    output: &Path,
    keyframes: &[Keyframe],
    mode: InterpolationMode,
    chunk_size: usize,
    bits: u16,
) -> Result<()> {
    info!(
        "Transition {} ({} keyframes, {:?})",
        input.display(),
        keyframes.len(),
        mode
    );

    let buffer = load_wav(input)?;
    let processed = TransitionScheduler::default().schedule(&buffer, keyframes, chunk_size, mode)?;
    save_wav_with_depth(&processed, output, bits)?;

    print_levels(output, &processed);
    Ok(())
}

/// Normalize loudness.
pub fn normalize_file(input: &Path, output: &Path, target_db: f64, bits: u16) -> Result<()> {
    info!("Normalizing {} to {} dB", input.display(), target_db);

    let buffer = load_wav(input)?;
    let processed = normalize(&buffer, target_db)?;
    save_wav_with_depth(&processed, output, bits)?;

    print_levels(output, &processed);
    Ok(())
}

/// Mix two tracks end to end.
#[allow(clippy::too_many_arguments)]
pub fn mix(
    master: &Path,
    slave: &Path,
    master_analysis: &Path,
    slave_analysis: &Path,
    output: &Path,
    config: Option<&Path>,
    match_tempo: bool,
    bits: u16,
) -> Result<()> {
    let config = match config {
        Some(path) => {
            info!("Loading mix config: {}", path.display());
            MixConfig::load(path)?
        }
        None => MixConfig::default(),
    };
    let extractor = CuePointExtractor::new(config.cue.clone())?;
    let master_analysis = AnalysisFile::load(master_analysis)?;
    let slave_analysis = AnalysisFile::load(slave_analysis)?;

    let mut context = MixContext::new();
    context.insert(Track::load("master", master, &WavLoader)?);
    context.insert(Track::load("slave", slave, &WavLoader)?);
    context.preprocess("master", &master_analysis, &DownbeatTempo, &extractor)?;
    context.preprocess("slave", &slave_analysis, &DownbeatTempo, &extractor)?;

    let slave_name = if match_tempo {
        let ratio = tempo_ratio(
            context.get("master")?.require_tempo()?,
            context.get("slave")?.require_tempo()?,
        )?;
        let name = context.match_tempo("master", "slave", &Varispeed)?;
        context.preprocess(&name, &slave_analysis.stretched(ratio)?, &DownbeatTempo, &extractor)?;
        name
    } else {
        "slave".to_string()
    };

    let orchestrator = MixOrchestrator::new(config)?;
    let master_track = context.get("master")?;
    let slave_track = context.get(&slave_name)?;
    let plan = orchestrator.plan(master_track, slave_track)?;
    println!(
        "Master: {} BPM, cut at {:.3}s, bass out by {:.3}s",
        master_track.require_tempo()?,
        plan.a_cue,
        plan.a_bass
    );
    println!(
        "Slave:  {} BPM, enters at {:.3}s, bass in by {:.3}s",
        slave_track.require_tempo()?,
        plan.b_cue,
        plan.b_bass
    );

    let mixed = orchestrator.mix(master_track, slave_track)?;
    save_wav_with_depth(&mixed, output, bits)?;

    print_levels(output, &mixed);
    Ok(())
}

fn print_levels(output: &Path, buffer: &AudioBuffer) {
    println!("Wrote {} ({:.2}s)", output.display(), buffer.duration());
    println!(
        "  RMS {:.4} | peak {:.4} | level {:.2} dB",
        calculate_rms(buffer.samples()),
        calculate_peak(buffer.samples()),
        mean_square_db(buffer.samples())
    );
}
