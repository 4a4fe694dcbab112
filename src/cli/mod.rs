//! CLI Module
//!
//! Command-line interface for the segue mixing tools.

pub mod commands;

use crate::dsp::{InterpolationMode, Keyframe, DEFAULT_CHUNK_SIZE};
use crate::mix::DEFAULT_TARGET_DB;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Segue - beatmatched two-track mixing
#[derive(Parser, Debug)]
#[command(name = "segue")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Bit depth of written WAV files (16, 24 or 32-bit float)
    #[arg(long, global = true, default_value_t = 32)]
    pub bits: u16,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the WAV tracks in a folder with their sidecar analysis
    #[command(name = "scan")]
    Scan {
        /// Folder containing WAV files
        dir: PathBuf,
    },

    /// Extract cue points from a track
    #[command(name = "cues")]
    Cues {
        /// Input audio file
        audio: PathBuf,

        /// Beat-tracker analysis JSON
        #[arg(short, long)]
        analysis: PathBuf,
    },

    /// Estimate tempo from downbeats
    #[command(name = "tempo")]
    Tempo {
        /// Beat-tracker analysis JSON
        #[arg(short, long)]
        analysis: PathBuf,
    },

    /// Apply a static two-band EQ
    #[command(name = "eq")]
    Eq {
        input: PathBuf,
        output: PathBuf,

        /// Low-shelf linear gain
        #[arg(long, default_value_t = 1.0)]
        low: f64,

        /// High-shelf linear gain
        #[arg(long, default_value_t = 1.0)]
        high: f64,
    },

    /// Render EQ automation along keyframes
    #[command(name = "transition")]
    Transition {
        input: PathBuf,
        output: PathBuf,

        /// Keyframe as time:low:high (repeatable, ascending times)
        #[arg(short, long = "keyframe", value_parser = parse_keyframe, required = true)]
        keyframes: Vec<Keyframe>,

        /// Interpolation between keyframes (linear or sigmoid)
        #[arg(short, long, default_value = "linear")]
        mode: InterpolationMode,

        /// Samples per constant-gain chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Scale a track to a target loudness
    #[command(name = "normalize")]
    Normalize {
        input: PathBuf,
        output: PathBuf,

        /// Target mean-square level in dB
        #[arg(long, default_value_t = DEFAULT_TARGET_DB, allow_hyphen_values = true)]
        target_db: f64,
    },

    /// Mix a master track into a slave track
    #[command(name = "mix")]
    Mix {
        /// Outgoing track
        master: PathBuf,

        /// Incoming track
        slave: PathBuf,

        /// Analysis JSON of the master track
        #[arg(long)]
        master_analysis: PathBuf,

        /// Analysis JSON of the slave track
        #[arg(long)]
        slave_analysis: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Mix configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Time-stretch the slave to the master tempo first
        #[arg(long)]
        match_tempo: bool,
    },
}

/// Parse `time:low:high`
pub fn parse_keyframe(s: &str) -> Result<Keyframe, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [time, low, high] = parts.as_slice() else {
        return Err(format!("expected time:low:high, got '{}'", s));
    };
    let number = |field: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid {} '{}': {}", field, value, e))
    };
    Ok(Keyframe::new(
        number("time", *time)?,
        number("low gain", *low)?,
        number("high gain", *high)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keyframe() {
        let keyframe = parse_keyframe("12.5:0.2:1").unwrap();
        assert_eq!(keyframe, Keyframe::new(12.5, 0.2, 1.0));
        assert!(parse_keyframe("1:2").is_err());
        assert!(parse_keyframe("a:1:1").is_err());
    }

    #[test]
    fn test_cli_parses_transition() {
        let cli = Cli::try_parse_from([
            "segue",
            "transition",
            "in.wav",
            "out.wav",
            "-k",
            "0:1:1",
            "-k",
            "4:0.2:1",
            "--mode",
            "sigmoid",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Transition {
                keyframes, mode, chunk_size, ..
            }) => {
                assert_eq!(keyframes.len(), 2);
                assert_eq!(mode, InterpolationMode::Sigmoid);
                assert_eq!(chunk_size, 44100);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
