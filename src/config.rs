//! Mix configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes.

use crate::analysis::CueOptions;
use crate::dsp::DEFAULT_CHUNK_SIZE;
use crate::error::{MixError, Result};
use crate::mix::{CompositeMode, DEFAULT_TARGET_DB};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of a two-track mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    /// Samples per constant-gain block in EQ automation
    pub chunk_size: usize,
    /// Loudness of the final mix, dB of mean-square energy
    pub target_db: f64,
    /// How many master beats the bass swap leads the slave's bass cue by
    pub lead_beats: f64,
    /// Master cue at which the treble hand-off starts and the master is cut
    pub master_cue_index: usize,
    /// Slave cue at which the slave enters
    pub slave_cue_index: usize,
    /// Slave cue at which its bass is fully restored
    pub slave_bass_cue_index: usize,
    /// Low-shelf gain of whichever track has its bass cut
    pub bass_cut_gain: f64,
    /// Length of the treble hand-off in seconds
    pub treble_duration_secs: f64,
    pub composite: CompositeMode,
    pub cue: CueOptions,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            target_db: DEFAULT_TARGET_DB,
            lead_beats: 8.0,
            master_cue_index: 4,
            slave_cue_index: 2,
            slave_bass_cue_index: 4,
            bass_cut_gain: 0.2,
            treble_duration_secs: 120.0,
            composite: CompositeMode::default(),
            cue: CueOptions::default(),
        }
    }
}

impl MixConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(MixError::invalid("chunk_size", self.chunk_size, "> 0 samples"));
        }
        if !self.target_db.is_finite() {
            return Err(MixError::invalid("target_db", self.target_db, "a finite level in dB"));
        }
        if !self.lead_beats.is_finite() || self.lead_beats < 0.0 {
            return Err(MixError::invalid("lead_beats", self.lead_beats, "finite and >= 0"));
        }
        if !self.bass_cut_gain.is_finite() || self.bass_cut_gain < 0.0 {
            return Err(MixError::invalid("bass_cut_gain", self.bass_cut_gain, "finite and >= 0"));
        }
        if !self.treble_duration_secs.is_finite() || self.treble_duration_secs <= 0.0 {
            return Err(MixError::invalid(
                "treble_duration_secs",
                self.treble_duration_secs,
                "finite and > 0 seconds",
            ));
        }
        if let CompositeMode::Crossfade { duration_secs } = self.composite {
            if !duration_secs.is_finite() || duration_secs < 0.0 {
                return Err(MixError::invalid(
                    "composite.duration_secs",
                    duration_secs,
                    "finite and >= 0 seconds",
                ));
            }
        }
        self.cue.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = MixConfig::default();
        assert_eq!(config.chunk_size, 44100);
        assert_eq!(config.target_db, -10.0);
        assert_eq!(config.composite, CompositeMode::Splice);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mix.json");
        std::fs::write(
            &path,
            r#"{ "lead_beats": 16, "composite": { "mode": "crossfade", "duration_secs": 4.0 } }"#,
        )
        .unwrap();

        let config = MixConfig::load(&path).unwrap();
        assert_eq!(config.lead_beats, 16.0);
        assert_eq!(config.composite, CompositeMode::Crossfade { duration_secs: 4.0 });
        assert_eq!(config.master_cue_index, 4);
        assert_eq!(config.cue, CueOptions::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mix.json");
        let config = MixConfig {
            target_db: -14.0,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(MixConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mix.json");
        std::fs::write(&path, r#"{ "chunk_size": 0 }"#).unwrap();
        assert!(matches!(
            MixConfig::load(&path),
            Err(MixError::InvalidParameter { .. })
        ));

        let config = MixConfig {
            treble_duration_secs: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
