//! Track compositing
//!
//! Joins two EQ-automated buffers into one and sets the loudness of the result.

mod compositor;

pub use compositor::{crossfade, normalize, splice, DEFAULT_TARGET_DB};

use crate::audio::AudioBuffer;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// How the outgoing and incoming tracks are joined
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum CompositeMode {
    /// Average the overlap after both cut points
    #[default]
    Splice,
    /// Linear fade over a fixed window ending at the outgoing cut point
    Crossfade { duration_secs: f64 },
}

impl CompositeMode {
    /// Join `a` and `b` at their cut points with this policy
    pub fn combine(
        &self,
        a: &AudioBuffer,
        b: &AudioBuffer,
        cut_a_secs: f64,
        cut_b_secs: f64,
    ) -> Result<AudioBuffer> {
        match *self {
            CompositeMode::Splice => splice(a, b, cut_a_secs, cut_b_secs),
            CompositeMode::Crossfade { duration_secs } => {
                crossfade(a, b, cut_a_secs, cut_b_secs, duration_secs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serialisation() {
        let json = serde_json::to_string(&CompositeMode::Crossfade { duration_secs: 2.0 }).unwrap();
        assert_eq!(json, r#"{"mode":"crossfade","duration_secs":2.0}"#);

        let parsed: CompositeMode = serde_json::from_str(r#"{"mode":"splice"}"#).unwrap();
        assert_eq!(parsed, CompositeMode::Splice);
    }

    #[test]
    fn test_combine_dispatches() {
        let a = AudioBuffer::new(vec![1.0; 10], 10).unwrap();
        let b = AudioBuffer::new(vec![0.0; 10], 10).unwrap();

        let spliced = CompositeMode::Splice.combine(&a, &b, 0.5, 0.5).unwrap();
        assert_eq!(spliced.len(), 10);

        let faded = CompositeMode::Crossfade { duration_secs: 0.2 }
            .combine(&a, &b, 0.5, 0.5)
            .unwrap();
        assert_eq!(faded.len(), 8);
    }
}
